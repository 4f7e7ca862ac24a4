//! Core domain types for emerging-status ranking.
//! Status columns are an enumerated schema: every (year, indicator) pair
//! is a `StatusColumn`, never a column name matched by prefix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returns true for cells that encode a missing value (`NA` or empty).
pub fn is_na(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "NA"
}

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    /// Number of distinct grid cells occupied
    Occupancy,
    /// Raw observation counts
    Observations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Restricted to protected-area cells
    ProtectedArea,
    /// All of Belgium
    Belgium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Indicator {
    #[serde(rename = "occupancy_pa")]
    OccupancyPa,
    #[serde(rename = "observations_pa")]
    ObservationsPa,
    #[serde(rename = "occupancy_BE")]
    OccupancyBe,
    #[serde(rename = "observations_BE")]
    ObservationsBe,
}

impl Indicator {
    /// Indicators in ranking priority within a single year:
    /// protected area before Belgium, occupancy before observations.
    pub const PRIORITY: [Indicator; 4] = [
        Indicator::OccupancyPa,
        Indicator::ObservationsPa,
        Indicator::OccupancyBe,
        Indicator::ObservationsBe,
    ];

    pub fn kind(self) -> IndicatorKind {
        match self {
            Indicator::OccupancyPa | Indicator::OccupancyBe => IndicatorKind::Occupancy,
            Indicator::ObservationsPa | Indicator::ObservationsBe => IndicatorKind::Observations,
        }
    }

    pub fn region(self) -> Region {
        match self {
            Indicator::OccupancyPa | Indicator::ObservationsPa => Region::ProtectedArea,
            Indicator::OccupancyBe | Indicator::ObservationsBe => Region::Belgium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Indicator::OccupancyPa => "occupancy_pa",
            Indicator::ObservationsPa => "observations_pa",
            Indicator::OccupancyBe => "occupancy_BE",
            Indicator::ObservationsBe => "observations_BE",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Indicator::PRIORITY
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("unknown indicator `{s}`"))
    }
}

// ---------------------------------------------------------------------------
// Evaluation year
// ---------------------------------------------------------------------------

/// Years whose emerging status enters the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvaluationYear {
    Y2016,
    Y2017,
    Y2018,
}

impl EvaluationYear {
    /// Most recent year first.
    pub const PRIORITY: [EvaluationYear; 3] =
        [EvaluationYear::Y2018, EvaluationYear::Y2017, EvaluationYear::Y2016];

    pub fn value(self) -> i32 {
        match self {
            EvaluationYear::Y2016 => 2016,
            EvaluationYear::Y2017 => 2017,
            EvaluationYear::Y2018 => 2018,
        }
    }

    /// Maps a calendar year onto the evaluation window, `None` outside it.
    pub fn from_year(year: i32) -> Option<Self> {
        EvaluationYear::PRIORITY
            .into_iter()
            .find(|y| y.value() == year)
    }
}

impl fmt::Display for EvaluationYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// ---------------------------------------------------------------------------
// Status column
// ---------------------------------------------------------------------------

/// One emerging-status column of the wide table, e.g. `year_2018_occupancy_pa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusColumn {
    pub year: EvaluationYear,
    pub indicator: Indicator,
}

impl StatusColumn {
    pub const COUNT: usize = 12;

    pub fn new(year: EvaluationYear, indicator: Indicator) -> Self {
        Self { year, indicator }
    }

    /// All twelve columns in hierarchical priority order.
    pub fn priority_order() -> [StatusColumn; StatusColumn::COUNT] {
        let mut columns = [StatusColumn::new(EvaluationYear::Y2018, Indicator::OccupancyPa);
            StatusColumn::COUNT];
        for (y, year) in EvaluationYear::PRIORITY.into_iter().enumerate() {
            for (i, indicator) in Indicator::PRIORITY.into_iter().enumerate() {
                columns[y * Indicator::PRIORITY.len() + i] = StatusColumn::new(year, indicator);
            }
        }
        columns
    }

    /// Position of this column in `priority_order()`.
    pub fn index(self) -> usize {
        let y = EvaluationYear::PRIORITY
            .iter()
            .position(|&y| y == self.year)
            .unwrap_or(0);
        let i = Indicator::PRIORITY
            .iter()
            .position(|&i| i == self.indicator)
            .unwrap_or(0);
        y * Indicator::PRIORITY.len() + i
    }

    pub fn name(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StatusColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "year_{}_{}", self.year, self.indicator)
    }
}

impl FromStr for StatusColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusColumn::priority_order()
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown status column `{s}`"))
    }
}

// ---------------------------------------------------------------------------
// Emerging status
// ---------------------------------------------------------------------------

/// Ordinal emerging status, 0 (not emerging) to 3 (emerging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmStatus(u8);

impl EmStatus {
    pub const MAX: u8 = 3;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Parses a table cell: `NA`/empty is `Ok(None)`, 0–3 is a status,
    /// anything else is rejected. Numeric cells written as `2.0` are accepted.
    pub fn parse_cell(raw: &str) -> Result<Option<Self>, String> {
        if is_na(raw) {
            return Ok(None);
        }
        let trimmed = raw.trim();
        let value = match trimmed.parse::<u8>() {
            Ok(v) => v,
            Err(_) => {
                let f: f64 = trimmed
                    .parse()
                    .map_err(|_| format!("not a number: {trimmed}"))?;
                if f.fract() != 0.0 || !(0.0..=f64::from(Self::MAX)).contains(&f) {
                    return Err(format!("out of range: {trimmed}"));
                }
                f as u8
            }
        };
        Self::new(value)
            .map(Some)
            .ok_or_else(|| format!("out of range: {trimmed}"))
    }
}

impl fmt::Display for EmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Status columns (wide row)
// ---------------------------------------------------------------------------

/// The twelve resolved statuses of one taxon, indexed by `StatusColumn`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusColumns {
    values: [Option<EmStatus>; StatusColumn::COUNT],
}

impl StatusColumns {
    pub fn get(&self, column: StatusColumn) -> Option<EmStatus> {
        self.values[column.index()]
    }

    pub fn set(&mut self, column: StatusColumn, status: Option<EmStatus>) {
        self.values[column.index()] = status;
    }

    /// (column, status) pairs in hierarchical priority order.
    pub fn iter(&self) -> impl Iterator<Item = (StatusColumn, Option<EmStatus>)> + '_ {
        StatusColumn::priority_order()
            .into_iter()
            .map(move |c| (c, self.get(c)))
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "GAM")]
    Gam,
    #[serde(rename = "decision_rules")]
    DecisionRules,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Gam => f.write_str("GAM"),
            Model::DecisionRules => f.write_str("decision_rules"),
        }
    }
}

/// One upstream model output row.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonIndicatorRecord {
    pub taxon_key: u64,
    pub year: i32,
    pub indicator: Indicator,
    pub model: Model,
    pub em_status: Option<EmStatus>,
    /// Only present for GAM output
    pub growth: Option<f64>,
}

/// Taxonomic lookup entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonName {
    pub taxon_key: u64,
    pub canonical_name: Option<String>,
    pub kingdom: Option<String>,
    pub class: Option<String>,
}

/// One taxon after widening and coalescing model outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTaxonRecord {
    pub taxon_key: u64,
    pub canonical_name: Option<String>,
    pub kingdom: Option<String>,
    pub class: Option<String>,
    pub statuses: StatusColumns,
    pub mean_growth: Option<f64>,
}

impl MergedTaxonRecord {
    pub fn new(taxon_key: u64) -> Self {
        Self {
            taxon_key,
            canonical_name: None,
            kingdom: None,
            class: None,
            statuses: StatusColumns::default(),
            mean_growth: None,
        }
    }
}
