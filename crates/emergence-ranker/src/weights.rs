//! Gain factors for the point-based ranking strategy.

use std::collections::BTreeMap;

use emergence_common::{EmergenceError, EvaluationYear, Indicator, Result, StatusColumn};
use serde::Serialize;

/// One gain factor per status column, stored in hierarchical priority order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainFactors {
    factors: [f64; StatusColumn::COUNT],
}

impl Default for GainFactors {
    /// Recent years, protected areas and occupancy weigh more.
    fn default() -> Self {
        let mut factors = [0.0; StatusColumn::COUNT];
        for column in StatusColumn::priority_order() {
            factors[column.index()] = default_factor(column);
        }
        Self { factors }
    }
}

fn default_factor(column: StatusColumn) -> f64 {
    let base = match column.year {
        EvaluationYear::Y2018 => 3.0,
        EvaluationYear::Y2017 => 2.5,
        EvaluationYear::Y2016 => 2.0,
    };
    let offset = match column.indicator {
        Indicator::OccupancyPa => 0.0,
        Indicator::ObservationsPa | Indicator::OccupancyBe => 0.5,
        Indicator::ObservationsBe => 1.0,
    };
    base - offset
}

impl GainFactors {
    pub fn factor(&self, column: StatusColumn) -> f64 {
        self.factors[column.index()]
    }

    pub fn set(&mut self, column: StatusColumn, factor: f64) {
        self.factors[column.index()] = factor;
    }

    /// Defaults with per-column overrides keyed by column name.
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Result<Self> {
        let mut gains = Self::default();
        for (name, factor) in overrides {
            let column: StatusColumn = name
                .parse()
                .map_err(|e| EmergenceError::Config(format!("gain factor override: {e}")))?;
            gains.set(column, *factor);
        }
        gains.validate()?;
        Ok(gains)
    }

    /// All factors must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (column, factor) in self.iter() {
            if !factor.is_finite() || factor < 0.0 {
                return Err(EmergenceError::Config(format!(
                    "gain factor for {column} must be a non-negative number, got {factor}"
                )));
            }
        }
        Ok(())
    }

    /// (column, factor) pairs in hierarchical priority order.
    pub fn iter(&self) -> impl Iterator<Item = (StatusColumn, f64)> + '_ {
        StatusColumn::priority_order()
            .into_iter()
            .map(move |c| (c, self.factor(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emergence_common::Indicator::*;
    use emergence_test_utils::column;

    #[test]
    fn test_default_table() {
        let g = GainFactors::default();
        let expected = [
            (2018, OccupancyPa, 3.0),
            (2018, ObservationsPa, 2.5),
            (2018, OccupancyBe, 2.5),
            (2018, ObservationsBe, 2.0),
            (2017, OccupancyPa, 2.5),
            (2017, ObservationsPa, 2.0),
            (2017, OccupancyBe, 2.0),
            (2017, ObservationsBe, 1.5),
            (2016, OccupancyPa, 2.0),
            (2016, ObservationsPa, 1.5),
            (2016, OccupancyBe, 1.5),
            (2016, ObservationsBe, 1.0),
        ];
        for (year, indicator, factor) in expected {
            assert_eq!(g.factor(column(year, indicator)), factor, "{year} {indicator}");
        }
    }

    #[test]
    fn test_overrides_apply_by_name() {
        let mut overrides = BTreeMap::new();
        overrides.insert("year_2016_observations_BE".to_string(), 0.5);
        let g = GainFactors::with_overrides(&overrides).unwrap();
        assert_eq!(g.factor(column(2016, ObservationsBe)), 0.5);
        assert_eq!(g.factor(column(2018, OccupancyPa)), 3.0);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let mut overrides = BTreeMap::new();
        overrides.insert("year_2018_occupancy".to_string(), 1.0);
        assert!(GainFactors::with_overrides(&overrides).is_err());

        let mut overrides = BTreeMap::new();
        overrides.insert("year_2018_occupancy_pa".to_string(), f64::NAN);
        assert!(GainFactors::with_overrides(&overrides).is_err());
    }
}
