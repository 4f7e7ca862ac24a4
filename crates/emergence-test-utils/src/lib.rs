//! Fixture builders shared by the Emergence test suites.

use std::path::{Path, PathBuf};

use emergence_common::{
    EmStatus, EvaluationYear, Indicator, MergedTaxonRecord, Model, StatusColumn,
    TaxonIndicatorRecord, TaxonName,
};

pub use pretty_assertions::assert_eq;

pub fn status(value: u8) -> Option<EmStatus> {
    EmStatus::new(value)
}

pub fn column(year: i32, indicator: Indicator) -> StatusColumn {
    let year = EvaluationYear::from_year(year)
        .unwrap_or_else(|| panic!("{year} is outside the evaluation window"));
    StatusColumn::new(year, indicator)
}

pub fn gam(
    taxon_key: u64,
    year: i32,
    indicator: Indicator,
    em_status: Option<u8>,
    growth: Option<f64>,
) -> TaxonIndicatorRecord {
    TaxonIndicatorRecord {
        taxon_key,
        year,
        indicator,
        model: Model::Gam,
        em_status: em_status.and_then(EmStatus::new),
        growth,
    }
}

pub fn rule(taxon_key: u64, year: i32, indicator: Indicator, em_status: Option<u8>) -> TaxonIndicatorRecord {
    TaxonIndicatorRecord {
        taxon_key,
        year,
        indicator,
        model: Model::DecisionRules,
        em_status: em_status.and_then(EmStatus::new),
        growth: None,
    }
}

pub fn taxon_name(taxon_key: u64, canonical_name: &str, kingdom: &str, class: &str) -> TaxonName {
    TaxonName {
        taxon_key,
        canonical_name: Some(canonical_name.to_string()),
        kingdom: Some(kingdom.to_string()),
        class: Some(class.to_string()),
    }
}

/// Builder for merged records used by ranker tests.
#[derive(Debug, Clone)]
pub struct TaxonBuilder {
    record: MergedTaxonRecord,
}

impl TaxonBuilder {
    pub fn new(taxon_key: u64) -> Self {
        Self { record: MergedTaxonRecord::new(taxon_key) }
    }

    /// Every status column set to the same value.
    pub fn all(mut self, value: u8) -> Self {
        for c in StatusColumn::priority_order() {
            self.record.statuses.set(c, status(value));
        }
        self
    }

    pub fn status(mut self, year: i32, indicator: Indicator, value: Option<u8>) -> Self {
        self.record
            .statuses
            .set(column(year, indicator), value.and_then(EmStatus::new));
        self
    }

    pub fn growth(mut self, mean_growth: f64) -> Self {
        self.record.mean_growth = Some(mean_growth);
        self
    }

    pub fn name(mut self, canonical_name: &str) -> Self {
        self.record.canonical_name = Some(canonical_name.to_string());
        self
    }

    pub fn build(self) -> MergedTaxonRecord {
        self.record
    }
}

pub fn taxon(taxon_key: u64) -> TaxonBuilder {
    TaxonBuilder::new(taxon_key)
}

/// Joins lines with newlines, tab-separating fields written as `|`.
pub fn tsv(lines: &[&str]) -> String {
    let mut out = lines
        .iter()
        .map(|l| l.replace('|', "\t"))
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dir");
    }
    std::fs::write(&path, content).expect("write fixture");
    path
}

pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}
