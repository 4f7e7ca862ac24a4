//! Loading of the upstream model outputs and the taxonomic lookup.
//!
//! All inputs are tab-separated with a header row. Columns are located by
//! name, so column order is free and extra columns are ignored. A missing
//! file or a missing required column is fatal; `NA` cells are valid data.

use std::path::{Path, PathBuf};

use emergence_common::entities::is_na;
use emergence_common::{
    EmStatus, EmergenceError, Indicator, InputConfig, Model, Result, TaxonIndicatorRecord,
    TaxonName,
};
use tracing::{debug, info};

pub const COL_TAXON_KEY: &str = "taxonKey";
pub const COL_YEAR: &str = "year";
pub const COL_EM_STATUS: &str = "em_status";
pub const COL_GROWTH: &str = "growth";
pub const COL_CANONICAL_NAME: &str = "canonicalName";
pub const COL_KINGDOM: &str = "kingdom";
pub const COL_CLASS: &str = "class";

/// Everything the merger needs, as read from disk.
#[derive(Debug, Clone, Default)]
pub struct RankingInputs {
    pub gam: Vec<TaxonIndicatorRecord>,
    pub decision_rules: Vec<TaxonIndicatorRecord>,
    pub taxonomy: Vec<TaxonName>,
}

/// Load the four GAM tables, the four decision-rule tables and the taxonomy.
pub async fn load_inputs(inputs: &InputConfig) -> Result<RankingInputs> {
    let mut loaded = RankingInputs::default();

    for indicator in Indicator::PRIORITY {
        let path = inputs.gam_path(indicator);
        loaded.gam.extend(load_indicator_table(&path, indicator, Model::Gam).await?);

        let path = inputs.decision_rules_path(indicator);
        loaded
            .decision_rules
            .extend(load_indicator_table(&path, indicator, Model::DecisionRules).await?);
    }

    loaded.taxonomy = load_taxonomy(&inputs.taxonomy).await?;

    info!(
        "Loaded {} GAM rows, {} decision-rule rows, {} taxonomy entries",
        loaded.gam.len(),
        loaded.decision_rules.len(),
        loaded.taxonomy.len()
    );
    Ok(loaded)
}

pub async fn load_indicator_table(
    path: &Path,
    indicator: Indicator,
    model: Model,
) -> Result<Vec<TaxonIndicatorRecord>> {
    let content = read_input(path).await?;
    let records = parse_indicator_table(&content, path, indicator, model)?;
    debug!("Read {} {} rows for {} from {:?}", records.len(), model, indicator, path);
    Ok(records)
}

pub async fn load_taxonomy(path: &Path) -> Result<Vec<TaxonName>> {
    let content = read_input(path).await?;
    parse_taxonomy(&content, path)
}

async fn read_input(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EmergenceError::MissingInput {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Parse one model output table. GAM tables must carry a `growth` column.
pub fn parse_indicator_table(
    content: &str,
    path: &Path,
    indicator: Indicator,
    model: Model,
) -> Result<Vec<TaxonIndicatorRecord>> {
    let mut reader = tsv_reader(content);
    let columns = HeaderIndex::new(reader.headers()?, path);

    let taxon_col = columns.require(COL_TAXON_KEY)?;
    let year_col = columns.require(COL_YEAR)?;
    let status_col = columns.require(COL_EM_STATUS)?;
    let growth_col = match model {
        Model::Gam => Some(columns.require(COL_GROWTH)?),
        Model::DecisionRules => None,
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let invalid = |column: &str, value: &str| EmergenceError::InvalidValue {
            path: path.to_path_buf(),
            line,
            column: column.to_string(),
            value: value.to_string(),
        };

        let taxon_key = parse_taxon_key(cell(taxon_col)).ok_or_else(|| invalid(COL_TAXON_KEY, cell(taxon_col)))?;
        let year: i32 = cell(year_col)
            .trim()
            .parse()
            .map_err(|_| invalid(COL_YEAR, cell(year_col)))?;
        let em_status = EmStatus::parse_cell(cell(status_col))
            .map_err(|_| invalid(COL_EM_STATUS, cell(status_col)))?;
        let growth = match growth_col {
            Some(idx) => parse_growth(cell(idx)).map_err(|_| invalid(COL_GROWTH, cell(idx)))?,
            None => None,
        };

        records.push(TaxonIndicatorRecord {
            taxon_key,
            year,
            indicator,
            model,
            em_status,
            growth,
        });
    }

    Ok(records)
}

/// Parse the taxonomic lookup. Empty or `NA` name fields stay missing.
pub fn parse_taxonomy(content: &str, path: &Path) -> Result<Vec<TaxonName>> {
    let mut reader = tsv_reader(content);
    let columns = HeaderIndex::new(reader.headers()?, path);

    let taxon_col = columns.require(COL_TAXON_KEY)?;
    let name_col = columns.require(COL_CANONICAL_NAME)?;
    let kingdom_col = columns.require(COL_KINGDOM)?;
    let class_col = columns.require(COL_CLASS)?;

    let mut names = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw_key = record.get(taxon_col).unwrap_or("");
        let taxon_key = parse_taxon_key(raw_key).ok_or_else(|| EmergenceError::InvalidValue {
            path: path.to_path_buf(),
            line,
            column: COL_TAXON_KEY.to_string(),
            value: raw_key.to_string(),
        })?;

        names.push(TaxonName {
            taxon_key,
            canonical_name: optional_text(record.get(name_col)),
            kingdom: optional_text(record.get(kingdom_col)),
            class: optional_text(record.get(class_col)),
        });
    }

    Ok(names)
}

pub(crate) fn tsv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes())
}

pub(crate) fn parse_taxon_key(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

/// `NA`, empty and non-finite values are missing growth.
pub(crate) fn parse_growth(raw: &str) -> std::result::Result<Option<f64>, ()> {
    if is_na(raw) {
        return Ok(None);
    }
    let value: f64 = raw.trim().parse().map_err(|_| ())?;
    Ok(value.is_finite().then_some(value))
}

pub(crate) fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !is_na(s)).map(|s| s.trim().to_string())
}

/// Column name → position lookup for one table header.
pub(crate) struct HeaderIndex {
    names: Vec<String>,
    path: PathBuf,
}

impl HeaderIndex {
    pub(crate) fn new(headers: &csv::StringRecord, path: &Path) -> Self {
        Self {
            names: headers.iter().map(|h| h.trim().to_string()).collect(),
            path: path.to_path_buf(),
        }
    }

    pub(crate) fn find(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|n| n == column)
    }

    pub(crate) fn require(&self, column: &str) -> Result<usize> {
        self.find(column).ok_or_else(|| EmergenceError::Schema {
            path: self.path.clone(),
            column: column.to_string(),
        })
    }
}
