//! Ranking tables: one row per taxon, row order is the rank.

use std::path::Path;

use emergence_common::entities::is_na;
use emergence_common::{EmStatus, EmergenceError, MergedTaxonRecord, Result, StatusColumn};
use tracing::info;

use crate::loader::{
    optional_text, parse_growth, parse_taxon_key, tsv_reader, HeaderIndex, COL_CANONICAL_NAME,
    COL_CLASS, COL_KINGDOM, COL_TAXON_KEY,
};
use crate::{RankedTaxon, Strategy};

pub const COL_RANK: &str = "rank";
pub const COL_MEAN_GROWTH: &str = "mean_growth";
pub const COL_POINTS: &str = "points";
const NA: &str = "NA";

/// Header of a ranking table for the given strategy.
pub fn ranking_columns(strategy: Strategy) -> Vec<String> {
    let mut columns: Vec<String> = [COL_RANK, COL_TAXON_KEY, COL_CANONICAL_NAME, COL_KINGDOM, COL_CLASS]
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(StatusColumn::priority_order().iter().map(|c| c.name()));
    columns.push(COL_MEAN_GROWTH.to_string());
    if strategy == Strategy::Points {
        columns.push(COL_POINTS.to_string());
    }
    columns
}

fn opt_text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NA)
}

fn opt_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| NA.to_string())
}

fn opt_status(value: Option<EmStatus>) -> String {
    value.map(|s| s.to_string()).unwrap_or_else(|| NA.to_string())
}

/// Serialise a ranking to TSV bytes.
pub fn ranking_to_tsv(ranked: &[RankedTaxon], strategy: Strategy) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    writer.write_record(ranking_columns(strategy))?;

    for row in ranked {
        let taxon = &row.taxon;
        let mut fields = vec![
            row.rank.to_string(),
            taxon.taxon_key.to_string(),
            opt_text(&taxon.canonical_name).to_string(),
            opt_text(&taxon.kingdom).to_string(),
            opt_text(&taxon.class).to_string(),
        ];
        fields.extend(taxon.statuses.iter().map(|(_, s)| opt_status(s)));
        fields.push(opt_number(taxon.mean_growth));
        if strategy == Strategy::Points {
            fields.push(opt_number(row.points));
        }
        writer.write_record(&fields)?;
    }

    writer
        .into_inner()
        .map_err(|e| EmergenceError::Io(e.into_error()))
}

pub async fn write_ranking(path: &Path, ranked: &[RankedTaxon], strategy: Strategy) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = ranking_to_tsv(ranked, strategy)?;
    tokio::fs::write(path, bytes).await?;
    info!("Wrote {} taxa to {:?}", ranked.len(), path);
    Ok(())
}

/// A ranking table read back from disk.
#[derive(Debug, Clone)]
pub struct RankingTable {
    pub columns: Vec<String>,
    pub rows: Vec<RankedTaxon>,
}

impl RankingTable {
    pub fn strategy(&self) -> Strategy {
        if self.columns.iter().any(|c| c == COL_POINTS) {
            Strategy::Points
        } else {
            Strategy::Hierarchical
        }
    }
}

pub fn parse_ranking(content: &str, path: &Path) -> Result<RankingTable> {
    let mut reader = tsv_reader(content);
    let header = reader.headers()?.clone();
    let columns = HeaderIndex::new(&header, path);

    let rank_col = columns.require(COL_RANK)?;
    let taxon_col = columns.require(COL_TAXON_KEY)?;
    let name_col = columns.require(COL_CANONICAL_NAME)?;
    let kingdom_col = columns.require(COL_KINGDOM)?;
    let class_col = columns.require(COL_CLASS)?;
    let growth_col = columns.require(COL_MEAN_GROWTH)?;
    let points_col = columns.find(COL_POINTS);
    let status_cols = StatusColumn::priority_order()
        .into_iter()
        .map(|c| columns.require(&c.name()).map(|idx| (c, idx)))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
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

        let rank: usize = cell(rank_col)
            .trim()
            .parse()
            .map_err(|_| invalid(COL_RANK, cell(rank_col)))?;
        let taxon_key =
            parse_taxon_key(cell(taxon_col)).ok_or_else(|| invalid(COL_TAXON_KEY, cell(taxon_col)))?;

        let mut taxon = MergedTaxonRecord::new(taxon_key);
        taxon.canonical_name = optional_text(record.get(name_col));
        taxon.kingdom = optional_text(record.get(kingdom_col));
        taxon.class = optional_text(record.get(class_col));
        for (column, idx) in &status_cols {
            let status = EmStatus::parse_cell(cell(*idx))
                .map_err(|_| invalid(&column.name(), cell(*idx)))?;
            taxon.statuses.set(*column, status);
        }
        taxon.mean_growth = parse_growth(cell(growth_col))
            .map_err(|_| invalid(COL_MEAN_GROWTH, cell(growth_col)))?;

        let points = match points_col {
            Some(idx) if !is_na(cell(idx)) => Some(
                cell(idx)
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid(COL_POINTS, cell(idx)))?,
            ),
            _ => None,
        };

        rows.push(RankedTaxon { rank, taxon, points });
    }

    Ok(RankingTable {
        columns: header.iter().map(|h| h.to_string()).collect(),
        rows,
    })
}

pub async fn read_ranking(path: &Path) -> Result<RankingTable> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EmergenceError::MissingInput { path: path.to_path_buf() })
        }
        Err(e) => return Err(e.into()),
    };
    parse_ranking(&content, path)
}
