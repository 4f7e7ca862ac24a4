//! emergence-ranker — Emerging-status taxon ranking engine.
//! Merges GAM and decision-rule outputs, then orders taxa with the
//! hierarchical and the point-based strategy.

pub mod hierarchical;
pub mod loader;
pub mod merger;
pub mod output;
pub mod pipeline;
pub mod scorer;
pub mod summary;
pub mod weights;

use emergence_common::MergedTaxonRecord;

/// The two ranking strategies and their output table names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Hierarchical,
    Points,
}

impl Strategy {
    pub fn table_name(self) -> &'static str {
        match self {
            Strategy::Hierarchical => "ranking_emerging_status_hierarchical_strategy",
            Strategy::Points => "ranking_emerging_status_points_strategy",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.tsv", self.table_name())
    }
}

/// A taxon at its final position. `rank` starts at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTaxon {
    pub rank: usize,
    pub taxon: MergedTaxonRecord,
    /// Point score, only set by the point strategy
    pub points: Option<f64>,
}
