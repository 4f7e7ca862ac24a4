//! JSON run summary written next to the ranking tables.

use std::path::Path;

use chrono::{DateTime, Utc};
use emergence_common::{MissingScorePolicy, Result};
use serde::Serialize;
use tracing::info;

use crate::merger::MergeStats;
use crate::weights::GainFactors;
use crate::{RankedTaxon, Strategy};

pub const SUMMARY_FILE: &str = "ranking_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct TopTaxon {
    pub rank: usize,
    pub taxon_key: u64,
    pub canonical_name: Option<String>,
    pub points: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategySummary {
    pub strategy: Strategy,
    pub table: String,
    pub taxa: usize,
    pub top: Vec<TopTaxon>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingSummary {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub merge: MergeStats,
    pub missing_policy: MissingScorePolicy,
    /// Taxa whose point score is missing under the active policy
    pub unscored_taxa: usize,
    /// Taxa with at least one missing status column
    pub taxa_with_missing_status: usize,
    pub gain_factors: Vec<(String, f64)>,
    pub strategies: Vec<StrategySummary>,
}

fn strategy_summary(strategy: Strategy, ranked: &[RankedTaxon], top_n: usize) -> StrategySummary {
    StrategySummary {
        strategy,
        table: strategy.file_name(),
        taxa: ranked.len(),
        top: ranked
            .iter()
            .take(top_n)
            .map(|r| TopTaxon {
                rank: r.rank,
                taxon_key: r.taxon.taxon_key,
                canonical_name: r.taxon.canonical_name.clone(),
                points: r.points,
            })
            .collect(),
    }
}

impl RankingSummary {
    pub fn build(
        merge: MergeStats,
        policy: MissingScorePolicy,
        gains: &GainFactors,
        hierarchical: &[RankedTaxon],
        points: &[RankedTaxon],
        top_n: usize,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            merge,
            missing_policy: policy,
            unscored_taxa: points.iter().filter(|r| r.points.is_none()).count(),
            taxa_with_missing_status: hierarchical
                .iter()
                .filter(|r| r.taxon.statuses.missing_count() > 0)
                .count(),
            gain_factors: gains.iter().map(|(c, f)| (c.name(), f)).collect(),
            strategies: vec![
                strategy_summary(Strategy::Hierarchical, hierarchical, top_n),
                strategy_summary(Strategy::Points, points, top_n),
            ],
        }
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        info!("Wrote run summary to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchical::rank_hierarchical;
    use crate::scorer::rank_by_points;
    use emergence_common::Indicator::*;
    use emergence_test_utils::{assert_eq, taxon};

    #[test]
    fn test_summary_counts_and_top_n() {
        let records = vec![
            taxon(1).all(2).build(),
            taxon(2).all(1).status(2016, OccupancyBe, None).build(),
            taxon(3).all(0).build(),
        ];
        let gains = GainFactors::default();
        let h = rank_hierarchical(&records);
        let p = rank_by_points(&records, &gains, MissingScorePolicy::Propagate);
        let summary = RankingSummary::build(MergeStats::default(), MissingScorePolicy::Propagate, &gains, &h, &p, 2);

        assert_eq!(summary.unscored_taxa, 1);
        assert_eq!(summary.taxa_with_missing_status, 1);
        assert_eq!(summary.gain_factors.len(), 12);
        assert_eq!(summary.strategies[0].top.len(), 2);
        assert_eq!(summary.strategies[1].top[0].taxon_key, 1);
        assert_eq!(summary.strategies[1].top[0].points, Some(48.0));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["missing_policy"], "propagate");
        assert_eq!(json["strategies"][1]["strategy"], "points");
        assert_eq!(
            json["strategies"][0]["table"],
            "ranking_emerging_status_hierarchical_strategy.tsv"
        );
    }
}
