//! End-to-end ranking run: load → merge → rank twice → write.

use std::path::PathBuf;

use emergence_common::{RankingConfig, Result};
use tracing::info;

use crate::hierarchical::rank_hierarchical;
use crate::loader::load_inputs;
use crate::merger::{merge_indicators, MergeStats};
use crate::output::write_ranking;
use crate::scorer::rank_by_points;
use crate::summary::{RankingSummary, SUMMARY_FILE};
use crate::weights::GainFactors;
use crate::{RankedTaxon, Strategy};

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RankingReport {
    pub merge: MergeStats,
    pub hierarchical: Vec<RankedTaxon>,
    pub points: Vec<RankedTaxon>,
    pub written: Vec<PathBuf>,
}

pub async fn run(config: &RankingConfig) -> Result<RankingReport> {
    config.validate()?;
    let gains = GainFactors::with_overrides(&config.scoring.gain_factors)?;
    let policy = config.scoring.missing_policy;

    info!("Loading model outputs...");
    let inputs = load_inputs(&config.inputs).await?;

    let (merged, merge) = merge_indicators(&inputs.gam, &inputs.decision_rules, &inputs.taxonomy);
    let hierarchical = rank_hierarchical(&merged);
    let points = rank_by_points(&merged, &gains, policy);

    let out_dir = &config.output.dir;
    tokio::fs::create_dir_all(out_dir).await?;

    let mut written = Vec::new();
    for (strategy, ranked) in [(Strategy::Hierarchical, &hierarchical), (Strategy::Points, &points)] {
        let path = out_dir.join(strategy.file_name());
        write_ranking(&path, ranked, strategy).await?;
        written.push(path);
    }

    if config.output.write_summary {
        let summary = RankingSummary::build(merge, policy, &gains, &hierarchical, &points, config.output.top_n);
        let path = out_dir.join(SUMMARY_FILE);
        summary.write(&path).await?;
        written.push(path);
    }

    info!("Ranked {} taxa with both strategies", merged.len());
    Ok(RankingReport {
        merge,
        hierarchical,
        points,
        written,
    })
}
