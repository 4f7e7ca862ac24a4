//! Point-based ranking.
//!
//! points = Σ status(column) × gain(column) over the twelve status columns.
//! Taxa are sorted by points descending, then `mean_growth` descending,
//! then taxonKey ascending.

use std::cmp::Ordering;

use emergence_common::{MergedTaxonRecord, MissingScorePolicy, StatusColumns};
use tracing::{debug, info};

use crate::hierarchical::cmp_desc_missing_last;
use crate::weights::GainFactors;
use crate::RankedTaxon;

/// Point score of one taxon. Under `Propagate` any missing status makes the
/// score missing; under `Zero` missing terms add nothing.
pub fn compute_points(
    statuses: &StatusColumns,
    gains: &GainFactors,
    policy: MissingScorePolicy,
) -> Option<f64> {
    statuses.iter().try_fold(0.0, |total, (column, status)| {
        let term = match (status, policy) {
            (Some(s), _) => f64::from(s.value()) * gains.factor(column),
            (None, MissingScorePolicy::Zero) => 0.0,
            (None, MissingScorePolicy::Propagate) => return None,
        };
        Some(total + term)
    })
}

fn compare_scored(
    a: &(Option<f64>, &MergedTaxonRecord),
    b: &(Option<f64>, &MergedTaxonRecord),
) -> Ordering {
    cmp_desc_missing_last(a.0, b.0)
        .then_with(|| cmp_desc_missing_last(a.1.mean_growth, b.1.mean_growth))
        .then_with(|| a.1.taxon_key.cmp(&b.1.taxon_key))
}

pub fn rank_by_points(
    records: &[MergedTaxonRecord],
    gains: &GainFactors,
    policy: MissingScorePolicy,
) -> Vec<RankedTaxon> {
    let mut scored: Vec<(Option<f64>, &MergedTaxonRecord)> = records
        .iter()
        .map(|r| (compute_points(&r.statuses, gains, policy), r))
        .collect();
    scored.sort_by(compare_scored);

    let unscored = scored.iter().filter(|(p, _)| p.is_none()).count();
    if unscored > 0 {
        info!(
            "{} of {} taxa have no point score (missing policy: {}) and rank last",
            unscored,
            scored.len(),
            policy
        );
    }
    debug!("Point ranking over {} taxa", scored.len());

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (points, taxon))| RankedTaxon {
            rank: i + 1,
            taxon: taxon.clone(),
            points,
        })
        .collect()
}
