//! Hierarchical ranking: lexicographic order over the twelve status columns.
//!
//! Columns are compared most recent year first; within a year protected
//! area before Belgium and occupancy before observations. Higher status
//! wins, a missing status loses to every value including 0. Ties fall
//! through to `mean_growth` (higher wins, missing lowest), then to
//! taxonKey ascending so the order is total.

use std::cmp::Ordering;

use emergence_common::{MergedTaxonRecord, StatusColumn};
use tracing::debug;

use crate::RankedTaxon;

/// Descending order on optional floats with missing values last.
pub(crate) fn cmp_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `Less` means `a` ranks above `b`.
pub fn compare_hierarchical(a: &MergedTaxonRecord, b: &MergedTaxonRecord) -> Ordering {
    StatusColumn::priority_order()
        .into_iter()
        // Option's order puts None below Some(0); reverse for descending.
        .map(|c| b.statuses.get(c).cmp(&a.statuses.get(c)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
        .then_with(|| cmp_desc_missing_last(a.mean_growth, b.mean_growth))
        .then_with(|| a.taxon_key.cmp(&b.taxon_key))
}

pub fn rank_hierarchical(records: &[MergedTaxonRecord]) -> Vec<RankedTaxon> {
    let mut sorted: Vec<&MergedTaxonRecord> = records.iter().collect();
    sorted.sort_by(|a, b| compare_hierarchical(a, b));
    debug!("Hierarchical ranking over {} taxa", sorted.len());

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, taxon)| RankedTaxon {
            rank: i + 1,
            taxon: taxon.clone(),
            points: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use emergence_common::Indicator::*;
    use emergence_test_utils::{assert_eq, taxon};

    fn keys(ranked: &[RankedTaxon]) -> Vec<u64> {
        ranked.iter().map(|r| r.taxon.taxon_key).collect()
    }

    #[test]
    fn test_higher_top_status_ranks_first() {
        let a = taxon(1).all(1).status(2018, OccupancyPa, Some(3)).build();
        let b = taxon(2).all(1).status(2018, OccupancyPa, Some(2)).build();
        let ranked = rank_hierarchical(&[b, a]);
        assert_eq!(keys(&ranked), vec![1, 2]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_recent_year_outranks_older() {
        let recent = taxon(1).status(2018, ObservationsBe, Some(1)).build();
        let older = taxon(2).status(2017, OccupancyPa, Some(3)).build();
        assert_eq!(compare_hierarchical(&recent, &older), Ordering::Less);
    }

    #[test]
    fn test_protected_area_outranks_belgium() {
        let pa = taxon(1).status(2018, ObservationsPa, Some(1)).build();
        let be = taxon(2).status(2018, OccupancyBe, Some(3)).build();
        assert_eq!(compare_hierarchical(&pa, &be), Ordering::Less);
    }

    #[test]
    fn test_occupancy_outranks_observations() {
        let occ = taxon(1).status(2017, OccupancyBe, Some(2)).build();
        let obs = taxon(2).status(2017, ObservationsBe, Some(3)).build();
        assert_eq!(compare_hierarchical(&occ, &obs), Ordering::Less);
    }

    #[test]
    fn test_missing_sorts_below_zero() {
        let zero = taxon(2).status(2018, OccupancyPa, Some(0)).build();
        let missing = taxon(1).status(2018, OccupancyPa, None).build();
        let ranked = rank_hierarchical(&[missing, zero]);
        assert_eq!(keys(&ranked), vec![2, 1]);
    }

    #[test]
    fn test_growth_breaks_ties_with_missing_lowest() {
        let fast = taxon(3).all(2).growth(0.8).build();
        let slow = taxon(1).all(2).growth(-0.3).build();
        let unknown = taxon(2).all(2).build();
        let ranked = rank_hierarchical(&[unknown, slow, fast]);
        assert_eq!(keys(&ranked), vec![3, 1, 2]);
    }

    #[test]
    fn test_identical_taxa_ordered_by_key() {
        let a = taxon(9).all(1).growth(0.1).build();
        let b = taxon(4).all(1).growth(0.1).build();
        assert_eq!(compare_hierarchical(&a, &b), Ordering::Greater);
        assert_eq!(compare_hierarchical(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_order_is_total_and_antisymmetric() {
        let records = vec![
            taxon(1).all(1).build(),
            taxon(2).status(2018, OccupancyPa, Some(3)).build(),
            taxon(3).status(2016, ObservationsBe, Some(0)).growth(1.0).build(),
            taxon(4).build(),
            taxon(5).all(1).growth(0.5).build(),
        ];
        for a in &records {
            for b in &records {
                let ab = compare_hierarchical(a, b);
                let ba = compare_hierarchical(b, a);
                assert_eq!(ab, ba.reverse());
                if a.taxon_key != b.taxon_key {
                    assert!(ab.is_ne());
                }
            }
        }
    }

    #[test]
    fn test_ranking_is_invariant_under_permutation() {
        let records = vec![
            taxon(1).all(1).build(),
            taxon(2).status(2018, OccupancyPa, Some(3)).build(),
            taxon(3).all(1).growth(0.2).build(),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(keys(&rank_hierarchical(&records)), keys(&rank_hierarchical(&reversed)));
    }
}
