//! Indicator merger: one resolved emerging status per (taxon, year, indicator).
//!
//! resolved = GAM status if present, else decision-rule status, else missing.
//! This is a coalesce, never a blend.

use std::cmp::Ordering;
use std::collections::{btree_map, hash_map, BTreeMap, HashMap};

use emergence_common::{
    EmStatus, EvaluationYear, MergedTaxonRecord, Model, StatusColumn, TaxonIndicatorRecord,
    TaxonName,
};
use tracing::{debug, info, warn};

/// Coalesce a GAM status with a decision-rule status.
pub fn resolve_status(gam: Option<EmStatus>, decision_rule: Option<EmStatus>) -> Option<EmStatus> {
    gam.or(decision_rule)
}

/// Counters reported after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MergeStats {
    pub taxa: usize,
    pub rows_outside_window: usize,
    pub duplicate_rows: usize,
    pub duplicate_taxonomy_rows: usize,
    pub taxa_without_name: usize,
}

/// One (taxon, column) cell of a model table.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    status: Option<EmStatus>,
    growth: Option<f64>,
}

impl Cell {
    fn from_record(record: &TaxonIndicatorRecord) -> Self {
        Self {
            status: record.em_status,
            growth: record.growth.filter(|g| g.is_finite()),
        }
    }

    /// Total order used to pick among duplicate rows: status first, then
    /// growth, missing lowest in both.
    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.status.cmp(&other.status).then_with(|| match (self.growth, other.growth) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        })
    }
}

/// Per-model cells of one table family. Duplicate rows collapse onto the
/// highest-ranked row, whatever order they arrive in.
#[derive(Default)]
struct StatusCells {
    cells: BTreeMap<(u64, StatusColumn), Cell>,
    duplicates: usize,
    outside_window: usize,
}

impl StatusCells {
    fn insert(&mut self, record: &TaxonIndicatorRecord) {
        let Some(year) = EvaluationYear::from_year(record.year) else {
            self.outside_window += 1;
            return;
        };
        let column = StatusColumn::new(year, record.indicator);
        let cell = Cell::from_record(record);
        match self.cells.entry((record.taxon_key, column)) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(cell);
            }
            btree_map::Entry::Occupied(mut slot) => {
                self.duplicates += 1;
                if cell.cmp_rank(slot.get()) == Ordering::Greater {
                    slot.insert(cell);
                }
            }
        }
    }

    fn get(&self, taxon_key: u64, column: StatusColumn) -> Option<EmStatus> {
        self.cells.get(&(taxon_key, column)).and_then(|cell| cell.status)
    }

    /// Mean of the finite growth values of a taxon, summed in column
    /// priority order.
    fn mean_growth(&self, taxon_key: u64) -> Option<f64> {
        let (sum, n) = StatusColumn::priority_order()
            .into_iter()
            .filter_map(|column| self.cells.get(&(taxon_key, column)).and_then(|cell| cell.growth))
            .fold((0.0, 0usize), |(sum, n), g| (sum + g, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    fn taxa(&self) -> impl Iterator<Item = u64> + '_ {
        self.cells.keys().map(|(taxon_key, _)| *taxon_key)
    }
}

/// Widen and coalesce model outputs into one record per taxon, ordered by
/// taxonKey. Taxonomic names are left-joined; unmatched taxa keep missing names.
pub fn merge_indicators(
    gam: &[TaxonIndicatorRecord],
    decision_rules: &[TaxonIndicatorRecord],
    taxonomy: &[TaxonName],
) -> (Vec<MergedTaxonRecord>, MergeStats) {
    let mut gam_cells = StatusCells::default();
    for record in gam.iter().filter(|r| r.model == Model::Gam) {
        gam_cells.insert(record);
    }

    let mut rule_cells = StatusCells::default();
    for record in decision_rules.iter().filter(|r| r.model == Model::DecisionRules) {
        rule_cells.insert(record);
    }

    let mut names: HashMap<u64, &TaxonName> = HashMap::with_capacity(taxonomy.len());
    let mut duplicate_taxonomy_rows = 0;
    for name in taxonomy {
        match names.entry(name.taxon_key) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(name);
            }
            hash_map::Entry::Occupied(_) => duplicate_taxonomy_rows += 1,
        }
    }

    let mut taxa: Vec<u64> = gam_cells.taxa().chain(rule_cells.taxa()).collect();
    taxa.sort_unstable();
    taxa.dedup();

    let mut stats = MergeStats {
        taxa: taxa.len(),
        rows_outside_window: gam_cells.outside_window + rule_cells.outside_window,
        duplicate_rows: gam_cells.duplicates + rule_cells.duplicates,
        duplicate_taxonomy_rows,
        taxa_without_name: 0,
    };

    let merged: Vec<MergedTaxonRecord> = taxa
        .into_iter()
        .map(|taxon_key| {
            let mut record = MergedTaxonRecord::new(taxon_key);
            for column in StatusColumn::priority_order() {
                let resolved = resolve_status(
                    gam_cells.get(taxon_key, column),
                    rule_cells.get(taxon_key, column),
                );
                record.statuses.set(column, resolved);
            }
            record.mean_growth = gam_cells.mean_growth(taxon_key);

            match names.get(&taxon_key) {
                Some(name) => {
                    record.canonical_name = name.canonical_name.clone();
                    record.kingdom = name.kingdom.clone();
                    record.class = name.class.clone();
                }
                None => stats.taxa_without_name += 1,
            }
            record
        })
        .collect();

    if stats.duplicate_rows > 0 {
        warn!(
            "Collapsed {} duplicate (taxonKey, year, indicator) rows onto the highest status",
            stats.duplicate_rows
        );
    }
    if stats.duplicate_taxonomy_rows > 0 {
        warn!(
            "Ignored {} duplicate taxonKey rows in the taxonomy; first occurrence kept",
            stats.duplicate_taxonomy_rows
        );
    }
    if stats.rows_outside_window > 0 {
        debug!("Skipped {} rows outside the 2016–2018 evaluation window", stats.rows_outside_window);
    }
    if stats.taxa_without_name > 0 {
        warn!("{} taxa have no taxonomy entry", stats.taxa_without_name);
    }
    info!("Merged indicators for {} taxa", stats.taxa);

    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::compute_points;
    use crate::weights::GainFactors;
    use emergence_common::Indicator::*;
    use emergence_common::MissingScorePolicy;
    use emergence_test_utils::{assert_eq, column, gam, rule, status, taxon_name};

    #[test]
    fn test_resolve_prefers_gam() {
        assert_eq!(resolve_status(status(2), status(1)), status(2));
        assert_eq!(resolve_status(status(0), status(3)), status(0));
    }

    #[test]
    fn test_resolve_falls_back_to_decision_rule() {
        assert_eq!(resolve_status(None, status(1)), status(1));
        assert_eq!(resolve_status(None, None), None);
    }

    #[test]
    fn test_gam_na_uses_decision_rule() {
        let gam_rows = vec![gam(7, 2018, OccupancyPa, None, None)];
        let rule_rows = vec![rule(7, 2018, OccupancyPa, Some(1))];
        let (merged, _) = merge_indicators(&gam_rows, &rule_rows, &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].statuses.get(column(2018, OccupancyPa)), status(1));
    }

    #[test]
    fn test_each_cell_resolved_independently() {
        let gam_rows = vec![
            gam(1, 2018, OccupancyPa, Some(3), Some(0.5)),
            gam(1, 2017, ObservationsBe, None, Some(0.1)),
        ];
        let rule_rows = vec![
            rule(1, 2018, OccupancyPa, Some(0)),
            rule(1, 2017, ObservationsBe, Some(2)),
            rule(1, 2016, OccupancyBe, None),
        ];
        let (merged, _) = merge_indicators(&gam_rows, &rule_rows, &[]);
        let statuses = merged[0].statuses;
        assert_eq!(statuses.get(column(2018, OccupancyPa)), status(3));
        assert_eq!(statuses.get(column(2017, ObservationsBe)), status(2));
        assert_eq!(statuses.get(column(2016, OccupancyBe)), None);
        assert_eq!(statuses.missing_count(), 10);
    }

    #[test]
    fn test_mean_growth_ignores_missing() {
        let gam_rows = vec![
            gam(1, 2016, OccupancyPa, Some(1), Some(0.2)),
            gam(1, 2017, OccupancyPa, Some(1), None),
            gam(1, 2018, OccupancyBe, Some(1), Some(0.6)),
            gam(2, 2018, OccupancyBe, Some(1), None),
        ];
        let (merged, _) = merge_indicators(&gam_rows, &[], &[]);
        let growth = merged[0].mean_growth.unwrap();
        assert!((growth - 0.4).abs() < 1e-12, "got {growth}");
        assert_eq!(merged[1].mean_growth, None);
    }

    #[test]
    fn test_rows_outside_window_are_skipped() {
        let gam_rows = vec![
            gam(1, 2015, OccupancyPa, Some(3), Some(5.0)),
            gam(1, 2018, OccupancyPa, Some(1), Some(1.0)),
        ];
        let (merged, stats) = merge_indicators(&gam_rows, &[], &[]);
        assert_eq!(stats.rows_outside_window, 1);
        assert_eq!(merged[0].mean_growth, Some(1.0));
    }

    #[test]
    fn test_duplicates_collapse_onto_highest_status() {
        let rule_rows = vec![
            rule(1, 2018, OccupancyPa, Some(2)),
            rule(1, 2018, OccupancyPa, None),
            rule(1, 2018, OccupancyPa, Some(0)),
        ];
        let (merged, stats) = merge_indicators(&[], &rule_rows, &[]);
        assert_eq!(stats.duplicate_rows, 2);
        assert_eq!(merged[0].statuses.get(column(2018, OccupancyPa)), status(2));
    }

    #[test]
    fn test_duplicate_growth_follows_kept_row() {
        let gam_rows = vec![
            gam(1, 2018, OccupancyPa, Some(1), Some(0.9)),
            gam(1, 2018, OccupancyPa, Some(2), Some(0.1)),
            gam(1, 2018, OccupancyPa, Some(2), Some(0.3)),
        ];
        let (merged, stats) = merge_indicators(&gam_rows, &[], &[]);
        assert_eq!(stats.duplicate_rows, 2);
        assert_eq!(merged[0].statuses.get(column(2018, OccupancyPa)), status(2));
        assert_eq!(merged[0].mean_growth, Some(0.3));
    }

    #[test]
    fn test_duplicate_rows_score_the_same_in_any_order() {
        let target = column(2018, OccupancyPa);
        let mut rule_rows: Vec<_> = StatusColumn::priority_order()
            .into_iter()
            .filter(|c| *c != target)
            .map(|c| rule(1, c.year.value(), c.indicator, Some(1)))
            .collect();
        rule_rows.insert(0, rule(1, 2018, OccupancyPa, Some(0)));
        rule_rows.push(rule(1, 2018, OccupancyPa, Some(3)));

        let gains = GainFactors::default();
        let (forward, _) = merge_indicators(&[], &rule_rows, &[]);
        rule_rows.reverse();
        let (reversed, _) = merge_indicators(&[], &rule_rows, &[]);

        assert_eq!(forward[0].statuses, reversed[0].statuses);
        let points = |m: &MergedTaxonRecord| compute_points(&m.statuses, &gains, MissingScorePolicy::Propagate);
        assert_eq!(points(&forward[0]), points(&reversed[0]));
        assert_eq!(points(&forward[0]), Some(30.0));
    }

    #[test]
    fn test_taxonomy_left_join() {
        let rule_rows = vec![rule(1, 2018, OccupancyPa, Some(2)), rule(2, 2018, OccupancyPa, Some(1))];
        let taxonomy = vec![taxon_name(1, "Vespa velutina", "Animalia", "Insecta")];
        let (merged, stats) = merge_indicators(&[], &rule_rows, &taxonomy);
        assert_eq!(merged[0].canonical_name.as_deref(), Some("Vespa velutina"));
        assert_eq!(merged[0].class.as_deref(), Some("Insecta"));
        assert_eq!(merged[1].canonical_name, None);
        assert_eq!(stats.taxa_without_name, 1);
    }

    #[test]
    fn test_duplicate_taxonomy_rows_are_counted() {
        let rule_rows = vec![rule(1, 2018, OccupancyPa, Some(2))];
        let taxonomy = vec![
            taxon_name(1, "Vespa velutina", "Animalia", "Insecta"),
            taxon_name(1, "Vespa velutina nigrithorax", "Animalia", "Insecta"),
        ];
        let (merged, stats) = merge_indicators(&[], &rule_rows, &taxonomy);
        assert_eq!(stats.duplicate_taxonomy_rows, 1);
        assert_eq!(merged[0].canonical_name.as_deref(), Some("Vespa velutina"));
    }

    #[test]
    fn test_union_of_taxa_sorted_by_key() {
        let gam_rows = vec![gam(30, 2018, OccupancyPa, Some(1), None)];
        let rule_rows = vec![rule(10, 2018, OccupancyPa, Some(1)), rule(20, 2017, OccupancyBe, None)];
        let (merged, _) = merge_indicators(&gam_rows, &rule_rows, &[]);
        let keys: Vec<u64> = merged.iter().map(|m| m.taxon_key).collect();
        assert_eq!(keys, vec![10, 20, 30]);
    }

    #[test]
    fn test_merge_is_independent_of_row_order() {
        let mut gam_rows = vec![
            gam(1, 2018, OccupancyPa, Some(3), Some(0.1)),
            gam(2, 2017, ObservationsPa, None, Some(-0.1)),
            gam(1, 2016, OccupancyBe, Some(1), Some(0.7)),
            gam(1, 2017, ObservationsBe, Some(2), Some(0.2)),
            gam(1, 2016, OccupancyBe, Some(1), Some(0.4)),
        ];
        let mut rule_rows = vec![rule(2, 2017, ObservationsPa, Some(2)), rule(3, 2018, OccupancyBe, Some(0))];
        let (first, _) = merge_indicators(&gam_rows, &rule_rows, &[]);
        gam_rows.reverse();
        rule_rows.reverse();
        let (second, _) = merge_indicators(&gam_rows, &rule_rows, &[]);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.taxon_key, b.taxon_key);
            assert_eq!(a.statuses, b.statuses);
            assert_eq!(a.mean_growth.map(f64::to_bits), b.mean_growth.map(f64::to_bits));
        }
    }
}
