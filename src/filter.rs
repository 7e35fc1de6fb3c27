// Filter engine: a FilterSpec selects the subset of the dataset in view.
//
// Semantics follow the sidebar widgets of the dashboard: each categorical
// dimension holds the *selected* values (defaulting to every observed value,
// so "no filtering" is a full selection, not an absent one), and the age
// range is a closed interval from a dual-handle slider.
use crate::types::VisitRecord;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub sexes: HashSet<String>,
    pub specialties: HashSet<String>,
    pub municipalities: HashSet<String>,
    pub months: HashSet<u32>,
    /// Closed interval `[min, max]`. An inverted interval matches nothing;
    /// callers are expected to normalize, but we degrade instead of erroring.
    pub age_range: (i32, i32),
}

impl FilterSpec {
    /// The default spec: every observed value of every dimension selected,
    /// age range spanning the observed min/max. Equivalent to no filtering.
    pub fn all_observed(dataset: &[VisitRecord]) -> Self {
        let mut sexes = HashSet::new();
        let mut specialties = HashSet::new();
        let mut municipalities = HashSet::new();
        let mut months = HashSet::new();
        let mut age_range: Option<(i32, i32)> = None;
        for r in dataset {
            if let Some(s) = &r.sex {
                sexes.insert(s.clone());
            }
            if let Some(s) = &r.specialty {
                specialties.insert(s.clone());
            }
            municipalities.insert(r.municipality.clone());
            months.insert(r.month);
            age_range = Some(match age_range {
                Some((lo, hi)) => (lo.min(r.age), hi.max(r.age)),
                None => (r.age, r.age),
            });
        }
        FilterSpec {
            sexes,
            specialties,
            municipalities,
            months,
            age_range: age_range.unwrap_or((0, 0)),
        }
    }

    /// True iff the record satisfies every dimension predicate.
    ///
    /// A missing value never matches: the selected sets only ever contain
    /// concrete observed values, so a record with no sex (say) drops out as
    /// soon as the sex dimension is consulted.
    pub fn matches(&self, r: &VisitRecord) -> bool {
        let (lo, hi) = self.age_range;
        r.sex
            .as_deref()
            .is_some_and(|s| self.sexes.contains(s))
            && r.specialty
                .as_deref()
                .is_some_and(|s| self.specialties.contains(s))
            && self.municipalities.contains(&r.municipality)
            && self.months.contains(&r.month)
            && r.age >= lo
            && r.age <= hi
    }
}

/// Apply the spec to the dataset, yielding the records in view.
///
/// Pure and deterministic; the output preserves dataset order, which the
/// aggregation layer relies on for reproducible tie-breaking.
pub fn apply<'a>(dataset: &'a [VisitRecord], spec: &FilterSpec) -> Vec<&'a VisitRecord> {
    dataset.iter().filter(|r| spec.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample_visit;

    fn dataset() -> Vec<VisitRecord> {
        vec![
            sample_visit(
                Some("FEMININO"),
                30,
                Some("CARDIOLOGIA"),
                "PORTO ALEGRE",
                "2023-01-02 10:00",
            ),
            sample_visit(
                Some("MASCULINO"),
                40,
                Some("PEDIATRIA"),
                "CANOAS",
                "2023-02-07 11:00",
            ),
            sample_visit(
                None,
                55,
                Some("CARDIOLOGIA"),
                "CANOAS",
                "2023-02-08 09:00",
            ),
        ]
    }

    #[test]
    fn every_output_record_satisfies_every_predicate() {
        let data = dataset();
        let mut spec = FilterSpec::all_observed(&data);
        spec.sexes = ["FEMININO".to_string(), "MASCULINO".to_string()]
            .into_iter()
            .collect();
        spec.age_range = (0, 100);
        let view = apply(&data, &spec);
        for r in &view {
            assert!(spec.matches(r));
        }
        // The record with missing sex is excluded even though both observed
        // sexes are selected.
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn filtering_a_filtered_view_again_is_a_noop() {
        let data = dataset();
        let mut spec = FilterSpec::all_observed(&data);
        spec.months = [2].into_iter().collect();
        let view = apply(&data, &spec);
        let refiltered: Vec<_> = view.iter().copied().filter(|r| spec.matches(r)).collect();
        assert_eq!(view.len(), refiltered.len());
        for (a, b) in view.iter().zip(refiltered.iter()) {
            assert!(std::ptr::eq(*a, *b));
        }
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let data = dataset();
        let mut spec = FilterSpec::all_observed(&data);
        spec.specialties.clear();
        assert!(apply(&data, &spec).is_empty());
    }

    #[test]
    fn inverted_age_range_yields_empty_not_error() {
        let data = dataset();
        let mut spec = FilterSpec::all_observed(&data);
        spec.age_range = (80, 20);
        assert!(apply(&data, &spec).is_empty());
    }

    #[test]
    fn values_absent_from_dataset_contribute_nothing() {
        let data = dataset();
        let mut spec = FilterSpec::all_observed(&data);
        spec.municipalities.insert("GRAMADO".to_string());
        assert_eq!(apply(&data, &spec).len(), 3);
    }

    #[test]
    fn default_spec_keeps_only_records_with_all_dimensions_present() {
        let data = dataset();
        let spec = FilterSpec::all_observed(&data);
        // Record 3 has no sex, so the full-selection default still drops it.
        assert_eq!(apply(&data, &spec).len(), 2);
    }
}
