use std::collections::BTreeMap;
use std::fmt;

use super::{Accumulator, Reduction};
use crate::data::filter::records_for;
use crate::data::Dataset;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Which administrative level regions are grouped by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    #[default]
    State,
    District,
}

impl Granularity {
    pub const ALL: [Granularity; 2] = [Granularity::State, Granularity::District];
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::State => write!(f, "State"),
            Granularity::District => write!(f, "District"),
        }
    }
}

/// Grouping level plus reduction. The default is a state-level mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionPolicy {
    pub granularity: Granularity,
    pub reduction: Reduction,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionValue {
    pub value: f64,
    /// Number of records reduced into `value`; always at least one.
    pub records: usize,
}

/// Region name → reduced yield for one crop and one year.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub crop: String,
    pub year: i32,
    pub policy: RegionPolicy,
    pub regions: BTreeMap<String, RegionValue>,
}

impl RegionAggregate {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total records across all regions.
    pub fn record_count(&self) -> usize {
        self.regions.values().map(|v| v.records).sum()
    }

    /// `(min, max)` of the region values, for shading.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.regions.values().map(|v| v.value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Plain `region → value` view.
    pub fn values(&self) -> BTreeMap<&str, f64> {
        self.regions
            .iter()
            .map(|(k, v)| (k.as_str(), v.value))
            .collect()
    }
}

/// Group the records of one crop and year by region.
///
/// Regions without a matching record are absent, never zero-filled. At
/// district level records are grouped by `(state, district)`; a district name
/// shared by several states is labelled `"District, State"` so the groups stay
/// apart, while unique names keep the bare district label.
pub fn aggregate_by_region(
    dataset: &Dataset,
    crop: &str,
    year: i32,
    policy: RegionPolicy,
) -> RegionAggregate {
    let mut groups: BTreeMap<(&str, &str), Accumulator> = BTreeMap::new();
    for rec in records_for(dataset, crop, year) {
        let key = match policy.granularity {
            Granularity::State => (rec.state.as_str(), ""),
            Granularity::District => (rec.state.as_str(), rec.district.as_str()),
        };
        groups.entry(key).or_default().push(rec.yield_value);
    }

    let mut name_uses: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, district) in groups.keys() {
        *name_uses.entry(*district).or_default() += 1;
    }

    let regions: BTreeMap<String, RegionValue> = groups
        .iter()
        .map(|(&(state, district), acc)| {
            let label = match policy.granularity {
                Granularity::State => state.to_string(),
                Granularity::District if name_uses[district] > 1 => {
                    format!("{district}, {state}")
                }
                Granularity::District => district.to_string(),
            };
            (
                label,
                RegionValue {
                    value: acc.finish(policy.reduction),
                    records: acc.count(),
                },
            )
        })
        .collect();

    log::debug!(
        "Aggregated {crop} {year} into {} {} regions",
        regions.len(),
        policy.granularity
    );
    RegionAggregate {
        crop: crop.to_string(),
        year,
        policy,
        regions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{record, wheat_pair};
    use crate::data::Season;

    #[test]
    fn wheat_pair_by_district_and_state() {
        let ds = wheat_pair();

        let by_district = aggregate_by_region(
            &ds,
            "Wheat",
            2020,
            RegionPolicy {
                granularity: Granularity::District,
                reduction: Reduction::Mean,
            },
        );
        assert_eq!(by_district.values(), BTreeMap::from([("A", 5.0), ("B", 4.0)]));

        let by_state = aggregate_by_region(&ds, "Wheat", 2020, RegionPolicy::default());
        assert_eq!(by_state.values(), BTreeMap::from([("X", 4.5)]));
        assert_eq!(by_state.regions["X"].records, 2);
    }

    #[test]
    fn sum_policy_adds_yields() {
        let agg = aggregate_by_region(
            &wheat_pair(),
            "Wheat",
            2020,
            RegionPolicy {
                granularity: Granularity::State,
                reduction: Reduction::Sum,
            },
        );
        assert_eq!(agg.values(), BTreeMap::from([("X", 9.0)]));
    }

    #[test]
    fn counts_partition_the_matching_records() {
        let ds = Dataset::from_records(vec![
            record("X", "A", 2020, Season::Kharif, "Rice", 1.0, 1.0, 2.0),
            record("X", "B", 2020, Season::Rabi, "Rice", 1.0, 1.0, 3.0),
            record("Y", "C", 2020, Season::Kharif, "Rice", 1.0, 1.0, 1.0),
            record("Y", "C", 2019, Season::Kharif, "Rice", 1.0, 1.0, 9.0),
            record("Z", "D", 2020, Season::Kharif, "Maize", 1.0, 1.0, 9.0),
        ])
        .unwrap();

        let agg = aggregate_by_region(&ds, "Rice", 2020, RegionPolicy::default());
        let matching = records_for(&ds, "Rice", 2020).count();
        assert_eq!(agg.record_count(), matching);
        assert!(!agg.regions.contains_key("Z"));
        assert!(agg.regions.values().all(|v| v.records > 0));
        assert_eq!(agg.value_range(), Some((1.0, 2.5)));
    }

    #[test]
    fn shared_district_names_stay_separate() {
        let ds = Dataset::from_records(vec![
            record("Bihar", "Aurangabad", 2020, Season::Kharif, "Rice", 1.0, 2.0, 2.0),
            record("Maharashtra", "Aurangabad", 2020, Season::Kharif, "Rice", 1.0, 3.0, 3.0),
            record("Maharashtra", "Pune", 2020, Season::Kharif, "Rice", 1.0, 4.0, 4.0),
        ])
        .unwrap();

        let agg = aggregate_by_region(
            &ds,
            "Rice",
            2020,
            RegionPolicy {
                granularity: Granularity::District,
                reduction: Reduction::Mean,
            },
        );
        assert_eq!(
            agg.values(),
            BTreeMap::from([
                ("Aurangabad, Bihar", 2.0),
                ("Aurangabad, Maharashtra", 3.0),
                ("Pune", 4.0),
            ])
        );
        assert_eq!(agg.record_count(), 3);
    }

    #[test]
    fn no_match_is_empty_and_repeatable() {
        let ds = wheat_pair();
        let agg = aggregate_by_region(&ds, "Wheat", 1999, RegionPolicy::default());
        assert!(agg.is_empty());
        assert_eq!(agg.value_range(), None);

        let a = aggregate_by_region(&ds, "Wheat", 2020, RegionPolicy::default());
        let b = aggregate_by_region(&ds, "Wheat", 2020, RegionPolicy::default());
        assert_eq!(a, b);
    }
}
