use std::collections::BTreeSet;

use super::model::{Dataset, YieldRecord};

// ---------------------------------------------------------------------------
// Selector queries over a loaded dataset
// ---------------------------------------------------------------------------

/// Distinct districts recorded under `state`, sorted ascending.
///
/// Matching is exact and case-sensitive. An unknown state yields an empty
/// list rather than an error.
pub fn districts_for_state(dataset: &Dataset, state: &str) -> Vec<String> {
    dataset
        .records()
        .iter()
        .filter(|r| r.state == state)
        .map(|r| r.district.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Whether `district` appears under `state` in at least one record.
pub fn district_in_state(dataset: &Dataset, state: &str, district: &str) -> bool {
    dataset
        .records()
        .iter()
        .any(|r| r.state == state && r.district == district)
}

/// Records with exactly this crop and year, in dataset order.
pub fn records_for<'a>(
    dataset: &'a Dataset,
    crop: &'a str,
    year: i32,
) -> impl Iterator<Item = &'a YieldRecord> + 'a {
    dataset
        .records()
        .iter()
        .filter(move |r| r.crop == crop && r.year == year)
}
