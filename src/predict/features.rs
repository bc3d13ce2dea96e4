use std::collections::BTreeMap;

use super::PredictionRequest;
use crate::data::{Dataset, Season};

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

pub const NUMERIC_FEATURES: [&str; 9] = [
    "year",
    "area",
    "production",
    "log_area",
    "log_production",
    "productivity",
    "hist_state_yield",
    "hist_district_yield",
    "hist_district_season_yield",
];

/// Whether a model may reference `name`.
pub fn is_known_feature(name: &str) -> bool {
    NUMERIC_FEATURES.contains(&name)
        || name
            .strip_prefix("season_")
            .is_some_and(|s| Season::ALL.iter().any(|season| season.ident() == s))
}

/// Named feature values handed to a [`YieldModel`](super::YieldModel).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    values: BTreeMap<String, f64>,
}

impl Features {
    /// Value of `name`, `0.0` when unset (inactive one-hot columns).
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Join a request against the dataset's history.
///
/// The caller has already checked that the state/district pair exists, so
/// the state and district means always have at least one record. The
/// district+season mean falls back to the district mean.
pub fn build(dataset: &Dataset, request: &PredictionRequest) -> Features {
    let mut state_mean = Mean::default();
    let mut district_mean = Mean::default();
    let mut season_mean = Mean::default();

    for rec in dataset.records().iter().filter(|r| r.state == request.state) {
        state_mean.push(rec.yield_value);
        if rec.district == request.district {
            district_mean.push(rec.yield_value);
            if rec.season == request.season {
                season_mean.push(rec.yield_value);
            }
        }
    }

    let state_yield = state_mean.value().unwrap_or(0.0);
    let district_yield = district_mean.value().unwrap_or(state_yield);
    let season_yield = season_mean.value().unwrap_or(district_yield);

    let mut f = Features::default();
    f.set("year", request.year as f64);
    f.set("area", request.area);
    f.set("production", request.production);
    f.set("log_area", request.area.ln_1p());
    f.set("log_production", request.production.ln_1p());
    f.set(
        "productivity",
        if request.area > 0.0 {
            request.production / request.area
        } else {
            0.0
        },
    );
    f.set("hist_state_yield", state_yield);
    f.set("hist_district_yield", district_yield);
    f.set("hist_district_season_yield", season_yield);
    for season in Season::ALL {
        let active = if season == request.season { 1.0 } else { 0.0 };
        f.set(&format!("season_{}", season.ident()), active);
    }
    f
}
