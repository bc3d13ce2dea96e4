//! Grouped reductions feeding the map and chart views.
//!
//! Both aggregators share one [`Reduction`] policy so the map and the charts
//! agree on what a "yield value" for a group means.

pub mod region;
pub mod series;

use std::fmt;

pub use region::{aggregate_by_region, Granularity, RegionAggregate, RegionPolicy, RegionValue};
pub use series::{comparison_series, single_crop_series, SeriesPoint, SeriesSet};

/// How a group of yield observations collapses to one number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reduction {
    /// Arithmetic mean of the yields in the group.
    #[default]
    Mean,
    /// Sum of the yields in the group.
    Sum,
}

impl Reduction {
    pub const ALL: [Reduction; 2] = [Reduction::Mean, Reduction::Sum];
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reduction::Mean => write!(f, "Mean"),
            Reduction::Sum => write!(f, "Sum"),
        }
    }
}

/// Running accumulator for one group.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    pub(crate) fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Reduced value; groups are only created on their first record, so
    /// `count` is never zero here.
    pub(crate) fn finish(&self, reduction: Reduction) -> f64 {
        match reduction {
            Reduction::Mean => self.sum / self.count as f64,
            Reduction::Sum => self.sum,
        }
    }
}
