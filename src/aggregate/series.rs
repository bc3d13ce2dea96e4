use std::collections::BTreeMap;

use super::{Accumulator, Reduction};
use crate::data::CropYear;

/// One year of a crop's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// Crop name → its series, each ascending by year.
pub type SeriesSet = BTreeMap<String, Vec<SeriesPoint>>;

/// One point per year in which `crop` was recorded, reduced across every
/// region. Sorted ascending by year; missing years stay missing.
pub fn single_crop_series<R: CropYear>(
    records: &[R],
    crop: &str,
    reduction: Reduction,
) -> Vec<SeriesPoint> {
    let mut by_year: BTreeMap<i32, Accumulator> = BTreeMap::new();
    for rec in records.iter().filter(|r| r.crop() == crop) {
        by_year.entry(rec.year()).or_default().push(rec.yield_value());
    }
    by_year
        .into_iter()
        .map(|(year, acc)| SeriesPoint {
            year,
            value: acc.finish(reduction),
        })
        .collect()
}

/// [`single_crop_series`] for each requested crop; unknown crops map to an
/// empty series.
pub fn comparison_series<R, I, S>(records: &[R], crops: I, reduction: Reduction) -> SeriesSet
where
    R: CropYear,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    crops
        .into_iter()
        .map(|crop| {
            let crop = crop.as_ref();
            (
                crop.to_string(),
                single_crop_series(records, crop, reduction),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TrendRecord;

    fn trend(crop: &str, year: i32, value: f64) -> TrendRecord {
        TrendRecord {
            crop: crop.into(),
            year,
            yield_value: value,
            state: None,
        }
    }

    fn history() -> Vec<TrendRecord> {
        vec![
            trend("Wheat", 2007, 3.0),
            trend("Wheat", 2005, 2.0),
            trend("Rice", 2005, 1.5),
            trend("Wheat", 2005, 4.0),
            trend("Wheat", 2009, 5.0),
        ]
    }

    #[test]
    fn series_is_strictly_ascending_without_gap_fill() {
        let series = single_crop_series(&history(), "Wheat", Reduction::Mean);
        assert!(series.windows(2).all(|w| w[0].year < w[1].year));
        assert_eq!(
            series,
            [
                SeriesPoint { year: 2005, value: 3.0 },
                SeriesPoint { year: 2007, value: 3.0 },
                SeriesPoint { year: 2009, value: 5.0 },
            ]
        );
    }

    #[test]
    fn sum_reduction_totals_each_year() {
        let series = single_crop_series(&history(), "Wheat", Reduction::Sum);
        assert_eq!(series[0], SeriesPoint { year: 2005, value: 6.0 });
    }

    #[test]
    fn comparison_keeps_absent_crops_empty() {
        let set = comparison_series(&history(), ["Rice", "Jute"], Reduction::Mean);
        assert_eq!(set.len(), 2);
        assert_eq!(set["Rice"], [SeriesPoint { year: 2005, value: 1.5 }]);
        assert!(set["Jute"].is_empty());
    }

    #[test]
    fn works_over_main_dataset_records() {
        let ds = crate::data::model::tests::wheat_pair();
        let series = single_crop_series(ds.records(), "Wheat", Reduction::Mean);
        assert_eq!(series, [SeriesPoint { year: 2020, value: 4.5 }]);
    }
}
