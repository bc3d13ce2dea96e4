//! Yield prediction: a stored regressor evaluated on request features.
//!
//! The model is never trained here. [`load_model`] reads a JSON artifact
//! and [`predict`] joins the request against the dataset's history before
//! calling [`YieldModel::evaluate`].

pub mod features;
pub mod model;

pub use features::Features;
pub use model::{load_model, YieldModel};

use crate::data::filter::district_in_state;
use crate::data::{Dataset, Season};
use crate::error::{Result, YieldError};

/// User input for one prediction.
///
/// The year is range-checked by the input widget, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub state: String,
    pub district: String,
    pub year: i32,
    pub season: Season,
    /// Hectares.
    pub area: f64,
    /// Tonnes.
    pub production: f64,
}

impl PredictionRequest {
    fn validate(&self, dataset: &Dataset) -> Result<()> {
        if !(self.area.is_finite() && self.area >= 0.0) {
            return Err(YieldError::InvalidInput(format!(
                "area must be a non-negative number, got {}",
                self.area
            )));
        }
        if !(self.production.is_finite() && self.production >= 0.0) {
            return Err(YieldError::InvalidInput(format!(
                "production must be a non-negative number, got {}",
                self.production
            )));
        }
        if !dataset.has_state(&self.state) {
            return Err(YieldError::InvalidInput(format!(
                "state '{}' does not appear in the dataset",
                self.state
            )));
        }
        if !district_in_state(dataset, &self.state, &self.district) {
            return Err(YieldError::InvalidInput(format!(
                "district '{}' is not part of '{}'",
                self.district, self.state
            )));
        }
        Ok(())
    }
}

/// Predict a point estimate of yield for `request`.
///
/// Pure: the same model, dataset and request always give the same value.
pub fn predict(model: &YieldModel, dataset: &Dataset, request: &PredictionRequest) -> Result<f64> {
    request.validate(dataset).inspect_err(|e| log::warn!("{e}"))?;

    let features = features::build(dataset, request);
    let value = model.evaluate(&features);
    if !value.is_finite() {
        return Err(YieldError::InvalidInput(format!(
            "model produced a non-finite yield for {}, {}",
            request.district, request.state
        )));
    }

    log::debug!(
        "Predicted {value:.4} for {} / {} {} ({})",
        request.state,
        request.district,
        request.year,
        request.season
    );
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::model::tests::wheat_pair;
    use crate::predict::model::LinearModel;

    fn linear() -> YieldModel {
        let coefficients = BTreeMap::from([
            ("productivity".to_string(), 0.8),
            ("hist_district_season_yield".to_string(), 0.2),
            ("year".to_string(), 0.001),
        ]);
        YieldModel::Linear(LinearModel {
            intercept: -2.0,
            coefficients,
        })
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            state: "X".into(),
            district: "A".into(),
            year: 2021,
            season: Season::Kharif,
            area: 10.0,
            production: 50.0,
        }
    }

    #[test]
    fn prediction_is_deterministic() {
        let ds = wheat_pair();
        let model = linear();
        let first = predict(&model, &ds, &request()).unwrap();
        let second = predict(&model, &ds, &request()).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        // -2 + 0.8*5 + 0.2*5 + 0.001*2021
        assert!((first - 5.021).abs() < 1e-9);
    }

    #[test]
    fn negative_inputs_are_invalid() {
        let ds = wheat_pair();
        let model = linear();

        let mut req = request();
        req.area = -1.0;
        assert!(matches!(predict(&model, &ds, &req), Err(YieldError::InvalidInput(_))));

        let mut req = request();
        req.production = -0.5;
        assert!(matches!(predict(&model, &ds, &req), Err(YieldError::InvalidInput(_))));

        let mut req = request();
        req.area = f64::NAN;
        assert!(matches!(predict(&model, &ds, &req), Err(YieldError::InvalidInput(_))));
    }

    #[test]
    fn unknown_location_is_invalid() {
        let ds = wheat_pair();
        let model = linear();

        let mut req = request();
        req.state = "Y".into();
        assert!(matches!(predict(&model, &ds, &req), Err(YieldError::InvalidInput(_))));

        let mut req = request();
        req.district = "C".into();
        assert!(matches!(predict(&model, &ds, &req), Err(YieldError::InvalidInput(_))));
    }

    #[test]
    fn non_finite_output_is_not_returned() {
        let model = YieldModel::Linear(LinearModel {
            intercept: f64::MAX,
            coefficients: BTreeMap::from([("production".to_string(), f64::MAX)]),
        });
        let err = predict(&model, &wheat_pair(), &request()).unwrap_err();
        assert!(matches!(err, YieldError::InvalidInput(_)));
    }
}
