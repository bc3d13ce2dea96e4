use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crop_yield::aggregate::{
    aggregate_by_region, comparison_series, single_crop_series, Reduction, RegionAggregate,
    RegionPolicy, SeriesPoint, SeriesSet,
};
use crop_yield::cache::SessionCache;
use crop_yield::config::DashboardConfig;
use crop_yield::data::filter::districts_for_state;
use crop_yield::data::{Dataset, Season, TrendDataset};
use crop_yield::predict::{predict, PredictionRequest};
use crop_yield::YieldError;

use crate::color::ColorMap;

pub const MIN_YEAR: i32 = 2018;
pub const MAX_YEAR: i32 = 2021;

// ---------------------------------------------------------------------------
// Per-tab form state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Prediction,
    Distribution,
    Analysis,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Prediction, Tab::Distribution, Tab::Analysis];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Prediction => "Crop Yields Prediction",
            Tab::Distribution => "Distribution Across India",
            Tab::Analysis => "Analysis & Comparison",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartKind {
    #[default]
    Line,
    Area,
    Bar,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Line, ChartKind::Area, ChartKind::Bar];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Area => "Area Chart",
            ChartKind::Bar => "Bar Chart",
        }
    }
}

/// Outcome of the last Predict click.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Success(String),
    Warning(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct PredictionForm {
    pub state: String,
    pub district: String,
    pub year: i32,
    pub season: Season,
    pub area: f64,
    pub production: f64,
    pub outcome: Option<PredictionOutcome>,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self {
            state: String::new(),
            district: String::new(),
            year: MIN_YEAR,
            season: Season::Autumn,
            area: 0.0,
            production: 0.0,
            outcome: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegionSort {
    #[default]
    Name,
    ValueDescending,
}

#[derive(Debug, Clone)]
pub struct DistributionForm {
    pub crop: String,
    pub year: i32,
    pub policy: RegionPolicy,
    pub sort: RegionSort,
    pub result: Option<RegionAggregate>,
}

impl Default for DistributionForm {
    fn default() -> Self {
        Self {
            crop: String::new(),
            year: 2020,
            policy: RegionPolicy::default(),
            sort: RegionSort::default(),
            result: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisForm {
    pub crop: String,
    pub compare: BTreeSet<String>,
    pub reduction: Reduction,
    pub single_chart: ChartKind,
    pub compare_chart: ChartKind,
    pub single: Vec<SeriesPoint>,
    pub comparison: SeriesSet,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    cache: SessionCache,

    /// Main dataset (None until it loads successfully).
    pub dataset: Option<Arc<Dataset>>,
    /// Long historical series for the analysis tab.
    pub trends: Option<Arc<TrendDataset>>,

    pub tab: Tab,
    pub prediction: PredictionForm,
    pub distribution: DistributionForm,
    pub analysis: AnalysisForm,

    /// Colours for crops in the analysis charts.
    pub crop_colors: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = Self {
            config,
            cache: SessionCache::new(),
            dataset: None,
            trends: None,
            tab: Tab::default(),
            prediction: PredictionForm::default(),
            distribution: DistributionForm::default(),
            analysis: AnalysisForm::default(),
            crop_colors: None,
            status_message: None,
        };
        state.load_all();
        state
    }

    /// (Re)load every input through the cache and reset dependent selections.
    pub fn load_all(&mut self) {
        let mut errors = Vec::new();

        match self.cache.dataset(&self.config.dataset_path) {
            Ok(ds) => self.set_dataset(ds),
            Err(e) => {
                log::error!("Failed to load dataset: {e}");
                errors.push(e.to_string());
            }
        }
        match self.cache.trends(&self.config.trend_path) {
            Ok(trends) => self.set_trends(trends),
            Err(e) => {
                log::error!("Failed to load trend dataset: {e}");
                errors.push(e.to_string());
            }
        }
        // Loaded eagerly so a broken artifact is reported up front.
        if let Err(e) = self.cache.model(&self.config.model_path) {
            log::error!("Failed to load model: {e}");
            errors.push(e.to_string());
        }

        self.status_message = (!errors.is_empty()).then(|| errors.join("; "));
    }

    /// Drop cached inputs and read them again from disk.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        self.load_all();
    }

    /// Switch to another dataset file. The path is only committed once the
    /// file loads; on failure the current dataset and path stay in use.
    pub fn set_dataset_path(&mut self, path: PathBuf) {
        match self.cache.dataset(&path) {
            Ok(ds) => {
                self.config.dataset_path = path;
                self.set_dataset(ds);
                self.status_message = None;
            }
            Err(e) => self.report_load_error("dataset", e),
        }
    }

    pub fn set_trend_path(&mut self, path: PathBuf) {
        match self.cache.trends(&path) {
            Ok(trends) => {
                self.config.trend_path = path;
                self.set_trends(trends);
                self.status_message = None;
            }
            Err(e) => self.report_load_error("trend dataset", e),
        }
    }

    pub fn set_model_path(&mut self, path: PathBuf) {
        match self.cache.model(&path) {
            Ok(_) => {
                self.config.model_path = path;
                self.status_message = None;
            }
            Err(e) => self.report_load_error("model", e),
        }
    }

    fn report_load_error(&mut self, what: &str, e: YieldError) {
        log::error!("Failed to load {what}: {e}");
        self.status_message = Some(e.to_string());
    }

    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        if self.dataset.as_ref().is_some_and(|d| Arc::ptr_eq(d, &dataset)) {
            return;
        }
        self.prediction = PredictionForm::default();
        self.distribution.crop = dataset.crops().next().unwrap_or_default().to_string();
        self.distribution.result = None;
        self.dataset = Some(dataset);
    }

    fn set_trends(&mut self, trends: Arc<TrendDataset>) {
        if self.trends.as_ref().is_some_and(|t| Arc::ptr_eq(t, &trends)) {
            return;
        }
        let crops: Vec<String> = trends.crops().map(str::to_string).collect();
        self.crop_colors = Some(ColorMap::new(&crops));
        self.analysis.crop = crops.first().cloned().unwrap_or_default();
        self.analysis.compare = crops
            .iter()
            .filter(|c| c.as_str() == "Wheat")
            .cloned()
            .collect();
        self.trends = Some(trends);
        self.refresh_series();
    }

    /// Districts of the currently selected state.
    pub fn districts(&self) -> Vec<String> {
        match &self.dataset {
            Some(ds) if !self.prediction.state.is_empty() => {
                districts_for_state(ds, &self.prediction.state)
            }
            _ => Vec::new(),
        }
    }

    /// Select a state and clear a district that no longer belongs to it.
    pub fn select_state(&mut self, state: String) {
        if self.prediction.state != state {
            self.prediction.state = state;
            self.prediction.district.clear();
        }
    }

    /// Handle the Predict button.
    pub fn run_prediction(&mut self) {
        let form = &self.prediction;
        if form.state.is_empty()
            || form.district.is_empty()
            || form.area == 0.0
            || form.production == 0.0
        {
            self.prediction.outcome = Some(PredictionOutcome::Warning(
                "Please fill in all the fields".to_string(),
            ));
            return;
        }

        let request = PredictionRequest {
            state: form.state.clone(),
            district: form.district.clone(),
            year: form.year.clamp(MIN_YEAR, MAX_YEAR),
            season: form.season,
            area: form.area,
            production: form.production,
        };

        // Predict against the dataset the selectors were populated from.
        let Some(ds) = self.dataset.clone() else {
            self.prediction.outcome = Some(PredictionOutcome::Error(
                "No dataset is loaded".to_string(),
            ));
            return;
        };
        let outcome = self
            .cache
            .model(&self.config.model_path)
            .and_then(|model| predict(&model, &ds, &request));

        self.prediction.outcome = Some(match outcome {
            Ok(value) => PredictionOutcome::Success(format!(
                "Predicted yield for {}, {} in {} ({}): {value:.4}",
                request.state, request.district, request.year, request.season
            )),
            Err(e) => {
                log::error!("Prediction failed: {e}");
                PredictionOutcome::Error(e.to_string())
            }
        });
    }

    /// Handle the Show Map button.
    pub fn show_map(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let form = &self.distribution;
        let aggregate = aggregate_by_region(ds, &form.crop, form.year, form.policy);
        log::info!(
            "Showing {} {} across {} regions",
            aggregate.crop,
            aggregate.year,
            aggregate.regions.len()
        );
        self.distribution.result = Some(aggregate);
    }

    /// Recompute both analysis series after a selection change.
    pub fn refresh_series(&mut self) {
        let Some(trends) = &self.trends else {
            self.analysis.single.clear();
            self.analysis.comparison.clear();
            return;
        };
        let a = &self.analysis;
        let single = single_crop_series(trends.records(), &a.crop, a.reduction);
        let comparison = comparison_series(trends.records(), &a.compare, a.reduction);
        self.analysis.single = single;
        self.analysis.comparison = comparison;
    }

    /// Toggle a crop in the comparison selection.
    pub fn toggle_compare(&mut self, crop: &str) {
        if !self.analysis.compare.remove(crop) {
            self.analysis.compare.insert(crop.to_string());
        }
        self.refresh_series();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    struct Fixture {
        _files: Vec<NamedTempFile>,
        state: AppState,
    }

    fn fixture() -> Fixture {
        let dataset = temp(
            ".csv",
            "State,District,Crop,Year,Season,Area,Production,Yield\n\
             X,A,Wheat,2020,Kharif,10,50,5.0\n\
             X,B,Wheat,2020,Kharif,20,80,4.0\n",
        );
        let trends = temp(
            ".csv",
            "Crop,Year,Yield\nRice,2005,2.0\nWheat,2005,3.0\nWheat,2006,3.5\n",
        );
        let model = temp(
            ".json",
            r#"{"kind":"linear","intercept":0.0,"coefficients":{"productivity":1.0}}"#,
        );
        let config = DashboardConfig {
            dataset_path: dataset.path().to_path_buf(),
            trend_path: trends.path().to_path_buf(),
            model_path: model.path().to_path_buf(),
        };
        Fixture {
            state: AppState::new(config),
            _files: vec![dataset, trends, model],
        }
    }

    #[test]
    fn startup_populates_selectors_and_series() {
        let f = fixture();
        assert!(f.state.status_message.is_none(), "{:?}", f.state.status_message);
        assert_eq!(f.state.distribution.crop, "Wheat");
        assert_eq!(f.state.analysis.crop, "Rice");
        assert!(f.state.analysis.compare.contains("Wheat"));
        assert_eq!(f.state.analysis.comparison["Wheat"].len(), 2);
    }

    #[test]
    fn empty_fields_warn_instead_of_predicting() {
        let mut f = fixture();
        f.state.select_state("X".into());
        f.state.run_prediction();
        assert_eq!(
            f.state.prediction.outcome,
            Some(PredictionOutcome::Warning("Please fill in all the fields".into()))
        );
    }

    #[test]
    fn complete_form_predicts() {
        let mut f = fixture();
        f.state.select_state("X".into());
        assert_eq!(f.state.districts(), ["A", "B"]);
        f.state.prediction.district = "B".into();
        f.state.prediction.area = 10.0;
        f.state.prediction.production = 30.0;
        f.state.run_prediction();
        match &f.state.prediction.outcome {
            Some(PredictionOutcome::Success(msg)) => assert!(msg.ends_with(": 3.0000"), "{msg}"),
            other => panic!("unexpected outcome {other:?}"),
        }

        f.state.select_state("Y".into());
        assert!(f.state.prediction.district.is_empty());
    }

    #[test]
    fn missing_model_is_reported() {
        let mut f = fixture();
        f.state.set_model_path(PathBuf::from("/no/model.json"));
        assert!(f.state.status_message.as_deref().unwrap_or("").contains("model"));
    }

    #[test]
    fn failed_dataset_switch_keeps_the_loaded_source() {
        let mut f = fixture();
        let original = f.state.config.dataset_path.clone();
        f.state.set_dataset_path(PathBuf::from("/no/such/crops.csv"));

        assert!(f.state.status_message.as_deref().unwrap_or("").contains("crops.csv"));
        assert_eq!(f.state.config.dataset_path, original);
        assert!(f.state.dataset.is_some());

        f.state.show_map();
        assert_eq!(f.state.distribution.result.as_ref().unwrap().regions["X"].value, 4.5);

        f.state.select_state("X".into());
        f.state.prediction.district = "A".into();
        f.state.prediction.area = 10.0;
        f.state.prediction.production = 50.0;
        f.state.run_prediction();
        assert!(
            matches!(f.state.prediction.outcome, Some(PredictionOutcome::Success(_))),
            "{:?}",
            f.state.prediction.outcome
        );
    }

    #[test]
    fn show_map_uses_state_mean_by_default() {
        let mut f = fixture();
        f.state.show_map();
        let agg = f.state.distribution.result.as_ref().unwrap();
        assert_eq!(agg.regions["X"].value, 4.5);
    }
}
