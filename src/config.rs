use std::path::PathBuf;

pub const DATASET_ENV: &str = "CROP_YIELD_DATASET";
pub const TRENDS_ENV: &str = "CROP_YIELD_TRENDS";
pub const MODEL_ENV: &str = "CROP_YIELD_MODEL";

const DEFAULT_DATASET: &str = "data/CompleteDataset.csv";
const DEFAULT_TRENDS: &str = "data/FinalDataSet(2005-2021).csv";
const DEFAULT_MODEL: &str = "data/model.json";

/// Where the dashboard finds its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub dataset_path: PathBuf,
    pub trend_path: PathBuf,
    pub model_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            trend_path: PathBuf::from(DEFAULT_TRENDS),
            model_path: PathBuf::from(DEFAULT_MODEL),
        }
    }
}

impl DashboardConfig {
    /// Read `.env` (if any) and then the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve paths through `lookup`, falling back to the `data/` defaults
    /// for unset or blank variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, default: PathBuf| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };
        let config = Self {
            dataset_path: pick(DATASET_ENV, defaults.dataset_path),
            trend_path: pick(TRENDS_ENV, defaults.trend_path),
            model_path: pick(MODEL_ENV, defaults.model_path),
        };
        log::info!(
            "Dataset: {}, trends: {}, model: {}",
            config.dataset_path.display(),
            config.trend_path.display(),
            config.model_path.display()
        );
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unset_variables_use_data_dir_defaults() {
        let config = DashboardConfig::from_lookup(|_| None);
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.model_path, PathBuf::from("data/model.json"));
    }

    #[test]
    fn variables_override_and_blanks_are_ignored() {
        let env = HashMap::from([
            (DATASET_ENV, "/srv/crops.parquet".to_string()),
            (MODEL_ENV, "   ".to_string()),
        ]);
        let config = DashboardConfig::from_lookup(|k| env.get(k).cloned());
        assert_eq!(config.dataset_path, PathBuf::from("/srv/crops.parquet"));
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL));
        assert_eq!(config.trend_path, PathBuf::from(DEFAULT_TRENDS));
    }
}
