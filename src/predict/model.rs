use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::features::{is_known_feature, Features};
use crate::error::{Result, YieldError};

// ---------------------------------------------------------------------------
// Model artifact
// ---------------------------------------------------------------------------

/// A pre-trained yield regressor, deserialized from JSON.
///
/// ```json
/// { "kind": "linear", "intercept": 0.4, "coefficients": { "productivity": 0.9 } }
/// { "kind": "forest", "trees": [ { "nodes": [
///     { "feature": "area", "threshold": 100.0, "left": 1, "right": 2 },
///     { "leaf": 2.1 },
///     { "leaf": 3.4 } ] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YieldModel {
    Linear(LinearModel),
    Forest(ForestModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
}

/// Averaging ensemble of regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<Tree>,
}

/// Flat node array; node 0 is the root and children always sit at higher
/// indices than their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Leaf {
        leaf: f64,
    },
    /// `feature <= threshold` goes left.
    Split {
        feature: String,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

impl YieldModel {
    /// Evaluate the model on a feature vector.
    pub fn evaluate(&self, features: &Features) -> f64 {
        match self {
            YieldModel::Linear(m) => m.evaluate(features),
            YieldModel::Forest(m) => m.evaluate(features),
        }
    }

    /// Check the artifact refers only to known features and is well formed.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            YieldModel::Linear(m) => {
                if !m.intercept.is_finite() {
                    return Err("intercept is not finite".into());
                }
                for (name, weight) in &m.coefficients {
                    check_feature(name)?;
                    if !weight.is_finite() {
                        return Err(format!("coefficient for '{name}' is not finite"));
                    }
                }
                Ok(())
            }
            YieldModel::Forest(m) => {
                if m.trees.is_empty() {
                    return Err("forest has no trees".into());
                }
                m.trees
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, t)| t.validate().map_err(|e| format!("tree {i}: {e}")))
            }
        }
    }
}

fn check_feature(name: &str) -> std::result::Result<(), String> {
    if is_known_feature(name) {
        Ok(())
    } else {
        Err(format!("unknown feature '{name}'"))
    }
}

impl LinearModel {
    fn evaluate(&self, features: &Features) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .map(|(name, w)| w * features.get(name))
                .sum::<f64>()
    }
}

impl ForestModel {
    fn evaluate(&self, features: &Features) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        total / self.trees.len() as f64
    }
}

impl Tree {
    /// Walk from the root to a leaf. A tree that was built by hand and never
    /// validated may point outside `nodes` or loop; both evaluate to NaN,
    /// which `predict` refuses to return.
    fn evaluate(&self, features: &Features) -> f64 {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                None => return f64::NAN,
                Some(Node::Leaf { leaf }) => return *leaf,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if features.get(feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        f64::NAN
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { leaf } if !leaf.is_finite() => {
                    return Err(format!("node {i}: leaf value is not finite"));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    check_feature(feature).map_err(|e| format!("node {i}: {e}"))?;
                    if !threshold.is_finite() {
                        return Err(format!("node {i}: threshold is not finite"));
                    }
                    for &child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!(
                                "node {i}: child index {child} must lie in {}..{}",
                                i + 1,
                                self.nodes.len()
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Deserialize and validate a model artifact.
pub fn load_model(path: &Path) -> Result<YieldModel> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        log::warn!("Cannot read model {}: {e}", path.display());
        YieldError::model_load(path, e.to_string())
    })?;
    let model: YieldModel = serde_json::from_str(&text)
        .map_err(|e| YieldError::model_load(path, format!("parsing JSON: {e}")))?;
    model.validate().map_err(|msg| {
        log::warn!("Rejected model {}: {msg}", path.display());
        YieldError::model_load(path, msg)
    })?;

    match &model {
        YieldModel::Linear(m) => log::info!(
            "Loaded linear model with {} coefficients from {}",
            m.coefficients.len(),
            path.display()
        ),
        YieldModel::Forest(m) => log::info!(
            "Loaded forest model with {} trees from {}",
            m.trees.len(),
            path.display()
        ),
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn model_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{json}").unwrap();
        file
    }

    fn features(pairs: &[(&str, f64)]) -> Features {
        let mut f = Features::default();
        for (name, value) in pairs {
            f.set(name, *value);
        }
        f
    }

    #[test]
    fn linear_model_is_intercept_plus_weighted_sum() {
        let file = model_file(
            r#"{"kind":"linear","intercept":1.0,"coefficients":{"area":0.5,"season_Rabi":2.0}}"#,
        );
        let model = load_model(file.path()).unwrap();
        let f = features(&[("area", 4.0), ("season_Rabi", 1.0)]);
        assert!((model.evaluate(&f) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn forest_averages_tree_leaves() {
        let file = model_file(
            r#"{"kind":"forest","trees":[
                {"nodes":[{"feature":"area","threshold":10.0,"left":1,"right":2},{"leaf":1.0},{"leaf":3.0}]},
                {"nodes":[{"leaf":5.0}]}
            ]}"#,
        );
        let model = load_model(file.path()).unwrap();
        assert!((model.evaluate(&features(&[("area", 5.0)])) - 3.0).abs() < 1e-12);
        assert!((model.evaluate(&features(&[("area", 50.0)])) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_unknown_features_and_backward_children() {
        let file = model_file(r#"{"kind":"linear","intercept":0.0,"coefficients":{"rainfall":1.0}}"#);
        let err = load_model(file.path()).unwrap_err();
        assert!(matches!(err, YieldError::ModelLoad { .. }));
        assert!(err.to_string().contains("rainfall"));

        let file = model_file(
            r#"{"kind":"forest","trees":[{"nodes":[{"feature":"area","threshold":1.0,"left":0,"right":1},{"leaf":1.0}]}]}"#,
        );
        assert!(matches!(load_model(file.path()), Err(YieldError::ModelLoad { .. })));
    }

    #[test]
    fn unvalidated_trees_evaluate_to_nan() {
        let split = |left, right| Node::Split {
            feature: "area".into(),
            threshold: 1.0,
            left,
            right,
        };
        let f = features(&[("area", 0.0)]);

        let empty = YieldModel::Forest(ForestModel {
            trees: vec![Tree { nodes: vec![] }],
        });
        assert!(empty.evaluate(&f).is_nan());

        let dangling = YieldModel::Forest(ForestModel {
            trees: vec![Tree {
                nodes: vec![split(7, 8)],
            }],
        });
        assert!(dangling.evaluate(&f).is_nan());

        let cyclic = YieldModel::Forest(ForestModel {
            trees: vec![Tree {
                nodes: vec![split(1, 1), split(0, 0)],
            }],
        });
        assert!(cyclic.evaluate(&f).is_nan());
    }

    #[test]
    fn missing_or_corrupt_artifact_is_model_load_error() {
        let err = load_model(Path::new("/no/such/model.json")).unwrap_err();
        assert!(matches!(err, YieldError::ModelLoad { .. }));

        let file = model_file("{ not json");
        assert!(matches!(load_model(file.path()), Err(YieldError::ModelLoad { .. })));

        let file = model_file(r#"{"kind":"forest","trees":[]}"#);
        assert!(matches!(load_model(file.path()), Err(YieldError::ModelLoad { .. })));
    }
}
