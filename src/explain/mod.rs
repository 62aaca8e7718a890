//! Model interpretability: feature importances and SHAP-style summaries

mod shap;

pub use shap::{ShapExplainer, ShapSummary};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::model::Estimator;

/// How a candidate model exposes feature importances.
///
/// Attached to each registry entry at registration time, so extraction
/// never has to probe the fitted model's capabilities at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportanceKind {
    /// Impurity-based importances native to the model
    NativeImportance,
    /// Magnitudes of linear coefficients
    LinearCoefficients,
    /// The model exposes no importances
    Unavailable,
}

/// A single (feature, importance) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Number of features reported by [`feature_importance`].
pub const TOP_K_FEATURES: usize = 10;

/// Extract the top features by absolute importance, per the candidate's
/// declared capability. Returns `None` when the model exposes none.
pub fn feature_importance(
    estimator: &Estimator,
    kind: ImportanceKind,
    feature_names: &[String],
) -> Option<Vec<FeatureImportance>> {
    let values: Array1<f64> = match kind {
        ImportanceKind::NativeImportance => estimator.native_importances()?,
        ImportanceKind::LinearCoefficients => estimator.coefficient_magnitudes()?,
        ImportanceKind::Unavailable => return None,
    };

    let mut pairs: Vec<FeatureImportance> = values
        .iter()
        .enumerate()
        .map(|(i, &importance)| FeatureImportance {
            feature: feature_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("feature_{}", i)),
            importance,
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.importance
            .abs()
            .partial_cmp(&a.importance.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pairs.truncate(TOP_K_FEATURES);

    Some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelKind;
    use crate::search::ParamGrid;
    use ndarray::array;

    #[test]
    fn test_forest_native_importance() {
        let x = array![
            [0.0, 7.0],
            [0.1, 7.0],
            [0.9, 7.0],
            [1.0, 7.0],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let params = ParamGrid::new().ints("n_estimators", &[10]).expand();
        let mut estimator = Estimator::build(ModelKind::RandomForest, &params[0], 42).unwrap();
        estimator.fit(&x, &y).unwrap();

        let names = vec!["informative".to_string(), "constant".to_string()];
        let importance =
            feature_importance(&estimator, ImportanceKind::NativeImportance, &names).unwrap();

        assert_eq!(importance[0].feature, "informative");
    }

    #[test]
    fn test_svc_has_no_importance() {
        let x = array![[0.0, 0.0], [1.0, 1.0], [0.1, 0.1], [0.9, 0.9]];
        let y = array![0.0, 1.0, 0.0, 1.0];

        let params = ParamGrid::new()
            .floats("C", &[1.0])
            .strs("kernel", &["linear"])
            .expand();
        let mut estimator = Estimator::build(ModelKind::Svc, &params[0], 42).unwrap();
        estimator.fit(&x, &y).unwrap();

        let names = vec!["a".to_string(), "b".to_string()];
        assert!(feature_importance(&estimator, ImportanceKind::Unavailable, &names).is_none());
    }

    #[test]
    fn test_top_k_truncation() {
        let x = ndarray::Array2::from_shape_fn((20, 15), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 7 + j * 3) % 5) as f64
            }
        });
        let y = Array1::from_shape_fn(20, |i| if i < 10 { 0.0 } else { 1.0 });

        let params = ParamGrid::new().floats("C", &[1.0]).expand();
        let mut estimator =
            Estimator::build(ModelKind::LogisticRegression, &params[0], 42).unwrap();
        estimator.fit(&x, &y).unwrap();

        let names: Vec<String> = (0..15).map(|i| format!("f{}", i)).collect();
        let importance =
            feature_importance(&estimator, ImportanceKind::LinearCoefficients, &names).unwrap();

        assert_eq!(importance.len(), TOP_K_FEATURES);
    }
}
