//! Candidate model implementations
//!
//! The fixed candidate set: multinomial logistic regression, random
//! forest, and a support vector classifier. [`Estimator`] dispatches over
//! the fitted variants; [`FittedUnit`] couples a fitted preprocessor with
//! a fitted estimator into a single predict unit.

pub mod decision_tree;
pub mod logistic;
pub mod random_forest;
pub mod svm;

pub use decision_tree::DecisionTree;
pub use logistic::LogisticRegression;
pub use random_forest::RandomForest;
pub use svm::{KernelType, SvmClassifier, SvmConfig};

use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};
use crate::metrics;
use crate::preprocessing::Preprocessor;
use crate::search::grid::{ParamSet, ParamSetExt};

/// The fixed candidate model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression,
    RandomForest,
    Svc,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "LogisticRegression",
            ModelKind::RandomForest => "RandomForest",
            ModelKind::Svc => "SVC",
        }
    }
}

/// A fitted (or fittable) estimator variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    Logistic(LogisticRegression),
    Forest(RandomForest),
    Svc(SvmClassifier),
}

impl Estimator {
    /// Construct an unfitted estimator from a grid point.
    pub fn build(kind: ModelKind, params: &ParamSet, seed: u64) -> Result<Self> {
        match kind {
            ModelKind::LogisticRegression => Ok(Estimator::Logistic(
                LogisticRegression::new()
                    .with_c(params.get_f64("C")?)
                    .with_max_iter(1000),
            )),
            ModelKind::RandomForest => Ok(Estimator::Forest(
                RandomForest::new(params.get_usize("n_estimators")?).with_random_state(seed),
            )),
            ModelKind::Svc => {
                let kernel = match params.get_str("kernel")? {
                    "linear" => KernelType::Linear,
                    "rbf" => KernelType::Rbf { gamma: None },
                    other => {
                        return Err(TabClassError::InvalidParameter {
                            name: "kernel".to_string(),
                            value: other.to_string(),
                            reason: "expected 'linear' or 'rbf'".to_string(),
                        })
                    }
                };
                Ok(Estimator::Svc(SvmClassifier::new(SvmConfig {
                    c: params.get_f64("C")?,
                    kernel,
                    random_state: Some(seed),
                    ..Default::default()
                })))
            }
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::Logistic(m) => m.fit(x, y).map(|_| ()),
            Estimator::Forest(m) => m.fit(x, y).map(|_| ()),
            Estimator::Svc(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::Logistic(m) => m.predict(x),
            Estimator::Forest(m) => m.predict(x),
            Estimator::Svc(m) => m.predict(x),
        }
    }

    /// Native impurity-based importances (forest only).
    pub fn native_importances(&self) -> Option<Array1<f64>> {
        match self {
            Estimator::Forest(m) => m.feature_importances().cloned(),
            _ => None,
        }
    }

    /// Linear coefficient magnitudes (logistic regression only).
    pub fn coefficient_magnitudes(&self) -> Option<Array1<f64>> {
        match self {
            Estimator::Logistic(m) => m.coefficient_magnitudes(),
            _ => None,
        }
    }
}

/// A fitted preprocessing + estimator unit.
///
/// The preprocessor is fit on exactly the rows the estimator is fit on,
/// never on evaluation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedUnit {
    pub preprocessor: Preprocessor,
    pub estimator: Estimator,
}

impl FittedUnit {
    /// Fit preprocessor and estimator on the same training rows.
    pub fn fit(
        kind: ModelKind,
        params: &ParamSet,
        seed: u64,
        x: &DataFrame,
        y: &Array1<f64>,
    ) -> Result<Self> {
        let mut preprocessor = Preprocessor::new();
        preprocessor.fit(x)?;
        let x_matrix = preprocessor.transform_matrix(x)?;

        let mut estimator = Estimator::build(kind, params, seed)?;
        estimator.fit(&x_matrix, y)?;

        Ok(Self {
            preprocessor,
            estimator,
        })
    }

    /// Transform and predict unseen rows.
    pub fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        let x_matrix = self.preprocessor.transform_matrix(x)?;
        self.estimator.predict(&x_matrix)
    }

    /// Accuracy against known targets.
    pub fn score(&self, x: &DataFrame, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(metrics::accuracy(y, &predictions))
    }

    /// Transformed feature names, for importance reporting.
    pub fn feature_names(&self) -> Vec<String> {
        self.preprocessor.feature_names()
    }
}
