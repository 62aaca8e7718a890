//! Selection result bundle

use serde::Serialize;

use crate::explain::{FeatureImportance, ShapSummary};
use crate::metrics::{ClassificationReport, ConfusionMatrix};
use crate::model::FittedUnit;
use crate::problem::ProblemType;
use crate::search::ParamSet;

/// One (actual, predicted) pair from the held-out split.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub actual: String,
    pub predicted: String,
}

/// Per-candidate search summary.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub model: String,
    pub best_params: ParamSet,
    /// Mean cross-validated accuracy of the best grid point
    pub cv_accuracy: f64,
    /// Accuracy of the refit unit on the held-out split
    pub holdout_accuracy: f64,
}

/// Read-only bundle produced by a selection run. Serialized verbatim as
/// the `result` field of the upload response (minus the fitted unit,
/// which is persisted separately).
#[derive(Debug, Serialize)]
pub struct SelectionOutcome {
    pub problem_type: ProblemType,
    pub best_model: String,
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub predictions: Vec<PredictionRecord>,
    pub feature_importance: Option<Vec<FeatureImportance>>,
    pub confusion_matrix: ConfusionMatrix,
    pub shap_summary: Option<ShapSummary>,
    pub candidates: Vec<CandidateScore>,
    /// The winning fitted unit; persisted to disk, not serialized inline
    #[serde(skip)]
    pub winner: FittedUnit,
}
