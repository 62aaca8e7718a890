//! Model selection pipeline
//!
//! The core loop: one stratified 80/20 split, then a cross-validated grid
//! search per candidate family, scoring every refit candidate on the same
//! held-out rows and keeping the best under strict `>` comparison.

use ndarray::Array1;
use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::data::{stratified_train_test_split, take_rows, take_values, LabelIndex};
use crate::error::{Result, TabClassError};
use crate::explain::{self, ImportanceKind, ShapExplainer};
use crate::metrics::{classification_report, confusion_matrix};
use crate::model::ModelKind;
use crate::problem::{detect_problem_type, ProblemType};
use crate::report::{CandidateScore, PredictionRecord, SelectionOutcome};
use crate::search::{GridSearch, ParamGrid};

/// Seed for every stochastic component of a selection run: the global
/// split, cross-validation shuffling, model RNGs, and SHAP sampling.
pub const SELECTION_SEED: u64 = 42;

/// Held-out fraction of the global split.
pub const TEST_SIZE: f64 = 0.2;

/// Folds for the per-candidate grid search.
pub const CV_FOLDS: usize = 3;

/// A registry entry: one candidate family, its fixed grid, and its
/// importance capability.
pub struct CandidateSpec {
    pub kind: ModelKind,
    pub grid: ParamGrid,
    pub importance: ImportanceKind,
}

/// The fixed candidate set evaluated by every selection run.
pub fn candidate_registry() -> Vec<CandidateSpec> {
    vec![
        CandidateSpec {
            kind: ModelKind::LogisticRegression,
            grid: ParamGrid::new().floats("C", &[0.1, 1.0, 10.0]),
            importance: ImportanceKind::LinearCoefficients,
        },
        CandidateSpec {
            kind: ModelKind::RandomForest,
            grid: ParamGrid::new().ints("n_estimators", &[50, 100]),
            importance: ImportanceKind::NativeImportance,
        },
        CandidateSpec {
            kind: ModelKind::Svc,
            grid: ParamGrid::new()
                .floats("C", &[0.1, 1.0])
                .strs("kernel", &["linear", "rbf"]),
            importance: ImportanceKind::Unavailable,
        },
    ]
}

/// One request's model-selection run over an immutable dataset.
#[derive(Debug)]
pub struct ModelSelection {
    df: DataFrame,
    target_column: String,
    problem_type: ProblemType,
}

impl ModelSelection {
    /// Validate the target column and detect the problem type.
    pub fn new(df: DataFrame, target_column: &str) -> Result<Self> {
        if df.column(target_column).is_err() {
            return Err(TabClassError::InvalidTargetColumn(target_column.to_string()));
        }
        if df.width() < 2 {
            return Err(TabClassError::DataError(
                "dataset has no feature columns besides the target".to_string(),
            ));
        }

        let problem_type = detect_problem_type(&df, target_column)?;

        Ok(Self {
            df,
            target_column: target_column.to_string(),
            problem_type,
        })
    }

    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    /// Run the search loop and assemble the report.
    pub fn run(&self) -> Result<SelectionOutcome> {
        let target = self
            .df
            .column(&self.target_column)?
            .as_materialized_series()
            .clone();
        let labels = LabelIndex::fit(&target)?;
        let y = labels.encode(&target)?;

        let x = self.df.drop(&self.target_column)?;

        // Single global split, fixed seed, identical for every candidate
        let split = stratified_train_test_split(&y, TEST_SIZE, SELECTION_SEED)?;
        let x_train = take_rows(&x, &split.train_indices)?;
        let y_train = take_values(&y, &split.train_indices);
        let x_test = take_rows(&x, &split.test_indices)?;
        let y_test = take_values(&y, &split.test_indices);

        info!(
            rows = self.df.height(),
            train = x_train.height(),
            test = x_test.height(),
            classes = labels.n_classes(),
            target = %self.target_column,
            "starting model selection"
        );

        let mut candidates = Vec::new();
        let mut best: Option<(CandidateSpec, crate::search::GridSearchResult, f64)> = None;

        for spec in candidate_registry() {
            let search = GridSearch::new(spec.kind, spec.grid.clone())
                .with_n_splits(CV_FOLDS)
                .with_seed(SELECTION_SEED);
            let result = search.run(&x_train, &y_train)?;
            let holdout_accuracy = result.best_unit.score(&x_test, &y_test)?;

            info!(
                model = spec.kind.as_str(),
                cv_accuracy = result.best_cv.mean_score,
                holdout_accuracy,
                "candidate evaluated"
            );

            candidates.push(CandidateScore {
                model: spec.kind.as_str().to_string(),
                best_params: result.best_params.clone(),
                cv_accuracy: result.best_cv.mean_score,
                holdout_accuracy,
            });

            // Strict > so the first-seen candidate wins ties
            let better = best
                .as_ref()
                .map(|(_, _, score)| holdout_accuracy > *score)
                .unwrap_or(true);
            if better {
                best = Some((spec, result, holdout_accuracy));
            }
        }

        let (winner_spec, winner_result, accuracy) = best.ok_or_else(|| {
            TabClassError::TrainingError("no candidate produced a model".to_string())
        })?;
        let winner = winner_result.best_unit;

        let y_pred = winner.predict(&x_test)?;
        let report = classification_report(&y_test, &y_pred, &labels);
        let cm = confusion_matrix(&y_test, &y_pred, &labels);

        let predictions: Vec<PredictionRecord> = y_test
            .iter()
            .zip(y_pred.iter())
            .map(|(&actual, &predicted)| PredictionRecord {
                actual: labels.decode(actual).to_string(),
                predicted: labels.decode(predicted).to_string(),
            })
            .collect();

        let feature_names = winner.feature_names();
        let feature_importance =
            explain::feature_importance(&winner.estimator, winner_spec.importance, &feature_names);

        let shap_summary = self
            .shap_summary(&winner, &x_train, &x_test, &feature_names)
            .map_err(|e| {
                warn!(error = %e, "SHAP summary failed, omitting artifact");
                e
            })
            .ok();

        info!(
            best_model = winner_spec.kind.as_str(),
            accuracy, "model selection finished"
        );

        Ok(SelectionOutcome {
            problem_type: self.problem_type,
            best_model: winner_spec.kind.as_str().to_string(),
            accuracy,
            report,
            predictions,
            feature_importance,
            confusion_matrix: cm,
            shap_summary,
            candidates,
            winner,
        })
    }

    /// Best-effort SHAP summary on the transformed held-out sample; any
    /// failure is downgraded to a missing artifact by the caller.
    fn shap_summary(
        &self,
        winner: &crate::model::FittedUnit,
        x_train: &DataFrame,
        x_test: &DataFrame,
        feature_names: &[String],
    ) -> Result<crate::explain::ShapSummary> {
        let background = winner.preprocessor.transform_matrix(x_train)?;
        let instances = winner.preprocessor.transform_matrix(x_test)?;

        let estimator = winner.estimator.clone();
        let explainer = ShapExplainer::new(
            move |m: &ndarray::Array2<f64>| -> Result<Array1<f64>> { estimator.predict(m) },
            background,
        )
        .with_seed(SELECTION_SEED);

        explainer.summarize(&instances, feature_names)
    }
}
