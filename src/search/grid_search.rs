//! Cross-validated grid search

use ndarray::Array1;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::data::{take_rows, take_values};
use crate::error::{Result, TabClassError};
use crate::model::{FittedUnit, ModelKind};

use super::cross_validation::{CvResults, StratifiedKFold};
use super::grid::{format_params, ParamGrid, ParamSet};

/// Exhaustive search over a candidate's parameter grid.
///
/// Every combination is scored by stratified k-fold cross-validation on
/// the training partition; the preprocessor and estimator are refit per
/// fold on fold-train rows only, so no evaluation data ever reaches a
/// fit. The best combination is refit on the full training partition.
#[derive(Debug, Clone)]
pub struct GridSearch {
    kind: ModelKind,
    grid: ParamGrid,
    n_splits: usize,
    seed: u64,
}

/// Outcome of a grid search over one candidate.
#[derive(Debug)]
pub struct GridSearchResult {
    pub best_params: ParamSet,
    pub best_cv: CvResults,
    pub best_unit: FittedUnit,
}

impl GridSearch {
    pub fn new(kind: ModelKind, grid: ParamGrid) -> Self {
        Self {
            kind,
            grid,
            n_splits: 3,
            seed: 42,
        }
    }

    pub fn with_n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run the search on the training partition.
    pub fn run(&self, x: &DataFrame, y: &Array1<f64>) -> Result<GridSearchResult> {
        let combos = self.grid.expand();
        if combos.is_empty() {
            return Err(TabClassError::TrainingError(
                "empty parameter grid".to_string(),
            ));
        }

        let folds = StratifiedKFold::new(self.n_splits)
            .with_seed(self.seed)
            .split(y)?;

        let mut best: Option<(ParamSet, CvResults)> = None;

        for params in combos {
            let mut scores = Vec::with_capacity(folds.len());
            for fold in &folds {
                let x_train = take_rows(x, &fold.train_indices)?;
                let y_train = take_values(y, &fold.train_indices);
                let x_test = take_rows(x, &fold.test_indices)?;
                let y_test = take_values(y, &fold.test_indices);

                let unit = FittedUnit::fit(self.kind, &params, self.seed, &x_train, &y_train)?;
                scores.push(unit.score(&x_test, &y_test)?);
            }

            let cv = CvResults::from_scores(scores);
            debug!(
                model = self.kind.as_str(),
                params = %format_params(&params),
                mean_accuracy = cv.mean_score,
                "evaluated grid point"
            );

            let better = best
                .as_ref()
                .map(|(_, b)| cv.mean_score > b.mean_score)
                .unwrap_or(true);
            if better {
                best = Some((params, cv));
            }
        }

        // combos is non-empty, so best is always set here
        let (best_params, best_cv) = best.ok_or_else(|| {
            TabClassError::TrainingError("grid search produced no result".to_string())
        })?;

        let best_unit = FittedUnit::fit(self.kind, &best_params, self.seed, x, y)?;

        Ok(GridSearchResult {
            best_params,
            best_cv,
            best_unit,
        })
    }
}
