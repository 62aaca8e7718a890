//! Multinomial logistic regression

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

/// Softmax logistic regression trained by gradient descent.
///
/// `c` is the inverse regularization strength (larger means weaker L2
/// penalty), matching the convention of the candidate grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients, shape (n_features, n_classes)
    pub coefficients: Option<Array2<f64>>,
    /// Fitted intercepts, one per class
    pub intercepts: Option<Array1<f64>>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    n_classes: usize,
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            n_classes: 0,
            is_fitted: false,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Row-wise softmax with max subtraction for numerical stability
    fn softmax(logits: &Array2<f64>) -> Array2<f64> {
        let mut out = logits.clone();
        for mut row in out.rows_mut() {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum: f64 = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            }
        }
        out
    }

    /// Fit the model using gradient descent on the softmax cross-entropy.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(TabClassError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(TabClassError::TrainingError(
                "cannot fit on an empty matrix".to_string(),
            ));
        }

        let n_classes = y
            .iter()
            .map(|v| v.round() as usize)
            .max()
            .unwrap_or(0)
            + 1;
        let n_classes = n_classes.max(2);
        self.n_classes = n_classes;

        // One-hot target matrix
        let mut y_onehot = Array2::zeros((n_samples, n_classes));
        for (i, &label) in y.iter().enumerate() {
            y_onehot[[i, label.round() as usize]] = 1.0;
        }

        let mut weights: Array2<f64> = Array2::zeros((n_features, n_classes));
        let mut intercepts: Array1<f64> = Array1::zeros(n_classes);

        let lr = self.learning_rate;
        let lambda = 1.0 / (self.c * n_samples as f64);

        for _iter in 0..self.max_iter {
            let logits = x.dot(&weights) + &intercepts;
            let probs = Self::softmax(&logits);

            let errors = &probs - &y_onehot;
            let dw = x.t().dot(&errors) / n_samples as f64 + lambda * &weights;
            let db = errors
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(n_classes));

            let grad_norm =
                (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            intercepts = intercepts - lr * db;
        }

        self.coefficients = Some(weights);
        self.intercepts = Some(intercepts);
        self.is_fitted = true;

        Ok(self)
    }

    /// Predict class probabilities, shape (n_samples, n_classes).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(TabClassError::ModelNotFitted);
        }

        let weights = self.coefficients.as_ref().ok_or(TabClassError::ModelNotFitted)?;
        let intercepts = self.intercepts.as_ref().ok_or(TabClassError::ModelNotFitted)?;

        let logits = x.dot(weights) + intercepts;
        Ok(Self::softmax(&logits))
    }

    /// Predict class indices.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let probs = self.predict_proba(x)?;

        let predictions: Vec<f64> = probs
            .rows()
            .into_iter()
            .map(|row| {
                // First maximum wins for deterministic ties
                let mut best_idx = 0usize;
                let mut best = f64::NEG_INFINITY;
                for (j, &v) in row.iter().enumerate() {
                    if v > best {
                        best = v;
                        best_idx = j;
                    }
                }
                best_idx as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Mean absolute coefficient per feature, across classes.
    pub fn coefficient_magnitudes(&self) -> Option<Array1<f64>> {
        let coefficients = self.coefficients.as_ref()?;
        let n_classes = coefficients.ncols().max(1) as f64;
        Some(coefficients.map_axis(Axis(1), |row| {
            row.iter().map(|v| v.abs()).sum::<f64>() / n_classes
        }))
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}
