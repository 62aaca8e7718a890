//! Support vector classifier (simplified SMO)

use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// K(x, y) = x · y
    Linear,
    /// K(x, y) = exp(-γ ||x - y||²); γ defaults to 1 / n_features
    Rbf { gamma: Option<f64> },
}

impl KernelType {
    fn compute(&self, a: ArrayView1<f64>, b: ArrayView1<f64>, gamma: f64) -> f64 {
        match self {
            KernelType::Linear => a.dot(&b),
            KernelType::Rbf { .. } => {
                let mut dist = 0.0;
                for (x, y) in a.iter().zip(b.iter()) {
                    let d = x - y;
                    dist += d * d;
                }
                (-gamma * dist).exp()
            }
        }
    }
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Regularization parameter
    pub c: f64,
    pub kernel: KernelType,
    /// KKT violation tolerance
    pub tol: f64,
    /// Consecutive unchanged passes before stopping
    pub max_passes: usize,
    /// Hard ceiling on optimization sweeps
    pub max_iter: usize,
    pub random_state: Option<u64>,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::Rbf { gamma: None },
            tol: 1e-3,
            max_passes: 5,
            max_iter: 200,
            random_state: Some(42),
        }
    }
}

/// One binary machine of the one-vs-rest ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySvm {
    support_vectors: Array2<f64>,
    /// alpha_i * y_i per support vector
    alpha_y: Array1<f64>,
    bias: f64,
}

impl BinarySvm {
    fn decision(&self, x: ArrayView1<f64>, kernel: &KernelType, gamma: f64) -> f64 {
        let mut sum = self.bias;
        for (sv, &ay) in self.support_vectors.rows().into_iter().zip(self.alpha_y.iter()) {
            sum += ay * kernel.compute(sv, x, gamma);
        }
        sum
    }
}

/// Support vector classifier with one-vs-rest multiclass handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    config: SvmConfig,
    classes: Vec<i64>,
    gamma: f64,
    machines: Vec<BinarySvm>,
    is_fitted: bool,
}

impl SvmClassifier {
    pub fn new(config: SvmConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            gamma: 0.0,
            machines: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &SvmConfig {
        &self.config
    }

    /// Fit one binary machine per class against the rest.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(TabClassError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples < 2 {
            return Err(TabClassError::TrainingError(
                "SVM requires at least 2 training samples".to_string(),
            ));
        }

        let mut classes: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(TabClassError::TrainingError(
                "SVM requires at least 2 distinct classes".to_string(),
            ));
        }

        self.gamma = match self.config.kernel {
            KernelType::Rbf { gamma } => gamma.unwrap_or(1.0 / x.ncols().max(1) as f64),
            KernelType::Linear => 0.0,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state.unwrap_or(42));

        let machines = classes
            .iter()
            .map(|&class| {
                let y_signed: Array1<f64> = y
                    .iter()
                    .map(|&v| if v.round() as i64 == class { 1.0 } else { -1.0 })
                    .collect();
                self.smo_train(x, &y_signed, &mut rng)
            })
            .collect::<Result<Vec<_>>>()?;

        self.machines = machines;
        self.classes = classes;
        self.is_fitted = true;
        Ok(())
    }

    /// Predict class labels; for multiple machines the largest decision
    /// value wins (first machine on ties).
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(TabClassError::ModelNotFitted);
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut best_idx = 0usize;
                let mut best = f64::NEG_INFINITY;
                for (idx, machine) in self.machines.iter().enumerate() {
                    let d = machine.decision(row, &self.config.kernel, self.gamma);
                    if d > best {
                        best = d;
                        best_idx = idx;
                    }
                }
                self.classes[best_idx] as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn smo_train(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> Result<BinarySvm> {
        let n = x.nrows();
        let c = self.config.c;
        let tol = self.config.tol;

        // Precomputed kernel matrix
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let v = self.config.kernel.compute(x.row(i), x.row(j), self.gamma);
                k[[i, j]] = v;
                k[[j, i]] = v;
            }
        }

        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;

        let decision = |alphas: &Array1<f64>, bias: f64, idx: usize| -> f64 {
            let mut sum = bias;
            for t in 0..n {
                if alphas[t] > 0.0 {
                    sum += alphas[t] * y[t] * k[[t, idx]];
                }
            }
            sum
        };

        let mut passes = 0usize;
        let mut iter = 0usize;

        while passes < self.config.max_passes && iter < self.config.max_iter {
            let mut num_changed = 0usize;

            for i in 0..n {
                let e_i = decision(&alphas, bias, i) - y[i];

                let violates = (y[i] * e_i < -tol && alphas[i] < c)
                    || (y[i] * e_i > tol && alphas[i] > 0.0);
                if !violates {
                    continue;
                }

                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let e_j = decision(&alphas, bias, j) - y[j];

                let (a_i_old, a_j_old) = (alphas[i], alphas[j]);
                let (low, high) = if (y[i] - y[j]).abs() > 1e-9 {
                    ((a_j_old - a_i_old).max(0.0), (c + a_j_old - a_i_old).min(c))
                } else {
                    ((a_i_old + a_j_old - c).max(0.0), (a_i_old + a_j_old).min(c))
                };
                if (high - low).abs() < 1e-12 {
                    continue;
                }

                let eta = 2.0 * k[[i, j]] - k[[i, i]] - k[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                let a_j_new = (a_j_old - y[j] * (e_i - e_j) / eta).clamp(low, high);
                if (a_j_new - a_j_old).abs() < 1e-5 {
                    continue;
                }

                let a_i_new = a_i_old + y[i] * y[j] * (a_j_old - a_j_new);

                let b1 = bias
                    - e_i
                    - y[i] * (a_i_new - a_i_old) * k[[i, i]]
                    - y[j] * (a_j_new - a_j_old) * k[[i, j]];
                let b2 = bias
                    - e_j
                    - y[i] * (a_i_new - a_i_old) * k[[i, j]]
                    - y[j] * (a_j_new - a_j_old) * k[[j, j]];

                bias = if a_i_new > 0.0 && a_i_new < c {
                    b1
                } else if a_j_new > 0.0 && a_j_new < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                alphas[i] = a_i_new;
                alphas[j] = a_j_new;
                num_changed += 1;
            }

            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
            iter += 1;
        }

        // Keep only support vectors
        let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > 1e-8).collect();
        let support_vectors = x.select(ndarray::Axis(0), &support);
        let alpha_y: Array1<f64> =
            Array1::from_iter(support.iter().map(|&i| alphas[i] * y[i]));

        Ok(BinarySvm {
            support_vectors,
            alpha_y,
            bias,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        (
            array![
                [0.0, 0.0],
                [0.2, 0.1],
                [0.1, 0.3],
                [2.0, 2.0],
                [2.2, 1.9],
                [1.8, 2.1],
            ],
            array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
    }

    #[test]
    fn test_linear_kernel_separable() {
        let (x, y) = separable();
        let mut model = SvmClassifier::new(SvmConfig {
            kernel: KernelType::Linear,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_rbf_kernel_separable() {
        let (x, y) = separable();
        let mut model = SvmClassifier::new(SvmConfig::default());
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_multiclass_one_vs_rest() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [4.0, 0.0],
            [4.1, 0.1],
            [0.0, 4.0],
            [0.1, 4.1],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let mut model = SvmClassifier::new(SvmConfig {
            kernel: KernelType::Linear,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 0.0];

        let mut model = SvmClassifier::new(SvmConfig::default());
        assert!(model.fit(&x, &y).is_err());
    }
}
