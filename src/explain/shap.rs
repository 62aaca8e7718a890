//! SHAP-style summary via permutation sampling
//!
//! Monte-Carlo approximation of per-feature contributions: features are
//! added to a coalition in random order, starting from a background
//! sample, and each feature is credited with the prediction change it
//! causes. Contributions are aggregated over a capped held-out sample
//! into a per-feature summary.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

/// Ceiling on explained instances; keeps the summary bounded on large uploads.
const MAX_INSTANCES: usize = 20;
/// Ceiling on background rows.
const MAX_BACKGROUND: usize = 50;

/// Aggregated SHAP-style summary over a sample of predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapSummary {
    pub feature_names: Vec<String>,
    /// Mean |contribution| per feature across explained instances
    pub mean_abs_contribution: Vec<f64>,
    /// Mean signed contribution per feature
    pub mean_contribution: Vec<f64>,
    /// Expected prediction on the background sample
    pub base_value: f64,
    /// Number of instances explained
    pub n_instances: usize,
}

/// Permutation-sampling explainer over an opaque predict function.
pub struct ShapExplainer<F>
where
    F: Fn(&Array2<f64>) -> Result<Array1<f64>>,
{
    predict_fn: F,
    background: Array2<f64>,
    n_samples: usize,
    seed: u64,
}

impl<F> ShapExplainer<F>
where
    F: Fn(&Array2<f64>) -> Result<Array1<f64>>,
{
    pub fn new(predict_fn: F, background: Array2<f64>) -> Self {
        Self {
            predict_fn,
            background,
            n_samples: 16,
            seed: 42,
        }
    }

    /// Set the number of permutation samples per instance.
    pub fn with_n_samples(mut self, n: usize) -> Self {
        self.n_samples = n.max(4);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Summarize contributions over (a capped prefix of) the instances.
    pub fn summarize(
        &self,
        instances: &Array2<f64>,
        feature_names: &[String],
    ) -> Result<ShapSummary> {
        let n_features = instances.ncols();
        if n_features == 0 || instances.nrows() == 0 {
            return Err(TabClassError::DataError(
                "nothing to explain: empty instance matrix".to_string(),
            ));
        }
        if self.background.nrows() == 0 {
            return Err(TabClassError::DataError(
                "empty background sample".to_string(),
            ));
        }

        let background = if self.background.nrows() > MAX_BACKGROUND {
            self.background
                .slice(ndarray::s![0..MAX_BACKGROUND, ..])
                .to_owned()
        } else {
            self.background.clone()
        };

        let base_value = (self.predict_fn)(&background)?
            .mean()
            .unwrap_or(0.0);

        let n_explain = instances.nrows().min(MAX_INSTANCES);
        let mut sum_abs = vec![0.0; n_features];
        let mut sum_signed = vec![0.0; n_features];

        for instance_idx in 0..n_explain {
            let instance = instances.row(instance_idx).to_owned();
            let contributions =
                self.explain_instance(&instance, &background, instance_idx)?;

            for (i, &c) in contributions.iter().enumerate() {
                sum_abs[i] += c.abs();
                sum_signed[i] += c;
            }
        }

        let n = n_explain as f64;
        Ok(ShapSummary {
            feature_names: feature_names.to_vec(),
            mean_abs_contribution: sum_abs.into_iter().map(|v| v / n).collect(),
            mean_contribution: sum_signed.into_iter().map(|v| v / n).collect(),
            base_value,
            n_instances: n_explain,
        })
    }

    fn explain_instance(
        &self,
        instance: &Array1<f64>,
        background: &Array2<f64>,
        instance_idx: usize,
    ) -> Result<Vec<f64>> {
        let n_features = instance.len();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed + instance_idx as u64);
        let mut contributions = vec![0.0; n_features];

        for _ in 0..self.n_samples {
            let mut perm: Vec<usize> = (0..n_features).collect();
            perm.shuffle(&mut rng);

            let bg_idx = rng.gen_range(0..background.nrows());
            let mut coalition = background.row(bg_idx).to_owned();
            let mut pred_before = (self.predict_fn)(
                &coalition.clone().insert_axis(Axis(0)),
            )?[0];

            for &feature_idx in &perm {
                coalition[feature_idx] = instance[feature_idx];
                let pred_after = (self.predict_fn)(
                    &coalition.clone().insert_axis(Axis(0)),
                )?[0];
                contributions[feature_idx] += pred_after - pred_before;
                pred_before = pred_after;
            }
        }

        for c in &mut contributions {
            *c /= self.n_samples as f64;
        }

        Ok(contributions)
    }
}
