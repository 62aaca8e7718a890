//! Stratified k-fold cross-validation

use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, TabClassError};

/// A single train/validation fold
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter (maintains class distribution per fold).
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Distribute each class's samples round-robin over folds after a
    /// seeded shuffle.
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(TabClassError::InvalidParameter {
                name: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if y.len() < self.n_splits {
            return Err(TabClassError::DataError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                y.len(),
                self.n_splits
            )));
        }

        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label.round() as i64).or_default().push(i);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];

        for indices in class_indices.values() {
            let mut shuffled = indices.clone();
            shuffled.shuffle(&mut rng);
            for (i, idx) in shuffled.into_iter().enumerate() {
                folds[i % self.n_splits].push(idx);
            }
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();

                CvSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Aggregated scores across folds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvResults {
    pub scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    pub n_folds: usize,
}

impl CvResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds.max(1) as f64;
        let variance = scores
            .iter()
            .map(|s| (s - mean_score).powi(2))
            .sum::<f64>()
            / n_folds.max(1) as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_cover_all_samples_once() {
        let y = Array1::from_vec(
            (0..30).map(|i| if i < 15 { 0.0 } else { 1.0 }).collect(),
        );
        let splits = StratifiedKFold::new(3).split(&y).unwrap();

        assert_eq!(splits.len(), 3);

        let mut all_test: Vec<usize> = splits
            .iter()
            .flat_map(|s| s.test_indices.clone())
            .collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_folds_are_stratified() {
        let y = Array1::from_vec(
            (0..30).map(|i| if i < 15 { 0.0 } else { 1.0 }).collect(),
        );
        let splits = StratifiedKFold::new(3).split(&y).unwrap();

        for split in &splits {
            let ones = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
            assert_eq!(split.test_indices.len(), 10);
            assert_eq!(ones, 5);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let y = Array1::from_vec((0..20).map(|i| (i % 2) as f64).collect());
        let a = StratifiedKFold::new(3).split(&y).unwrap();
        let b = StratifiedKFold::new(3).split(&y).unwrap();

        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_cv_results_statistics() {
        let results = CvResults::from_scores(vec![0.8, 0.9, 1.0]);
        assert!((results.mean_score - 0.9).abs() < 1e-10);
        assert_eq!(results.n_folds, 3);
        assert!(results.std_score > 0.0);
    }
}
