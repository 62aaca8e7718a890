//! Stratified train/test splitting

use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::error::{Result, TabClassError};

/// Row indices for a single train/test partition.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Split row indices into stratified train/test partitions.
///
/// Each class contributes `test_size` of its members to the test set
/// (at least one). The split is computed once per request and is fully
/// determined by the seed, so identical inputs always produce the same
/// held-out set.
pub fn stratified_train_test_split(
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(TabClassError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    // Group indices by class; BTreeMap keeps class iteration deterministic.
    let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        class_indices.entry(label.round() as i64).or_default().push(i);
    }

    for (class, indices) in &class_indices {
        if indices.len() < 2 {
            return Err(TabClassError::DataError(format!(
                "stratified split requires at least 2 samples per class, class {} has {}",
                class,
                indices.len()
            )));
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for indices in class_indices.values() {
        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);

        let n_test = ((shuffled.len() as f64 * test_size).round() as usize)
            .max(1)
            .min(shuffled.len() - 1);

        test_indices.extend_from_slice(&shuffled[..n_test]);
        train_indices.extend_from_slice(&shuffled[n_test..]);
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(TrainTestSplit {
        train_indices,
        test_indices,
    })
}
