//! CART decision tree classifier (gini impurity)

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

/// A node in the fitted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        prediction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Decision tree classifier.
///
/// Splits minimize weighted gini impurity. `max_features`, when set,
/// restricts each split to a random feature subset (used by the forest).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub random_state: Option<u64>,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
    is_fitted: bool,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            n_classes: 0,
            feature_importances: None,
            is_fitted: false,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
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

        self.n_features = x.ncols();
        self.n_classes = (y.iter().map(|v| v.round() as usize).max().unwrap_or(0) + 1).max(2);

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(42));
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();

        let root = self.build_node(x, y, &indices, 0, &mut rng, &mut importances);

        // Normalize importances
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(importances));
        self.root = Some(root);
        self.is_fitted = true;
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(TabClassError::ModelNotFitted)?;

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { prediction } => return *prediction,
                        TreeNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature] <= *threshold { left } else { right };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    fn class_counts(&self, y: &Array1<f64>, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            let c = (y[i].round().max(0.0) as usize).min(self.n_classes - 1);
            counts[c] += 1;
        }
        counts
    }

    fn gini(counts: &[usize], n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        let mut g = 1.0;
        for &c in counts {
            let p = c as f64 / n as f64;
            g -= p * p;
        }
        g
    }

    fn majority(counts: &[usize]) -> f64 {
        let mut best_idx = 0usize;
        let mut best = 0usize;
        for (i, &c) in counts.iter().enumerate() {
            if c > best {
                best = c;
                best_idx = i;
            }
        }
        best_idx as f64
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n = indices.len();
        let counts = self.class_counts(y, indices);
        let node_gini = Self::gini(&counts, n);

        let depth_reached = self.max_depth.map(|d| depth >= d).unwrap_or(false);
        if node_gini == 0.0 || n < self.min_samples_split || depth_reached {
            return TreeNode::Leaf {
                prediction: Self::majority(&counts),
            };
        }

        // Candidate feature subset
        let features: Vec<usize> = match self.max_features {
            Some(k) if k < self.n_features => {
                rand::seq::index::sample(rng, self.n_features, k).into_vec()
            }
            _ => (0..self.n_features).collect(),
        };

        let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, decrease)

        for &feature in &features {
            let mut sorted: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (x[[i, feature]], (y[i].round().max(0.0) as usize).min(self.n_classes - 1)))
                .collect();
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = counts.clone();

            for i in 0..n - 1 {
                let (value, class) = sorted[i];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let next_value = sorted[i + 1].0;
                if next_value <= value {
                    continue;
                }

                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * Self::gini(&left_counts, n_left)
                    + n_right as f64 * Self::gini(&right_counts, n_right))
                    / n as f64;
                let decrease = node_gini - weighted;

                if decrease > 1e-12
                    && best.map(|(_, _, d)| decrease > d).unwrap_or(true)
                {
                    best = Some((feature, (value + next_value) / 2.0, decrease));
                }
            }
        }

        let (feature, threshold, decrease) = match best {
            Some(b) => b,
            None => {
                return TreeNode::Leaf {
                    prediction: Self::majority(&counts),
                }
            }
        };

        importances[feature] += n as f64 * decrease;

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature]] <= threshold);

        let left = self.build_node(x, y, &left_indices, depth + 1, rng, importances);
        let right = self.build_node(x, y, &right_indices, depth + 1, rng, importances);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
