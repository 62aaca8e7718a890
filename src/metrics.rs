//! Classification metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::LabelIndex;

/// Fraction of predictions matching the actual class.
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Per-class metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1/support plus macro and weighted averages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

/// Compute the full classification report against a label index.
pub fn classification_report(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    labels: &LabelIndex,
) -> ClassificationReport {
    let n_classes = labels.n_classes();
    let total = y_true.len();

    let mut classes = BTreeMap::new();
    let mut macro_precision = 0.0;
    let mut macro_recall = 0.0;
    let mut macro_f1 = 0.0;
    let mut weighted_precision = 0.0;
    let mut weighted_recall = 0.0;
    let mut weighted_f1 = 0.0;

    for class_idx in 0..n_classes {
        let c = class_idx as f64;
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        let mut support = 0usize;

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let is_true = (*t - c).abs() < 0.5;
            let is_pred = (*p - c).abs() < 0.5;
            if is_true {
                support += 1;
            }
            match (is_true, is_pred) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        macro_precision += precision;
        macro_recall += recall;
        macro_f1 += f1_score;

        let weight = support as f64 / total.max(1) as f64;
        weighted_precision += precision * weight;
        weighted_recall += recall * weight;
        weighted_f1 += f1_score * weight;

        classes.insert(
            labels.decode(c).to_string(),
            ClassMetrics {
                precision,
                recall,
                f1_score,
                support,
            },
        );
    }

    let k = n_classes.max(1) as f64;
    ClassificationReport {
        classes,
        accuracy: accuracy(y_true, y_pred),
        macro_avg: ClassMetrics {
            precision: macro_precision / k,
            recall: macro_recall / k,
            f1_score: macro_f1 / k,
            support: total,
        },
        weighted_avg: ClassMetrics {
            precision: weighted_precision,
            recall: weighted_recall,
            f1_score: weighted_f1,
            support: total,
        },
    }
}

/// Labelled confusion matrix; `counts[i][j]` is the number of samples of
/// actual class `i` predicted as class `j`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

pub fn confusion_matrix(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    labels: &LabelIndex,
) -> ConfusionMatrix {
    let n = labels.n_classes();
    let mut counts = vec![vec![0u64; n]; n];

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let ti = (t.round().max(0.0) as usize).min(n - 1);
        let pi = (p.round().max(0.0) as usize).min(n - 1);
        counts[ti][pi] += 1;
    }

    ConfusionMatrix {
        labels: labels.classes().to_vec(),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn binary_labels() -> LabelIndex {
        let target = Series::new("y".into(), &["neg", "pos"]);
        LabelIndex::fit(&target).unwrap()
    }

    #[test]
    fn test_accuracy() {
        let y_true = Array1::from_vec(vec![0.0, 1.0, 1.0, 0.0]);
        let y_pred = Array1::from_vec(vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(accuracy(&y_true, &y_pred), 0.75);
    }

    #[test]
    fn test_report_perfect_predictions() {
        let labels = binary_labels();
        let y = Array1::from_vec(vec![0.0, 1.0, 1.0, 0.0]);
        let report = classification_report(&y, &y, &labels);

        assert_eq!(report.accuracy, 1.0);
        let pos = report.classes.get("pos").unwrap();
        assert_eq!(pos.precision, 1.0);
        assert_eq!(pos.recall, 1.0);
        assert_eq!(pos.support, 2);
    }

    #[test]
    fn test_report_known_values() {
        use approx::assert_relative_eq;

        let labels = binary_labels();
        // actual: neg neg pos pos; predicted: neg pos pos pos
        let y_true = Array1::from_vec(vec![0.0, 0.0, 1.0, 1.0]);
        let y_pred = Array1::from_vec(vec![0.0, 1.0, 1.0, 1.0]);
        let report = classification_report(&y_true, &y_pred, &labels);

        let pos = report.classes.get("pos").unwrap();
        assert_relative_eq!(pos.precision, 2.0 / 3.0);
        assert_eq!(pos.recall, 1.0);

        let neg = report.classes.get("neg").unwrap();
        assert_eq!(neg.precision, 1.0);
        assert_eq!(neg.recall, 0.5);

        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.macro_avg.support, 4);

        // weighted f1: equal supports, so the mean of per-class f1
        let expected_f1 = (pos.f1_score + neg.f1_score) / 2.0;
        assert_relative_eq!(report.weighted_avg.f1_score, expected_f1);
    }

    #[test]
    fn test_confusion_matrix() {
        let labels = binary_labels();
        let y_true = Array1::from_vec(vec![0.0, 0.0, 1.0, 1.0]);
        let y_pred = Array1::from_vec(vec![0.0, 1.0, 1.0, 1.0]);
        let cm = confusion_matrix(&y_true, &y_pred, &labels);

        assert_eq!(cm.labels, vec!["neg", "pos"]);
        assert_eq!(cm.counts, vec![vec![1, 1], vec![0, 2]]);
    }
}
