//! Dataset loading, label indexing, and splitting

mod loader;
mod split;

pub use loader::{read_csv_bytes, read_csv_path, DatasetSummary};
pub use split::{stratified_train_test_split, TrainTestSplit};

use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

/// Mapping between class labels and contiguous class indices.
///
/// Labels are kept as strings end-to-end; models see indices `0..k`.
/// The index order is the sorted distinct label set, so encoding is
/// deterministic across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelIndex {
    classes: Vec<String>,
}

impl LabelIndex {
    /// Build the index from a target column.
    pub fn fit(target: &Series) -> Result<Self> {
        if target.null_count() > 0 {
            return Err(TabClassError::DataError(format!(
                "target column '{}' contains null values",
                target.name()
            )));
        }

        let as_str = target
            .cast(&DataType::String)
            .map_err(|e| TabClassError::DataError(e.to_string()))?;
        let ca = as_str
            .str()
            .map_err(|e| TabClassError::DataError(e.to_string()))?;

        let mut classes: Vec<String> = ca.into_iter().flatten().map(|s| s.to_string()).collect();
        classes.sort();
        classes.dedup();

        if classes.len() < 2 {
            return Err(TabClassError::DataError(format!(
                "target column '{}' has fewer than 2 distinct classes",
                target.name()
            )));
        }

        Ok(Self { classes })
    }

    /// Encode a target column into class indices.
    pub fn encode(&self, target: &Series) -> Result<Array1<f64>> {
        let as_str = target
            .cast(&DataType::String)
            .map_err(|e| TabClassError::DataError(e.to_string()))?;
        let ca = as_str
            .str()
            .map_err(|e| TabClassError::DataError(e.to_string()))?;

        let mut encoded = Vec::with_capacity(ca.len());
        for value in ca.into_iter() {
            let value = value.ok_or_else(|| {
                TabClassError::DataError("target column contains null values".to_string())
            })?;
            let idx = self
                .classes
                .binary_search_by(|c| c.as_str().cmp(value))
                .map_err(|_| {
                    TabClassError::DataError(format!("unknown class label '{}'", value))
                })?;
            encoded.push(idx as f64);
        }

        Ok(Array1::from_vec(encoded))
    }

    /// Decode a class index back to its label.
    pub fn decode(&self, index: f64) -> &str {
        let idx = index.round().max(0.0) as usize;
        self.classes
            .get(idx)
            .map(|s| s.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Take a subset of rows from a DataFrame by position.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: IdxCa = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    df.take(&idx)
        .map_err(|e| TabClassError::DataError(e.to_string()))
}

/// Take a subset of values from a target array by position.
pub fn take_values(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    Array1::from_iter(indices.iter().map(|&i| y[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_index_roundtrip() {
        let target = Series::new("label".into(), &["yes", "no", "yes", "maybe"]);
        let labels = LabelIndex::fit(&target).unwrap();

        assert_eq!(labels.n_classes(), 3);
        assert_eq!(labels.classes(), &["maybe", "no", "yes"]);

        let encoded = labels.encode(&target).unwrap();
        assert_eq!(encoded[0], 2.0);
        assert_eq!(encoded[1], 1.0);
        assert_eq!(labels.decode(encoded[3]), "maybe");
    }

    #[test]
    fn test_label_index_integer_target() {
        let target = Series::new("label".into(), &[1i64, 0, 1, 0]);
        let labels = LabelIndex::fit(&target).unwrap();
        assert_eq!(labels.n_classes(), 2);
    }

    #[test]
    fn test_label_index_rejects_single_class() {
        let target = Series::new("label".into(), &["a", "a", "a"]);
        assert!(LabelIndex::fit(&target).is_err());
    }

    #[test]
    fn test_take_rows() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0, 4.0],
            "b" => &["w", "x", "y", "z"]
        )
        .unwrap();

        let taken = take_rows(&df, &[0, 2]).unwrap();
        assert_eq!(taken.height(), 2);
        let col = taken.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(3.0));
    }
}
