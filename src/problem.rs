//! Problem-type detection
//!
//! Only classification with at most [`MAX_CLASSES`] discrete classes is
//! supported. Regression-shaped targets (floating-point dtype) and
//! high-cardinality targets are rejected before any split or fit happens.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

/// Maximum number of distinct target values for a supported task.
pub const MAX_CLASSES: usize = 10;

/// Supported problem types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemType {
    Classification,
}

impl ProblemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Classification => "classification",
        }
    }
}

/// Inspect the target column and classify the task.
pub fn detect_problem_type(df: &DataFrame, target_column: &str) -> Result<ProblemType> {
    let target = df
        .column(target_column)
        .map_err(|_| TabClassError::InvalidTargetColumn(target_column.to_string()))?;

    if matches!(target.dtype(), DataType::Float32 | DataType::Float64) {
        return Err(TabClassError::UnsupportedProblemType(format!(
            "target column '{}' has a floating-point type; only classification targets with at most {} classes are supported",
            target_column, MAX_CLASSES
        )));
    }

    let distinct = target
        .as_materialized_series()
        .n_unique()
        .map_err(|e| TabClassError::DataError(e.to_string()))?;

    if distinct > MAX_CLASSES {
        return Err(TabClassError::UnsupportedProblemType(format!(
            "target column '{}' has {} distinct values; only classification targets with at most {} classes are supported",
            target_column, distinct, MAX_CLASSES
        )));
    }

    Ok(ProblemType::Classification)
}
