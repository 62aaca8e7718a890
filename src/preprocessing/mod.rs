//! Data preprocessing: imputation, scaling, encoding
//!
//! Feature columns are partitioned by declared type into numeric and
//! categorical groups (boolean counts as categorical) and each group gets
//! its own imputation + transformation chain. Fitted state is only ever
//! computed from training data.

mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::Preprocessor;
pub use scaler::StandardScaler;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Feature column classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Whether a dtype belongs to the numeric feature group.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Partition feature columns into numeric and categorical groups,
/// preserving the dataset's column order within each group.
pub fn partition_columns(df: &DataFrame) -> (Vec<String>, Vec<String>) {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for col in df.get_columns() {
        let name = col.name().to_string();
        if is_numeric_dtype(col.dtype()) {
            numeric.push(name);
        } else {
            // Strings, booleans, and anything else stringifiable
            categorical.push(name);
        }
    }

    (numeric, categorical)
}
