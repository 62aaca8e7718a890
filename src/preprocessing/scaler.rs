//! Standard (z-score) feature scaling

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, TabClassError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    mean: f64,
    std: f64,
}

/// Zero-mean / unit-variance scaler for numeric columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    params: BTreeMap<String, ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Fit mean and standard deviation per column.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| TabClassError::PreprocessingError(format!(
                    "column '{}' not found during scaler fit",
                    col_name
                )))?;
            let ca = column
                .as_materialized_series()
                .f64()
                .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?;

            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(1.0);

            self.params.insert(
                col_name.clone(),
                ScalerParams {
                    mean,
                    // Constant columns scale by 1 so transform is a no-op shift
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabClassError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, params) in &self.params {
            if let Ok(col) = df.column(col_name) {
                let ca = col
                    .as_materialized_series()
                    .f64()
                    .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?;

                let scaled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| opt.map(|v| (v - params.mean) / params.std))
                    .collect();

                result = result
                    .with_column(scaled.with_name(col_name.as_str().into()).into_series())
                    .map_err(|e| TabClassError::DataError(e.to_string()))?
                    .clone();
            }
        }

        Ok(result)
    }

    /// The fitted mean for a column, if any.
    pub fn mean(&self, column: &str) -> Option<f64> {
        self.params.get(column).map(|p| p.mean)
    }

    /// The fitted standard deviation for a column, if any.
    pub fn std(&self, column: &str) -> Option<f64> {
        self.params.get(column).map(|p| p.std)
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
