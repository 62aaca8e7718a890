//! One-hot categorical encoding

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

/// One-hot encoder for categorical columns.
///
/// Categories are learned at fit time, sorted so that output column order
/// is deterministic. A value unseen at fit time encodes to an all-zero
/// indicator row instead of failing, which keeps inference robust to new
/// categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    // (column, sorted categories), in fit column order
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the category set of each column.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.categories.clear();

        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| TabClassError::PreprocessingError(format!(
                    "column '{}' not found during encoder fit",
                    col_name
                )))?;
            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?;

            let mut cats: Vec<String> =
                ca.into_iter().flatten().map(|s| s.to_string()).collect();
            cats.sort();
            cats.dedup();

            self.categories.push((col_name.clone(), cats));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Expand each fitted column into per-category indicator columns and
    /// drop the original.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabClassError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, cats) in &self.categories {
            let column = result
                .column(col_name)
                .map_err(|_| TabClassError::PreprocessingError(format!(
                    "column '{}' not found during encoding",
                    col_name
                )))?;
            let raw: Vec<Option<String>> = column
                .as_materialized_series()
                .str()
                .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect();

            for cat in cats {
                let indicator_name = Self::indicator_name(col_name, cat);
                let values: Vec<f64> = raw
                    .iter()
                    .map(|v| if v.as_deref() == Some(cat.as_str()) { 1.0 } else { 0.0 })
                    .collect();

                result = result
                    .with_column(Series::new(indicator_name.into(), values))
                    .map_err(|e| TabClassError::DataError(e.to_string()))?
                    .clone();
            }

            result = result
                .drop(col_name)
                .map_err(|e| TabClassError::DataError(e.to_string()))?;
        }

        Ok(result)
    }

    /// Names of the indicator columns produced by `transform`, in order.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(col, cats)| {
                cats.iter().map(move |cat| Self::indicator_name(col, cat))
            })
            .collect()
    }

    /// Fitted categories for a column, if any.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cats)| cats.as_slice())
    }

    fn indicator_name(column: &str, category: &str) -> String {
        format!("{}_{}", column, category)
    }
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}
