//! Missing value imputation

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, TabClassError};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with the column mean (numeric only)
    Mean,
    /// Replace with the most frequent value
    MostFrequent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum FillValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values.
///
/// Fill values are computed from the columns seen at fit time and reused
/// verbatim at transform time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, FillValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the imputer to the given columns.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| TabClassError::PreprocessingError(format!(
                    "column '{}' not found during imputer fit",
                    col_name
                )))?;

            let fill = self.compute_fill_value(column.as_materialized_series())?;
            self.fill_values.insert(col_name.clone(), fill);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing values with the fitted fill values.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabClassError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, fill) in &self.fill_values {
            if let Ok(col) = df.column(col_name) {
                let filled = Self::fill_series(col.as_materialized_series(), fill)?;
                result = result
                    .with_column(filled)
                    .map_err(|e| TabClassError::DataError(e.to_string()))?
                    .clone();
            }
        }

        Ok(result)
    }

    /// The fitted fill value for a numeric column, if any.
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        match self.fill_values.get(column) {
            Some(FillValue::Numeric(v)) => Some(*v),
            _ => None,
        }
    }

    /// The fitted fill value for a string column, if any.
    pub fn string_fill(&self, column: &str) -> Option<&str> {
        match self.fill_values.get(column) {
            Some(FillValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    fn compute_fill_value(&self, series: &Series) -> Result<FillValue> {
        match self.strategy {
            ImputeStrategy::Mean => {
                let mean = series
                    .f64()
                    .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?
                    .mean()
                    .unwrap_or(0.0);
                Ok(FillValue::Numeric(mean))
            }
            ImputeStrategy::MostFrequent => {
                let mode = Self::compute_mode_string(series)?;
                Ok(FillValue::String(mode))
            }
        }
    }

    /// Mode of a string column. Ties break toward the lexicographically
    /// smallest value so fitted state is deterministic.
    fn compute_mode_string(series: &Series) -> Result<String> {
        let ca = series
            .str()
            .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in ca.into_iter().flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut mode = "";
        let mut best = 0usize;
        for (value, count) in counts {
            if count > best {
                best = count;
                mode = value;
            }
        }

        Ok(mode.to_string())
    }

    fn fill_series(series: &Series, fill: &FillValue) -> Result<Series> {
        match fill {
            FillValue::Numeric(value) => {
                let ca = series
                    .f64()
                    .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?;
                let filled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*value)))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
            FillValue::String(value) => {
                let ca = series
                    .str()
                    .map_err(|e| TabClassError::PreprocessingError(e.to_string()))?;
                let filled: StringChunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(value.as_str()).to_string()))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_imputation() {
        let df = DataFrame::new(vec![Column::new(
            "a".into(),
            &[Some(1.0), None, Some(3.0), Some(4.0)],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        imputer.fit(&df, &["a".to_string()]).unwrap();
        let result = imputer.transform(&df).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.get(1).unwrap() - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_most_frequent_imputation() {
        let df = DataFrame::new(vec![Column::new(
            "city".into(),
            &[Some("NYC"), Some("LA"), None, Some("NYC")],
        )])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        imputer.fit(&df, &["city".to_string()]).unwrap();
        let result = imputer.transform(&df).unwrap();

        let col = result.column("city").unwrap().str().unwrap();
        assert_eq!(col.get(2), Some("NYC"));
    }

    #[test]
    fn test_transform_requires_fit() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let imputer = Imputer::new(ImputeStrategy::Mean);
        assert!(matches!(
            imputer.transform(&df),
            Err(TabClassError::ModelNotFitted)
        ));
    }
}
