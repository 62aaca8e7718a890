//! Column-wise preprocessing pipeline

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabClassError};

use super::{
    encoder::OneHotEncoder,
    imputer::{ImputeStrategy, Imputer},
    partition_columns,
    scaler::StandardScaler,
};

/// Composed preprocessing transformer.
///
/// Numeric columns: mean imputation, then standard scaling.
/// Categorical columns (boolean included): most-frequent imputation, then
/// one-hot encoding with unseen categories mapping to all-zero indicators.
///
/// Invariant: `fit` only ever sees the training partition. Transform
/// statistics (means, modes, category sets) are never recomputed from
/// data passed to `transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Option<Imputer>,
    categorical_imputer: Option<Imputer>,
    scaler: Option<StandardScaler>,
    encoder: Option<OneHotEncoder>,
    is_fitted: bool,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            numeric_columns: Vec::new(),
            categorical_columns: Vec::new(),
            numeric_imputer: None,
            categorical_imputer: None,
            scaler: None,
            encoder: None,
            is_fitted: false,
        }
    }

    /// Fit all chains on the training partition.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let (numeric, categorical) = partition_columns(df);
        self.numeric_columns = numeric;
        self.categorical_columns = categorical;

        let df = self.cast_feature_columns(df)?;

        if !self.numeric_columns.is_empty() {
            let mut imputer = Imputer::new(ImputeStrategy::Mean);
            imputer.fit(&df, &self.numeric_columns)?;

            // Scaler statistics come from imputed data, as a fitted chain would see it
            let imputed = imputer.transform(&df)?;
            let mut scaler = StandardScaler::new();
            scaler.fit(&imputed, &self.numeric_columns)?;

            self.numeric_imputer = Some(imputer);
            self.scaler = Some(scaler);
        }

        if !self.categorical_columns.is_empty() {
            let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
            imputer.fit(&df, &self.categorical_columns)?;

            let imputed = imputer.transform(&df)?;
            let mut encoder = OneHotEncoder::new();
            encoder.fit(&imputed, &self.categorical_columns)?;

            self.categorical_imputer = Some(imputer);
            self.encoder = Some(encoder);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted chains to a frame with the same feature columns.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TabClassError::ModelNotFitted);
        }

        let mut result = self.cast_feature_columns(df)?;

        if let Some(ref imputer) = self.numeric_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref imputer) = self.categorical_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref scaler) = self.scaler {
            result = scaler.transform(&result)?;
        }
        if let Some(ref encoder) = self.encoder {
            result = encoder.transform(&result)?;
        }

        // Fix output column order regardless of input layout
        result
            .select(self.feature_names())
            .map_err(|e| TabClassError::DataError(e.to_string()))
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Names of the transformed output columns: numeric features first
    /// (dataset order), then one-hot indicators per categorical column.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        if let Some(ref encoder) = self.encoder {
            names.extend(encoder.feature_names());
        }
        names
    }

    /// Transform and convert to a row-major feature matrix.
    pub fn transform_matrix(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let transformed = self.transform(df)?;
        Self::to_matrix(&transformed)
    }

    /// Convert a transformed frame to a row-major `Array2<f64>`.
    fn to_matrix(df: &DataFrame) -> Result<Array2<f64>> {
        let n_rows = df.height();
        let n_cols = df.width();

        let col_data: Vec<Vec<f64>> = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col
                    .as_materialized_series()
                    .cast(&DataType::Float64)
                    .map_err(|e| TabClassError::DataError(e.to_string()))?;
                let values: Vec<f64> = series
                    .f64()
                    .map_err(|e| TabClassError::DataError(e.to_string()))?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                Ok(values)
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
            col_data[c][r]
        }))
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// Access the fitted scaler (used by leakage tests and diagnostics).
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    /// Access the fitted encoder.
    pub fn encoder(&self) -> Option<&OneHotEncoder> {
        self.encoder.as_ref()
    }

    /// Cast numeric feature columns to Float64 and categorical ones to String.
    fn cast_feature_columns(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for name in &self.numeric_columns {
            let col = result
                .column(name)
                .map_err(|_| TabClassError::PreprocessingError(format!(
                    "feature column '{}' missing from input",
                    name
                )))?;
            let casted = col
                .cast(&DataType::Float64)
                .map_err(|e| TabClassError::DataError(e.to_string()))?;
            result = result
                .with_column(casted)
                .map_err(|e| TabClassError::DataError(e.to_string()))?
                .clone();
        }

        for name in &self.categorical_columns {
            let col = result
                .column(name)
                .map_err(|_| TabClassError::PreprocessingError(format!(
                    "feature column '{}' missing from input",
                    name
                )))?;
            let casted = col
                .cast(&DataType::String)
                .map_err(|e| TabClassError::DataError(e.to_string()))?;
            result = result
                .with_column(casted)
                .map_err(|e| TabClassError::DataError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "age" => &[25.0, 30.0, 35.0, 40.0],
            "city" => &["NYC", "LA", "NYC", "SF"],
            "active" => &[true, false, true, true]
        )
        .unwrap()
    }

    #[test]
    fn test_fit_transform_shapes() {
        let df = sample_df();
        let mut pre = Preprocessor::new();
        let out = pre.fit_transform(&df).unwrap();

        // age + 3 city indicators + 2 boolean indicators
        assert_eq!(out.width(), 6);
        assert_eq!(
            pre.feature_names(),
            vec!["age", "city_LA", "city_NYC", "city_SF", "active_false", "active_true"]
        );
    }

    #[test]
    fn test_matrix_conversion() {
        let df = sample_df();
        let mut pre = Preprocessor::new();
        pre.fit(&df).unwrap();
        let x = pre.transform_matrix(&df).unwrap();

        assert_eq!(x.nrows(), 4);
        assert_eq!(x.ncols(), 6);
    }

    #[test]
    fn test_train_only_statistics() {
        let train = df!(
            "age" => &[0.0, 10.0],
            "city" => &["a", "a"]
        )
        .unwrap();
        let test = df!(
            "age" => &[100.0, 200.0],
            "city" => &["b", "b"]
        )
        .unwrap();

        let mut fit_on_train = Preprocessor::new();
        fit_on_train.fit(&train).unwrap();

        let mut fit_on_test = Preprocessor::new();
        fit_on_test.fit(&test).unwrap();

        // Same column, different fit partitions, different statistics
        let train_mean = fit_on_train.scaler().unwrap().mean("age").unwrap();
        let test_mean = fit_on_test.scaler().unwrap().mean("age").unwrap();
        assert_ne!(train_mean, test_mean);

        // Transforming test data with the train-fitted pipeline uses train
        // statistics and maps the unseen "b" category to all zeros
        let out = fit_on_train.transform(&test).unwrap();
        let a = out.column("city_a").unwrap().f64().unwrap();
        assert_eq!(a.get(0), Some(0.0));
    }

    #[test]
    fn test_transform_handles_missing_values() {
        let train = df!(
            "age" => &[Some(10.0), Some(20.0), Some(30.0)],
            "city" => &[Some("x"), Some("y"), Some("x")]
        )
        .unwrap();
        let test = df!(
            "age" => &[None::<f64>],
            "city" => &[None::<&str>]
        )
        .unwrap();

        let mut pre = Preprocessor::new();
        pre.fit(&train).unwrap();
        let out = pre.transform(&test).unwrap();

        // Missing age imputes to the train mean (20), which scales to zero
        let age = out.column("age").unwrap().f64().unwrap();
        assert!(age.get(0).unwrap().abs() < 1e-10);

        // Missing city imputes to the train mode "x"
        let x = out.column("city_x").unwrap().f64().unwrap();
        assert_eq!(x.get(0), Some(1.0));
    }
}
