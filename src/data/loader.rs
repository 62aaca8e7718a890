//! CSV ingestion

use polars::prelude::*;
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, TabClassError};

/// Parse an in-memory CSV upload into a DataFrame.
pub fn read_csv_bytes(data: &[u8]) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(data))
        .finish()
        .map_err(|e| TabClassError::DataError(format!("failed to parse CSV: {}", e)))?;

    if df.height() == 0 {
        return Err(TabClassError::DataError("dataset has no rows".to_string()));
    }

    Ok(df)
}

/// Read a CSV file from disk into a DataFrame.
pub fn read_csv_path(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| TabClassError::DataError(e.to_string()))?
        .finish()
        .map_err(|e| TabClassError::DataError(format!("failed to parse CSV: {}", e)))?;

    if df.height() == 0 {
        return Err(TabClassError::DataError("dataset has no rows".to_string()));
    }

    Ok(df)
}

/// Shape and schema summary for a loaded dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub dtypes: Vec<String>,
}

impl DatasetSummary {
    pub fn from_frame(df: &DataFrame) -> Self {
        Self {
            rows: df.height(),
            columns: df.width(),
            column_names: df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dtypes: df.dtypes().iter().map(|d| format!("{:?}", d)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_bytes() {
        let csv = b"a,b,label\n1.5,x,yes\n2.5,y,no\n";
        let df = read_csv_bytes(csv).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);

        let summary = DatasetSummary::from_frame(&df);
        assert_eq!(summary.column_names, vec!["a", "b", "label"]);
    }

    #[test]
    fn test_read_csv_bytes_rejects_empty() {
        let csv = b"a,b\n";
        assert!(read_csv_bytes(csv).is_err());
    }
}
