//! Artifact persistence
//!
//! The winning fitted unit and the predictions table are written to the
//! results directory keyed by job id, so concurrent requests can never
//! collide on a path.

use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, TabClassError};
use crate::report::SelectionOutcome;

/// Paths of the artifacts persisted for one job.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub predictions: PathBuf,
}

/// Persist the winning model (JSON) and predictions (CSV) for a job.
pub fn persist_outcome(
    results_dir: &Path,
    job_id: &str,
    outcome: &SelectionOutcome,
) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(results_dir)?;

    let model_path = results_dir.join(format!("{}_model.json", job_id));
    let json = serde_json::to_string_pretty(&outcome.winner)?;
    std::fs::write(&model_path, json)?;

    let predictions_path = results_dir.join(format!("{}_predictions.csv", job_id));
    let actual: Vec<String> = outcome.predictions.iter().map(|p| p.actual.clone()).collect();
    let predicted: Vec<String> = outcome
        .predictions
        .iter()
        .map(|p| p.predicted.clone())
        .collect();
    let mut df = df!("actual" => &actual, "predicted" => &predicted)
        .map_err(|e| TabClassError::DataError(e.to_string()))?;

    let mut file = File::create(&predictions_path)?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .map_err(|e| TabClassError::DataError(e.to_string()))?;

    info!(
        job_id,
        model = %model_path.display(),
        predictions = %predictions_path.display(),
        "persisted artifacts"
    );

    Ok(ArtifactPaths {
        model: model_path,
        predictions: predictions_path,
    })
}
