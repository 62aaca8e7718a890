//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::artifacts::persist_outcome;
use crate::data::read_csv_bytes;
use crate::error::TabClassError;
use crate::pipeline::ModelSelection;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Upload a CSV and run model selection against a target column.
///
/// Multipart fields: `file` (CSV bytes) and `target_column` (string).
/// The whole selection runs synchronously within this request; the
/// response carries the job id, the result bundle, and artifact paths.
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name = "data.csv".to_string();
    let mut target_column: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                if let Some(name) = field.file_name() {
                    file_name = name.to_string();
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("target_column") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                target_column = Some(text);
            }
            _ => {}
        }
    }

    let data = file_bytes
        .ok_or_else(|| ServerError::BadRequest("Missing 'file' field".to_string()))?;
    let target_column = target_column
        .ok_or_else(|| ServerError::BadRequest("Missing 'target_column' field".to_string()))?;

    // Backstop for requests that evade the content-length middleware
    if data.len() > state.storage.max_upload_size {
        return Err(TabClassError::UploadTooLarge {
            limit: state.storage.max_upload_size,
        }
        .into());
    }

    info!(file = %file_name, bytes = data.len(), target = %target_column, "received upload");

    let df = read_csv_bytes(&data).map_err(ServerError::from)?;

    // Validate before any persistence or fitting
    if df.column(&target_column).is_err() {
        return Err(TabClassError::InvalidTargetColumn(target_column).into());
    }

    let job_id = Uuid::new_v4().to_string();

    // Keep the raw upload, keyed by job id
    let raw_path = state.storage.temp_dir.join(format!("{}.csv", job_id));
    if let Err(e) = std::fs::write(&raw_path, &data) {
        tracing::warn!(error = %e, path = %raw_path.display(), "failed to persist raw upload");
    }

    // The search loop is CPU-bound and synchronous; run it off the
    // async executor but block this request on the result.
    let storage = state.storage.clone();
    let job_id_for_task = job_id.clone();
    let (outcome, artifact_paths) = tokio::task::spawn_blocking(move || {
        let selection = ModelSelection::new(df, &target_column)?;
        let outcome = selection.run()?;
        let paths = persist_outcome(&storage.results_dir, &job_id_for_task, &outcome)?;
        Ok::<_, TabClassError>((outcome, paths))
    })
    .await
    .map_err(|e| ServerError::Internal(format!("selection task failed: {}", e)))?
    .map_err(ServerError::from)?;

    let mut result = serde_json::to_value(&outcome)
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    result["artifacts"] = json!({
        "model": artifact_paths.model,
        "predictions": artifact_paths.predictions,
    });

    Ok(Json(json!({
        "job_id": job_id,
        "created_at": chrono::Utc::now().to_rfc3339(),
        "result": result,
    })))
}

/// Liveness probe.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "tabclass",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
