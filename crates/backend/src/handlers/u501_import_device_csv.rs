use axum::body::Bytes;
use axum::extract::Query;
use axum::Json;
use contracts::usecases::u501_import_device_csv::schema::normalize_device_import_rows;
use contracts::usecases::u501_import_device_csv::{ImportChunkRequest, ImportDeviceCsvResponse, ImportJobDto};
use serde::Deserialize;

use crate::shared::error::{ApiError, ApiResult};
use crate::usecases::u501_import_device_csv::{executor, parse_device_csv_bytes, ImportExecutor};

const DEFAULT_JOBS_LIMIT: u64 = 50;

/// POST /api/gas-gage/import
pub async fn import_chunk(Json(request): Json<ImportChunkRequest>) -> ApiResult<ImportDeviceCsvResponse> {
    let rows = request.rows().map_err(ApiError::BadRequest)?;
    let import_type = request.resolve_type().map_err(ApiError::BadRequest)?;
    let rows = normalize_device_import_rows(import_type, rows);

    let response = ImportExecutor::from_config()
        .import_rows(import_type, &rows, request.file_name.as_deref())
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CsvImportQuery {
    #[serde(alias = "fileName")]
    pub file_name: Option<String>,
}

/// POST /api/gas-gage/import/csv?file_name=
pub async fn import_csv(Query(query): Query<CsvImportQuery>, body: Bytes) -> ApiResult<ImportDeviceCsvResponse> {
    let parsed = parse_device_csv_bytes(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    tracing::info!(
        "CSV {} detected as {} ({} rows)",
        query.file_name.as_deref().unwrap_or("<unnamed>"),
        parsed.import_type.code(),
        parsed.rows.len()
    );

    let response = ImportExecutor::from_config()
        .import_rows(parsed.import_type, &parsed.rows, query.file_name.as_deref())
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobsQuery {
    pub limit: Option<u64>,
}

/// GET /api/import-jobs
pub async fn list_jobs(Query(query): Query<JobsQuery>) -> ApiResult<Vec<ImportJobDto>> {
    let limit = query.limit.unwrap_or(DEFAULT_JOBS_LIMIT).clamp(1, 500);
    Ok(Json(executor::list_jobs(limit).await?))
}
