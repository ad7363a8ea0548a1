use axum::extract::Path;
use axum::Json;
use contracts::domain::a005_warning_override::aggregate::WarningActionResponse;

use crate::domain::a005_warning_override::service;
use crate::shared::error::{ApiError, ApiResult};

fn require_serial(serial: &str) -> Result<String, ApiError> {
    let serial = serial.trim();
    if serial.is_empty() {
        return Err(ApiError::BadRequest("Serial number is required".into()));
    }
    Ok(serial.to_string())
}

/// POST /api/devices/:serial/warnings/dismiss
pub async fn dismiss(Path(serial): Path<String>) -> ApiResult<WarningActionResponse> {
    let serial = require_serial(&serial)?;
    service::dismiss(&serial).await?;
    Ok(Json(WarningActionResponse {
        success: true,
        serial_number: serial,
    }))
}

/// POST /api/devices/:serial/warnings/restore
pub async fn restore(Path(serial): Path<String>) -> ApiResult<WarningActionResponse> {
    let serial = require_serial(&serial)?;
    service::restore(&serial).await?;
    Ok(Json(WarningActionResponse {
        success: true,
        serial_number: serial,
    }))
}
