use axum::extract::Path;
use axum::Json;
use contracts::domain::a002_device::detail::DeviceDetail;

use crate::domain::a002_device::service;
use crate::shared::error::{ApiError, ApiResult};

/// GET /api/devices/:serial
pub async fn get_detail(Path(serial): Path<String>) -> ApiResult<DeviceDetail> {
    match service::get_device_detail(serial.trim()).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::NotFound(format!("Device {} not found", serial.trim()))),
    }
}
