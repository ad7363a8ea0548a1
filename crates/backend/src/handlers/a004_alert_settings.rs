use axum::extract::Query;
use axum::Json;
use contracts::domain::a004_alert_settings::aggregate::{
    AlertSettingsDto, AlertSettingsSaveResponse, BulkAlertSettingsRequest, BulkAlertSettingsResponse,
    DeviceAlertSettings,
};
use serde::Deserialize;

use crate::domain::a004_alert_settings::service;
use crate::shared::error::{ApiError, ApiResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsQuery {
    #[serde(alias = "deviceId")]
    pub device_id: Option<String>,
}

/// GET /api/device-alert-settings?device_id=
pub async fn get_settings(Query(query): Query<SettingsQuery>) -> ApiResult<DeviceAlertSettings> {
    let device_id = query
        .device_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("device_id is required".into()))?;
    Ok(Json(service::get(device_id).await?))
}

/// POST /api/device-alert-settings
pub async fn save_settings(Json(dto): Json<AlertSettingsDto>) -> ApiResult<AlertSettingsSaveResponse> {
    let thresholds = dto.validate().map_err(ApiError::BadRequest)?;
    let data = service::save(thresholds).await?;
    Ok(Json(AlertSettingsSaveResponse { success: true, data }))
}

/// POST /api/device-alert-settings/bulk
pub async fn bulk_update(Json(request): Json<BulkAlertSettingsRequest>) -> ApiResult<BulkAlertSettingsResponse> {
    if request.device_ids().is_empty() {
        return Err(ApiError::BadRequest("device_ids must be a non-empty array".into()));
    }
    match service::bulk_update(&request).await? {
        Some(response) => Ok(Json(response)),
        None => Err(ApiError::BadRequest("No valid device IDs provided".into())),
    }
}
