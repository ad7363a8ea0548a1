use axum::extract::Query;
use axum::Json;
use contracts::dashboards::d400_device_status::dashboard::{DashboardQuery, DeviceDashboard};

use crate::dashboards::d400_device_status::service;
use crate::shared::error::{ApiError, ApiResult};

/// GET /api/devices
pub async fn list_devices(Query(query): Query<DashboardQuery>) -> ApiResult<DeviceDashboard> {
    let filter = query.into_filter().map_err(ApiError::BadRequest)?;
    let dashboard = service::get_dashboard(&filter).await?;
    Ok(Json(dashboard))
}
