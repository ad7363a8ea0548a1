use axum::extract::Query;
use axum::Json;
use chrono::Utc;
use contracts::projections::p905_connection_events::dto::ConnectionEventDto;
use contracts::usecases::u502_connectivity_check::{ConnectionEventsQuery, ConnectivityCheckResponse};

use crate::shared::error::ApiResult;
use crate::usecases::u502_connectivity_check::executor;

/// POST /api/connectivity/check
pub async fn run_check() -> ApiResult<ConnectivityCheckResponse> {
    Ok(Json(executor::run_connectivity_check(Utc::now()).await?))
}

/// GET /api/connectivity/events
pub async fn list_events(Query(query): Query<ConnectionEventsQuery>) -> ApiResult<Vec<ConnectionEventDto>> {
    Ok(Json(executor::list_events(&query).await?))
}
