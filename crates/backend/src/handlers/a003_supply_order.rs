use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use contracts::dashboards::d400_device_status::active_orders::ActiveOrdersResponse;
use contracts::domain::a003_supply_order::aggregate::{
    CreateOrderRequest, OrderId, SupplyOrder, UpdateOrderStatusRequest,
};
use contracts::domain::common::AggregateId;
use contracts::domain::a003_supply_order::bulk::{BulkOrderRequest, BulkOrderResponse};
use contracts::enums::{OrderScope, OrderStatus};
use contracts::projections::p904_order_lifecycle::dto::OrderLifecycleEventDto;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::a003_supply_order::service::{self, OrderError};
use crate::shared::error::{ApiError, ApiResult};

const INVALID_CREATE_PAYLOAD: &str = "Invalid payload. Scope and device serial number are required.";

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::MissingSerial => ApiError::BadRequest(e.to_string()),
            other => {
                tracing::error!("Order operation failed: {}", other);
                ApiError::Unprocessable(other.to_string())
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

/// GET /api/orders?status=
pub async fn list(Query(query): Query<OrdersQuery>) -> ApiResult<Vec<SupplyOrder>> {
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None | Some("all") => None,
        Some(code) => Some(
            OrderStatus::from_code(code)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid status filter: {}", code)))?,
        ),
    };
    Ok(Json(service::list(status).await?))
}

/// GET /api/orders/active
pub async fn active() -> ApiResult<ActiveOrdersResponse> {
    Ok(Json(service::active_orders().await?))
}

/// POST /api/orders/create
pub async fn create(Json(request): Json<CreateOrderRequest>) -> ApiResult<Value> {
    let scope = request.scope.as_deref().and_then(OrderScope::from_code);
    let device = request.device.as_ref().filter(|d| d.trimmed_serial().is_some());
    let (Some(scope), Some(device)) = (scope, device) else {
        return Err(ApiError::BadRequest(INVALID_CREATE_PAYLOAD.into()));
    };

    let order = service::create_supply_order(scope, device, &request.options()).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// POST /api/orders/bulk
pub async fn bulk(Json(request): Json<BulkOrderRequest>) -> Result<(StatusCode, Json<BulkOrderResponse>), ApiError> {
    let (scope, _) = request.validate().map_err(ApiError::BadRequest)?;
    let response = service::bulk_create(scope, &request).await?;
    let status = StatusCode::from_u16(response.http_status()).unwrap_or(StatusCode::OK);
    Ok((status, Json(response)))
}

fn parse_order_id(id: &str) -> Result<uuid::Uuid, ApiError> {
    OrderId::from_string(id.trim())
        .map(|order_id| order_id.value())
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id {}: {}", id, e)))
}

/// PUT /api/orders/:id/status
pub async fn change_status(
    Path(id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> ApiResult<SupplyOrder> {
    let uuid = parse_order_id(&id)?;
    match service::change_status(uuid, request.status, request.changed_by).await? {
        Some(order) => Ok(Json(order)),
        None => Err(ApiError::NotFound(format!("Order {} not found", uuid))),
    }
}

/// GET /api/orders/:id/events
pub async fn history(Path(id): Path<String>) -> ApiResult<Vec<OrderLifecycleEventDto>> {
    let uuid = parse_order_id(&id)?;
    Ok(Json(service::history(uuid).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_errors_map_to_statuses() {
        let missing: ApiError = OrderError::MissingSerial.into();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let failed: ApiError = OrderError::CreateOrder {
            serial: "SN1".into(),
            source: anyhow::anyhow!("disk full"),
        }
        .into();
        assert_eq!(failed.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(failed.to_string(), "Failed to create order for SN1: disk full");
    }
}
