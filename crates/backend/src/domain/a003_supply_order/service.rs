use super::repository;
use contracts::dashboards::d400_device_status::active_orders::{build_active_orders, ActiveOrdersResponse};
use contracts::domain::a002_device::aggregate::Device;
use contracts::domain::a003_supply_order::aggregate::{
    active_order_scopes, CreateOrderOptions, DeviceOrderPayload, SupplyOrder, UNKNOWN_CUSTOMER,
};
use contracts::domain::a003_supply_order::bulk::{plan_bulk_orders, BulkOrderDecision, BulkOrderRequest, BulkOrderResponse};
use contracts::domain::common::AggregateId;
use contracts::enums::{OrderLifecycleEventType, OrderScope, OrderStatus};
use contracts::projections::p904_order_lifecycle::dto::OrderLifecycleEventDto;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{a001_gas_gage, a002_device};
use crate::projections::p904_order_lifecycle;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Device serial number is required.")]
    MissingSerial,

    #[error("Failed to sync device {serial}: {source}")]
    SyncDevice {
        serial: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to create order for {serial}: {source}")]
    CreateOrder {
        serial: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Карточка a002, которую синхронизируем вместе с заказом
fn device_snapshot(serial: &str, device: &DeviceOrderPayload) -> Device {
    Device {
        serial_number: serial.to_string(),
        device_id: device.device_id.clone().filter(|v| !v.trim().is_empty()),
        customer_name: device.customer.clone(),
        model: device.model.clone(),
        location: device.device_location.clone(),
        last_updated_at: device.last_updated_at(),
        toner_k_percent: device.black,
        toner_c_percent: device.cyan,
        toner_m_percent: device.magenta,
        toner_y_percent: device.yellow,
        ..Default::default()
    }
}

/// Создаёт заказ для устройства и синхронизирует его карточку
pub async fn create_supply_order(
    scope: OrderScope,
    device: &DeviceOrderPayload,
    options: &CreateOrderOptions,
) -> Result<SupplyOrder, OrderError> {
    let serial = device.trimmed_serial().ok_or(OrderError::MissingSerial)?.to_string();

    a002_device::repository::upsert_order_snapshot(&device_snapshot(&serial, device))
        .await
        .map_err(|source| OrderError::SyncDevice {
            serial: serial.clone(),
            source,
        })?;

    let customer = device
        .customer
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_CUSTOMER)
        .to_string();
    let order = SupplyOrder::new_for_insert(serial.clone(), customer, scope, options);

    repository::insert(&order)
        .await
        .map_err(|source| OrderError::CreateOrder {
            serial: serial.clone(),
            source,
        })?;

    let order_id = order.order_id.as_string();
    let event = p904_order_lifecycle::repository::new_event(
        &order_id,
        OrderLifecycleEventType::Created,
        order.toner_color,
    );
    if let Err(e) = p904_order_lifecycle::repository::insert(&event).await {
        tracing::warn!("Failed to record lifecycle event for order {}: {}", order_id, e);
    }

    tracing::info!("Order {} created for {} ({})", order_id, serial, scope);
    Ok(order)
}

/// Пакетное создание заказов одного scope
pub async fn bulk_create(
    scope: OrderScope,
    request: &BulkOrderRequest,
) -> anyhow::Result<BulkOrderResponse> {
    let devices = request.devices.as_deref().unwrap_or_default();

    let existing = if request.skip_existing {
        let open = repository::list_open_for_devices(&request.normalized_serials()).await?;
        Some(active_order_scopes(&open))
    } else {
        None
    };

    let plan = plan_bulk_orders(scope, devices, existing.as_ref());
    let mut response = BulkOrderResponse::from_plan(&plan);
    let options = CreateOrderOptions::default();

    for decision in &plan {
        let BulkOrderDecision::Create { serial, device } = decision else {
            continue;
        };
        match create_supply_order(scope, device, &options).await {
            Ok(_) => response.created += 1,
            Err(e) => {
                tracing::warn!("Bulk order failed for {}: {}", serial, e);
                response.push_error(serial, &e.to_string());
            }
        }
    }

    tracing::info!(
        "Bulk orders ({}): created {}, skipped {}, errors {}",
        scope,
        response.created,
        response.skipped,
        response.error_count()
    );
    Ok(response)
}

pub async fn list(status: Option<OrderStatus>) -> anyhow::Result<Vec<SupplyOrder>> {
    repository::list(status).await
}

/// Открытые заказы с текущим уровнем тонера и срочностью
pub async fn active_orders() -> anyhow::Result<ActiveOrdersResponse> {
    let orders = repository::list(Some(OrderStatus::Open)).await?;
    let devices = a001_gas_gage::repository::list_all().await?;
    Ok(build_active_orders(&orders, &devices))
}

/// Меняет статус и пишет событие в журнал; `None`, если заказа нет
pub async fn change_status(
    id: Uuid,
    status: OrderStatus,
    changed_by: Option<String>,
) -> anyhow::Result<Option<SupplyOrder>> {
    let Some(mut order) = repository::get_by_id(id).await? else {
        return Ok(None);
    };
    repository::update_status(id, status).await?;
    order.status = status;

    let mut event = p904_order_lifecycle::repository::new_event(&id.to_string(), status.into(), order.toner_color);
    event.completed_by = changed_by;
    p904_order_lifecycle::repository::insert(&event).await?;

    tracing::info!("Order {} status changed to {}", id, status.code());
    Ok(Some(order))
}

/// Журнал событий заказа в хронологическом порядке
pub async fn history(id: Uuid) -> anyhow::Result<Vec<OrderLifecycleEventDto>> {
    p904_order_lifecycle::repository::list_for_order(&id.to_string()).await
}
