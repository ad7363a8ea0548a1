use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::a001_gas_gage::aggregate::GasGageDevice;
use crate::domain::common::AggregateId;
use crate::enums::{OrderScope, OrderStatus, OrderType, TonerColor};

/// Заказчик по умолчанию, если у устройства он не указан
pub const UNKNOWN_CUSTOMER: &str = "Unknown customer";

/// Ключ активного заказа без цвета (бункер отработки и прочее)
pub const WASTE_SCOPE_KEY: &str = "waste";

// ============================================================================
// ID Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for OrderId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(OrderId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Заказ расходников (тонер или бункер отработки) для устройства
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyOrder {
    pub order_id: OrderId,
    /// Серийный номер устройства (исторически поле называется device_id)
    pub device_id: String,
    pub customer_name: String,
    pub order_type: OrderType,
    pub toner_color: Option<TonerColor>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub sales_order_number: Option<String>,
}

impl SupplyOrder {
    pub fn new_for_insert(
        device_id: String,
        customer_name: String,
        scope: OrderScope,
        options: &CreateOrderOptions,
    ) -> Self {
        Self {
            order_id: OrderId::new_v4(),
            device_id,
            customer_name,
            order_type: scope.order_type(),
            toner_color: scope.toner_color(),
            status: options.status.unwrap_or(OrderStatus::Open),
            created_at: Utc::now(),
            ordered_at: options.ordered_at,
            sales_order_number: options.sales_order_number.clone(),
        }
    }

    /// Ключ для дедупликации: цвет тонера либо "waste"
    pub fn scope_key(&self) -> &'static str {
        match self.toner_color {
            Some(color) => color.code(),
            None => WASTE_SCOPE_KEY,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.device_id.trim().is_empty() {
            return Err("Device serial number is required.".into());
        }
        if self.order_type == OrderType::Toner && self.toner_color.is_none() {
            return Err("Toner orders must specify a toner color.".into());
        }
        Ok(())
    }
}

/// Активные заказы, сгруппированные по устройству: ключ устройства -> набор scope-ключей
pub type ActiveOrderScopes = HashMap<String, HashSet<String>>;

/// Собирает scope-ключи активных заказов по устройствам (ключ - обрезанный device_id заказа)
pub fn active_order_scopes<'a, I>(orders: I) -> ActiveOrderScopes
where
    I: IntoIterator<Item = &'a SupplyOrder>,
{
    let mut map: ActiveOrderScopes = HashMap::new();
    for order in orders {
        let key = order.device_id.trim();
        if key.is_empty() {
            continue;
        }
        map.entry(key.to_string())
            .or_default()
            .insert(order.scope_key().to_string());
    }
    map
}

/// Scope-ключи устройства: объединение найденных по серийному номеру и по device_id
pub fn scopes_for_device(
    scopes: &ActiveOrderScopes,
    serial_number: &str,
    device_id: &str,
) -> HashSet<String> {
    let mut combined = HashSet::new();
    for key in [serial_number.trim(), device_id.trim()] {
        if key.is_empty() {
            continue;
        }
        if let Some(found) = scopes.get(key) {
            combined.extend(found.iter().cloned());
        }
    }
    combined
}

// ============================================================================
// DTOs
// ============================================================================

/// Данные устройства, передаваемые при создании заказа
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceOrderPayload {
    pub serial_number: Option<String>,
    pub device_id: Option<String>,
    pub customer: Option<String>,
    pub model: Option<String>,
    pub device_location: Option<String>,
    pub latest_receive_date: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub black: Option<f64>,
    pub cyan: Option<f64>,
    pub magenta: Option<f64>,
    pub yellow: Option<f64>,
}

impl DeviceOrderPayload {
    pub fn trimmed_serial(&self) -> Option<&str> {
        self.serial_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.latest_receive_date
            .or(self.updated_at)
            .or(self.created_at)
    }
}

impl From<&GasGageDevice> for DeviceOrderPayload {
    fn from(device: &GasGageDevice) -> Self {
        Self {
            serial_number: Some(device.serial_number.clone()),
            device_id: Some(device.device_id.clone()),
            customer: device.customer.clone(),
            model: device.model.clone(),
            device_location: device.device_location.clone(),
            latest_receive_date: device.latest_receive_date,
            updated_at: device.updated_at,
            created_at: device.created_at,
            black: device.black,
            cyan: device.cyan,
            magenta: device.magenta,
            yellow: device.yellow,
        }
    }
}

/// Необязательные параметры создания заказа
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOrderOptions {
    pub status: Option<OrderStatus>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub sales_order_number: Option<String>,
}

/// POST /api/orders/create
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOrderRequest {
    pub scope: Option<String>,
    pub device: Option<DeviceOrderPayload>,
    #[serde(alias = "orderedAt")]
    pub ordered_at: Option<DateTime<Utc>>,
    #[serde(alias = "salesOrderNumber")]
    pub sales_order_number: Option<String>,
    pub status: Option<OrderStatus>,
}

impl CreateOrderRequest {
    pub fn options(&self) -> CreateOrderOptions {
        CreateOrderOptions {
            status: self.status,
            ordered_at: self.ordered_at,
            sales_order_number: self.sales_order_number.clone(),
        }
    }
}

/// PUT /api/orders/:id/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub changed_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(device_id: &str, scope: OrderScope) -> SupplyOrder {
        SupplyOrder::new_for_insert(
            device_id.to_string(),
            "Acme".to_string(),
            scope,
            &CreateOrderOptions::default(),
        )
    }

    #[test]
    fn test_new_order_defaults_to_open() {
        let o = order("SN1", OrderScope::Waste);
        assert_eq!(o.status, OrderStatus::Open);
        assert_eq!(o.order_type, OrderType::WasteToner);
        assert_eq!(o.scope_key(), "waste");
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_active_order_scopes_merges_serial_and_device_id() {
        let orders = vec![
            order(" SN1 ", OrderScope::Black),
            order("SN1", OrderScope::Waste),
            order("DEV-9", OrderScope::Cyan),
            order("   ", OrderScope::Yellow),
        ];
        let scopes = active_order_scopes(&orders);
        assert_eq!(scopes.len(), 2);

        let combined = scopes_for_device(&scopes, "SN1", "DEV-9");
        assert!(combined.contains("black"));
        assert!(combined.contains("waste"));
        assert!(combined.contains("cyan"));
        assert!(!combined.contains("yellow"));

        assert!(scopes_for_device(&scopes, "", "").is_empty());
    }
}
