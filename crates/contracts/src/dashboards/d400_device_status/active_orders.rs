use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::a001_gas_gage::aggregate::GasGageDevice;
use crate::domain::a003_supply_order::aggregate::SupplyOrder;
use crate::enums::{OrderType, TonerColor};

/// Срочность открытого заказа по текущему уровню тонера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderUrgency {
    Critical,
    Urgent,
    Normal,
}

/// <= 5% critical, <= 10% urgent, иначе (и без данных) normal
pub fn order_urgency(level: Option<f64>) -> OrderUrgency {
    match level {
        Some(v) if v <= 5.0 => OrderUrgency::Critical,
        Some(v) if v <= 10.0 => OrderUrgency::Urgent,
        _ => OrderUrgency::Normal,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveOrderView {
    pub order_id: String,
    pub device_id: String,
    pub customer_name: String,
    pub order_type: OrderType,
    pub toner_color: Option<TonerColor>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub sales_order_number: Option<String>,
    pub device_serial: Option<String>,
    pub current_level: Option<f64>,
    pub urgency: OrderUrgency,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyCounts {
    pub critical: usize,
    pub urgent: usize,
    pub normal: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveOrdersResponse {
    pub total: usize,
    pub counts: UrgencyCounts,
    pub orders: Vec<ActiveOrderView>,
}

/// Дополняет открытые заказы текущим уровнем заказанного цвета.
///
/// Устройство ищется и по серийному номеру, и по device_id Gas Gage.
pub fn build_active_orders(orders: &[SupplyOrder], devices: &[GasGageDevice]) -> ActiveOrdersResponse {
    let mut by_key: HashMap<&str, &GasGageDevice> = HashMap::new();
    for device in devices {
        let serial = device.trimmed_serial();
        if !serial.is_empty() {
            by_key.insert(serial, device);
        }
        let device_id = device.trimmed_device_id();
        if !device_id.is_empty() {
            by_key.insert(device_id, device);
        }
    }

    let mut counts = UrgencyCounts::default();
    let views: Vec<ActiveOrderView> = orders
        .iter()
        .map(|order| {
            let device = by_key.get(order.device_id.trim()).copied();
            let current_level = match (device, order.toner_color) {
                (Some(d), Some(color)) => d.level(color),
                _ => None,
            };
            let urgency = order_urgency(current_level);
            match urgency {
                OrderUrgency::Critical => counts.critical += 1,
                OrderUrgency::Urgent => counts.urgent += 1,
                OrderUrgency::Normal => counts.normal += 1,
            }
            ActiveOrderView {
                order_id: order.order_id.value().to_string(),
                device_id: order.device_id.clone(),
                customer_name: order.customer_name.clone(),
                order_type: order.order_type,
                toner_color: order.toner_color,
                ordered_at: order.ordered_at,
                sales_order_number: order.sales_order_number.clone(),
                device_serial: device
                    .map(|d| d.serial_number.clone())
                    .filter(|s| !s.is_empty()),
                current_level,
                urgency,
            }
        })
        .collect();

    ActiveOrdersResponse {
        total: views.len(),
        counts,
        orders: views,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_supply_order::aggregate::CreateOrderOptions;
    use crate::enums::OrderScope;

    #[test]
    fn test_order_urgency_buckets() {
        assert_eq!(order_urgency(Some(0.0)), OrderUrgency::Critical);
        assert_eq!(order_urgency(Some(5.0)), OrderUrgency::Critical);
        assert_eq!(order_urgency(Some(5.5)), OrderUrgency::Urgent);
        assert_eq!(order_urgency(Some(10.0)), OrderUrgency::Urgent);
        assert_eq!(order_urgency(Some(10.1)), OrderUrgency::Normal);
        assert_eq!(order_urgency(None), OrderUrgency::Normal);
    }

    #[test]
    fn test_active_orders_lookup_by_serial_or_device_id() {
        let devices = vec![GasGageDevice {
            device_id: "GG1".into(),
            serial_number: "SN1".into(),
            black: Some(4.0),
            cyan: Some(8.0),
            ..Default::default()
        }];
        let opts = CreateOrderOptions::default();
        let orders = vec![
            SupplyOrder::new_for_insert("SN1".into(), "Acme".into(), OrderScope::Black, &opts),
            SupplyOrder::new_for_insert("GG1".into(), "Acme".into(), OrderScope::Cyan, &opts),
            SupplyOrder::new_for_insert("SN1".into(), "Acme".into(), OrderScope::Waste, &opts),
            SupplyOrder::new_for_insert("SN404".into(), "Acme".into(), OrderScope::Black, &opts),
        ];

        let view = build_active_orders(&orders, &devices);
        assert_eq!(view.total, 4);
        assert_eq!(view.orders[0].urgency, OrderUrgency::Critical);
        assert_eq!(view.orders[1].current_level, Some(8.0));
        assert_eq!(view.orders[1].device_serial.as_deref(), Some("SN1"));
        assert_eq!(view.orders[2].current_level, None);
        assert_eq!(view.orders[3].device_serial, None);
        assert_eq!(
            view.counts,
            UrgencyCounts {
                critical: 1,
                urgent: 1,
                normal: 2
            }
        );
    }
}
