use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::Device;
use crate::domain::a001_gas_gage::aggregate::{GasGageDevice, UNASSIGNED_CUSTOMER};
use crate::domain::a003_supply_order::aggregate::{DeviceOrderPayload, SupplyOrder};
use crate::enums::{OrderStatus, OrderType, TonerColor};
use crate::projections::p900_toner_snapshots::dto::TonerSnapshotDto;
use crate::projections::p901_meter_readings::dto::MeterReadingDto;
use crate::projections::p902_warning_events::dto::WarningEventDto;

/// Сколько событий предупреждений читаем для карточки устройства
pub const WARNING_HISTORY_LIMIT: u64 = 40;

/// Сколько последних заказов показываем в карточке
pub const RECENT_ORDERS_LIMIT: u64 = 10;

pub const NO_ACTIVE_WARNINGS: &str = "No active warnings";

/// Нужно ли дополнять запись устройства данными Gas Gage
pub fn needs_hydration(record: Option<&Device>) -> bool {
    match record {
        None => true,
        Some(device) => device.has_missing_toner(),
    }
}

/// Сливает строку Gas Gage с (возможно отсутствующей) записью устройства.
///
/// Уровни тонера, заказчик, модель, расположение и время обновления берутся
/// из Gas Gage; служебные поля устройства сохраняются.
pub fn hydrate_from_gas_gage(record: Option<Device>, gas: &GasGageDevice) -> Device {
    let existing = record.unwrap_or_default();
    let gas_device_id = non_empty(&gas.device_id).or_else(|| non_empty(&gas.serial_number));

    Device {
        serial_number: gas.serial_number.clone(),
        device_id: existing.device_id.clone().or(gas_device_id),
        center_id: existing.center_id.clone().or_else(|| non_empty(&gas.center_id)),
        code_name: existing.code_name.clone().or_else(|| gas.code_name.clone()),
        service_office: existing
            .service_office
            .clone()
            .or_else(|| gas.service_office.clone()),
        department: existing.department.clone(),
        device_host_name: existing
            .device_host_name
            .clone()
            .or_else(|| gas.device_host_name.clone()),
        customer_name: gas.customer.clone().or(existing.customer_name.clone()),
        model: gas.model.clone().or(existing.model.clone()),
        location: gas.device_location.clone().or(existing.location.clone()),
        last_updated_at: gas.last_updated_at().or(existing.last_updated_at),
        last_seen_at: existing.last_seen_at,
        last_meter_received_at: existing.last_meter_received_at,
        offline_threshold_minutes: existing.offline_threshold_minutes,
        toner_k_percent: gas.black.or(existing.toner_k_percent),
        toner_c_percent: gas.cyan.or(existing.toner_c_percent),
        toner_m_percent: gas.magenta.or(existing.toner_m_percent),
        toner_y_percent: gas.yellow.or(existing.toner_y_percent),
        waste_toner_percent: existing.waste_toner_percent,
        warning_message: existing.warning_message.clone(),
        counter_total: existing.counter_total,
        counter_color: existing.counter_color,
        counter_mono: existing.counter_mono,
        created_at: existing.created_at.or(gas.created_at),
        updated_at: existing.updated_at.or(gas.updated_at),
    }
}

/// Накладывает последний снимок тонера поверх записи устройства
pub fn apply_latest_snapshot(device: &mut Device, snapshot: &TonerSnapshotDto) {
    device.toner_k_percent = snapshot.black.or(device.toner_k_percent);
    device.toner_c_percent = snapshot.cyan.or(device.toner_c_percent);
    device.toner_m_percent = snapshot.magenta.or(device.toner_m_percent);
    device.toner_y_percent = snapshot.yellow.or(device.toner_y_percent);
    device.waste_toner_percent = snapshot.waste_toner.or(device.waste_toner_percent);
    device.last_updated_at = Some(snapshot.captured_at);
}

/// Накладывает последние показания счётчиков
pub fn apply_latest_meter(device: &mut Device, meter: &MeterReadingDto) {
    device.counter_total = meter
        .total
        .or(meter.printer_total)
        .or(meter.copy_total)
        .or(device.counter_total);
    device.counter_color = meter.color_total.or(device.counter_color);
    device.counter_mono = meter.black_total.or(device.counter_mono);
    device.last_meter_received_at = Some(meter.captured_at);
}

/// Строка истории предупреждений по тонеру
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningSummary {
    pub timestamp: DateTime<Utc>,
    pub message: Option<String>,
    pub recovered: Option<bool>,
    pub warning_type: Option<String>,
    pub alert_code: Option<String>,
}

/// Оставляет только предупреждения про тонер, сохраняя порядок (новые первыми)
pub fn toner_warning_history(events: &[WarningEventDto]) -> Vec<WarningSummary> {
    events
        .iter()
        .filter_map(|event| {
            let headline = event
                .message
                .as_ref()
                .or(event.warning_type.as_ref())
                .or(event.alert_code.as_ref());
            let mentions_toner = headline
                .map(|text| text.to_lowercase().contains("toner"))
                .unwrap_or(false);
            if !mentions_toner {
                return None;
            }
            let timestamp = event
                .received_at_server
                .or(event.occurred_at_device)
                .or(event.recovered_at_server)
                .or(event.created_at)?;
            Some(WarningSummary {
                timestamp,
                message: headline.cloned(),
                recovered: event.recovered,
                warning_type: event.warning_type.clone(),
                alert_code: event.alert_code.clone(),
            })
        })
        .collect()
}

/// Заказ в карточке устройства
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceOrderSummary {
    pub order_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub status_label: String,
    pub toner_color: Option<TonerColor>,
    pub created_at: DateTime<Utc>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub sales_order_number: Option<String>,
    /// Подпись для заказов бункера отработки
    pub waste_label: Option<String>,
}

impl From<&SupplyOrder> for DeviceOrderSummary {
    fn from(order: &SupplyOrder) -> Self {
        let waste_label = (order.order_type == OrderType::WasteToner)
            .then(|| waste_order_label(order.status).to_string());
        Self {
            order_id: order.order_id.value().to_string(),
            order_type: order.order_type,
            status: order.status,
            status_label: order.status.label().to_string(),
            toner_color: order.toner_color,
            created_at: order.created_at,
            ordered_at: order.ordered_at,
            sales_order_number: order.sales_order_number.clone(),
            waste_label,
        }
    }
}

pub fn waste_order_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Open => "Waste toner order open",
        OrderStatus::InProgress => "Waste toner in progress",
        OrderStatus::Completed => "Waste toner completed",
        OrderStatus::Archived => "Waste toner archived",
    }
}

/// Карточка устройства целиком
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDetail {
    pub device: Device,
    pub customer_label: String,
    pub order_payload: DeviceOrderPayload,
    pub warning_history: Vec<WarningSummary>,
    pub active_warning: Option<WarningSummary>,
    pub current_warning: String,
    pub recent_orders: Vec<DeviceOrderSummary>,
    pub active_waste_order: Option<DeviceOrderSummary>,
    pub active_toner_colors: Vec<TonerColor>,
}

/// Собирает карточку из уже гидратированной записи, событий и заказов
pub fn build_device_detail(
    device: Device,
    warning_events: &[WarningEventDto],
    orders: &[SupplyOrder],
) -> DeviceDetail {
    let warning_history = toner_warning_history(warning_events);
    let active_warning = warning_history
        .iter()
        .find(|entry| entry.recovered != Some(true))
        .cloned();
    let current_warning = active_warning
        .as_ref()
        .and_then(|w| w.message.clone())
        .or_else(|| device.warning_message.clone())
        .unwrap_or_else(|| NO_ACTIVE_WARNINGS.to_string());

    let recent_orders: Vec<DeviceOrderSummary> =
        orders.iter().map(DeviceOrderSummary::from).collect();
    let active_waste_order = recent_orders
        .iter()
        .find(|o| o.order_type == OrderType::WasteToner && o.status != OrderStatus::Completed)
        .cloned();

    let mut active_toner_colors: Vec<TonerColor> = Vec::new();
    for order in &recent_orders {
        if order.order_type != OrderType::Toner || order.status == OrderStatus::Completed {
            continue;
        }
        if let Some(color) = order.toner_color {
            if !active_toner_colors.contains(&color) {
                active_toner_colors.push(color);
            }
        }
    }

    let customer_label = device
        .customer_name
        .clone()
        .unwrap_or_else(|| UNASSIGNED_CUSTOMER.to_string());

    DeviceDetail {
        order_payload: order_payload(&device),
        device,
        customer_label,
        warning_history,
        active_warning,
        current_warning,
        recent_orders,
        active_waste_order,
        active_toner_colors,
    }
}

/// Данные для кнопок быстрого заказа в карточке
pub fn order_payload(device: &Device) -> DeviceOrderPayload {
    DeviceOrderPayload {
        serial_number: Some(device.serial_number.clone()),
        device_id: Some(device.order_key().to_string()),
        customer: device.customer_name.clone(),
        model: device.model.clone(),
        device_location: device.location.clone(),
        latest_receive_date: device
            .last_updated_at
            .or(device.updated_at)
            .or(device.created_at),
        updated_at: device.updated_at.or(device.last_updated_at),
        created_at: device.created_at,
        black: device.toner_k_percent,
        cyan: device.toner_c_percent,
        magenta: device.toner_m_percent,
        yellow: device.toner_y_percent,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_supply_order::aggregate::CreateOrderOptions;
    use crate::enums::OrderScope;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, h, 0, 0).unwrap()
    }

    #[test]
    fn test_hydration_prefers_gas_gage_levels() {
        let record = Device {
            serial_number: "SN1".into(),
            device_id: Some("DEV1".into()),
            department: Some("Finance".into()),
            toner_k_percent: Some(80.0),
            counter_total: Some(1200),
            ..Default::default()
        };
        assert!(needs_hydration(Some(&record)));
        assert!(needs_hydration(None));

        let gas = GasGageDevice {
            device_id: "GG1".into(),
            serial_number: "SN1".into(),
            customer: Some("Acme".into()),
            black: Some(12.0),
            cyan: Some(40.0),
            latest_receive_date: Some(ts(6)),
            ..Default::default()
        };
        let merged = hydrate_from_gas_gage(Some(record), &gas);
        assert_eq!(merged.device_id.as_deref(), Some("DEV1"));
        assert_eq!(merged.toner_k_percent, Some(12.0));
        assert_eq!(merged.toner_c_percent, Some(40.0));
        assert_eq!(merged.toner_m_percent, None);
        assert_eq!(merged.customer_name.as_deref(), Some("Acme"));
        assert_eq!(merged.department.as_deref(), Some("Finance"));
        assert_eq!(merged.counter_total, Some(1200));
        assert_eq!(merged.last_updated_at, Some(ts(6)));

        let fresh = hydrate_from_gas_gage(None, &gas);
        assert_eq!(fresh.device_id.as_deref(), Some("GG1"));
    }

    #[test]
    fn test_overlay_snapshot_and_meter() {
        let mut device = Device {
            serial_number: "SN1".into(),
            toner_y_percent: Some(55.0),
            counter_color: Some(10),
            ..Default::default()
        };
        let snapshot = TonerSnapshotDto {
            captured_at: ts(8),
            black: Some(5.0),
            waste_toner: Some(70.0),
            ..Default::default()
        };
        apply_latest_snapshot(&mut device, &snapshot);
        assert_eq!(device.toner_k_percent, Some(5.0));
        assert_eq!(device.toner_y_percent, Some(55.0));
        assert_eq!(device.waste_toner_percent, Some(70.0));
        assert_eq!(device.last_updated_at, Some(ts(8)));

        let meter = MeterReadingDto {
            captured_at: ts(9),
            printer_total: Some(500),
            black_total: Some(300),
            ..Default::default()
        };
        apply_latest_meter(&mut device, &meter);
        assert_eq!(device.counter_total, Some(500));
        assert_eq!(device.counter_mono, Some(300));
        assert_eq!(device.counter_color, Some(10));
        assert_eq!(device.last_meter_received_at, Some(ts(9)));
    }

    #[test]
    fn test_warning_history_and_orders() {
        let events = vec![
            WarningEventDto {
                message: Some("Paper jam".into()),
                received_at_server: Some(ts(10)),
                ..Default::default()
            },
            WarningEventDto {
                message: Some("Toner Low (Cyan)".into()),
                received_at_server: Some(ts(9)),
                recovered: Some(true),
                ..Default::default()
            },
            WarningEventDto {
                warning_type: Some("TONER_EMPTY".into()),
                occurred_at_device: Some(ts(8)),
                ..Default::default()
            },
            WarningEventDto {
                message: Some("toner near end".into()),
                ..Default::default()
            },
        ];

        let open_waste = SupplyOrder::new_for_insert(
            "SN1".into(),
            "Acme".into(),
            OrderScope::Waste,
            &CreateOrderOptions::default(),
        );
        let mut done_black = SupplyOrder::new_for_insert(
            "SN1".into(),
            "Acme".into(),
            OrderScope::Black,
            &CreateOrderOptions::default(),
        );
        done_black.status = OrderStatus::Completed;
        let open_cyan = SupplyOrder::new_for_insert(
            "SN1".into(),
            "Acme".into(),
            OrderScope::Cyan,
            &CreateOrderOptions::default(),
        );

        let device = Device {
            serial_number: "SN1".into(),
            ..Default::default()
        };
        let detail = build_device_detail(device, &events, &[open_waste, done_black, open_cyan]);

        assert_eq!(detail.warning_history.len(), 2);
        assert_eq!(detail.current_warning, "TONER_EMPTY");
        assert_eq!(detail.customer_label, "Unassigned");
        assert_eq!(detail.active_toner_colors, vec![TonerColor::Cyan]);
        let waste = detail.active_waste_order.expect("waste order");
        assert_eq!(waste.waste_label.as_deref(), Some("Waste toner order open"));
        assert_eq!(detail.order_payload.device_id.as_deref(), Some("SN1"));
    }
}
