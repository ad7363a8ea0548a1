use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::status::{
    compute_device_status, compute_muted_scopes, compute_toner_snapshots, needs_attention,
    TonerSnapshot,
};
use crate::domain::a001_gas_gage::aggregate::GasGageDevice;
use crate::domain::a003_supply_order::aggregate::{active_order_scopes, scopes_for_device, SupplyOrder};
use crate::domain::a004_alert_settings::aggregate::DeviceAlertSettings;
use crate::domain::a005_warning_override::aggregate::WarningOverride;
use crate::enums::{DeviceStatus, WarningScope};
use crate::shared::format::format_relative_time;

/// Устройство с вычисленным состоянием для списка на дашборде
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceOverview {
    pub device: GasGageDevice,
    pub toner_levels: Vec<TonerSnapshot>,
    pub status: DeviceStatus,
    pub status_label: String,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_updated_label: String,
    pub muted_scopes: Vec<WarningScope>,
    pub active_order_scopes: Vec<String>,
    pub can_dismiss: bool,
    pub can_restore: bool,
    pub has_active_order: bool,
    pub needs_attention: bool,
    pub automation_enabled: bool,
    pub customer_label: String,
}

impl DeviceOverview {
    fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let haystack = [
            self.customer_label.as_str(),
            self.device.model.as_deref().unwrap_or(""),
            self.device.serial_number.as_str(),
            self.device.device_id.as_str(),
            self.device.device_location.as_deref().unwrap_or(""),
        ]
        .join(" ")
        .to_lowercase();
        haystack.contains(term)
    }
}

/// Обогащает строки Gas Gage статусами, подавлениями и активными заказами
pub fn enrich_devices(
    devices: &[GasGageDevice],
    settings: &[DeviceAlertSettings],
    overrides: &[WarningOverride],
    active_orders: &[SupplyOrder],
    now: DateTime<Utc>,
) -> Vec<DeviceOverview> {
    let settings_by_device: HashMap<&str, &DeviceAlertSettings> = settings
        .iter()
        .filter(|s| !s.device_id.trim().is_empty())
        .map(|s| (s.device_id.trim(), s))
        .collect();

    let mut overrides_by_serial: HashMap<&str, Vec<WarningOverride>> = HashMap::new();
    for o in overrides {
        let key = o.serial_number.trim();
        if key.is_empty() {
            continue;
        }
        overrides_by_serial.entry(key).or_default().push(o.clone());
    }

    let order_scopes = active_order_scopes(active_orders);

    devices
        .iter()
        .map(|device| {
            let device_id = device.trimmed_device_id();
            let serial = device.trimmed_serial();
            let device_settings = if device_id.is_empty() {
                None
            } else {
                settings_by_device.get(device_id).copied()
            };
            let device_overrides = overrides_by_serial
                .get(serial)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let muted_scopes = compute_muted_scopes(device, device_overrides, now);
            let combined = scopes_for_device(&order_scopes, serial, device_id);
            let has_active_order = !combined.is_empty();
            let toner_levels = compute_toner_snapshots(
                device,
                device_settings,
                &muted_scopes,
                has_active_order.then_some(&combined),
            );
            let status = compute_device_status(&toner_levels, &muted_scopes);
            let mute_all = muted_scopes.contains(&WarningScope::All);
            let last_updated_at = device.last_updated_at();

            DeviceOverview {
                device: device.clone(),
                status,
                status_label: status.label().to_string(),
                last_updated_at,
                last_updated_label: format_relative_time(last_updated_at, now),
                can_dismiss: status != DeviceStatus::Ok && !mute_all && !serial.is_empty(),
                can_restore: mute_all && !serial.is_empty(),
                has_active_order,
                needs_attention: needs_attention(status, &toner_levels),
                automation_enabled: device_settings.map(|s| s.alerts_enabled).unwrap_or(true),
                customer_label: device.customer_label(),
                active_order_scopes: combined.into_iter().collect::<BTreeSet<_>>().into_iter().collect(),
                muted_scopes,
                toner_levels,
            }
        })
        .collect()
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionFilter {
    #[default]
    NeedsAttention,
    ActiveOrders,
    All,
}

impl AttentionFilter {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "needs_attention" => Some(AttentionFilter::NeedsAttention),
            "active_orders" => Some(AttentionFilter::ActiveOrders),
            "all" => Some(AttentionFilter::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationFilter {
    All,
    #[default]
    Auto,
    Manual,
}

impl AutomationFilter {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "all" => Some(AutomationFilter::All),
            "auto" => Some(AutomationFilter::Auto),
            "manual" => Some(AutomationFilter::Manual),
            _ => None,
        }
    }

    fn accepts(&self, automation_enabled: bool) -> bool {
        match self {
            AutomationFilter::All => true,
            AutomationFilter::Auto => automation_enabled,
            AutomationFilter::Manual => !automation_enabled,
        }
    }
}

/// Фильтры дашборда. `None` у статуса и заказчика означает "все".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFilter {
    pub status: Option<DeviceStatus>,
    pub attention: AttentionFilter,
    pub customer: Option<String>,
    pub automation: AutomationFilter,
    pub search: String,
}

impl DashboardFilter {
    /// Фильтры, не зависящие от автоматизации
    fn accepts(&self, entry: &DeviceOverview, term: &str) -> bool {
        match self.attention {
            AttentionFilter::NeedsAttention if !entry.needs_attention => return false,
            AttentionFilter::ActiveOrders if !entry.has_active_order => return false,
            _ => {}
        }
        if matches!(self.status, Some(status) if status != entry.status) {
            return false;
        }
        if !self.accepts_customer(entry) {
            return false;
        }
        entry.matches_search(term)
    }

    fn accepts_customer(&self, entry: &DeviceOverview) -> bool {
        match &self.customer {
            Some(customer) => &entry.customer_label == customer,
            None => true,
        }
    }
}

/// GET /api/devices (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub attention: Option<String>,
    pub customer: Option<String>,
    pub automation: Option<String>,
    pub search: Option<String>,
}

impl DashboardQuery {
    pub fn into_filter(self) -> Result<DashboardFilter, String> {
        let status = match non_all(self.status.as_deref()) {
            None => None,
            Some(code) => Some(
                DeviceStatus::from_code(code)
                    .ok_or_else(|| format!("Invalid status filter: {}", code))?,
            ),
        };
        let attention = match self.attention.as_deref() {
            None => AttentionFilter::default(),
            Some(code) => AttentionFilter::from_code(code)
                .ok_or_else(|| format!("Invalid attention filter: {}", code))?,
        };
        let automation = match self.automation.as_deref() {
            None => AutomationFilter::default(),
            Some(code) => AutomationFilter::from_code(code)
                .ok_or_else(|| format!("Invalid automation filter: {}", code))?,
        };
        Ok(DashboardFilter {
            status,
            attention,
            customer: non_all(self.customer.as_deref()).map(str::to_string),
            automation,
            search: self.search.unwrap_or_default(),
        })
    }
}

fn non_all(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "all")
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub ok: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionCounts {
    pub needs_attention: usize,
    pub active_orders: usize,
    pub all: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDashboard {
    pub counts: StatusCounts,
    pub attention_counts: AttentionCounts,
    pub customer_options: Vec<String>,
    pub devices: Vec<DeviceOverview>,
    /// Устройств после фильтров автоматизации и заказчика
    pub total_visible: usize,
    /// Ручные устройства, скрытые фильтром `auto`
    pub hidden_manual_count: usize,
}

/// Применяет фильтры и сортировку к обогащённому списку
pub fn build_dashboard(entries: Vec<DeviceOverview>, filter: &DashboardFilter) -> DeviceDashboard {
    let customer_options: Vec<String> = entries
        .iter()
        .map(|e| e.customer_label.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // заказчик, которого нет в списке, сбрасывается в "все"
    let mut filter = filter.clone();
    if matches!(&filter.customer, Some(c) if !customer_options.contains(c)) {
        filter.customer = None;
    }

    let term = filter.search.trim().to_lowercase();

    let visible: Vec<&DeviceOverview> = entries
        .iter()
        .filter(|e| filter.automation.accepts(e.automation_enabled))
        .filter(|e| filter.accepts_customer(e))
        .collect();

    let mut counts = StatusCounts::default();
    let mut attention_counts = AttentionCounts::default();
    for entry in &visible {
        counts.total += 1;
        match entry.status {
            DeviceStatus::Critical => counts.critical += 1,
            DeviceStatus::Warning => counts.warning += 1,
            DeviceStatus::Ok => counts.ok += 1,
        }
        if entry.needs_attention {
            attention_counts.needs_attention += 1;
        }
        if entry.has_active_order {
            attention_counts.active_orders += 1;
        }
    }
    attention_counts.all = counts.total;

    let hidden_manual_count = if filter.automation == AutomationFilter::Auto {
        entries
            .iter()
            .filter(|e| !e.automation_enabled && filter.accepts(e, &term))
            .count()
    } else {
        0
    };

    let mut devices: Vec<DeviceOverview> = visible
        .into_iter()
        .filter(|e| filter.accepts(e, &term))
        .cloned()
        .collect();
    devices.sort_by(|a, b| {
        a.status
            .sort_rank()
            .cmp(&b.status.sort_rank())
            .then_with(|| a.customer_label.to_lowercase().cmp(&b.customer_label.to_lowercase()))
    });

    DeviceDashboard {
        total_visible: counts.total,
        counts,
        attention_counts,
        customer_options,
        devices,
        hidden_manual_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_supply_order::aggregate::CreateOrderOptions;
    use crate::enums::OrderScope;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap()
    }

    fn gas(device_id: &str, serial: &str, customer: &str, levels: [f64; 4]) -> GasGageDevice {
        GasGageDevice {
            device_id: device_id.into(),
            serial_number: serial.into(),
            customer: Some(customer.into()),
            model: Some("bizhub C300i".into()),
            black: Some(levels[0]),
            cyan: Some(levels[1]),
            magenta: Some(levels[2]),
            yellow: Some(levels[3]),
            latest_receive_date: Some(now() - chrono::Duration::hours(3)),
            ..Default::default()
        }
    }

    fn fleet() -> Vec<DeviceOverview> {
        let devices = vec![
            gas("D1", "S1", "Zeta", [0.0, 60.0, 60.0, 60.0]),
            gas("D2", "S2", "Acme", [10.0, 60.0, 60.0, 60.0]),
            gas("D3", "S3", "Acme", [80.0, 60.0, 60.0, 60.0]),
            gas("D4", "S4", "Beta", [5.0, 60.0, 60.0, 60.0]),
            gas("D5", "S5", " ", [12.0, 60.0, 60.0, 60.0]),
        ];
        let mut manual = DeviceAlertSettings::defaults_for("D4");
        manual.alerts_enabled = false;

        let order = SupplyOrder::new_for_insert(
            "S2".into(),
            "Acme".into(),
            OrderScope::Black,
            &CreateOrderOptions::default(),
        );
        let mute = WarningOverride::dismiss("S5", Some("D5".into()), WarningScope::All);

        enrich_devices(&devices, &[manual], &[mute], &[order], now())
    }

    #[test]
    fn test_enrich_devices() {
        let entries = fleet();
        assert_eq!(entries[0].status, DeviceStatus::Critical);
        assert!(entries[0].can_dismiss);
        assert_eq!(entries[0].last_updated_label, "3h ago");

        assert_eq!(entries[1].status, DeviceStatus::Warning);
        assert!(entries[1].has_active_order);
        assert!(!entries[1].needs_attention);
        assert_eq!(entries[1].active_order_scopes, vec!["black".to_string()]);

        assert_eq!(entries[2].status, DeviceStatus::Ok);
        assert!(!entries[2].can_dismiss);

        assert!(!entries[3].automation_enabled);

        assert_eq!(entries[4].status, DeviceStatus::Ok);
        assert_eq!(entries[4].customer_label, "Unassigned");
        assert!(entries[4].can_restore);
        assert!(!entries[4].can_dismiss);
    }

    #[test]
    fn test_build_dashboard_default_filter() {
        let dashboard = build_dashboard(fleet(), &DashboardFilter::default());

        assert_eq!(dashboard.counts.total, 4);
        assert_eq!(dashboard.counts.critical, 1);
        assert_eq!(dashboard.counts.warning, 1);
        assert_eq!(dashboard.counts.ok, 2);
        assert_eq!(dashboard.attention_counts.needs_attention, 1);
        assert_eq!(dashboard.attention_counts.active_orders, 1);
        assert_eq!(dashboard.hidden_manual_count, 1);
        assert_eq!(
            dashboard.customer_options,
            vec!["Acme", "Beta", "Unassigned", "Zeta"]
        );

        let serials: Vec<&str> = dashboard
            .devices
            .iter()
            .map(|d| d.device.serial_number.as_str())
            .collect();
        assert_eq!(serials, vec!["S1"]);
    }

    #[test]
    fn test_build_dashboard_all_sorted() {
        let filter = DashboardQuery {
            attention: Some("all".into()),
            automation: Some("all".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        let dashboard = build_dashboard(fleet(), &filter);
        let serials: Vec<&str> = dashboard
            .devices
            .iter()
            .map(|d| d.device.serial_number.as_str())
            .collect();
        assert_eq!(serials, vec!["S1", "S2", "S4", "S3", "S5"]);
        assert_eq!(dashboard.hidden_manual_count, 0);

        let filter = DashboardFilter {
            attention: AttentionFilter::All,
            automation: AutomationFilter::All,
            customer: Some("Acme".into()),
            search: "s3".into(),
            ..Default::default()
        };
        let dashboard = build_dashboard(fleet(), &filter);
        assert_eq!(dashboard.devices.len(), 1);
        assert_eq!(dashboard.total_visible, 2);
    }

    #[test]
    fn test_query_validation() {
        let err = DashboardQuery {
            status: Some("broken".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap_err();
        assert!(err.contains("broken"));

        let filter = DashboardQuery {
            status: Some("all".into()),
            customer: Some("all".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.status, None);
        assert_eq!(filter.customer, None);
    }
}
