use anyhow::Result;
use chrono::Utc;
use contracts::dashboards::d400_device_status::dashboard::{
    build_dashboard, enrich_devices, DashboardFilter, DeviceDashboard,
};

use crate::domain::{a001_gas_gage, a003_supply_order, a004_alert_settings, a005_warning_override};

/// Дашборд парка: все устройства Gas Gage с настройками, подавлениями и активными заказами
pub async fn get_dashboard(filter: &DashboardFilter) -> Result<DeviceDashboard> {
    let devices = a001_gas_gage::repository::list_all().await?;
    let settings = a004_alert_settings::repository::list_all().await?;
    let overrides = a005_warning_override::repository::list_all().await?;
    let active_orders = a003_supply_order::repository::list_active().await?;

    let entries = enrich_devices(&devices, &settings, &overrides, &active_orders, Utc::now());
    Ok(build_dashboard(entries, filter))
}
