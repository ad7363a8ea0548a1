use super::repository;
use contracts::domain::a002_device::detail::{
    apply_latest_meter, apply_latest_snapshot, build_device_detail, hydrate_from_gas_gage,
    needs_hydration, DeviceDetail, RECENT_ORDERS_LIMIT, WARNING_HISTORY_LIMIT,
};

use crate::domain::{a001_gas_gage, a003_supply_order};
use crate::projections::{p900_toner_snapshots, p901_meter_readings, p902_warning_events};

/// Карточка устройства: запись a002, дополненная данными Gas Gage,
/// последним снимком тонера, счётчиками, историей предупреждений и заказами.
///
/// `None`, если устройство не найдено ни в a002, ни в Gas Gage.
pub async fn get_device_detail(serial_number: &str) -> anyhow::Result<Option<DeviceDetail>> {
    let serial = serial_number.trim();
    if serial.is_empty() {
        return Ok(None);
    }

    let record = repository::get_by_serial(serial).await?;
    let gas = if needs_hydration(record.as_ref()) {
        a001_gas_gage::repository::get_by_serial(serial).await?
    } else {
        None
    };
    let mut device = match (record, gas) {
        (record, Some(gas)) => hydrate_from_gas_gage(record, &gas),
        (Some(device), None) => device,
        (None, None) => return Ok(None),
    };

    let device_id = device.device_id.clone();
    if let Some(snapshot) = p900_toner_snapshots::repository::get_latest_for_device(serial, device_id.as_deref()).await? {
        apply_latest_snapshot(&mut device, &snapshot);
    }
    if let Some(meter) = p901_meter_readings::repository::get_latest_for_device(serial, device_id.as_deref()).await? {
        apply_latest_meter(&mut device, &meter);
    }

    let warnings =
        p902_warning_events::repository::list_recent_for_device(serial, device_id.as_deref(), WARNING_HISTORY_LIMIT)
            .await?;

    let mut keys = vec![serial.to_string()];
    if let Some(id) = device_id.filter(|id| !id.is_empty() && id != serial) {
        keys.push(id);
    }
    let orders = a003_supply_order::repository::list_recent_for_device(&keys, RECENT_ORDERS_LIMIT).await?;

    Ok(Some(build_device_detail(device, &warnings, &orders)))
}
