use super::repository;
use contracts::domain::a005_warning_override::aggregate::WarningOverride;
use contracts::enums::WarningScope;

use crate::domain::a001_gas_gage;

/// Подавляет все предупреждения устройства до следующей телеметрии
pub async fn dismiss(serial_number: &str) -> anyhow::Result<WarningOverride> {
    let serial = serial_number.trim();
    if serial.is_empty() {
        anyhow::bail!("Serial number is required");
    }
    let device_id = a001_gas_gage::repository::get_by_serial(serial)
        .await?
        .map(|d| d.device_id);

    let item = WarningOverride::dismiss(serial, device_id, WarningScope::All);
    repository::upsert_many(std::slice::from_ref(&item)).await?;
    tracing::info!("Warnings dismissed for {}", serial);
    Ok(item)
}

/// Снимает подавление `all`
pub async fn restore(serial_number: &str) -> anyhow::Result<bool> {
    let serial = serial_number.trim();
    if serial.is_empty() {
        anyhow::bail!("Serial number is required");
    }
    let removed = repository::delete_for_serials(&[serial.to_string()], WarningScope::All).await?;
    tracing::info!("Warnings restored for {} ({} override(s) removed)", serial, removed);
    Ok(removed > 0)
}

/// Пакетное подавление: старые записи `all` заменяются свежими
pub async fn mute_many(targets: &[(String, Option<String>)]) -> anyhow::Result<()> {
    let serials: Vec<String> = targets.iter().map(|(serial, _)| serial.clone()).collect();
    repository::delete_for_serials(&serials, WarningScope::All).await?;

    let overrides: Vec<WarningOverride> = targets
        .iter()
        .map(|(serial, device_id)| WarningOverride::dismiss(serial, device_id.clone(), WarningScope::All))
        .collect();
    repository::upsert_many(&overrides).await
}

pub async fn unmute_many(serials: &[String]) -> anyhow::Result<u64> {
    repository::delete_for_serials(serials, WarningScope::All).await
}

