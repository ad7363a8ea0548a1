use super::repository;
use contracts::domain::a004_alert_settings::aggregate::{
    resolve_bulk_targets, BulkAlertSettingsRequest, BulkAlertSettingsResponse, DeviceAlertSettings,
    ValidatedThresholds, WarningAction,
};

use crate::domain::{a001_gas_gage, a005_warning_override};

/// Настройки устройства; если в БД ничего нет - значения по умолчанию
pub async fn get(device_id: &str) -> anyhow::Result<DeviceAlertSettings> {
    Ok(repository::get(device_id)
        .await?
        .unwrap_or_else(|| DeviceAlertSettings::defaults_for(device_id)))
}

/// Сохраняет пороги одного устройства, остальные поля берутся из текущей записи
pub async fn save(thresholds: ValidatedThresholds) -> anyhow::Result<DeviceAlertSettings> {
    let current = get(&thresholds.device_id).await?;
    let settings = DeviceAlertSettings {
        black_threshold: thresholds.black,
        cyan_threshold: thresholds.cyan,
        magenta_threshold: thresholds.magenta,
        yellow_threshold: thresholds.yellow,
        special_color_threshold: thresholds.special_color,
        ..current
    };
    repository::upsert(&settings).await
}

/// Пакетное обновление порогов, подавлений и автоматизации.
///
/// `None`, если ни одно устройство из запроса не удалось сопоставить.
pub async fn bulk_update(
    request: &BulkAlertSettingsRequest,
) -> anyhow::Result<Option<BulkAlertSettingsResponse>> {
    let device_ids = request.device_ids();
    let serials = request.serial_numbers(&device_ids);

    let lookup_serials: Vec<String> = serials
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let serial_to_device_id = a001_gas_gage::repository::map_serials_to_device_ids(&lookup_serials).await?;

    let (targets, skipped) = resolve_bulk_targets(&device_ids, &serials, &serial_to_device_id);
    if targets.is_empty() {
        return Ok(None);
    }
    let target_ids: Vec<String> = targets.iter().map(|t| t.device_id.clone()).collect();

    if let Some(thresholds) = &request.thresholds {
        let settings: Vec<DeviceAlertSettings> = targets
            .iter()
            .map(|t| {
                let mut s = thresholds.to_settings(&t.device_id);
                if let Some(enabled) = request.automation {
                    s.alerts_enabled = enabled;
                }
                s
            })
            .collect();
        repository::upsert_many(&settings).await?;
    } else if let Some(enabled) = request.automation {
        let existing = repository::get_many(&target_ids).await?;
        let settings: Vec<DeviceAlertSettings> = target_ids
            .iter()
            .map(|id| DeviceAlertSettings {
                alerts_enabled: enabled,
                ..existing
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| DeviceAlertSettings::defaults_for(id))
            })
            .collect();
        repository::upsert_many(&settings).await?;
    }

    let override_serials: Vec<(String, Option<String>)> = targets
        .iter()
        .filter(|t| !t.serial_number.is_empty())
        .map(|t| (t.serial_number.clone(), Some(t.device_id.clone())))
        .collect();
    match request.warning_action.unwrap_or_default() {
        WarningAction::Mute => a005_warning_override::service::mute_many(&override_serials).await?,
        WarningAction::Unmute => {
            let serials: Vec<String> = override_serials.into_iter().map(|(s, _)| s).collect();
            a005_warning_override::service::unmute_many(&serials).await?;
        }
        WarningAction::None => {}
    }

    tracing::info!(
        "Bulk alert settings applied to {} device(s), skipped {}",
        targets.len(),
        skipped
    );
    Ok(Some(BulkAlertSettingsResponse::with_skipped(skipped)))
}
