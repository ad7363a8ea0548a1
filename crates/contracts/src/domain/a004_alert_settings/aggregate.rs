use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::enums::TonerColor;

/// Порог "низкого" тонера по умолчанию, %
pub const DEFAULT_TONER_THRESHOLD: f64 = 15.0;

/// Минимальный прирост уровня, считающийся заменой картриджа, %
pub const DEFAULT_REPLACEMENT_THRESHOLD: f64 = 70.0;

/// Через сколько часов без телеметрии устройство считается offline
pub const DEFAULT_OFFLINE_THRESHOLD_HOURS: i32 = 24;

/// Настройки оповещений для одного устройства (ключ - device_id Gas Gage)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAlertSettings {
    pub device_id: String,
    pub black_threshold: f64,
    pub cyan_threshold: f64,
    pub magenta_threshold: f64,
    pub yellow_threshold: f64,
    pub special_color_threshold: Option<f64>,
    pub alerts_enabled: bool,
    pub black_enabled: bool,
    pub cyan_enabled: bool,
    pub magenta_enabled: bool,
    pub yellow_enabled: bool,
    pub replacement_detection_threshold: f64,
    pub offline_alert_enabled: bool,
    pub offline_threshold_hours: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceAlertSettings {
    /// Значения по умолчанию (то, что отдаём, если в БД ничего нет)
    pub fn defaults_for(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            black_threshold: DEFAULT_TONER_THRESHOLD,
            cyan_threshold: DEFAULT_TONER_THRESHOLD,
            magenta_threshold: DEFAULT_TONER_THRESHOLD,
            yellow_threshold: DEFAULT_TONER_THRESHOLD,
            special_color_threshold: Some(DEFAULT_TONER_THRESHOLD),
            alerts_enabled: true,
            black_enabled: true,
            cyan_enabled: true,
            magenta_enabled: true,
            yellow_enabled: true,
            replacement_detection_threshold: DEFAULT_REPLACEMENT_THRESHOLD,
            offline_alert_enabled: true,
            offline_threshold_hours: DEFAULT_OFFLINE_THRESHOLD_HOURS,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn threshold(&self, color: TonerColor) -> f64 {
        match color {
            TonerColor::Black => self.black_threshold,
            TonerColor::Cyan => self.cyan_threshold,
            TonerColor::Magenta => self.magenta_threshold,
            TonerColor::Yellow => self.yellow_threshold,
        }
    }
}

// ============================================================================
// Single device
// ============================================================================

/// POST /api/device-alert-settings
///
/// Пороги приходят как произвольный JSON, чтобы отличать "не число" от
/// отсутствующего значения.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettingsDto {
    pub device_id: Option<String>,
    pub black_threshold: Value,
    pub cyan_threshold: Value,
    pub magenta_threshold: Value,
    pub yellow_threshold: Value,
    pub special_color_threshold: Option<f64>,
}

/// Проверенные пороги из запроса
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedThresholds {
    pub device_id: String,
    pub black: f64,
    pub cyan: f64,
    pub magenta: f64,
    pub yellow: f64,
    pub special_color: Option<f64>,
}

impl AlertSettingsDto {
    pub fn validate(&self) -> Result<ValidatedThresholds, String> {
        let device_id = self
            .device_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| "device_id is required".to_string())?;

        let check = |key: &str, value: &Value| -> Result<f64, String> {
            match value.as_f64() {
                Some(n) if (0.0..=100.0).contains(&n) => Ok(n),
                _ => Err(format!("{} must be a number between 0 and 100", key)),
            }
        };

        Ok(ValidatedThresholds {
            device_id: device_id.to_string(),
            black: check("black_threshold", &self.black_threshold)?,
            cyan: check("cyan_threshold", &self.cyan_threshold)?,
            magenta: check("magenta_threshold", &self.magenta_threshold)?,
            yellow: check("yellow_threshold", &self.yellow_threshold)?,
            special_color: self.special_color_threshold,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettingsSaveResponse {
    pub success: bool,
    pub data: DeviceAlertSettings,
}

// ============================================================================
// Bulk
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningAction {
    #[default]
    None,
    Mute,
    Unmute,
}

/// Пороги для пакетного обновления (любые JSON-значения, см. `sanitize_threshold`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkThresholds {
    pub black: Option<Value>,
    pub cyan: Option<Value>,
    pub magenta: Option<Value>,
    pub yellow: Option<Value>,
}

/// POST /api/device-alert-settings/bulk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkAlertSettingsRequest {
    #[serde(alias = "deviceIds")]
    pub device_ids: Vec<String>,
    #[serde(alias = "serialNumbers")]
    pub serial_numbers: Option<Vec<String>>,
    pub thresholds: Option<BulkThresholds>,
    #[serde(alias = "warningAction")]
    pub warning_action: Option<WarningAction>,
    /// Включить/выключить автоматизацию для выбранных устройств
    pub automation: Option<bool>,
}

/// Устройство, к которому применяется пакетное изменение
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkTarget {
    pub device_id: String,
    pub serial_number: String,
}

impl BulkAlertSettingsRequest {
    /// Непустые device_id из запроса
    pub fn device_ids(&self) -> Vec<String> {
        self.device_ids
            .iter()
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Серийные номера, если их столько же, сколько device_id; иначе сами device_id
    pub fn serial_numbers(&self, device_ids: &[String]) -> Vec<String> {
        match &self.serial_numbers {
            Some(serials) if serials.len() == device_ids.len() => serials.clone(),
            _ => device_ids.to_vec(),
        }
    }
}

/// Сопоставляет входные device_id с найденными по серийному номеру в Gas Gage.
///
/// Возвращает валидные цели и число пропущенных (без device_id).
pub fn resolve_bulk_targets(
    device_ids: &[String],
    serial_numbers: &[String],
    serial_to_device_id: &HashMap<String, String>,
) -> (Vec<BulkTarget>, usize) {
    let mut targets = Vec::new();
    let mut skipped = 0;

    for (index, raw_id) in device_ids.iter().enumerate() {
        let serial = serial_numbers
            .get(index)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let looked_up = if serial.is_empty() {
            None
        } else {
            serial_to_device_id.get(&serial).filter(|v| !v.is_empty())
        };
        let resolved = looked_up
            .cloned()
            .unwrap_or_else(|| raw_id.trim().to_string());

        if resolved.is_empty() {
            skipped += 1;
            continue;
        }
        targets.push(BulkTarget {
            device_id: resolved,
            serial_number: serial,
        });
    }

    (targets, skipped)
}

/// Округляет и ограничивает порог 0..100; не число -> 15
pub fn sanitize_threshold(value: Option<&Value>) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(n) if n.is_finite() => n.round().clamp(0.0, 100.0),
        _ => DEFAULT_TONER_THRESHOLD,
    }
}

impl BulkThresholds {
    /// Настройки для пакетного upsert: пороги очищены, все оповещения включены
    pub fn to_settings(&self, device_id: &str) -> DeviceAlertSettings {
        let black = sanitize_threshold(self.black.as_ref());
        DeviceAlertSettings {
            black_threshold: black,
            cyan_threshold: sanitize_threshold(self.cyan.as_ref()),
            magenta_threshold: sanitize_threshold(self.magenta.as_ref()),
            yellow_threshold: sanitize_threshold(self.yellow.as_ref()),
            special_color_threshold: Some(black),
            ..DeviceAlertSettings::defaults_for(device_id)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkAlertSettingsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,
}

impl BulkAlertSettingsResponse {
    pub fn with_skipped(skipped: usize) -> Self {
        Self {
            success: true,
            skipped: (skipped > 0).then_some(skipped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_single_settings() {
        let dto: AlertSettingsDto = serde_json::from_value(json!({
            "device_id": "DEV1",
            "black_threshold": 10,
            "cyan_threshold": 20.5,
            "magenta_threshold": 0,
            "yellow_threshold": 100
        }))
        .unwrap();
        let validated = dto.validate().unwrap();
        assert_eq!(validated.cyan, 20.5);
        assert_eq!(validated.special_color, None);

        let bad: AlertSettingsDto = serde_json::from_value(json!({
            "device_id": "DEV1",
            "black_threshold": 10,
            "cyan_threshold": "20",
            "magenta_threshold": 0,
            "yellow_threshold": 100
        }))
        .unwrap();
        assert_eq!(
            bad.validate().unwrap_err(),
            "cyan_threshold must be a number between 0 and 100"
        );

        let missing = AlertSettingsDto::default();
        assert_eq!(missing.validate().unwrap_err(), "device_id is required");
    }

    #[test]
    fn test_sanitize_threshold() {
        assert_eq!(sanitize_threshold(Some(&json!(12.6))), 13.0);
        assert_eq!(sanitize_threshold(Some(&json!(-4))), 0.0);
        assert_eq!(sanitize_threshold(Some(&json!(250))), 100.0);
        assert_eq!(sanitize_threshold(Some(&json!("x"))), 15.0);
        assert_eq!(sanitize_threshold(None), 15.0);

        let thresholds = BulkThresholds {
            black: Some(json!(22)),
            ..Default::default()
        };
        let settings = thresholds.to_settings("DEV1");
        assert_eq!(settings.special_color_threshold, Some(22.0));
        assert_eq!(settings.cyan_threshold, 15.0);
        assert!(settings.alerts_enabled && settings.yellow_enabled);
    }

    #[test]
    fn test_resolve_bulk_targets() {
        let request: BulkAlertSettingsRequest = serde_json::from_value(json!({
            "deviceIds": ["", "RAW2", "RAW3"],
            "serialNumbers": ["SN1", "SN2", ""],
            "warningAction": "mute"
        }))
        .unwrap();
        assert_eq!(request.warning_action, Some(WarningAction::Mute));

        let ids = request.device_ids();
        assert_eq!(ids.len(), 2);
        // длины не совпали -> серийники берутся из device_ids
        let serials = request.serial_numbers(&ids);
        assert_eq!(serials, ids);

        let mut lookup = HashMap::new();
        lookup.insert("SN1".to_string(), "GG1".to_string());
        let (targets, skipped) = resolve_bulk_targets(
            &["X".to_string(), " ".to_string()],
            &["SN1".to_string(), "SN9".to_string()],
            &lookup,
        );
        assert_eq!(skipped, 1);
        assert_eq!(targets[0].device_id, "GG1");
        assert_eq!(targets[0].serial_number, "SN1");

        assert_eq!(
            serde_json::to_value(BulkAlertSettingsResponse::with_skipped(0)).unwrap(),
            json!({"success": true})
        );
    }
}
