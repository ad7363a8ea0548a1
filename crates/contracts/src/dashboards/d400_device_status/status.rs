//! Вычисление состояния устройства по уровням тонера, порогам и подавлениям.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::a001_gas_gage::aggregate::GasGageDevice;
use crate::domain::a004_alert_settings::aggregate::{DeviceAlertSettings, DEFAULT_TONER_THRESHOLD};
use crate::domain::a005_warning_override::aggregate::WarningOverride;
use crate::enums::{DeviceStatus, TonerColor, WarningScope};
use crate::shared::format::{format_percent, toner_status_level, TonerStatusLevel};

/// Состояние одного цвета тонера для карточки устройства
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonerSnapshot {
    pub key: TonerColor,
    pub label: String,
    pub value: Option<f64>,
    /// "42%" или "--"
    pub display: String,
    pub gauge: TonerStatusLevel,
    pub threshold: f64,
    pub muted: bool,
    pub has_active_order: bool,
}

impl TonerSnapshot {
    /// Уровень требует внимания: неизвестен, ноль или не выше порога
    pub fn is_alerting(&self) -> bool {
        match self.value {
            None => true,
            Some(v) => v == 0.0 || v <= self.threshold,
        }
    }
}

/// Нормализует процент: None для NaN/бесконечности, иначе обрезка в 0..100
pub fn extract_percentage(value: Option<f64>) -> Option<f64> {
    let v = value?;
    if !v.is_finite() {
        return None;
    }
    Some(v.clamp(0.0, 100.0))
}

/// Действующие подавления устройства (без повторов, в порядке появления)
pub fn compute_muted_scopes(
    device: &GasGageDevice,
    overrides: &[WarningOverride],
    now: DateTime<Utc>,
) -> Vec<WarningScope> {
    let last_updated = device.last_updated_at();
    let mut seen = HashSet::new();
    let mut scopes = Vec::new();

    for o in overrides {
        if !o.is_active(last_updated, now) {
            continue;
        }
        if seen.insert(o.scope) {
            scopes.push(o.scope);
        }
    }
    scopes
}

/// Четыре снимка тонера (K, C, M, Y) с порогами, подавлением и активными заказами
pub fn compute_toner_snapshots(
    device: &GasGageDevice,
    settings: Option<&DeviceAlertSettings>,
    muted: &[WarningScope],
    active_order_scopes: Option<&HashSet<String>>,
) -> Vec<TonerSnapshot> {
    let mute_all = muted.contains(&WarningScope::All);

    TonerColor::ALL
        .iter()
        .map(|&color| {
            let value = extract_percentage(device.level(color));
            TonerSnapshot {
                key: color,
                label: color.label().to_string(),
                value,
                display: format_percent(value),
                gauge: toner_status_level(value),
                threshold: settings
                    .map(|s| s.threshold(color))
                    .unwrap_or(DEFAULT_TONER_THRESHOLD),
                muted: mute_all || muted.contains(&WarningScope::from(color)),
                has_active_order: active_order_scopes
                    .map(|scopes| scopes.contains(color.code()))
                    .unwrap_or(false),
            }
        })
        .collect()
}

/// critical если хоть один неподавленный уровень равен 0; warning если
/// неизвестен или не выше порога; иначе ok. Подавление `all` даёт ok.
pub fn compute_device_status(levels: &[TonerSnapshot], muted: &[WarningScope]) -> DeviceStatus {
    if muted.contains(&WarningScope::All) {
        return DeviceStatus::Ok;
    }

    let unmuted = || levels.iter().filter(|level| !level.muted);

    if unmuted().any(|level| level.value == Some(0.0)) {
        return DeviceStatus::Critical;
    }
    if unmuted().any(|level| match level.value {
        None => true,
        Some(v) => v <= level.threshold,
    }) {
        return DeviceStatus::Warning;
    }
    DeviceStatus::Ok
}

/// Нужны ли действия оператора: есть тревожный цвет без активного заказа
pub fn needs_attention(status: DeviceStatus, levels: &[TonerSnapshot]) -> bool {
    status != DeviceStatus::Ok
        && levels
            .iter()
            .any(|level| !level.muted && level.is_alerting() && !level.has_active_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn device(levels: [Option<f64>; 4]) -> GasGageDevice {
        GasGageDevice {
            device_id: "DEV1".into(),
            serial_number: "SN1".into(),
            black: levels[0],
            cyan: levels[1],
            magenta: levels[2],
            yellow: levels[3],
            ..Default::default()
        }
    }

    fn override_at(scope: WarningScope, dismissed_at: DateTime<Utc>) -> WarningOverride {
        WarningOverride {
            id: "o".into(),
            device_id: None,
            serial_number: "SN1".into(),
            scope,
            dismissed_at,
            expires_at: None,
            created_at: dismissed_at,
            updated_at: dismissed_at,
        }
    }

    #[test]
    fn test_extract_percentage() {
        assert_eq!(extract_percentage(None), None);
        assert_eq!(extract_percentage(Some(f64::NAN)), None);
        assert_eq!(extract_percentage(Some(f64::INFINITY)), None);
        assert_eq!(extract_percentage(Some(-3.0)), Some(0.0));
        assert_eq!(extract_percentage(Some(140.0)), Some(100.0));
        assert_eq!(extract_percentage(Some(42.5)), Some(42.5));
    }

    #[test]
    fn test_status_levels() {
        let d = device([Some(0.0), Some(50.0), Some(50.0), Some(50.0)]);
        let snaps = compute_toner_snapshots(&d, None, &[], None);
        assert_eq!(compute_device_status(&snaps, &[]), DeviceStatus::Critical);

        let d = device([Some(15.0), Some(50.0), Some(50.0), Some(50.0)]);
        let snaps = compute_toner_snapshots(&d, None, &[], None);
        assert_eq!(compute_device_status(&snaps, &[]), DeviceStatus::Warning);

        let d = device([Some(16.0), Some(50.0), None, Some(50.0)]);
        let snaps = compute_toner_snapshots(&d, None, &[], None);
        assert_eq!(compute_device_status(&snaps, &[]), DeviceStatus::Warning);

        let d = device([Some(16.0), Some(50.0), Some(90.0), Some(50.0)]);
        let snaps = compute_toner_snapshots(&d, None, &[], None);
        assert_eq!(compute_device_status(&snaps, &[]), DeviceStatus::Ok);
    }

    #[test]
    fn test_custom_threshold_and_color_mute() {
        let d = device([Some(0.0), Some(25.0), Some(50.0), Some(50.0)]);
        let mut settings = DeviceAlertSettings::defaults_for("DEV1");
        settings.cyan_threshold = 30.0;

        let muted = vec![WarningScope::Black];
        let snaps = compute_toner_snapshots(&d, Some(&settings), &muted, None);
        assert!(snaps[0].muted);
        assert_eq!(snaps[1].threshold, 30.0);
        assert_eq!(snaps[1].display, "25%");
        assert_eq!(snaps[1].gauge, TonerStatusLevel::Warning);
        assert_eq!(snaps[0].gauge, TonerStatusLevel::Critical);
        assert_eq!(compute_device_status(&snaps, &muted), DeviceStatus::Warning);

        let all = vec![WarningScope::All];
        let snaps = compute_toner_snapshots(&d, Some(&settings), &all, None);
        assert!(snaps.iter().all(|s| s.muted));
        assert_eq!(compute_device_status(&snaps, &all), DeviceStatus::Ok);
    }

    #[test]
    fn test_muted_scopes_respect_expiry_and_new_telemetry() {
        let now = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        let mut d = device([None; 4]);
        d.latest_receive_date = Some(now - Duration::hours(2));

        let mut expired = override_at(WarningScope::Cyan, now - Duration::hours(1));
        expired.expires_at = Some(now);
        let overrides = vec![
            override_at(WarningScope::All, now - Duration::hours(1)),
            override_at(WarningScope::All, now - Duration::minutes(30)),
            override_at(WarningScope::Black, now - Duration::hours(3)),
            expired,
        ];

        let scopes = compute_muted_scopes(&d, &overrides, now);
        assert_eq!(scopes, vec![WarningScope::All]);
    }

    #[test]
    fn test_needs_attention_ignores_colors_with_orders() {
        let d = device([Some(5.0), Some(50.0), Some(50.0), Some(50.0)]);
        let scopes: HashSet<String> = ["black".to_string()].into_iter().collect();

        let snaps = compute_toner_snapshots(&d, None, &[], Some(&scopes));
        let status = compute_device_status(&snaps, &[]);
        assert_eq!(status, DeviceStatus::Warning);
        assert!(snaps[0].has_active_order);
        assert!(!needs_attention(status, &snaps));

        let snaps = compute_toner_snapshots(&d, None, &[], None);
        assert!(needs_attention(status, &snaps));
    }
}
