use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a001_gas_gage::aggregate::GasGageDevice;
use contracts::domain::a004_alert_settings::aggregate::DeviceAlertSettings;
use contracts::enums::ConnectionEventType;
use contracts::projections::p905_connection_events::dto::ConnectionEventDto;
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u502_connectivity_check::{
    evaluate_connectivity, ConnectivityCheck, ConnectionEventsQuery, ConnectivityCheckResponse, ConnectivityInput,
    ConnectivityTransition,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{a001_gas_gage, a004_alert_settings};
use crate::projections::p905_connection_events::repository;

const DEFAULT_EVENTS_LIMIT: u64 = 100;
const MAX_EVENTS_LIMIT: u64 = 1000;

fn new_event(
    device: &GasGageDevice,
    event_type: ConnectionEventType,
    now: DateTime<Utc>,
) -> ConnectionEventDto {
    ConnectionEventDto {
        id: Uuid::new_v4().to_string(),
        device_id: Some(device.device_id.clone()),
        serial_number: Some(device.trimmed_serial().to_string()),
        event_type,
        last_seen_at: device.last_updated_at(),
        detected_at: now,
        resolved_at: None,
        duration_hours: None,
        notes: None,
    }
}

fn connectivity_input(
    device: &GasGageDevice,
    settings: Option<&DeviceAlertSettings>,
    open: Option<&ConnectionEventDto>,
) -> ConnectivityInput {
    ConnectivityInput {
        last_seen_at: device.last_updated_at(),
        offline_alert_enabled: settings.map_or(true, |s| s.offline_alert_enabled),
        offline_threshold_hours: settings.map(|s| s.offline_threshold_hours),
        open_offline_since: open.map(|e| e.detected_at),
    }
}

/// Один прогон проверки связи по всем устройствам
pub async fn run_connectivity_check(now: DateTime<Utc>) -> Result<ConnectivityCheckResponse> {
    let devices = a001_gas_gage::repository::list_all().await?;
    let settings: HashMap<String, DeviceAlertSettings> = a004_alert_settings::repository::list_all()
        .await?
        .into_iter()
        .map(|s| (s.device_id.clone(), s))
        .collect();
    let open = repository::list_open_offline().await?;
    tracing::info!(
        "{}: checking {} devices, {} open offline events",
        ConnectivityCheck::full_name(),
        devices.len(),
        open.len()
    );

    let mut response = ConnectivityCheckResponse::default();
    for device in &devices {
        let serial = device.trimmed_serial();
        if serial.is_empty() {
            continue;
        }
        response.checked += 1;

        let open_event = open.get(serial);
        let input = connectivity_input(device, settings.get(&device.device_id), open_event);

        match evaluate_connectivity(&input, now) {
            ConnectivityTransition::WentOffline { last_seen_at } => {
                let mut event = new_event(device, ConnectionEventType::WentOffline, now);
                event.last_seen_at = last_seen_at;
                repository::insert(&event).await?;
                tracing::warn!("Device {} went offline (last seen {:?})", serial, last_seen_at);
                response.went_offline += 1;
                response.events.push(event);
            }
            ConnectivityTransition::Restored { duration_hours } => {
                if let Some(open_event) = open_event {
                    repository::resolve(&open_event.id, now, duration_hours).await?;
                }
                let mut event = new_event(device, ConnectionEventType::ConnectionRestored, now);
                event.duration_hours = Some(duration_hours);
                repository::insert(&event).await?;
                tracing::info!("Device {} is back online after {:.2}h", serial, duration_hours);
                response.restored += 1;
                response.events.push(event);
            }
            ConnectivityTransition::Unchanged => {}
        }
    }

    Ok(response)
}

/// Журнал событий связи, новые сверху
pub async fn list_events(query: &ConnectionEventsQuery) -> Result<Vec<ConnectionEventDto>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENTS_LIMIT)
        .clamp(1, MAX_EVENTS_LIMIT);
    repository::list_recent(query.serial_number.as_deref(), limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn device(hours_ago: i64) -> GasGageDevice {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        GasGageDevice {
            device_id: "D-1".into(),
            serial_number: " S-1 ".into(),
            latest_receive_date: Some(now - Duration::hours(hours_ago)),
            ..Default::default()
        }
    }

    #[test]
    fn test_input_uses_device_settings() {
        let mut settings = DeviceAlertSettings::defaults_for("D-1");
        settings.offline_alert_enabled = false;
        settings.offline_threshold_hours = 6;

        let input = connectivity_input(&device(3), Some(&settings), None);
        assert!(!input.offline_alert_enabled);
        assert_eq!(input.offline_threshold_hours, Some(6));

        let defaults = connectivity_input(&device(3), None, None);
        assert!(defaults.offline_alert_enabled);
        assert_eq!(defaults.offline_threshold_hours, None);
    }

    #[test]
    fn test_event_carries_trimmed_serial() {
        let now = Utc::now();
        let event = new_event(&device(30), ConnectionEventType::WentOffline, now);
        assert_eq!(event.serial_number.as_deref(), Some("S-1"));
        assert_eq!(event.detected_at, now);
        assert!(event.resolved_at.is_none());
    }
}
