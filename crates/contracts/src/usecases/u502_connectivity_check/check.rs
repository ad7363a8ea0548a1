use chrono::{DateTime, Duration, Utc};

use crate::domain::a004_alert_settings::aggregate::DEFAULT_OFFLINE_THRESHOLD_HOURS;

/// Переход состояния связи, который нужно записать
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectivityTransition {
    /// Устройство впервые превысило порог молчания
    WentOffline { last_seen_at: Option<DateTime<Utc>> },
    /// Открытое событие offline закрывается; длительность в часах
    Restored { duration_hours: f64 },
    Unchanged,
}

/// Входные данные проверки одного устройства
#[derive(Debug, Clone, Copy)]
pub struct ConnectivityInput {
    pub last_seen_at: Option<DateTime<Utc>>,
    pub offline_alert_enabled: bool,
    pub offline_threshold_hours: Option<i32>,
    /// detected_at открытого события went_offline, если оно есть
    pub open_offline_since: Option<DateTime<Utc>>,
}

impl ConnectivityInput {
    fn threshold(&self) -> Duration {
        let hours = self
            .offline_threshold_hours
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_OFFLINE_THRESHOLD_HOURS);
        Duration::hours(hours as i64)
    }

    /// Устройство без телеметрии считается offline
    pub fn is_offline(&self, now: DateTime<Utc>) -> bool {
        match self.last_seen_at {
            Some(seen) => now - seen > self.threshold(),
            None => true,
        }
    }
}

pub fn evaluate_connectivity(input: &ConnectivityInput, now: DateTime<Utc>) -> ConnectivityTransition {
    if !input.offline_alert_enabled {
        return ConnectivityTransition::Unchanged;
    }

    let offline = input.is_offline(now);
    match (input.open_offline_since, offline) {
        (None, true) => ConnectivityTransition::WentOffline {
            last_seen_at: input.last_seen_at,
        },
        (Some(since), false) => {
            let minutes = (now - since).num_minutes().max(0) as f64;
            ConnectivityTransition::Restored {
                duration_hours: (minutes / 60.0 * 100.0).round() / 100.0,
            }
        }
        _ => ConnectivityTransition::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn input(hours_ago: Option<i64>, open_since: Option<i64>) -> ConnectivityInput {
        ConnectivityInput {
            last_seen_at: hours_ago.map(|h| now() - Duration::hours(h)),
            offline_alert_enabled: true,
            offline_threshold_hours: None,
            open_offline_since: open_since.map(|h| now() - Duration::hours(h)),
        }
    }

    #[test]
    fn test_goes_offline_after_threshold() {
        assert_eq!(evaluate_connectivity(&input(Some(23), None), now()), ConnectivityTransition::Unchanged);
        assert!(matches!(
            evaluate_connectivity(&input(Some(25), None), now()),
            ConnectivityTransition::WentOffline { .. }
        ));
        assert!(matches!(
            evaluate_connectivity(&input(None, None), now()),
            ConnectivityTransition::WentOffline { last_seen_at: None }
        ));
        // уже открытое событие не дублируется
        assert_eq!(evaluate_connectivity(&input(Some(48), Some(20)), now()), ConnectivityTransition::Unchanged);
    }

    #[test]
    fn test_restored_and_disabled() {
        assert_eq!(
            evaluate_connectivity(&input(Some(1), Some(30)), now()),
            ConnectivityTransition::Restored { duration_hours: 30.0 }
        );

        let mut custom = input(Some(5), None);
        custom.offline_threshold_hours = Some(4);
        assert!(custom.is_offline(now()));

        custom.offline_alert_enabled = false;
        assert_eq!(evaluate_connectivity(&custom, now()), ConnectivityTransition::Unchanged);
    }
}
