use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::shared::config::ConnectivityConfig;
use crate::usecases::u502_connectivity_check::executor;

/// Фоновый воркер, запускающий проверку связи по cron-расписанию.
pub struct ConnectivityWorker {
    schedule: Schedule,
    poll_seconds: u64,
}

impl ConnectivityWorker {
    pub fn new(schedule: Schedule, poll_seconds: u64) -> Self {
        Self {
            schedule,
            poll_seconds,
        }
    }

    /// None, если проверка выключена в конфигурации
    pub fn from_config(config: &ConnectivityConfig) -> anyhow::Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        Ok(Some(Self::new(config.parsed_schedule()?, 30)))
    }

    fn next_run_after(&self, moment: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&moment).next()
    }

    /// Запускает цикл: раз в `poll_seconds` проверяет, не наступил ли запуск.
    pub async fn run_loop(&self) {
        let mut next_run = self.next_run_after(Utc::now());
        info!(
            "Connectivity worker started, first run at {:?}",
            next_run.map(|t| t.to_rfc3339())
        );

        let mut interval = time::interval(time::Duration::from_secs(self.poll_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let Some(due) = next_run else {
                warn!("Connectivity schedule has no upcoming runs, worker stops");
                return;
            };

            let now = Utc::now();
            if due > now {
                continue;
            }

            match executor::run_connectivity_check(now).await {
                Ok(result) => info!(
                    "Connectivity check: {} devices, {} went offline, {} restored",
                    result.checked, result.went_offline, result.restored
                ),
                Err(e) => error!("Connectivity check failed: {:?}", e),
            }
            next_run = self.next_run_after(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_next_run_follows_schedule() {
        let schedule = Schedule::from_str("0 0 * * * *").unwrap();
        let worker = ConnectivityWorker::new(schedule, 30);
        let moment = Utc.with_ymd_and_hms(2024, 3, 10, 12, 15, 0).unwrap();
        assert_eq!(
            worker.next_run_after(moment),
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 13, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_disabled_config_gives_no_worker() {
        let config = ConnectivityConfig {
            enabled: false,
            schedule: "not a cron".into(),
        };
        assert!(ConnectivityWorker::from_config(&config).unwrap().is_none());
    }
}
