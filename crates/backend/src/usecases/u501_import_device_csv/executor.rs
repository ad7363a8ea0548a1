use super::{repository, transform};
use crate::domain::a003_supply_order::auto_completion::complete_replaced_toner_orders;
use crate::domain::{a001_gas_gage, a002_device};
use crate::projections::{p900_toner_snapshots, p901_meter_readings, p902_warning_events, p903_consumable_events};
use crate::shared::config;
use crate::shared::format::format_elapsed;
use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a001_gas_gage::aggregate::GasGageDevice;
use contracts::domain::a003_supply_order::auto_completion::DeviceTonerChange;
use contracts::enums::TonerLevels;
use contracts::projections::p901_meter_readings::dto::MeterReadingDto;
use contracts::projections::p902_warning_events::dto::WarningEventDto;
use contracts::projections::p903_consumable_events::dto::ConsumableEventDto;
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u501_import_device_csv::{
    DeviceImportRow, ImportDeviceCsv, DeviceImportType, ImportDeviceCsvResponse, ImportJobDto, ImportJobStatus,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Строки выгрузки, уже приведённые к типам проекций
enum Prepared {
    GasGage(Vec<GasGageDevice>),
    LatestTotal(Vec<MeterReadingDto>),
    WarningHistory(Vec<WarningEventDto>),
    ConsumableEvents(Vec<ConsumableEventDto>),
}

impl Prepared {
    fn len(&self) -> usize {
        match self {
            Prepared::GasGage(v) => v.len(),
            Prepared::LatestTotal(v) => v.len(),
            Prepared::WarningHistory(v) => v.len(),
            Prepared::ConsumableEvents(v) => v.len(),
        }
    }
}

/// Executor для UseCase импорта CSV-выгрузок устройств
pub struct ImportExecutor {
    batch_size: usize,
}

impl ImportExecutor {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config() -> Self {
        Self::new(config::import_batch_size())
    }

    /// Импортирует порцию строк одного типа.
    ///
    /// Строки пишутся пакетами по `batch_size`; упавший пакет не прерывает
    /// импорт. После gas_gage закрываются заказы с заменённым тонером.
    pub async fn import_rows(
        &self,
        import_type: DeviceImportType,
        rows: &[DeviceImportRow],
        source_file: Option<&str>,
    ) -> Result<ImportDeviceCsvResponse> {
        let started = std::time::Instant::now();
        let now = Utc::now();
        let mut response = ImportDeviceCsvResponse::new(import_type);

        let prepared = prepare(import_type, rows, now, &mut response);
        tracing::info!(
            "{} ({}): {} rows received, {} valid",
            ImportDeviceCsv::full_name(),
            import_type.code(),
            rows.len(),
            prepared.len()
        );

        match prepared {
            Prepared::GasGage(devices) => {
                let mut changes = Vec::new();
                for (index, batch) in devices.chunks(self.batch_size).enumerate() {
                    match import_gas_gage_batch(batch, now).await {
                        Ok(batch_changes) => {
                            response.success += batch.len();
                            changes.extend(batch_changes);
                        }
                        Err(e) => fail_batch(&mut response, index, batch.len(), &e),
                    }
                }
                match complete_replaced_toner_orders(&changes).await {
                    Ok(result) => {
                        response.auto_completed = result.orders_completed;
                        response.completion_details = result.completion_details;
                    }
                    Err(e) => tracing::error!("Order auto-completion failed: {:#}", e),
                }
            }
            Prepared::LatestTotal(readings) => {
                let mut stored: Vec<&MeterReadingDto> = Vec::new();
                for (index, batch) in readings.chunks(self.batch_size).enumerate() {
                    match p901_meter_readings::repository::upsert_batch(batch).await {
                        Ok(()) => {
                            response.success += batch.len();
                            stored.extend(batch.iter());
                        }
                        Err(e) => fail_batch(&mut response, index, batch.len(), &e),
                    }
                }
                let counters = latest_counters(&stored);
                if let Err(e) = a002_device::repository::upsert_meter_counters(&counters).await {
                    tracing::warn!("Failed to update device counters: {:#}", e);
                }
            }
            Prepared::WarningHistory(events) => {
                for (index, batch) in events.chunks(self.batch_size).enumerate() {
                    match p902_warning_events::repository::upsert_batch(batch).await {
                        Ok(()) => response.success += batch.len(),
                        Err(e) => fail_batch(&mut response, index, batch.len(), &e),
                    }
                }
            }
            Prepared::ConsumableEvents(events) => {
                for (index, batch) in events.chunks(self.batch_size).enumerate() {
                    match p903_consumable_events::repository::insert_batch(batch).await {
                        Ok(()) => response.success += batch.len(),
                        Err(e) => fail_batch(&mut response, index, batch.len(), &e),
                    }
                }
            }
        }

        response.job_id = record_job(&response, source_file, now).await;

        tracing::info!(
            "Import {} finished in {}: success {}, errors {}, auto-completed {}",
            import_type.code(),
            format_elapsed(started.elapsed()),
            response.success,
            response.errors,
            response.auto_completed
        );
        Ok(response)
    }
}

fn fail_batch(response: &mut ImportDeviceCsvResponse, index: usize, rows: usize, error: &anyhow::Error) {
    tracing::error!("Import batch {} failed: {:#}", index + 1, error);
    response.record_failed_batch(index + 1, rows, &error.to_string());
}

/// Преобразует строки; невалидные попадают в ошибки как "Row N: ..."
fn prepare(
    import_type: DeviceImportType,
    rows: &[DeviceImportRow],
    now: DateTime<Utc>,
    response: &mut ImportDeviceCsvResponse,
) -> Prepared {
    match import_type {
        DeviceImportType::GasGage => {
            Prepared::GasGage(collect_valid(rows, response, |row| transform::to_gas_gage(row, now)))
        }
        DeviceImportType::LatestTotal => {
            Prepared::LatestTotal(collect_valid(rows, response, transform::to_meter_reading))
        }
        DeviceImportType::WarningHistory => Prepared::WarningHistory(collect_valid(rows, response, |row| {
            transform::to_warning_event(row, now)
        })),
        DeviceImportType::ConsumableEvents => {
            Prepared::ConsumableEvents(collect_valid(rows, response, transform::to_consumable_event))
        }
    }
}

fn collect_valid<T>(
    rows: &[DeviceImportRow],
    response: &mut ImportDeviceCsvResponse,
    convert: impl Fn(&DeviceImportRow) -> Result<T, String>,
) -> Vec<T> {
    let mut items = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match convert(row) {
            Ok(item) => items.push(item),
            Err(message) => {
                response.errors += 1;
                response
                    .error_details
                    .get_or_insert_with(Vec::new)
                    .push(format!("Row {}: {}", index + 1, message));
            }
        }
    }
    items
}

/// Пакет gas_gage: запоминаем прежние уровни, пишем устройства и снимки.
/// Возвращает изменения уровней для уже известных устройств.
async fn import_gas_gage_batch(batch: &[GasGageDevice], now: DateTime<Utc>) -> Result<Vec<DeviceTonerChange>> {
    let device_ids: Vec<String> = batch.iter().map(|d| d.device_id.clone()).collect();
    let previous = a001_gas_gage::repository::fetch_current_toner_levels(&device_ids).await?;

    a001_gas_gage::repository::upsert_batch(batch).await?;

    let snapshots: Vec<_> = batch
        .iter()
        .map(|device| transform::to_toner_snapshot(device, now))
        .collect();
    if let Err(e) = p900_toner_snapshots::repository::insert_batch(&snapshots).await {
        tracing::warn!("Failed to store toner snapshots: {:#}", e);
    }

    Ok(toner_changes(batch, &previous))
}

/// Последнее состояние каждого устройства пакета против уровней до импорта
fn toner_changes(
    batch: &[GasGageDevice],
    previous: &HashMap<String, (String, TonerLevels)>,
) -> Vec<DeviceTonerChange> {
    let mut latest: HashMap<&str, &GasGageDevice> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for device in batch {
        let key = device.device_id.as_str();
        if latest.insert(key, device).is_none() {
            order.push(key);
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let (old_serial, old_levels) = previous.get(key)?;
            let device = latest.get(key)?;
            let serial = if device.trimmed_serial().is_empty() {
                old_serial.clone()
            } else {
                device.trimmed_serial().to_string()
            };
            Some(DeviceTonerChange {
                device_id: device.device_id.clone(),
                serial_number: serial,
                old_levels: *old_levels,
                new_levels: device.toner_levels(),
            })
        })
        .collect()
}

/// Самое свежее показание на серийный номер -> счётчики карточки a002
fn latest_counters(readings: &[&MeterReadingDto]) -> Vec<a002_device::repository::MeterCounters> {
    let mut newest: HashMap<String, &MeterReadingDto> = HashMap::new();
    for reading in readings {
        let Some(serial) = reading.serial_number.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let replace = newest
            .get(serial)
            .map_or(true, |current| reading.captured_at >= current.captured_at);
        if replace {
            newest.insert(serial.to_string(), reading);
        }
    }

    let mut counters: Vec<_> = newest
        .into_iter()
        .map(|(serial, r)| a002_device::repository::MeterCounters {
            serial_number: serial,
            device_id: r.device_id.clone(),
            customer_name: r
                .raw
                .as_ref()
                .and_then(|raw| raw.get("Customer"))
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            received_at: r.captured_at,
            counter_total: r.total.or(r.printer_total).or(r.copy_total),
            counter_color: r.color_total,
            counter_mono: r.black_total,
        })
        .collect();
    counters.sort_by(|a, b| a.serial_number.cmp(&b.serial_number));
    counters
}

/// Пишет запись журнала; ошибка журнала не ломает импорт
async fn record_job(
    response: &ImportDeviceCsvResponse,
    source_file: Option<&str>,
    now: DateTime<Utc>,
) -> Option<String> {
    let job = ImportJobDto {
        id: Uuid::new_v4().to_string(),
        source_file: source_file.map(str::to_string),
        source_type: response.import_type.code().to_string(),
        imported_by: None,
        imported_at: now,
        row_count: response.success as i64,
        status: ImportJobStatus::from_counts(response.success, response.errors)
            .code()
            .to_string(),
        details: Some(serde_json::json!({
            "errors": response.errors,
            "error_details": response.error_details,
            "auto_completed": response.auto_completed,
        })),
    };

    match repository::insert(&job).await {
        Ok(()) => Some(job.id),
        Err(e) => {
            tracing::warn!("Failed to record import job: {:#}", e);
            None
        }
    }
}

/// Журнал импортов для GET /api/import-jobs
pub async fn list_jobs(limit: u64) -> Result<Vec<ImportJobDto>> {
    repository::list_recent(limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_supply_order;
    use crate::shared::data::db::initialize_database_with_url;
    use chrono::TimeZone;
    use contracts::domain::a003_supply_order::aggregate::{CreateOrderOptions, DeviceOrderPayload};
    use contracts::enums::{OrderScope, OrderStatus, TonerColor};

    fn row(pairs: &[(&str, &str)]) -> DeviceImportRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn gas_gage_row(device_id: &str, serial: &str, black: &str) -> DeviceImportRow {
        row(&[
            ("CenterID", "C1"),
            ("DeviceID", device_id),
            ("Model", "IM C3000"),
            ("Serial Number", serial),
            ("Black", black),
            ("Cyan", "50"),
            ("Magenta", "50"),
            ("Yellow", "50"),
            ("Customer", "Acme"),
        ])
    }

    fn reading(serial: &str, day: u32, total: i64) -> MeterReadingDto {
        MeterReadingDto {
            id: 0,
            device_id: Some(format!("D-{}", serial)),
            serial_number: Some(serial.to_string()),
            captured_at: Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
            total: None,
            printer_total: Some(total),
            copy_total: None,
            scan_total: None,
            duplex_total: None,
            black_total: Some(total / 2),
            color_total: None,
            meter_a: None,
            meter_b: None,
            meter_c: None,
            raw: Some(serde_json::json!({ "Customer": " Acme " })),
        }
    }

    #[test]
    fn test_latest_counters_keep_newest_reading() {
        let older = reading("S-1", 1, 100);
        let newer = reading("S-1", 5, 300);
        let other = reading("S-2", 2, 40);

        let counters = latest_counters(&[&newer, &older, &other]);
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0].serial_number, "S-1");
        assert_eq!(counters[0].counter_total, Some(300));
        assert_eq!(counters[0].counter_mono, Some(150));
        assert_eq!(counters[0].customer_name.as_deref(), Some("Acme"));
        assert_eq!(counters[1].counter_total, Some(40));
    }

    #[test]
    fn test_toner_changes_only_for_known_devices() {
        let now = Utc::now();
        let batch = vec![
            transform::to_gas_gage(&gas_gage_row("D-1", "S-1", "10"), now).unwrap(),
            transform::to_gas_gage(&gas_gage_row("D-2", "S-2", "90"), now).unwrap(),
            transform::to_gas_gage(&gas_gage_row("D-1", "S-1", "95"), now).unwrap(),
        ];
        let mut previous = HashMap::new();
        previous.insert(
            "D-1".to_string(),
            (
                "S-1".to_string(),
                TonerLevels {
                    black: Some(5.0),
                    ..Default::default()
                },
            ),
        );

        let changes = toner_changes(&batch, &previous);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_levels.black, Some(5.0));
        // побеждает последняя строка устройства в пакете
        assert_eq!(changes[0].new_levels.black, Some(95.0));
    }

    #[test]
    fn test_invalid_rows_reported_with_numbers() {
        let mut response = ImportDeviceCsvResponse::new(DeviceImportType::GasGage);
        let rows = vec![gas_gage_row("D-1", "S-1", "10"), gas_gage_row("", "S-2", "10")];
        let prepared = prepare(DeviceImportType::GasGage, &rows, Utc::now(), &mut response);

        assert_eq!(prepared.len(), 1);
        assert_eq!(response.errors, 1);
        let details = response.error_details.unwrap();
        assert!(details[0].starts_with("Row 2: "), "{}", details[0]);
    }

    #[tokio::test]
    async fn test_import_flow_completes_replaced_toner_orders() {
        initialize_database_with_url("sqlite::memory:", 1).await.unwrap();
        let executor = ImportExecutor::new(2);

        // первичная загрузка: чёрный почти пуст
        let first = executor
            .import_rows(
                DeviceImportType::GasGage,
                &[gas_gage_row("FLOW-D1", "FLOW-S1", "4"), gas_gage_row("FLOW-D2", "FLOW-S2", "60")],
                Some("gasgage_1.csv"),
            )
            .await
            .unwrap();
        assert_eq!(first.success, 2);
        assert_eq!(first.errors, 0);
        assert_eq!(first.auto_completed, 0);
        assert!(first.job_id.is_some());

        let payload = DeviceOrderPayload {
            serial_number: Some("FLOW-S1".into()),
            device_id: Some("FLOW-D1".into()),
            customer: Some("Acme".into()),
            black: Some(4.0),
            ..Default::default()
        };
        let order = a003_supply_order::service::create_supply_order(
            OrderScope::Black,
            &payload,
            &CreateOrderOptions::default(),
        )
        .await
        .unwrap();

        // картридж заменён: +90 процентных пунктов
        let second = executor
            .import_rows(
                DeviceImportType::GasGage,
                &[gas_gage_row("FLOW-D1", "FLOW-S1", "94")],
                Some("gasgage_2.csv"),
            )
            .await
            .unwrap();
        assert_eq!(second.auto_completed, 1);
        assert_eq!(second.completion_details[0].toner_color, TonerColor::Black);

        let stored = a003_supply_order::repository::get_by_id(order.order_id.value())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);

        let device = a001_gas_gage::repository::get_by_device_id("FLOW-D1")
            .await
            .unwrap()
            .unwrap();
        assert!(device.toner_replacement_date_black.is_some());

        let jobs = list_jobs(10).await.unwrap();
        assert!(jobs.iter().any(|j| j.source_file.as_deref() == Some("gasgage_2.csv")));
    }
}
