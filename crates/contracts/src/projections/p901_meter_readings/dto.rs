use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Показания счётчиков из выгрузки LatestTotal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterReadingDto {
    pub id: i64,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub total: Option<i64>,
    pub printer_total: Option<i64>,
    pub copy_total: Option<i64>,
    pub scan_total: Option<i64>,
    pub duplex_total: Option<i64>,
    pub black_total: Option<i64>,
    pub color_total: Option<i64>,
    pub meter_a: Option<i64>,
    pub meter_b: Option<i64>,
    pub meter_c: Option<i64>,
    pub raw: Option<serde_json::Value>,
}
