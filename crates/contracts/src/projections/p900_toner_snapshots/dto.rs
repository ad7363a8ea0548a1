use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Снимок уровней тонера на момент импорта Gas Gage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TonerSnapshotDto {
    pub id: i64,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub snapshot_source: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub black: Option<f64>,
    pub cyan: Option<f64>,
    pub magenta: Option<f64>,
    pub yellow: Option<f64>,
    pub special_color: Option<f64>,
    pub waste_toner: Option<f64>,
    pub raw: Option<serde_json::Value>,
}
