use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Событие по расходнику из выгрузки Yields/Consumables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumableEventDto {
    pub id: i64,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub event_type: Option<String>,
    pub warning_code: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub tc: Option<f64>,
    pub captured_at: Option<DateTime<Utc>>,
    pub raw: Option<serde_json::Value>,
}
