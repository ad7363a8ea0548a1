use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Предупреждение устройства из выгрузки WarningHistory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarningEventDto {
    pub id: i64,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub alert_code: Option<String>,
    pub message: Option<String>,
    pub warning_type: Option<String>,
    pub received_at_server: Option<DateTime<Utc>>,
    pub occurred_at_device: Option<DateTime<Utc>>,
    pub recovered_at_server: Option<DateTime<Utc>>,
    pub recovered_at_device: Option<DateTime<Utc>>,
    pub recovered: Option<bool>,
    pub raw: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}
