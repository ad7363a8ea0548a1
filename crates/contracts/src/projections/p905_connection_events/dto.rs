use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ConnectionEventType;

/// Событие потери или восстановления связи с устройством
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEventDto {
    pub id: String,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub event_type: ConnectionEventType,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub duration_hours: Option<f64>,
    pub notes: Option<String>,
}
