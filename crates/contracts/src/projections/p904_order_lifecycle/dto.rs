use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{OrderLifecycleEventType, TonerColor};

/// Запись журнала жизненного цикла заказа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLifecycleEventDto {
    pub id: String,
    pub order_id: String,
    pub event_type: OrderLifecycleEventType,
    pub toner_color: Option<TonerColor>,
    pub toner_level_before: Option<f64>,
    pub toner_level_after: Option<f64>,
    pub auto_completed: bool,
    pub completed_by: Option<String>,
    pub notes: Option<String>,
    pub detected_at: DateTime<Utc>,
}
