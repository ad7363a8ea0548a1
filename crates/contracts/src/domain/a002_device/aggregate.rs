use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{TonerColor, TonerLevels};

/// Карточка устройства, на которую ссылаются заказы (ключ - серийный номер)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub serial_number: String,
    pub device_id: Option<String>,
    pub center_id: Option<String>,
    pub code_name: Option<String>,
    pub service_office: Option<String>,
    pub department: Option<String>,
    pub device_host_name: Option<String>,
    pub customer_name: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub last_meter_received_at: Option<DateTime<Utc>>,
    pub offline_threshold_minutes: Option<i32>,
    pub toner_c_percent: Option<f64>,
    pub toner_m_percent: Option<f64>,
    pub toner_y_percent: Option<f64>,
    pub toner_k_percent: Option<f64>,
    pub waste_toner_percent: Option<f64>,
    pub warning_message: Option<String>,
    pub counter_total: Option<i64>,
    pub counter_color: Option<i64>,
    pub counter_mono: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Device {
    pub fn toner_levels(&self) -> TonerLevels {
        TonerLevels {
            black: self.toner_k_percent,
            cyan: self.toner_c_percent,
            magenta: self.toner_m_percent,
            yellow: self.toner_y_percent,
        }
    }

    pub fn level(&self, color: TonerColor) -> Option<f64> {
        self.toner_levels().get(color)
    }

    /// Идентификатор, под которым заказы ссылаются на устройство
    pub fn order_key(&self) -> &str {
        self.device_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(&self.serial_number)
    }

    /// Есть ли хотя бы один неизвестный уровень тонера
    pub fn has_missing_toner(&self) -> bool {
        self.toner_c_percent.is_none()
            || self.toner_m_percent.is_none()
            || self.toner_y_percent.is_none()
            || self.toner_k_percent.is_none()
    }
}
