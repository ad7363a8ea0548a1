use serde::{Deserialize, Serialize};
use std::fmt;

/// Агрегированное состояние устройства
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Critical,
    Warning,
    Ok,
}

impl DeviceStatus {
    pub fn code(&self) -> &'static str {
        match self {
            DeviceStatus::Critical => "critical",
            DeviceStatus::Warning => "warning",
            DeviceStatus::Ok => "ok",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Critical => "Critical",
            DeviceStatus::Warning => "Warning",
            DeviceStatus::Ok => "OK",
        }
    }

    /// Порядок сортировки: critical, warning, ok
    pub fn sort_rank(&self) -> u8 {
        match self {
            DeviceStatus::Critical => 0,
            DeviceStatus::Warning => 1,
            DeviceStatus::Ok => 2,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "critical" => Some(DeviceStatus::Critical),
            "warning" => Some(DeviceStatus::Warning),
            "ok" => Some(DeviceStatus::Ok),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
