use serde::{Deserialize, Serialize};
use std::fmt;

/// Тип события связи с устройством
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionEventType {
    WentOffline,
    CameOnline,
    StaleData,
    ConnectionRestored,
}

impl ConnectionEventType {
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionEventType::WentOffline => "went_offline",
            ConnectionEventType::CameOnline => "came_online",
            ConnectionEventType::StaleData => "stale_data",
            ConnectionEventType::ConnectionRestored => "connection_restored",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "went_offline" => Some(ConnectionEventType::WentOffline),
            "came_online" => Some(ConnectionEventType::CameOnline),
            "stale_data" => Some(ConnectionEventType::StaleData),
            "connection_restored" => Some(ConnectionEventType::ConnectionRestored),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
