use serde::{Deserialize, Serialize};

use crate::projections::p905_connection_events::dto::ConnectionEventDto;

/// Итог одного прогона проверки связи
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityCheckResponse {
    pub checked: usize,
    pub went_offline: usize,
    pub restored: usize,
    pub events: Vec<ConnectionEventDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionEventsQuery {
    pub serial_number: Option<String>,
    pub limit: Option<u64>,
}
