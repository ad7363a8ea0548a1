use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::enums::ConnectionEventType;
use contracts::projections::p905_connection_events::dto::ConnectionEventDto;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p905_connection_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub event_type: String,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub duration_hours: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ConnectionEventDto {
    fn from(m: Model) -> Self {
        ConnectionEventDto {
            id: m.id,
            device_id: m.device_id,
            serial_number: m.serial_number,
            event_type: ConnectionEventType::from_code(&m.event_type)
                .unwrap_or(ConnectionEventType::StaleData),
            last_seen_at: m.last_seen_at,
            detected_at: m.detected_at,
            resolved_at: m.resolved_at,
            duration_hours: m.duration_hours,
            notes: m.notes,
        }
    }
}

pub async fn insert(event: &ConnectionEventDto) -> Result<()> {
    let active = ActiveModel {
        id: Set(event.id.clone()),
        device_id: Set(event.device_id.clone()),
        serial_number: Set(event.serial_number.clone()),
        event_type: Set(event.event_type.code().to_string()),
        last_seen_at: Set(event.last_seen_at),
        detected_at: Set(event.detected_at),
        resolved_at: Set(event.resolved_at),
        duration_hours: Set(event.duration_hours),
        notes: Set(event.notes.clone()),
    };
    active.insert(get_connection()).await?;
    Ok(())
}

/// Незакрытые события went_offline, по одному (самому раннему) на серийный номер
pub async fn list_open_offline() -> Result<HashMap<String, ConnectionEventDto>> {
    let rows = Entity::find()
        .filter(Column::EventType.eq(ConnectionEventType::WentOffline.code()))
        .filter(Column::ResolvedAt.is_null())
        .order_by_asc(Column::DetectedAt)
        .all(get_connection())
        .await?;

    let mut by_serial = HashMap::new();
    for row in rows {
        let Some(serial) = row.serial_number.clone() else {
            continue;
        };
        by_serial.entry(serial).or_insert_with(|| row.into());
    }
    Ok(by_serial)
}

/// Закрывает событие went_offline
pub async fn resolve(id: &str, resolved_at: DateTime<Utc>, duration_hours: f64) -> Result<()> {
    let Some(model) = Entity::find_by_id(id.to_string()).one(get_connection()).await? else {
        return Ok(());
    };
    let mut active: ActiveModel = model.into();
    active.resolved_at = Set(Some(resolved_at));
    active.duration_hours = Set(Some(duration_hours));
    active.update(get_connection()).await?;
    Ok(())
}

/// Последние события, новые сверху; фильтр по серийному номеру необязателен
pub async fn list_recent(serial: Option<&str>, limit: u64) -> Result<Vec<ConnectionEventDto>> {
    let mut query = Entity::find();
    if let Some(serial) = serial.filter(|s| !s.trim().is_empty()) {
        query = query.filter(Column::SerialNumber.eq(serial.trim()));
    }
    let items = query
        .order_by_desc(Column::DetectedAt)
        .limit(limit)
        .all(get_connection())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
