use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::projections::p902_warning_events::dto::WarningEventDto;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, Condition, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

/// Событие WarningHistory; ключ (device_id, alert_code, received_at_server)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p902_warning_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub device_id: String,
    pub serial_number: Option<String>,
    pub alert_code: String,
    pub message: Option<String>,
    pub warning_type: Option<String>,
    pub received_at_server: DateTime<Utc>,
    pub occurred_at_device: Option<DateTime<Utc>>,
    pub recovered_at_server: Option<DateTime<Utc>>,
    pub recovered_at_device: Option<DateTime<Utc>>,
    pub recovered: Option<bool>,
    pub raw: Option<Json>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for WarningEventDto {
    fn from(m: Model) -> Self {
        WarningEventDto {
            id: m.id,
            device_id: Some(m.device_id),
            serial_number: m.serial_number,
            alert_code: Some(m.alert_code).filter(|c| !c.is_empty()),
            message: m.message,
            warning_type: m.warning_type,
            received_at_server: Some(m.received_at_server),
            occurred_at_device: m.occurred_at_device,
            recovered_at_server: m.recovered_at_server,
            recovered_at_device: m.recovered_at_device,
            recovered: m.recovered,
            raw: m.raw,
            created_at: m.created_at,
        }
    }
}

/// Upsert пакета событий; повторный импорт обновляет поля восстановления.
/// События без device_id или даты приёма сервером не сохраняются.
pub async fn upsert_batch(events: &[WarningEventDto]) -> Result<()> {
    let now = Utc::now();
    let models: Vec<ActiveModel> = events
        .iter()
        .filter_map(|e| {
            let device_id = e.device_id.clone()?;
            let received = e.received_at_server?;
            Some(ActiveModel {
                id: NotSet,
                device_id: Set(device_id),
                serial_number: Set(e.serial_number.clone()),
                alert_code: Set(e.alert_code.clone().unwrap_or_default()),
                message: Set(e.message.clone()),
                warning_type: Set(e.warning_type.clone()),
                received_at_server: Set(received),
                occurred_at_device: Set(e.occurred_at_device),
                recovered_at_server: Set(e.recovered_at_server),
                recovered_at_device: Set(e.recovered_at_device),
                recovered: Set(e.recovered),
                raw: Set(e.raw.clone()),
                created_at: Set(Some(now)),
            })
        })
        .collect();
    if models.is_empty() {
        return Ok(());
    }

    Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([Column::DeviceId, Column::AlertCode, Column::ReceivedAtServer])
                .update_columns([
                    Column::SerialNumber,
                    Column::Message,
                    Column::WarningType,
                    Column::OccurredAtDevice,
                    Column::RecoveredAtServer,
                    Column::RecoveredAtDevice,
                    Column::Recovered,
                    Column::Raw,
                ])
                .to_owned(),
        )
        .exec(get_connection())
        .await?;
    Ok(())
}

/// Последние события устройства (по device_id или серийному номеру), новые сверху
pub async fn list_recent_for_device(
    serial: &str,
    device_id: Option<&str>,
    limit: u64,
) -> Result<Vec<WarningEventDto>> {
    let mut condition = Condition::any()
        .add(Column::SerialNumber.eq(serial))
        .add(Column::DeviceId.eq(serial));
    if let Some(device_id) = device_id.filter(|v| !v.is_empty()) {
        condition = condition.add(Column::DeviceId.eq(device_id));
    }

    let items = Entity::find()
        .filter(condition)
        .order_by_desc(Column::ReceivedAtServer)
        .limit(limit)
        .all(get_connection())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
