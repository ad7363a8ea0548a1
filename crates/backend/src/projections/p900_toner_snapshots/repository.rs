use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::projections::p900_toner_snapshots::dto::TonerSnapshotDto;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, Condition, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

/// Снимок уровней тонера (append-only)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p900_toner_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub snapshot_source: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub black: Option<f64>,
    pub cyan: Option<f64>,
    pub magenta: Option<f64>,
    pub yellow: Option<f64>,
    pub special_color: Option<f64>,
    pub waste_toner: Option<f64>,
    pub raw: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for TonerSnapshotDto {
    fn from(m: Model) -> Self {
        TonerSnapshotDto {
            id: m.id,
            device_id: m.device_id,
            serial_number: m.serial_number,
            snapshot_source: m.snapshot_source,
            captured_at: m.captured_at,
            black: m.black,
            cyan: m.cyan,
            magenta: m.magenta,
            yellow: m.yellow,
            special_color: m.special_color,
            waste_toner: m.waste_toner,
            raw: m.raw,
        }
    }
}

/// Добавляет снимки одним INSERT; поле `id` входных данных игнорируется
pub async fn insert_batch(snapshots: &[TonerSnapshotDto]) -> Result<()> {
    if snapshots.is_empty() {
        return Ok(());
    }
    let models: Vec<ActiveModel> = snapshots
        .iter()
        .map(|s| ActiveModel {
            id: NotSet,
            device_id: Set(s.device_id.clone()),
            serial_number: Set(s.serial_number.clone()),
            snapshot_source: Set(s.snapshot_source.clone()),
            captured_at: Set(s.captured_at),
            black: Set(s.black),
            cyan: Set(s.cyan),
            magenta: Set(s.magenta),
            yellow: Set(s.yellow),
            special_color: Set(s.special_color),
            waste_toner: Set(s.waste_toner),
            raw: Set(s.raw.clone()),
        })
        .collect();

    Entity::insert_many(models).exec(get_connection()).await?;
    Ok(())
}

/// Последний снимок устройства по серийному номеру или device_id
pub async fn get_latest_for_device(serial: &str, device_id: Option<&str>) -> Result<Option<TonerSnapshotDto>> {
    let mut condition = Condition::any().add(Column::SerialNumber.eq(serial));
    if let Some(device_id) = device_id.filter(|v| !v.is_empty()) {
        condition = condition.add(Column::DeviceId.eq(device_id));
    }

    let item = Entity::find()
        .filter(condition)
        .order_by_desc(Column::CapturedAt)
        .order_by_desc(Column::Id)
        .one(get_connection())
        .await?;
    Ok(item.map(Into::into))
}
