use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::projections::p903_consumable_events::dto::ConsumableEventDto;
use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p903_consumable_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub device_id: Option<String>,
    pub serial_number: Option<String>,
    pub event_type: Option<String>,
    pub warning_code: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub tc: Option<f64>,
    pub captured_at: Option<DateTime<Utc>>,
    pub raw: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn insert_batch(events: &[ConsumableEventDto]) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }
    let models: Vec<ActiveModel> = events
        .iter()
        .map(|e| ActiveModel {
            id: NotSet,
            device_id: Set(e.device_id.clone()),
            serial_number: Set(e.serial_number.clone()),
            event_type: Set(e.event_type.clone()),
            warning_code: Set(e.warning_code.clone()),
            description: Set(e.description.clone()),
            status: Set(e.status.clone()),
            tc: Set(e.tc),
            captured_at: Set(e.captured_at),
            raw: Set(e.raw.clone()),
        })
        .collect();

    Entity::insert_many(models).exec(get_connection()).await?;
    Ok(())
}
