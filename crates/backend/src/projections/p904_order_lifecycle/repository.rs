use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::enums::{OrderLifecycleEventType, TonerColor};
use contracts::projections::p904_order_lifecycle::dto::OrderLifecycleEventDto;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

/// Журнал переходов заказа
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p904_order_lifecycle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub order_id: String,
    pub event_type: String,
    pub toner_color: Option<String>,
    pub toner_level_before: Option<f64>,
    pub toner_level_after: Option<f64>,
    pub auto_completed: bool,
    pub completed_by: Option<String>,
    pub notes: Option<String>,
    pub detected_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OrderLifecycleEventDto {
    fn from(m: Model) -> Self {
        OrderLifecycleEventDto {
            id: m.id,
            order_id: m.order_id,
            event_type: OrderLifecycleEventType::from_code(&m.event_type)
                .unwrap_or(OrderLifecycleEventType::Created),
            toner_color: m.toner_color.as_deref().and_then(TonerColor::from_code),
            toner_level_before: m.toner_level_before,
            toner_level_after: m.toner_level_after,
            auto_completed: m.auto_completed,
            completed_by: m.completed_by,
            notes: m.notes,
            detected_at: m.detected_at,
        }
    }
}

/// Новое событие журнала без уровней тонера
pub fn new_event(
    order_id: &str,
    event_type: OrderLifecycleEventType,
    toner_color: Option<TonerColor>,
) -> OrderLifecycleEventDto {
    OrderLifecycleEventDto {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        event_type,
        toner_color,
        toner_level_before: None,
        toner_level_after: None,
        auto_completed: false,
        completed_by: None,
        notes: None,
        detected_at: Utc::now(),
    }
}

pub async fn insert(event: &OrderLifecycleEventDto) -> Result<()> {
    let active = ActiveModel {
        id: Set(event.id.clone()),
        order_id: Set(event.order_id.clone()),
        event_type: Set(event.event_type.code().to_string()),
        toner_color: Set(event.toner_color.map(|c| c.code().to_string())),
        toner_level_before: Set(event.toner_level_before),
        toner_level_after: Set(event.toner_level_after),
        auto_completed: Set(event.auto_completed),
        completed_by: Set(event.completed_by.clone()),
        notes: Set(event.notes.clone()),
        detected_at: Set(event.detected_at),
    };
    active.insert(get_connection()).await?;
    Ok(())
}

pub async fn list_for_order(order_id: &str) -> Result<Vec<OrderLifecycleEventDto>> {
    let items = Entity::find()
        .filter(Column::OrderId.eq(order_id))
        .order_by_asc(Column::DetectedAt)
        .all(get_connection())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
