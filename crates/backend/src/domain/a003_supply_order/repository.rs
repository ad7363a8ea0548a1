use chrono::{DateTime, Utc};
use contracts::domain::a003_supply_order::aggregate::{OrderId, SupplyOrder};
use contracts::enums::{OrderStatus, OrderType, TonerColor};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_supply_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,
    pub device_id: String,
    pub customer_name: String,
    pub order_type: String,
    pub toner_color: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub sales_order_number: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SupplyOrder {
    fn from(m: Model) -> Self {
        let uuid = Uuid::parse_str(&m.order_id).unwrap_or_else(|_| Uuid::new_v4());
        SupplyOrder {
            order_id: OrderId::new(uuid),
            device_id: m.device_id,
            customer_name: m.customer_name,
            order_type: OrderType::from_code(&m.order_type).unwrap_or(OrderType::Toner),
            toner_color: m.toner_color.as_deref().and_then(TonerColor::from_code),
            status: OrderStatus::from_code(&m.status).unwrap_or(OrderStatus::Open),
            created_at: m.created_at,
            ordered_at: m.ordered_at,
            sales_order_number: m.sales_order_number,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(order: &SupplyOrder) -> anyhow::Result<Uuid> {
    let uuid = order.order_id.value();
    let active = ActiveModel {
        order_id: Set(uuid.to_string()),
        device_id: Set(order.device_id.clone()),
        customer_name: Set(order.customer_name.clone()),
        order_type: Set(order.order_type.code().to_string()),
        toner_color: Set(order.toner_color.map(|c| c.code().to_string())),
        status: Set(order.status.code().to_string()),
        created_at: Set(order.created_at),
        ordered_at: Set(order.ordered_at),
        sales_order_number: Set(order.sales_order_number.clone()),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<SupplyOrder>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

/// Заказы, новые сверху; `status` - необязательный фильтр
pub async fn list(status: Option<OrderStatus>) -> anyhow::Result<Vec<SupplyOrder>> {
    let mut query = Entity::find();
    if let Some(status) = status {
        query = query.filter(Column::Status.eq(status.code()));
    }
    let items = query
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Незакрытые заказы (open и in_progress)
pub async fn list_active() -> anyhow::Result<Vec<SupplyOrder>> {
    let items = Entity::find()
        .filter(Column::Status.is_in([OrderStatus::Open.code(), OrderStatus::InProgress.code()]))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Открытые заказы по ключам устройств (серийные номера и device_id)
pub async fn list_open_for_devices(keys: &[String]) -> anyhow::Result<Vec<SupplyOrder>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let items = Entity::find()
        .filter(Column::Status.eq(OrderStatus::Open.code()))
        .filter(Column::DeviceId.is_in(keys.iter().cloned()))
        .order_by_asc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Последние заказы устройства
pub async fn list_recent_for_device(keys: &[String], limit: u64) -> anyhow::Result<Vec<SupplyOrder>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let items = Entity::find()
        .filter(Column::DeviceId.is_in(keys.iter().cloned()))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn update_status(id: Uuid, status: OrderStatus) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(status.code()))
        .filter(Column::OrderId.eq(id.to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
