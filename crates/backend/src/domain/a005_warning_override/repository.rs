use chrono::{DateTime, Utc};
use contracts::domain::a005_warning_override::aggregate::WarningOverride;
use contracts::enums::WarningScope;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a005_warning_override")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub device_id: Option<String>,
    pub serial_number: String,
    pub scope: String,
    pub dismissed_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for WarningOverride {
    fn from(m: Model) -> Self {
        WarningOverride {
            id: m.id,
            device_id: m.device_id,
            serial_number: m.serial_number,
            scope: WarningScope::from_code(&m.scope).unwrap_or(WarningScope::All),
            dismissed_at: m.dismissed_at,
            expires_at: m.expires_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn list_all() -> anyhow::Result<Vec<WarningOverride>> {
    let items = Entity::find()
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Upsert по (serial_number, scope): повторное подавление сдвигает dismissed_at
pub async fn upsert_many(overrides: &[WarningOverride]) -> anyhow::Result<()> {
    if overrides.is_empty() {
        return Ok(());
    }
    let models: Vec<ActiveModel> = overrides
        .iter()
        .map(|o| ActiveModel {
            id: Set(o.id.clone()),
            device_id: Set(o.device_id.clone()),
            serial_number: Set(o.serial_number.clone()),
            scope: Set(o.scope.code().to_string()),
            dismissed_at: Set(o.dismissed_at),
            expires_at: Set(o.expires_at),
            created_at: Set(o.created_at),
            updated_at: Set(o.updated_at),
        })
        .collect();

    Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([Column::SerialNumber, Column::Scope])
                .update_columns([
                    Column::DeviceId,
                    Column::DismissedAt,
                    Column::ExpiresAt,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn())
        .await?;
    Ok(())
}

/// Удаляет подавления области `scope` для серийных номеров; возвращает число удалённых
pub async fn delete_for_serials(serials: &[String], scope: WarningScope) -> anyhow::Result<u64> {
    if serials.is_empty() {
        return Ok(0);
    }
    let result = Entity::delete_many()
        .filter(Column::SerialNumber.is_in(serials.iter().cloned()))
        .filter(Column::Scope.eq(scope.code()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}
