use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::usecases::u501_import_device_csv::ImportJobDto;
use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

/// Журнал импортов CSV
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "u501_import_job")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub source_file: Option<String>,
    pub source_type: String,
    pub imported_by: Option<String>,
    pub imported_at: DateTime<Utc>,
    pub row_count: i64,
    pub status: String,
    pub details: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImportJobDto {
    fn from(m: Model) -> Self {
        ImportJobDto {
            id: m.id,
            source_file: m.source_file,
            source_type: m.source_type,
            imported_by: m.imported_by,
            imported_at: m.imported_at,
            row_count: m.row_count,
            status: m.status,
            details: m.details,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(job: &ImportJobDto) -> Result<()> {
    let active = ActiveModel {
        id: Set(job.id.clone()),
        source_file: Set(job.source_file.clone()),
        source_type: Set(job.source_type.clone()),
        imported_by: Set(job.imported_by.clone()),
        imported_at: Set(job.imported_at),
        row_count: Set(job.row_count),
        status: Set(job.status.clone()),
        details: Set(job.details.clone()),
    };
    Entity::insert(active).exec(conn()).await?;
    Ok(())
}

/// Последние импорты, новые сверху
pub async fn list_recent(limit: u64) -> Result<Vec<ImportJobDto>> {
    let rows = Entity::find()
        .order_by_desc(Column::ImportedAt)
        .limit(limit)
        .all(conn())
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}
