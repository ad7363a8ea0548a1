use chrono::{DateTime, Utc};
use contracts::domain::a004_alert_settings::aggregate::DeviceAlertSettings;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_alert_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub device_id: String,
    pub black_threshold: f64,
    pub cyan_threshold: f64,
    pub magenta_threshold: f64,
    pub yellow_threshold: f64,
    pub special_color_threshold: Option<f64>,
    pub alerts_enabled: bool,
    pub black_enabled: bool,
    pub cyan_enabled: bool,
    pub magenta_enabled: bool,
    pub yellow_enabled: bool,
    pub replacement_detection_threshold: f64,
    pub offline_alert_enabled: bool,
    pub offline_threshold_hours: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DeviceAlertSettings {
    fn from(m: Model) -> Self {
        DeviceAlertSettings {
            device_id: m.device_id,
            black_threshold: m.black_threshold,
            cyan_threshold: m.cyan_threshold,
            magenta_threshold: m.magenta_threshold,
            yellow_threshold: m.yellow_threshold,
            special_color_threshold: m.special_color_threshold,
            alerts_enabled: m.alerts_enabled,
            black_enabled: m.black_enabled,
            cyan_enabled: m.cyan_enabled,
            magenta_enabled: m.magenta_enabled,
            yellow_enabled: m.yellow_enabled,
            replacement_detection_threshold: m.replacement_detection_threshold,
            offline_alert_enabled: m.offline_alert_enabled,
            offline_threshold_hours: m.offline_threshold_hours,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active_model(s: &DeviceAlertSettings, now: DateTime<Utc>) -> ActiveModel {
    ActiveModel {
        device_id: Set(s.device_id.clone()),
        black_threshold: Set(s.black_threshold),
        cyan_threshold: Set(s.cyan_threshold),
        magenta_threshold: Set(s.magenta_threshold),
        yellow_threshold: Set(s.yellow_threshold),
        special_color_threshold: Set(s.special_color_threshold),
        alerts_enabled: Set(s.alerts_enabled),
        black_enabled: Set(s.black_enabled),
        cyan_enabled: Set(s.cyan_enabled),
        magenta_enabled: Set(s.magenta_enabled),
        yellow_enabled: Set(s.yellow_enabled),
        replacement_detection_threshold: Set(s.replacement_detection_threshold),
        offline_alert_enabled: Set(s.offline_alert_enabled),
        offline_threshold_hours: Set(s.offline_threshold_hours),
        created_at: Set(Some(s.created_at.unwrap_or(now))),
        updated_at: Set(Some(now)),
    }
}

pub async fn get(device_id: &str) -> anyhow::Result<Option<DeviceAlertSettings>> {
    let result = Entity::find_by_id(device_id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn list_all() -> anyhow::Result<Vec<DeviceAlertSettings>> {
    let items = Entity::find()
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Настройки для набора устройств (ключ - device_id)
pub async fn get_many(device_ids: &[String]) -> anyhow::Result<HashMap<String, DeviceAlertSettings>> {
    if device_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Entity::find()
        .filter(Column::DeviceId.is_in(device_ids.iter().cloned()))
        .all(conn())
        .await?;
    Ok(rows
        .into_iter()
        .map(|m| (m.device_id.clone(), m.into()))
        .collect())
}

/// Upsert пакета настроек по device_id; created_at сохраняется
pub async fn upsert_many(settings: &[DeviceAlertSettings]) -> anyhow::Result<()> {
    if settings.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let models: Vec<ActiveModel> = settings.iter().map(|s| to_active_model(s, now)).collect();

    Entity::insert_many(models)
        .on_conflict(
            OnConflict::column(Column::DeviceId)
                .update_columns([
                    Column::BlackThreshold,
                    Column::CyanThreshold,
                    Column::MagentaThreshold,
                    Column::YellowThreshold,
                    Column::SpecialColorThreshold,
                    Column::AlertsEnabled,
                    Column::BlackEnabled,
                    Column::CyanEnabled,
                    Column::MagentaEnabled,
                    Column::YellowEnabled,
                    Column::ReplacementDetectionThreshold,
                    Column::OfflineAlertEnabled,
                    Column::OfflineThresholdHours,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn())
        .await?;
    Ok(())
}

/// Upsert одной записи; возвращает сохранённое состояние
pub async fn upsert(settings: &DeviceAlertSettings) -> anyhow::Result<DeviceAlertSettings> {
    upsert_many(std::slice::from_ref(settings)).await?;
    get(&settings.device_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Alert settings for {} not found after save", settings.device_id))
}

/// Пороги распознавания замены картриджа (ключ - device_id)
pub async fn replacement_thresholds(device_ids: &[String]) -> anyhow::Result<HashMap<String, f64>> {
    Ok(get_many(device_ids)
        .await?
        .into_iter()
        .map(|(id, s)| (id, s.replacement_detection_threshold))
        .collect())
}
