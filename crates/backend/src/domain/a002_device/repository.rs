use chrono::{DateTime, Utc};
use contracts::domain::a002_device::aggregate::Device;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_device")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub serial_number: String,
    pub device_id: Option<String>,
    pub center_id: Option<String>,
    pub code_name: Option<String>,
    pub service_office: Option<String>,
    pub department: Option<String>,
    pub device_host_name: Option<String>,
    pub customer_name: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub last_meter_received_at: Option<DateTime<Utc>>,
    pub offline_threshold_minutes: Option<i32>,
    pub toner_c_percent: Option<f64>,
    pub toner_m_percent: Option<f64>,
    pub toner_y_percent: Option<f64>,
    pub toner_k_percent: Option<f64>,
    pub waste_toner_percent: Option<f64>,
    pub warning_message: Option<String>,
    pub counter_total: Option<i64>,
    pub counter_color: Option<i64>,
    pub counter_mono: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Device {
    fn from(m: Model) -> Self {
        Device {
            serial_number: m.serial_number,
            device_id: m.device_id,
            center_id: m.center_id,
            code_name: m.code_name,
            service_office: m.service_office,
            department: m.department,
            device_host_name: m.device_host_name,
            customer_name: m.customer_name,
            model: m.model,
            location: m.location,
            last_updated_at: m.last_updated_at,
            last_seen_at: m.last_seen_at,
            last_meter_received_at: m.last_meter_received_at,
            offline_threshold_minutes: m.offline_threshold_minutes,
            toner_c_percent: m.toner_c_percent,
            toner_m_percent: m.toner_m_percent,
            toner_y_percent: m.toner_y_percent,
            toner_k_percent: m.toner_k_percent,
            waste_toner_percent: m.waste_toner_percent,
            warning_message: m.warning_message,
            counter_total: m.counter_total,
            counter_color: m.counter_color,
            counter_mono: m.counter_mono,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_serial(serial: &str) -> anyhow::Result<Option<Device>> {
    let result = Entity::find_by_id(serial.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

/// Синхронизация карточки при создании заказа: заказчик, модель,
/// расположение, время обновления и уровни тонера
pub async fn upsert_order_snapshot(device: &Device) -> anyhow::Result<()> {
    let now = Utc::now();
    let active = ActiveModel {
        serial_number: Set(device.serial_number.clone()),
        device_id: Set(device.device_id.clone()),
        customer_name: Set(device.customer_name.clone()),
        model: Set(device.model.clone()),
        location: Set(device.location.clone()),
        last_updated_at: Set(device.last_updated_at),
        toner_k_percent: Set(device.toner_k_percent),
        toner_c_percent: Set(device.toner_c_percent),
        toner_m_percent: Set(device.toner_m_percent),
        toner_y_percent: Set(device.toner_y_percent),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    };

    Entity::insert(active)
        .on_conflict(
            OnConflict::column(Column::SerialNumber)
                .update_columns([
                    Column::CustomerName,
                    Column::Model,
                    Column::Location,
                    Column::LastUpdatedAt,
                    Column::TonerKPercent,
                    Column::TonerCPercent,
                    Column::TonerMPercent,
                    Column::TonerYPercent,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn())
        .await?;
    Ok(())
}

/// Последние счётчики из выгрузки LatestTotal
#[derive(Debug, Clone, PartialEq)]
pub struct MeterCounters {
    pub serial_number: String,
    pub device_id: Option<String>,
    pub customer_name: Option<String>,
    pub received_at: DateTime<Utc>,
    pub counter_total: Option<i64>,
    pub counter_color: Option<i64>,
    pub counter_mono: Option<i64>,
}

/// Обновляет счётчики карточек; устройства без карточки создаются
pub async fn upsert_meter_counters(batch: &[MeterCounters]) -> anyhow::Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let models: Vec<ActiveModel> = batch
        .iter()
        .map(|c| ActiveModel {
            serial_number: Set(c.serial_number.clone()),
            device_id: Set(c.device_id.clone()),
            customer_name: Set(c.customer_name.clone()),
            last_meter_received_at: Set(Some(c.received_at)),
            counter_total: Set(c.counter_total),
            counter_color: Set(c.counter_color),
            counter_mono: Set(c.counter_mono),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        })
        .collect();

    Entity::insert_many(models)
        .on_conflict(
            OnConflict::column(Column::SerialNumber)
                .update_columns([
                    Column::LastMeterReceivedAt,
                    Column::CounterTotal,
                    Column::CounterColor,
                    Column::CounterMono,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn())
        .await?;
    Ok(())
}
