use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::projections::p901_meter_readings::dto::MeterReadingDto;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, Condition, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

/// Показания счётчиков; уникальны по (serial_number, captured_at)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p901_meter_readings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub device_id: Option<String>,
    pub serial_number: String,
    pub captured_at: DateTime<Utc>,
    pub total: Option<i64>,
    pub printer_total: Option<i64>,
    pub copy_total: Option<i64>,
    pub scan_total: Option<i64>,
    pub duplex_total: Option<i64>,
    pub black_total: Option<i64>,
    pub color_total: Option<i64>,
    pub meter_a: Option<i64>,
    pub meter_b: Option<i64>,
    pub meter_c: Option<i64>,
    pub raw: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MeterReadingDto {
    fn from(m: Model) -> Self {
        MeterReadingDto {
            id: m.id,
            device_id: m.device_id,
            serial_number: Some(m.serial_number),
            captured_at: m.captured_at,
            total: m.total,
            printer_total: m.printer_total,
            copy_total: m.copy_total,
            scan_total: m.scan_total,
            duplex_total: m.duplex_total,
            black_total: m.black_total,
            color_total: m.color_total,
            meter_a: m.meter_a,
            meter_b: m.meter_b,
            meter_c: m.meter_c,
            raw: m.raw,
        }
    }
}

/// Upsert пакета показаний: повторный импорт той же выгрузки ничего не дублирует.
/// Строки без серийного номера пропускаются.
pub async fn upsert_batch(readings: &[MeterReadingDto]) -> Result<()> {
    let models: Vec<ActiveModel> = readings
        .iter()
        .filter_map(|r| {
            let serial = r.serial_number.clone()?;
            Some(ActiveModel {
                id: NotSet,
                device_id: Set(r.device_id.clone()),
                serial_number: Set(serial),
                captured_at: Set(r.captured_at),
                total: Set(r.total),
                printer_total: Set(r.printer_total),
                copy_total: Set(r.copy_total),
                scan_total: Set(r.scan_total),
                duplex_total: Set(r.duplex_total),
                black_total: Set(r.black_total),
                color_total: Set(r.color_total),
                meter_a: Set(r.meter_a),
                meter_b: Set(r.meter_b),
                meter_c: Set(r.meter_c),
                raw: Set(r.raw.clone()),
            })
        })
        .collect();
    if models.is_empty() {
        return Ok(());
    }

    Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([Column::SerialNumber, Column::CapturedAt])
                .update_columns([
                    Column::DeviceId,
                    Column::Total,
                    Column::PrinterTotal,
                    Column::CopyTotal,
                    Column::ScanTotal,
                    Column::DuplexTotal,
                    Column::BlackTotal,
                    Column::ColorTotal,
                    Column::MeterA,
                    Column::MeterB,
                    Column::MeterC,
                    Column::Raw,
                ])
                .to_owned(),
        )
        .exec(get_connection())
        .await?;
    Ok(())
}

/// Последние показания устройства
pub async fn get_latest_for_device(serial: &str, device_id: Option<&str>) -> Result<Option<MeterReadingDto>> {
    let mut condition = Condition::any().add(Column::SerialNumber.eq(serial));
    if let Some(device_id) = device_id.filter(|v| !v.is_empty()) {
        condition = condition.add(Column::DeviceId.eq(device_id));
    }

    let item = Entity::find()
        .filter(condition)
        .order_by_desc(Column::CapturedAt)
        .one(get_connection())
        .await?;
    Ok(item.map(Into::into))
}
