use chrono::{DateTime, Utc};
use contracts::domain::a001_gas_gage::aggregate::GasGageDevice;
use contracts::enums::{TonerColor, TonerLevels};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_gas_gage")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub device_id: String,
    pub center_id: String,
    pub serial_number: String,
    pub model: Option<String>,
    pub code_name: Option<String>,
    pub erp_id: Option<String>,
    pub protocol: Option<String>,
    pub black: Option<f64>,
    pub cyan: Option<f64>,
    pub magenta: Option<f64>,
    pub yellow: Option<f64>,
    pub special_color: Option<f64>,
    pub special_color_gage: Option<String>,
    pub customer: Option<String>,
    pub customer_site: Option<String>,
    pub customer_number: Option<String>,
    pub sales_office: Option<String>,
    pub service_office: Option<String>,
    pub latest_receive_date: Option<DateTime<Utc>>,
    pub device_host_name: Option<String>,
    pub device_location: Option<String>,
    pub toner_replacement_date_black: Option<DateTime<Utc>>,
    pub toner_replacement_date_cyan: Option<DateTime<Utc>>,
    pub toner_replacement_date_magenta: Option<DateTime<Utc>>,
    pub toner_replacement_date_yellow: Option<DateTime<Utc>>,
    pub toner_replacement_date_special_color: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for GasGageDevice {
    fn from(m: Model) -> Self {
        GasGageDevice {
            center_id: m.center_id,
            device_id: m.device_id,
            serial_number: m.serial_number,
            model: m.model,
            code_name: m.code_name,
            erp_id: m.erp_id,
            protocol: m.protocol,
            black: m.black,
            cyan: m.cyan,
            magenta: m.magenta,
            yellow: m.yellow,
            special_color: m.special_color,
            special_color_gage: m.special_color_gage,
            customer: m.customer,
            customer_site: m.customer_site,
            customer_number: m.customer_number,
            sales_office: m.sales_office,
            service_office: m.service_office,
            latest_receive_date: m.latest_receive_date,
            device_host_name: m.device_host_name,
            device_location: m.device_location,
            toner_replacement_date_black: m.toner_replacement_date_black,
            toner_replacement_date_cyan: m.toner_replacement_date_cyan,
            toner_replacement_date_magenta: m.toner_replacement_date_magenta,
            toner_replacement_date_yellow: m.toner_replacement_date_yellow,
            toner_replacement_date_special_color: m.toner_replacement_date_special_color,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn to_active_model(d: &GasGageDevice, now: DateTime<Utc>) -> ActiveModel {
    ActiveModel {
        device_id: Set(d.device_id.clone()),
        center_id: Set(d.center_id.clone()),
        serial_number: Set(d.serial_number.clone()),
        model: Set(d.model.clone()),
        code_name: Set(d.code_name.clone()),
        erp_id: Set(d.erp_id.clone()),
        protocol: Set(d.protocol.clone()),
        black: Set(d.black),
        cyan: Set(d.cyan),
        magenta: Set(d.magenta),
        yellow: Set(d.yellow),
        special_color: Set(d.special_color),
        special_color_gage: Set(d.special_color_gage.clone()),
        customer: Set(d.customer.clone()),
        customer_site: Set(d.customer_site.clone()),
        customer_number: Set(d.customer_number.clone()),
        sales_office: Set(d.sales_office.clone()),
        service_office: Set(d.service_office.clone()),
        latest_receive_date: Set(d.latest_receive_date),
        device_host_name: Set(d.device_host_name.clone()),
        device_location: Set(d.device_location.clone()),
        toner_replacement_date_black: Set(d.toner_replacement_date_black),
        toner_replacement_date_cyan: Set(d.toner_replacement_date_cyan),
        toner_replacement_date_magenta: Set(d.toner_replacement_date_magenta),
        toner_replacement_date_yellow: Set(d.toner_replacement_date_yellow),
        toner_replacement_date_special_color: Set(d.toner_replacement_date_special_color),
        created_at: Set(d.created_at.or(Some(now))),
        updated_at: Set(Some(now)),
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Все устройства, по заказчику и device_id
pub async fn list_all() -> anyhow::Result<Vec<GasGageDevice>> {
    let items = Entity::find()
        .order_by_asc(Column::Customer)
        .order_by_asc(Column::DeviceId)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_device_id(device_id: &str) -> anyhow::Result<Option<GasGageDevice>> {
    let result = Entity::find_by_id(device_id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

/// Поиск по серийному номеру; для строк без серийника - по device_id
pub async fn get_by_serial(serial: &str) -> anyhow::Result<Option<GasGageDevice>> {
    let by_serial = Entity::find()
        .filter(Column::SerialNumber.eq(serial))
        .one(conn())
        .await?;
    match by_serial {
        Some(model) => Ok(Some(model.into())),
        None => get_by_device_id(serial).await,
    }
}

/// Текущие уровни тонера до перезаписи импортом (ключ - device_id)
pub async fn fetch_current_toner_levels(
    device_ids: &[String],
) -> anyhow::Result<HashMap<String, (String, TonerLevels)>> {
    if device_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Entity::find()
        .filter(Column::DeviceId.is_in(device_ids.iter().cloned()))
        .all(conn())
        .await?;

    Ok(rows
        .into_iter()
        .map(|m| {
            let levels = TonerLevels {
                black: m.black,
                cyan: m.cyan,
                magenta: m.magenta,
                yellow: m.yellow,
            };
            (m.device_id, (m.serial_number, levels))
        })
        .collect())
}

/// Серийный номер -> device_id для указанных серийников
pub async fn map_serials_to_device_ids(
    serials: &[String],
) -> anyhow::Result<HashMap<String, String>> {
    if serials.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Entity::find()
        .filter(Column::SerialNumber.is_in(serials.iter().cloned()))
        .all(conn())
        .await?;
    Ok(rows
        .into_iter()
        .map(|m| (m.serial_number.trim().to_string(), m.device_id))
        .collect())
}

/// Пакетный upsert по device_id; created_at при обновлении не трогаем
pub async fn upsert_batch(devices: &[GasGageDevice]) -> anyhow::Result<()> {
    if devices.is_empty() {
        return Ok(());
    }
    let now = Utc::now();
    let models: Vec<ActiveModel> = devices.iter().map(|d| to_active_model(d, now)).collect();

    Entity::insert_many(models)
        .on_conflict(
            OnConflict::column(Column::DeviceId)
                .update_columns([
                    Column::CenterId,
                    Column::SerialNumber,
                    Column::Model,
                    Column::CodeName,
                    Column::ErpId,
                    Column::Protocol,
                    Column::Black,
                    Column::Cyan,
                    Column::Magenta,
                    Column::Yellow,
                    Column::SpecialColor,
                    Column::SpecialColorGage,
                    Column::Customer,
                    Column::CustomerSite,
                    Column::CustomerNumber,
                    Column::SalesOffice,
                    Column::ServiceOffice,
                    Column::LatestReceiveDate,
                    Column::DeviceHostName,
                    Column::DeviceLocation,
                    Column::TonerReplacementDateBlack,
                    Column::TonerReplacementDateCyan,
                    Column::TonerReplacementDateMagenta,
                    Column::TonerReplacementDateYellow,
                    Column::TonerReplacementDateSpecialColor,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn())
        .await?;
    Ok(())
}

fn replacement_date_column(color: TonerColor) -> Column {
    match color {
        TonerColor::Black => Column::TonerReplacementDateBlack,
        TonerColor::Cyan => Column::TonerReplacementDateCyan,
        TonerColor::Magenta => Column::TonerReplacementDateMagenta,
        TonerColor::Yellow => Column::TonerReplacementDateYellow,
    }
}

/// Отмечает замену картриджа цвета `color`
pub async fn set_toner_replacement_date(
    device_id: &str,
    color: TonerColor,
    at: DateTime<Utc>,
) -> anyhow::Result<()> {
    Entity::update_many()
        .col_expr(replacement_date_column(color), Expr::value(at))
        .filter(Column::DeviceId.eq(device_id))
        .exec(conn())
        .await?;
    Ok(())
}
