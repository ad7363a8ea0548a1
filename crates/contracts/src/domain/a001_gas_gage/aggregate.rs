use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{TonerColor, TonerLevels};

/// Подпись для устройств без заказчика
pub const UNASSIGNED_CUSTOMER: &str = "Unassigned";

/// Последний известный снимок устройства из выгрузки Gas Gage.
///
/// Ключ записи - `device_id`. Уровни тонера в процентах, `None` если
/// устройство не прислало значение.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasGageDevice {
    pub center_id: String,
    pub device_id: String,
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

impl GasGageDevice {
    /// Момент последней телеметрии: дата приёма, иначе обновление, иначе создание
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.latest_receive_date
            .or(self.updated_at)
            .or(self.created_at)
    }

    pub fn toner_levels(&self) -> TonerLevels {
        TonerLevels {
            black: self.black,
            cyan: self.cyan,
            magenta: self.magenta,
            yellow: self.yellow,
        }
    }

    pub fn level(&self, color: TonerColor) -> Option<f64> {
        self.toner_levels().get(color)
    }

    /// Имя заказчика для группировки; пустое -> "Unassigned"
    pub fn customer_label(&self) -> String {
        customer_label(self.customer.as_deref())
    }

    pub fn trimmed_serial(&self) -> &str {
        self.serial_number.trim()
    }

    pub fn trimmed_device_id(&self) -> &str {
        self.device_id.trim()
    }
}

pub fn customer_label(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNASSIGNED_CUSTOMER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_last_updated_prefers_receive_date() {
        let received = Utc.with_ymd_and_hms(2025, 7, 4, 6, 19, 8).unwrap();
        let updated = Utc.with_ymd_and_hms(2025, 7, 5, 0, 0, 0).unwrap();
        let mut device = GasGageDevice {
            latest_receive_date: Some(received),
            updated_at: Some(updated),
            ..Default::default()
        };
        assert_eq!(device.last_updated_at(), Some(received));

        device.latest_receive_date = None;
        assert_eq!(device.last_updated_at(), Some(updated));

        device.updated_at = None;
        assert_eq!(device.last_updated_at(), None);
    }

    #[test]
    fn test_customer_label() {
        assert_eq!(customer_label(None), "Unassigned");
        assert_eq!(customer_label(Some("   ")), "Unassigned");
        assert_eq!(customer_label(Some(" Acme ")), "Acme");
    }
}
