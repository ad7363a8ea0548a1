//! Схемы CSV-выгрузок устройств: канонизация заголовков, определение типа
//! файла и нормализация строк.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Нормализованная строка импорта: канонический заголовок -> значение
pub type DeviceImportRow = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceImportType {
    GasGage,
    LatestTotal,
    WarningHistory,
    ConsumableEvents,
}

impl DeviceImportType {
    pub fn code(&self) -> &'static str {
        match self {
            DeviceImportType::GasGage => "gas_gage",
            DeviceImportType::LatestTotal => "latest_total",
            DeviceImportType::WarningHistory => "warning_history",
            DeviceImportType::ConsumableEvents => "consumable_events",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "gas_gage" => Some(DeviceImportType::GasGage),
            "latest_total" => Some(DeviceImportType::LatestTotal),
            "warning_history" => Some(DeviceImportType::WarningHistory),
            "consumable_events" => Some(DeviceImportType::ConsumableEvents),
            _ => None,
        }
    }

    pub fn schema(&self) -> &'static DeviceImportSchema {
        match self {
            DeviceImportType::GasGage => &DEVICE_IMPORT_SCHEMAS[0],
            DeviceImportType::LatestTotal => &DEVICE_IMPORT_SCHEMAS[1],
            DeviceImportType::WarningHistory => &DEVICE_IMPORT_SCHEMAS[2],
            DeviceImportType::ConsumableEvents => &DEVICE_IMPORT_SCHEMAS[3],
        }
    }
}

impl fmt::Display for DeviceImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug)]
pub struct DeviceImportSchema {
    pub import_type: DeviceImportType,
    pub label: &'static str,
    pub description: &'static str,
    pub required_headers: &'static [&'static str],
    pub optional_headers: &'static [&'static str],
    pub preview_columns: &'static [&'static str],
    /// Нормализованный ключ -> канонический заголовок
    pub aliases: &'static [(&'static str, &'static str)],
}

impl DeviceImportSchema {
    pub fn all_headers(&self) -> impl Iterator<Item = &'static str> {
        self.required_headers
            .iter()
            .chain(self.optional_headers.iter())
            .copied()
    }
}

pub static DEVICE_IMPORT_SCHEMAS: [DeviceImportSchema; 4] = [
    DeviceImportSchema {
        import_type: DeviceImportType::GasGage,
        label: "Gas Gage Toner Snapshot",
        description: "Toner levels and device metadata exported from the Gas Gage dashboard.",
        required_headers: &[
            "CenterID",
            "DeviceID",
            "Model",
            "Serial Number",
            "Black",
            "Cyan",
            "Magenta",
            "Yellow",
            "Customer",
        ],
        optional_headers: &[
            "Code Name",
            "ERPID",
            "Protocol",
            "Special Color",
            "Special Color Gage",
            "Sales Office",
            "Service Office",
            "Latest Receive Date",
            "Device Host Name",
            "Device Location",
            "Toner Replacement Date (Black)",
            "Toner Replacement Date (Cyan)",
            "Toner Replacement Date (Magenta)",
            "Toner Replacement Date (Yellow)",
            "Toner Replacement Date (Special Color)",
        ],
        preview_columns: &["DeviceID", "Customer", "Model", "Black", "Cyan", "Magenta", "Yellow"],
        aliases: &[
            ("customername", "Customer"),
            ("serial", "Serial Number"),
            ("serialno", "Serial Number"),
            ("serialnum", "Serial Number"),
            ("serialnumber", "Serial Number"),
            ("codename", "Code Name"),
            ("devicehostname", "Device Host Name"),
            ("devicehost", "Device Host Name"),
            ("devicelocation", "Device Location"),
            ("serviceoffice", "Service Office"),
            ("salesoffice", "Sales Office"),
        ],
    },
    DeviceImportSchema {
        import_type: DeviceImportType::LatestTotal,
        label: "Latest Total Meter Reading",
        description: "Cumulative meter counters from the LatestTotal CSV export.",
        required_headers: &[
            "CenterID",
            "DeviceID",
            "Serial Number",
            "Model",
            "Server received date",
            "Total",
            "Copy:Total",
            "Printer:Total",
        ],
        optional_headers: &[
            "Duplex:Total",
            "Copy:Black",
            "Copy:Full Color",
            "Printer:Black",
            "Printer:Full Color",
            "Scanner/FAX:Scan",
            "Scanner/FAX:Print",
            "Black:Total",
            "Full Color:Total",
            "Meter A",
            "Meter B",
            "Meter C",
            "Customer",
            "Department",
            "Service Office",
            "Device Host Name",
            "Device Location",
            "Special Color",
            "Special Color: Total",
        ],
        preview_columns: &[
            "DeviceID",
            "Customer",
            "Server received date",
            "Total",
            "Copy:Total",
            "Printer:Total",
        ],
        aliases: &[],
    },
    DeviceImportSchema {
        import_type: DeviceImportType::WarningHistory,
        label: "Warning History",
        description: "Warning and alert events from the WarningHistory CSV export.",
        required_headers: &[
            "CenterID",
            "DeviceID",
            "Code",
            "Warning Contents",
            "Server received date",
        ],
        optional_headers: &[
            "Model",
            "Code Name",
            "Recovered",
            "TC",
            "Customer Name",
            "Department",
            "Service Office",
            "Alert Registration Date",
            "Occurred device Date",
            "Recovered server Date",
            "Recovered device Date",
            "Serial Number",
            "Device Host Name",
            "Device Location",
        ],
        preview_columns: &[
            "DeviceID",
            "Code",
            "Warning Contents",
            "Server received date",
            "Recovered",
        ],
        aliases: &[("customer", "Customer Name"), ("customername", "Customer Name")],
    },
    DeviceImportSchema {
        import_type: DeviceImportType::ConsumableEvents,
        label: "Yields / Consumables",
        description: "Consumable lifecycle records from the Yields_Consumables CSV export.",
        required_headers: &[
            "CenterID",
            "DeviceID",
            "Serial Number",
            "Model",
            "Type",
            "Warning Code",
            "Description",
            "Status",
            "TC",
        ],
        optional_headers: &[
            "Code Name",
            "Customer",
            "Department",
            "Service Office",
            "Device Host Name",
            "Device Location",
        ],
        preview_columns: &["DeviceID", "Type", "Warning Code", "Description", "Status", "TC"],
        aliases: &[],
    },
];

/// Нормализованный ключ заголовка -> канонический заголовок.
/// Заголовок более поздней схемы перекрывает ранний; псевдоним не
/// перекрывает уже занятый ключ.
static HEADER_ALIAS_MAP: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut map: HashMap<String, &'static str> = HashMap::new();
    for schema in DEVICE_IMPORT_SCHEMAS.iter() {
        for header in schema.all_headers() {
            map.insert(normalize_header_key(header), header);
        }
        for &(alias, canonical) in schema.aliases {
            map.entry(alias.to_string()).or_insert(canonical);
        }
    }
    map
});

pub fn strip_bom(value: &str) -> &str {
    value.strip_prefix('\u{FEFF}').unwrap_or(value)
}

/// "Serial  Number" -> "serialnumber"
pub fn normalize_header_key(header: &str) -> String {
    strip_bom(header)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Канонический заголовок; неизвестный возвращается обрезанным
pub fn canonicalize_device_import_header(header: &str) -> String {
    match HEADER_ALIAS_MAP.get(&normalize_header_key(header)) {
        Some(canonical) => canonical.to_string(),
        None => strip_bom(header).trim().to_string(),
    }
}

/// Все ли обязательные заголовки схемы присутствуют
pub fn validate_headers_for_type<S: AsRef<str>>(import_type: DeviceImportType, headers: &[S]) -> bool {
    let canonical: Vec<String> = headers
        .iter()
        .map(|h| canonicalize_device_import_header(h.as_ref()))
        .collect();
    import_type
        .schema()
        .required_headers
        .iter()
        .all(|required| canonical.iter().any(|h| h == required))
}

/// Определяет тип выгрузки; при нескольких совпадениях берётся схема
/// с наибольшим числом обязательных заголовков.
pub fn detect_device_import_type<S: AsRef<str>>(headers: &[S]) -> Option<DeviceImportType> {
    let mut best: Option<&DeviceImportSchema> = None;
    for schema in DEVICE_IMPORT_SCHEMAS.iter() {
        if !validate_headers_for_type(schema.import_type, headers) {
            continue;
        }
        match best {
            Some(current) if current.required_headers.len() >= schema.required_headers.len() => {}
            _ => best = Some(schema),
        }
    }
    best.map(|schema| schema.import_type)
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Канонизирует ключи и добавляет отсутствующие заголовки схемы пустыми строками
pub fn normalize_device_import_rows(
    import_type: DeviceImportType,
    rows: &[Map<String, Value>],
) -> Vec<DeviceImportRow> {
    let schema = import_type.schema();
    rows.iter()
        .map(|row| {
            let mut normalized = DeviceImportRow::new();
            for (key, value) in row {
                normalized.insert(canonicalize_device_import_header(key), value_to_string(value));
            }
            for header in schema.all_headers() {
                normalized.entry(header.to_string()).or_default();
            }
            normalized
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonicalize_header() {
        assert_eq!(canonicalize_device_import_header("\u{FEFF}CenterID"), "CenterID");
        assert_eq!(canonicalize_device_import_header("serial_no"), "Serial Number");
        assert_eq!(canonicalize_device_import_header("SERIAL NUMBER"), "Serial Number");
        assert_eq!(canonicalize_device_import_header("copy total"), "Copy:Total");
        assert_eq!(
            canonicalize_device_import_header("toner replacement date black"),
            "Toner Replacement Date (Black)"
        );
        // "customer" уже занят заголовком Gas Gage
        assert_eq!(canonicalize_device_import_header("customer"), "Customer");
        assert_eq!(canonicalize_device_import_header("  Foo Bar "), "Foo Bar");
    }

    #[test]
    fn test_later_schema_header_overrides_earlier_alias() {
        assert_eq!(canonicalize_device_import_header("Customer Name"), "Customer Name");
        assert_eq!(canonicalize_device_import_header("customer_name"), "Customer Name");

        // Gas Gage требует именно Customer
        let headers = [
            "CenterID",
            "DeviceID",
            "Model",
            "Serial Number",
            "Black",
            "Cyan",
            "Magenta",
            "Yellow",
            "Customer Name",
        ];
        assert!(!validate_headers_for_type(DeviceImportType::GasGage, &headers));
        assert_eq!(detect_device_import_type(&headers), None);
    }

    #[test]
    fn test_detect_types() {
        let gas = [
            "CenterID", "DeviceID", "Model", "Serial Number", "Black", "Cyan", "Magenta",
            "Yellow", "Customer",
        ];
        assert_eq!(detect_device_import_type(&gas), Some(DeviceImportType::GasGage));

        let warnings = [
            "centerid",
            "Device ID",
            "Code",
            "Warning Contents",
            "Server received date",
        ];
        assert_eq!(
            detect_device_import_type(&warnings),
            Some(DeviceImportType::WarningHistory)
        );

        let consumables = [
            "CenterID", "DeviceID", "Serial Number", "Model", "Type", "Warning Code",
            "Description", "Status", "TC",
        ];
        assert_eq!(
            detect_device_import_type(&consumables),
            Some(DeviceImportType::ConsumableEvents)
        );

        assert_eq!(detect_device_import_type(&["Foo", "Bar"]), None);
        assert!(!validate_headers_for_type(DeviceImportType::LatestTotal, &gas));
    }

    #[test]
    fn test_detect_prefers_schema_with_most_required_headers() {
        // подходит и под WarningHistory (5), и под ConsumableEvents (9)
        let headers = [
            "CenterID",
            "DeviceID",
            "Serial Number",
            "Model",
            "Type",
            "Warning Code",
            "Description",
            "Status",
            "TC",
            "Code",
            "Warning Contents",
            "Server received date",
        ];
        assert_eq!(
            detect_device_import_type(&headers),
            Some(DeviceImportType::ConsumableEvents)
        );
    }

    #[test]
    fn test_normalize_rows() {
        let row = json!({"serial": "SN1", "Black": 42, "Extra": null, "DeviceID": "D1"});
        let rows = vec![row.as_object().unwrap().clone()];
        let normalized = normalize_device_import_rows(DeviceImportType::GasGage, &rows);

        let first = &normalized[0];
        assert_eq!(first["Serial Number"], "SN1");
        assert_eq!(first["Black"], "42");
        assert_eq!(first["Extra"], "");
        assert_eq!(first["Cyan"], "");
        assert_eq!(first["Toner Replacement Date (Special Color)"], "");
    }
}
