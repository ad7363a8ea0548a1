use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::{detect_device_import_type, DeviceImportType};

pub const INVALID_ROWS_MESSAGE: &str = "Invalid data format. Expected an array of CSV rows.";
pub const UNKNOWN_TYPE_MESSAGE: &str =
    "Unable to detect import type. Headers do not match any supported export.";

/// Порция строк CSV, уже разобранная клиентом в JSON.
///
/// `type` можно не указывать: тогда он определяется по `headers` или по
/// ключам первой строки.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportChunkRequest {
    #[serde(rename = "type")]
    pub import_type: Option<String>,
    pub headers: Option<Vec<String>>,
    #[serde(alias = "data")]
    pub rows: Option<Vec<Map<String, Value>>>,
    #[serde(alias = "fileName", alias = "source_file")]
    pub file_name: Option<String>,
}

impl ImportChunkRequest {
    /// Строки запроса; пустой или отсутствующий список - ошибка
    pub fn rows(&self) -> Result<&[Map<String, Value>], String> {
        match self.rows.as_deref() {
            Some(rows) if !rows.is_empty() => Ok(rows),
            _ => Err(INVALID_ROWS_MESSAGE.to_string()),
        }
    }

    pub fn resolve_type(&self) -> Result<DeviceImportType, String> {
        if let Some(code) = self.import_type.as_deref().filter(|c| !c.trim().is_empty()) {
            return DeviceImportType::from_code(code)
                .ok_or_else(|| format!("Unsupported import type: {}", code));
        }

        if let Some(headers) = self.headers.as_deref().filter(|h| !h.is_empty()) {
            return detect_device_import_type(headers).ok_or_else(|| UNKNOWN_TYPE_MESSAGE.to_string());
        }

        let keys: Vec<&str> = self
            .rows()?
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default();
        detect_device_import_type(&keys).ok_or_else(|| UNKNOWN_TYPE_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_type_from_row_keys() {
        let request: ImportChunkRequest = serde_json::from_value(json!({
            "data": [{
                "CenterID": "C1", "DeviceID": "D1", "Model": "M", "Serial Number": "S1",
                "Black": "10", "Cyan": "20", "Magenta": "30", "Yellow": "40", "Customer": "Acme"
            }]
        }))
        .unwrap();
        assert_eq!(request.rows().unwrap().len(), 1);
        assert_eq!(request.resolve_type().unwrap(), DeviceImportType::GasGage);
    }

    #[test]
    fn test_resolve_type_explicit_and_errors() {
        let request: ImportChunkRequest = serde_json::from_value(json!({
            "type": "latest_total",
            "rows": [{"x": 1}]
        }))
        .unwrap();
        assert_eq!(request.resolve_type().unwrap(), DeviceImportType::LatestTotal);

        let empty = ImportChunkRequest::default();
        assert_eq!(empty.rows().unwrap_err(), INVALID_ROWS_MESSAGE);

        let unknown: ImportChunkRequest = serde_json::from_value(json!({
            "headers": ["Foo"],
            "rows": [{"Foo": 1}]
        }))
        .unwrap();
        assert_eq!(unknown.resolve_type().unwrap_err(), UNKNOWN_TYPE_MESSAGE);

        let bad: ImportChunkRequest =
            serde_json::from_value(json!({"type": "xlsx", "rows": [{}]})).unwrap();
        assert!(bad.resolve_type().unwrap_err().contains("xlsx"));
    }
}
