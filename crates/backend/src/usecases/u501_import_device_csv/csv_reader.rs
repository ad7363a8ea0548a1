use contracts::usecases::u501_import_device_csv::request::UNKNOWN_TYPE_MESSAGE;
use contracts::usecases::u501_import_device_csv::schema::{
    canonicalize_device_import_header, detect_device_import_type, normalize_device_import_rows, strip_bom,
};
use contracts::usecases::u501_import_device_csv::{DeviceImportRow, DeviceImportType};
use serde_json::{Map, Value};

pub const EMPTY_FILE_MESSAGE: &str = "CSV file is empty.";

/// Разобранный CSV-файл
#[derive(Debug)]
pub struct ParsedCsv {
    pub import_type: DeviceImportType,
    pub headers: Vec<String>,
    pub rows: Vec<DeviceImportRow>,
}

/// Ошибка разбора, которую показываем клиенту как 400
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CsvFormatError(pub String);

/// Читает CSV целиком: канонизирует заголовки, определяет тип выгрузки
/// и нормализует строки. Пустые строки пропускаются, короткие записи
/// дополняются пустыми значениями.
pub fn parse_device_csv(text: &str) -> Result<ParsedCsv, CsvFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(strip_bom(text).as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvFormatError(format!("Failed to parse CSV: {}", e)))?
        .iter()
        .map(canonicalize_device_import_header)
        .collect();

    let import_type =
        detect_device_import_type(&headers).ok_or_else(|| CsvFormatError(UNKNOWN_TYPE_MESSAGE.to_string()))?;

    let mut raw_rows: Vec<Map<String, Value>> = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| CsvFormatError(format!("CSV parsing error at row {}: {}", index + 1, e)))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let mut row = Map::new();
        for (position, header) in headers.iter().enumerate() {
            let value = record.get(position).unwrap_or("");
            row.insert(header.clone(), Value::String(value.to_string()));
        }
        raw_rows.push(row);
    }

    if raw_rows.is_empty() {
        return Err(CsvFormatError(EMPTY_FILE_MESSAGE.to_string()));
    }

    Ok(ParsedCsv {
        import_type,
        rows: normalize_device_import_rows(import_type, &raw_rows),
        headers,
    })
}

/// То же для тела запроса в байтах (допускается только UTF-8)
pub fn parse_device_csv_bytes(body: &[u8]) -> Result<ParsedCsv, CsvFormatError> {
    let text = std::str::from_utf8(body).map_err(|e| CsvFormatError(format!("CSV must be UTF-8: {}", e)))?;
    parse_device_csv(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAS_GAGE_CSV: &str = "\u{FEFF}CenterID,DeviceID,Model,Serial Number,Black,Cyan,Magenta,Yellow,Customer\n\
C1,D-1,IM C3000,S-1,80,70,60,50,Acme\n\
\n\
,,,,,,,,\n\
C1,D-2,IM C3000,S-2,5,,,,Beta\n\
C1,D-3,IM C3000\n";

    #[test]
    fn test_parse_gas_gage_export() {
        let parsed = parse_device_csv(GAS_GAGE_CSV).unwrap();
        assert_eq!(parsed.import_type, DeviceImportType::GasGage);
        assert_eq!(parsed.headers[0], "CenterID");
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0]["Serial Number"], "S-1");
        assert_eq!(parsed.rows[1]["Cyan"], "");
        // короткая запись дополнена
        assert_eq!(parsed.rows[2]["Black"], "");
        // заголовки схемы, которых нет в файле, тоже присутствуют
        assert!(parsed.rows[0].contains_key("Latest Receive Date"));
    }

    #[test]
    fn test_rejects_unknown_and_empty_files() {
        let unknown = parse_device_csv("foo,bar\n1,2\n").unwrap_err();
        assert_eq!(unknown.to_string(), UNKNOWN_TYPE_MESSAGE);

        let empty =
            parse_device_csv("CenterID,DeviceID,Model,Serial Number,Black,Cyan,Magenta,Yellow,Customer\n").unwrap_err();
        assert_eq!(empty.to_string(), EMPTY_FILE_MESSAGE);

        assert!(parse_device_csv_bytes(&[0xff, 0xfe, 0x00]).is_err());
    }
}
