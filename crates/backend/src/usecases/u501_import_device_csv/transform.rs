//! Преобразование нормализованных строк CSV в записи БД.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use contracts::domain::a001_gas_gage::aggregate::GasGageDevice;
use contracts::projections::p900_toner_snapshots::dto::TonerSnapshotDto;
use contracts::projections::p901_meter_readings::dto::MeterReadingDto;
use contracts::projections::p902_warning_events::dto::WarningEventDto;
use contracts::projections::p903_consumable_events::dto::ConsumableEventDto;
use contracts::usecases::u501_import_device_csv::DeviceImportRow;

pub const GAS_GAGE_SNAPSHOT_SOURCE: &str = "gas_gage";

/// Число из начала строки, как делает большинство выгрузок: "85%" -> 85.
/// Пустое значение или строка без цифр в начале -> `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Счётчики хранятся целыми
pub fn parse_counter(value: &str) -> Option<i64> {
    parse_number(value).map(|n| n.round() as i64)
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let (sign, digits) = match zone.as_bytes().first() {
        Some(b'+') => (1, &zone[1..]),
        Some(b'-') => (-1, &zone[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Отделяет зону от времени: "6:19:08Z", "06:19:08+09:00", "06:19 UTC"
fn split_zone(time: &str) -> Option<(&str, FixedOffset)> {
    let utc = FixedOffset::east_opt(0)?;
    let time = time.trim();
    for suffix in [" UTC", " GMT", "Z", "z"] {
        if let Some(rest) = time.strip_suffix(suffix) {
            return Some((rest.trim(), utc));
        }
    }
    match time.rfind(['+', '-']) {
        Some(idx) if idx > 0 => Some((time[..idx].trim(), parse_offset(&time[idx..])?)),
        _ => Some((time, utc)),
    }
}

/// Дата выгрузки в UTC.
///
/// Принимает `YYYY-MM-DD` и `YYYY.MM.DD` с необязательным временем
/// `H:M[:S[.fff]]` и зоной, а также RFC 3339. Время без зоны считается UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let (date_part, time_part) = match value.find([' ', 'T']) {
        Some(idx) => (&value[..idx], value[idx + 1..].trim()),
        None => (value, ""),
    };
    let date = NaiveDate::parse_from_str(&date_part.replace(['.', '/'], "-"), "%Y-%m-%d").ok()?;
    if time_part.is_empty() {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    let (clock, offset) = split_zone(time_part)?;
    let time = NaiveTime::parse_from_str(clock, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
        .ok()?;
    let local = date.and_time(time);
    Some(Utc.from_utc_datetime(&local) - Duration::seconds(offset.local_minus_utc() as i64))
}

/// "Yes"/"true"/"1" -> true, "No"/"false"/"0" -> false
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "" => None,
        "yes" | "y" | "true" | "1" | "recovered" => Some(true),
        "no" | "n" | "false" | "0" | "not recovered" => Some(false),
        _ => None,
    }
}

fn field<'a>(row: &'a DeviceImportRow, header: &str) -> &'a str {
    row.get(header).map(|v| v.trim()).unwrap_or("")
}

fn text(row: &DeviceImportRow, header: &str) -> Option<String> {
    Some(field(row, header))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(row: &DeviceImportRow, header: &str) -> Result<String, String> {
    text(row, header).ok_or_else(|| format!("{} is required", header))
}

fn raw_json(row: &DeviceImportRow) -> Option<serde_json::Value> {
    serde_json::to_value(row).ok()
}

/// Серийный номер, а если его нет - DeviceID
fn serial_or_device_id(row: &DeviceImportRow) -> Option<String> {
    text(row, "Serial Number").or_else(|| text(row, "DeviceID"))
}

pub fn to_gas_gage(row: &DeviceImportRow, now: DateTime<Utc>) -> Result<GasGageDevice, String> {
    let device_id = required(row, "DeviceID")?;
    Ok(GasGageDevice {
        center_id: field(row, "CenterID").to_string(),
        serial_number: serial_or_device_id(row).unwrap_or_else(|| device_id.clone()),
        device_id,
        model: text(row, "Model"),
        code_name: text(row, "Code Name"),
        erp_id: text(row, "ERPID"),
        protocol: text(row, "Protocol"),
        black: parse_number(field(row, "Black")),
        cyan: parse_number(field(row, "Cyan")),
        magenta: parse_number(field(row, "Magenta")),
        yellow: parse_number(field(row, "Yellow")),
        special_color: parse_number(field(row, "Special Color")),
        special_color_gage: text(row, "Special Color Gage"),
        customer: text(row, "Customer"),
        customer_site: None,
        customer_number: None,
        sales_office: text(row, "Sales Office"),
        service_office: text(row, "Service Office"),
        latest_receive_date: parse_timestamp(field(row, "Latest Receive Date")),
        device_host_name: text(row, "Device Host Name"),
        device_location: text(row, "Device Location"),
        toner_replacement_date_black: parse_timestamp(field(row, "Toner Replacement Date (Black)")),
        toner_replacement_date_cyan: parse_timestamp(field(row, "Toner Replacement Date (Cyan)")),
        toner_replacement_date_magenta: parse_timestamp(field(row, "Toner Replacement Date (Magenta)")),
        toner_replacement_date_yellow: parse_timestamp(field(row, "Toner Replacement Date (Yellow)")),
        toner_replacement_date_special_color: parse_timestamp(field(
            row,
            "Toner Replacement Date (Special Color)",
        )),
        created_at: Some(now),
        updated_at: Some(now),
    })
}

/// Снимок уровней по строке Gas Gage
pub fn to_toner_snapshot(device: &GasGageDevice, now: DateTime<Utc>) -> TonerSnapshotDto {
    TonerSnapshotDto {
        id: 0,
        device_id: Some(device.device_id.clone()),
        serial_number: Some(device.serial_number.clone()).filter(|s| !s.is_empty()),
        snapshot_source: Some(GAS_GAGE_SNAPSHOT_SOURCE.to_string()),
        captured_at: device.latest_receive_date.unwrap_or(now),
        black: device.black,
        cyan: device.cyan,
        magenta: device.magenta,
        yellow: device.yellow,
        special_color: device.special_color,
        waste_toner: None,
        raw: None,
    }
}

pub fn to_meter_reading(row: &DeviceImportRow) -> Result<MeterReadingDto, String> {
    let serial = serial_or_device_id(row).ok_or_else(|| "Serial Number or DeviceID is required".to_string())?;
    let captured_at = parse_timestamp(field(row, "Server received date"))
        .ok_or_else(|| "Server received date is missing or invalid".to_string())?;
    Ok(MeterReadingDto {
        id: 0,
        device_id: text(row, "DeviceID"),
        serial_number: Some(serial),
        captured_at,
        total: parse_counter(field(row, "Total")),
        printer_total: parse_counter(field(row, "Printer:Total")),
        copy_total: parse_counter(field(row, "Copy:Total")),
        scan_total: parse_counter(field(row, "Scanner/FAX:Scan")),
        duplex_total: parse_counter(field(row, "Duplex:Total")),
        black_total: parse_counter(field(row, "Black:Total")),
        color_total: parse_counter(field(row, "Full Color:Total")),
        meter_a: parse_counter(field(row, "Meter A")),
        meter_b: parse_counter(field(row, "Meter B")),
        meter_c: parse_counter(field(row, "Meter C")),
        raw: raw_json(row),
    })
}

pub fn to_warning_event(row: &DeviceImportRow, now: DateTime<Utc>) -> Result<WarningEventDto, String> {
    let device_id = required(row, "DeviceID")?;
    let received = parse_timestamp(field(row, "Server received date"))
        .ok_or_else(|| "Server received date is missing or invalid".to_string())?;
    Ok(WarningEventDto {
        id: 0,
        device_id: Some(device_id),
        serial_number: text(row, "Serial Number"),
        alert_code: text(row, "Code"),
        message: text(row, "Warning Contents"),
        warning_type: text(row, "TC"),
        received_at_server: Some(received),
        occurred_at_device: parse_timestamp(field(row, "Occurred device Date")),
        recovered_at_server: parse_timestamp(field(row, "Recovered server Date")),
        recovered_at_device: parse_timestamp(field(row, "Recovered device Date")),
        recovered: parse_flag(field(row, "Recovered")),
        raw: raw_json(row),
        created_at: Some(now),
    })
}

pub fn to_consumable_event(row: &DeviceImportRow) -> Result<ConsumableEventDto, String> {
    let device_id = required(row, "DeviceID")?;
    Ok(ConsumableEventDto {
        id: 0,
        serial_number: serial_or_device_id(row),
        device_id: Some(device_id),
        event_type: text(row, "Type"),
        warning_code: text(row, "Warning Code"),
        description: text(row, "Description"),
        status: text(row, "Status"),
        tc: parse_number(field(row, "TC")),
        captured_at: None,
        raw: raw_json(row),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn row(pairs: &[(&str, &str)]) -> DeviceImportRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_number_is_lenient() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  12.5 "), Some(12.5));
        assert_eq!(parse_number("85%"), Some(85.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e2x"), Some(100.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_counter("1234.6"), Some(1235));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let dotted = parse_timestamp("2025.07.04 6:19:08").unwrap();
        assert_eq!((dotted.year(), dotted.month(), dotted.day()), (2025, 7, 4));
        assert_eq!((dotted.hour(), dotted.minute(), dotted.second()), (6, 19, 8));

        let date_only = parse_timestamp("2025-07-04").unwrap();
        assert_eq!(date_only.hour(), 0);

        let short = parse_timestamp("2025/7/4 14:05").unwrap();
        assert_eq!((short.day(), short.hour(), short.minute()), (4, 14, 5));

        let zoned = parse_timestamp("2025-07-04 09:00:00+09:00").unwrap();
        assert_eq!(zoned.hour(), 0);

        let fraction = parse_timestamp("2025-07-04T06:19:08.250Z").unwrap();
        assert_eq!(fraction.second(), 8);

        let rfc = parse_timestamp("2025-07-04T06:19:08-02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2025-13-40"), None);
    }

    #[test]
    fn test_parse_timestamp_rejects_non_ascii_zone() {
        assert_eq!(parse_timestamp("2025-07-04 06:19:08+1é1"), None);
        assert_eq!(parse_timestamp("2025-07-04 06:19:08+0é"), None);
        assert_eq!(parse_timestamp("2025-07-04 06:19:08+１２:００"), None);
        assert!(parse_timestamp("2025-07-04 06:19:08+0130").is_some());
    }

    #[test]
    fn test_gas_gage_serial_falls_back_to_device_id() {
        let now = Utc::now();
        let device = to_gas_gage(
            &row(&[("DeviceID", "D-1"), ("Black", "55"), ("Cyan", ""), ("Customer", "Acme")]),
            now,
        )
        .unwrap();
        assert_eq!(device.serial_number, "D-1");
        assert_eq!(device.black, Some(55.0));
        assert_eq!(device.cyan, None);
        assert_eq!(device.customer.as_deref(), Some("Acme"));

        let snapshot = to_toner_snapshot(&device, now);
        assert_eq!(snapshot.captured_at, now);
        assert_eq!(snapshot.snapshot_source.as_deref(), Some("gas_gage"));

        let err = to_gas_gage(&row(&[("Serial Number", "S1")]), now).unwrap_err();
        assert_eq!(err, "DeviceID is required");
    }

    #[test]
    fn test_meter_and_warning_rows() {
        let meter = to_meter_reading(&row(&[
            ("DeviceID", "D-1"),
            ("Serial Number", "S-1"),
            ("Server received date", "2025.07.04 6:19:08"),
            ("Total", "1000"),
            ("Full Color:Total", "250"),
        ]))
        .unwrap();
        assert_eq!(meter.serial_number.as_deref(), Some("S-1"));
        assert_eq!(meter.total, Some(1000));
        assert_eq!(meter.color_total, Some(250));
        assert!(meter.raw.is_some());

        let missing_date = to_meter_reading(&row(&[("DeviceID", "D-1")])).unwrap_err();
        assert!(missing_date.contains("Server received date"));

        let warning = to_warning_event(
            &row(&[
                ("DeviceID", "D-1"),
                ("Code", "J-100"),
                ("Warning Contents", "Toner low (Black)"),
                ("Server received date", "2025-07-04 06:00"),
                ("Recovered", "Yes"),
            ]),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(warning.recovered, Some(true));
        assert_eq!(warning.alert_code.as_deref(), Some("J-100"));
        assert_eq!(warning.serial_number, None);
    }
}
