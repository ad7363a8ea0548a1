use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Цветовая шкала гейджа тонера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TonerStatusLevel {
    Normal,
    Warning,
    Critical,
    Unknown,
}

/// >= 50 normal, >= 20 warning, меньше - critical, нет значения - unknown
pub fn toner_status_level(value: Option<f64>) -> TonerStatusLevel {
    match value {
        None => TonerStatusLevel::Unknown,
        Some(v) if v.is_nan() => TonerStatusLevel::Unknown,
        Some(v) if v >= 50.0 => TonerStatusLevel::Normal,
        Some(v) if v >= 20.0 => TonerStatusLevel::Warning,
        Some(_) => TonerStatusLevel::Critical,
    }
}

/// "42%" или "--"
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{}%", v.round() as i64),
        _ => "--".to_string(),
    }
}

/// Относительное время: "just now", "5m ago", "3h ago", "2d ago"
pub fn format_relative_time(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "unknown".to_string();
    };
    let minutes = (now - at).num_seconds().div_euclid(60);
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_toner_status_level() {
        assert_eq!(toner_status_level(None), TonerStatusLevel::Unknown);
        assert_eq!(toner_status_level(Some(f64::NAN)), TonerStatusLevel::Unknown);
        assert_eq!(toner_status_level(Some(50.0)), TonerStatusLevel::Normal);
        assert_eq!(toner_status_level(Some(49.9)), TonerStatusLevel::Warning);
        assert_eq!(toner_status_level(Some(20.0)), TonerStatusLevel::Warning);
        assert_eq!(toner_status_level(Some(19.0)), TonerStatusLevel::Critical);
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(None), "--");
        assert_eq!(format_percent(Some(42.4)), "42%");
        assert_eq!(format_percent(Some(42.5)), "43%");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(None, now), "unknown");
        assert_eq!(format_relative_time(Some(now - Duration::seconds(30)), now), "just now");
        assert_eq!(format_relative_time(Some(now + Duration::minutes(5)), now), "just now");
        assert_eq!(format_relative_time(Some(now - Duration::minutes(59)), now), "59m ago");
        assert_eq!(format_relative_time(Some(now - Duration::hours(23)), now), "23h ago");
        assert_eq!(format_relative_time(Some(now - Duration::hours(50)), now), "2d ago");
    }
}
