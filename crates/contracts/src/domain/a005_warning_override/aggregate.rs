use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::WarningScope;

/// Подавление предупреждений устройства до прихода новой телеметрии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningOverride {
    pub id: String,
    pub device_id: Option<String>,
    pub serial_number: String,
    pub scope: WarningScope,
    pub dismissed_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WarningOverride {
    /// Новое подавление с `dismissed_at = now`
    pub fn dismiss(serial_number: &str, device_id: Option<String>, scope: WarningScope) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id,
            serial_number: serial_number.trim().to_string(),
            scope,
            dismissed_at: now,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Действует ли подавление: не истекло и телеметрия не приходила после него
    pub fn is_active(&self, last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        if matches!(self.expires_at, Some(expires) if expires <= now) {
            return false;
        }
        if matches!(last_updated, Some(updated) if self.dismissed_at <= updated) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningActionResponse {
    pub success: bool,
    pub serial_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_override_lifetime() {
        let mut o = WarningOverride::dismiss(" SN1 ", None, WarningScope::All);
        assert_eq!(o.serial_number, "SN1");
        let now = o.dismissed_at + Duration::minutes(5);

        assert!(o.is_active(None, now));
        assert!(o.is_active(Some(o.dismissed_at - Duration::hours(1)), now));
        // телеметрия пришла ровно в момент подавления -> уже не действует
        assert!(!o.is_active(Some(o.dismissed_at), now));

        o.expires_at = Some(now);
        assert!(!o.is_active(None, now));
    }
}
