use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::aggregate::{ActiveOrderScopes, DeviceOrderPayload};
use crate::enums::OrderScope;

pub const INVALID_SCOPE_MESSAGE: &str =
    "Invalid scope. Must be one of black, cyan, magenta, yellow, or waste.";
pub const EMPTY_DEVICES_MESSAGE: &str = "devices must be a non-empty array.";

/// POST /api/orders/bulk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkOrderRequest {
    pub scope: Option<String>,
    pub devices: Option<Vec<DeviceOrderPayload>>,
    #[serde(alias = "skipExisting")]
    pub skip_existing: bool,
}

impl BulkOrderRequest {
    /// Проверяет scope и список устройств, возвращает их в разобранном виде
    pub fn validate(&self) -> Result<(OrderScope, &[DeviceOrderPayload]), String> {
        let scope = self
            .scope
            .as_deref()
            .and_then(OrderScope::from_code)
            .ok_or_else(|| INVALID_SCOPE_MESSAGE.to_string())?;
        match self.devices.as_deref() {
            Some(devices) if !devices.is_empty() => Ok((scope, devices)),
            _ => Err(EMPTY_DEVICES_MESSAGE.to_string()),
        }
    }

    /// Уникальные непустые серийные номера из запроса
    pub fn normalized_serials(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut serials = Vec::new();
        for device in self.devices.iter().flatten() {
            if let Some(serial) = device.trimmed_serial() {
                if seen.insert(serial.to_string()) {
                    serials.push(serial.to_string());
                }
            }
        }
        serials
    }
}

/// Решение по одному устройству из пакета
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOrderDecision<'a> {
    Create {
        serial: String,
        device: &'a DeviceOrderPayload,
    },
    SkipMissingSerial,
    SkipDuplicate(String),
    SkipExisting(String),
}

/// Раскладывает устройства пакета по решениям в исходном порядке.
///
/// `existing` заполняется только при `skip_existing`; повторный серийный
/// номер пропускается раньше проверки существующих заказов.
pub fn plan_bulk_orders<'a>(
    scope: OrderScope,
    devices: &'a [DeviceOrderPayload],
    existing: Option<&ActiveOrderScopes>,
) -> Vec<BulkOrderDecision<'a>> {
    let target = scope.code();
    let mut seen: HashSet<String> = HashSet::new();
    let mut plan = Vec::with_capacity(devices.len());

    for device in devices {
        let Some(serial) = device.trimmed_serial() else {
            plan.push(BulkOrderDecision::SkipMissingSerial);
            continue;
        };
        let serial = serial.to_string();

        if !seen.insert(serial.clone()) {
            plan.push(BulkOrderDecision::SkipDuplicate(serial));
            continue;
        }

        let has_existing = existing
            .and_then(|map| map.get(&serial))
            .map(|scopes| scopes.contains(target))
            .unwrap_or(false);
        if has_existing {
            plan.push(BulkOrderDecision::SkipExisting(serial));
            continue;
        }

        plan.push(BulkOrderDecision::Create { serial, device });
    }

    plan
}

/// Итог пакетного создания заказов
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkOrderResponse {
    pub created: usize,
    pub skipped: usize,
    pub skipped_due_to_existing: usize,
    pub skipped_due_to_missing_serial: usize,
    pub skipped_due_to_duplicates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl BulkOrderResponse {
    /// Считает пропуски по плану; created и errors заполняются при исполнении
    pub fn from_plan(plan: &[BulkOrderDecision<'_>]) -> Self {
        let mut response = Self::default();
        for decision in plan {
            match decision {
                BulkOrderDecision::SkipMissingSerial => response.skipped_due_to_missing_serial += 1,
                BulkOrderDecision::SkipDuplicate(_) => response.skipped_due_to_duplicates += 1,
                BulkOrderDecision::SkipExisting(_) => response.skipped_due_to_existing += 1,
                BulkOrderDecision::Create { .. } => {}
            }
        }
        response.skipped = response.skipped_due_to_existing
            + response.skipped_due_to_missing_serial
            + response.skipped_due_to_duplicates;
        response
    }

    pub fn push_error(&mut self, serial: &str, message: &str) {
        self.errors
            .get_or_insert_with(Vec::new)
            .push(format!("{}: {}", serial, message));
    }

    pub fn error_count(&self) -> usize {
        self.errors.as_ref().map(Vec::len).unwrap_or(0)
    }

    /// 422 если ничего не создано и есть ошибки, 207 при частичных ошибках, иначе 200
    pub fn http_status(&self) -> u16 {
        let errors = self.error_count();
        if self.created == 0 && errors > 0 {
            422
        } else if errors > 0 {
            207
        } else {
            200
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn device(serial: Option<&str>) -> DeviceOrderPayload {
        DeviceOrderPayload {
            serial_number: serial.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_request() {
        let request = BulkOrderRequest {
            scope: Some("teal".into()),
            devices: Some(vec![device(Some("A"))]),
            skip_existing: false,
        };
        assert_eq!(request.validate().unwrap_err(), INVALID_SCOPE_MESSAGE);

        let request = BulkOrderRequest {
            scope: Some("waste".into()),
            devices: Some(vec![]),
            skip_existing: false,
        };
        assert_eq!(request.validate().unwrap_err(), EMPTY_DEVICES_MESSAGE);

        let parsed: BulkOrderRequest = serde_json::from_str(
            r#"{"scope":"cyan","devices":[{"serial_number":" A "}],"skipExisting":true}"#,
        )
        .unwrap();
        assert!(parsed.skip_existing);
        assert_eq!(parsed.normalized_serials(), vec!["A".to_string()]);
    }

    #[test]
    fn test_plan_classifies_devices_in_order() {
        let devices = vec![
            device(Some("A")),
            device(None),
            device(Some(" A ")),
            device(Some("B")),
            device(Some("C")),
        ];
        let mut existing: ActiveOrderScopes = HashMap::new();
        existing.insert("B".into(), ["cyan".to_string()].into_iter().collect());
        existing.insert("C".into(), ["waste".to_string()].into_iter().collect());

        let plan = plan_bulk_orders(OrderScope::Cyan, &devices, Some(&existing));
        assert!(matches!(plan[0], BulkOrderDecision::Create { ref serial, .. } if serial == "A"));
        assert_eq!(plan[1], BulkOrderDecision::SkipMissingSerial);
        assert_eq!(plan[2], BulkOrderDecision::SkipDuplicate("A".into()));
        assert_eq!(plan[3], BulkOrderDecision::SkipExisting("B".into()));
        assert!(matches!(plan[4], BulkOrderDecision::Create { ref serial, .. } if serial == "C"));

        let response = BulkOrderResponse::from_plan(&plan);
        assert_eq!(response.skipped, 3);
        assert_eq!(response.skipped_due_to_existing, 1);
    }

    #[test]
    fn test_http_status() {
        let mut response = BulkOrderResponse::default();
        assert_eq!(response.http_status(), 200);

        response.push_error("A", "Failed to create order for A: boom");
        assert_eq!(response.http_status(), 422);

        response.created = 1;
        assert_eq!(response.http_status(), 207);
        assert_eq!(
            response.errors.as_ref().unwrap()[0],
            "A: Failed to create order for A: boom"
        );
    }
}
