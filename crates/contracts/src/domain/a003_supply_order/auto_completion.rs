use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::aggregate::{OrderId, SupplyOrder};
use crate::domain::a004_alert_settings::aggregate::DEFAULT_REPLACEMENT_THRESHOLD;
use crate::enums::{TonerColor, TonerLevels};

/// Изменение уровней тонера устройства между двумя импортами
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTonerChange {
    pub device_id: String,
    pub serial_number: String,
    pub old_levels: TonerLevels,
    pub new_levels: TonerLevels,
}

/// Заказ, который нужно закрыть как выполненный
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCompletion {
    pub order_id: OrderId,
    pub device_id: String,
    pub toner_color: TonerColor,
    pub level_before: f64,
    pub level_after: f64,
    pub threshold: f64,
}

impl PlannedCompletion {
    pub fn increase(&self) -> f64 {
        self.level_after - self.level_before
    }

    /// Примечание для журнала жизненного цикла
    pub fn note(&self) -> String {
        format!(
            "Auto-completed due to {}% increase (threshold: {}%)",
            self.increase(),
            self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoCompletionDetail {
    pub order_id: String,
    pub device_id: String,
    pub toner_color: TonerColor,
    pub level_before: f64,
    pub level_after: f64,
}

impl From<&PlannedCompletion> for AutoCompletionDetail {
    fn from(plan: &PlannedCompletion) -> Self {
        Self {
            order_id: plan.order_id.value().to_string(),
            device_id: plan.device_id.clone(),
            toner_color: plan.toner_color,
            level_before: plan.level_before,
            level_after: plan.level_after,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoCompletionResult {
    pub orders_completed: usize,
    pub completion_details: Vec<AutoCompletionDetail>,
}

/// Ключи, по которым ищутся открытые заказы: серийные номера и device_id
pub fn order_lookup_keys(changes: &[DeviceTonerChange]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let serials = changes.iter().map(|c| c.serial_number.trim());
    let device_ids = changes.iter().map(|c| c.device_id.trim());
    for key in serials.chain(device_ids) {
        if !key.is_empty() && seen.insert(key.to_string()) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Находит заказы, закрытые физической заменой картриджа.
///
/// Для каждого цвета, где оба уровня известны и прирост не меньше порога
/// устройства (по умолчанию 70), берётся первый открытый заказ этого цвета
/// по серийному номеру или device_id. Заказ закрывается не более одного раза.
pub fn detect_toner_replacements(
    changes: &[DeviceTonerChange],
    open_orders: &[SupplyOrder],
    thresholds: &HashMap<String, f64>,
) -> Vec<PlannedCompletion> {
    let mut used: HashSet<OrderId> = HashSet::new();
    let mut planned = Vec::new();

    for change in changes {
        let threshold = thresholds
            .get(change.device_id.trim())
            .copied()
            .unwrap_or(DEFAULT_REPLACEMENT_THRESHOLD);
        let serial = change.serial_number.trim();
        let device_id = change.device_id.trim();

        for color in TonerColor::ALL {
            let (Some(before), Some(after)) = (change.old_levels.get(color), change.new_levels.get(color))
            else {
                continue;
            };
            if after - before < threshold {
                continue;
            }

            let matching = open_orders.iter().find(|order| {
                let key = order.device_id.trim();
                (key == serial || key == device_id)
                    && order.toner_color == Some(color)
                    && !used.contains(&order.order_id)
            });
            let Some(order) = matching else {
                continue;
            };

            used.insert(order.order_id);
            planned.push(PlannedCompletion {
                order_id: order.order_id,
                device_id: change.device_id.clone(),
                toner_color: color,
                level_before: before,
                level_after: after,
                threshold,
            });
        }
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a003_supply_order::aggregate::CreateOrderOptions;
    use crate::enums::OrderScope;

    fn levels(black: Option<f64>, cyan: Option<f64>) -> TonerLevels {
        TonerLevels {
            black,
            cyan,
            magenta: None,
            yellow: None,
        }
    }

    fn order(device_id: &str, scope: OrderScope) -> SupplyOrder {
        SupplyOrder::new_for_insert(
            device_id.into(),
            "Acme".into(),
            scope,
            &CreateOrderOptions::default(),
        )
    }

    #[test]
    fn test_detects_jump_above_threshold() {
        let changes = vec![DeviceTonerChange {
            device_id: "GG1".into(),
            serial_number: "SN1".into(),
            old_levels: levels(Some(5.0), Some(10.0)),
            new_levels: levels(Some(100.0), Some(60.0)),
        }];
        let orders = vec![
            order("SN1", OrderScope::Cyan),
            order("SN1", OrderScope::Black),
            order("OTHER", OrderScope::Black),
        ];

        let planned = detect_toner_replacements(&changes, &orders, &HashMap::new());
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].order_id, orders[1].order_id);
        assert_eq!(planned[0].toner_color, TonerColor::Black);
        assert_eq!(planned[0].note(), "Auto-completed due to 95% increase (threshold: 70%)");
    }

    #[test]
    fn test_custom_threshold_and_device_id_match() {
        let changes = vec![DeviceTonerChange {
            device_id: "GG1".into(),
            serial_number: "SN1".into(),
            old_levels: levels(None, Some(10.0)),
            new_levels: levels(Some(90.0), Some(60.0)),
        }];
        let orders = vec![order("GG1", OrderScope::Cyan), order("SN1", OrderScope::Black)];
        let mut thresholds = HashMap::new();
        thresholds.insert("GG1".to_string(), 50.0);

        let planned = detect_toner_replacements(&changes, &orders, &thresholds);
        // чёрный без старого значения не рассматривается
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].toner_color, TonerColor::Cyan);
        assert_eq!(planned[0].threshold, 50.0);
    }

    #[test]
    fn test_order_completed_once_per_run() {
        let change = DeviceTonerChange {
            device_id: "GG1".into(),
            serial_number: "SN1".into(),
            old_levels: levels(Some(0.0), None),
            new_levels: levels(Some(100.0), None),
        };
        let changes = vec![change.clone(), change];
        let orders = vec![order("SN1", OrderScope::Black)];

        let planned = detect_toner_replacements(&changes, &orders, &HashMap::new());
        assert_eq!(planned.len(), 1);

        assert_eq!(order_lookup_keys(&changes), vec!["SN1".to_string(), "GG1".to_string()]);
    }
}
