use std::future::Future;

use chrono::Utc;
use contracts::domain::a003_supply_order::auto_completion::{
    detect_toner_replacements, order_lookup_keys, AutoCompletionDetail, AutoCompletionResult,
    DeviceTonerChange, PlannedCompletion,
};
use contracts::domain::common::AggregateId;
use contracts::enums::{OrderLifecycleEventType, OrderStatus};

use super::repository;
use crate::domain::{a001_gas_gage, a004_alert_settings};
use crate::projections::p904_order_lifecycle;

/// Закрывает открытые заказы тонера, если импорт показал замену картриджа
pub async fn complete_replaced_toner_orders(
    changes: &[DeviceTonerChange],
) -> anyhow::Result<AutoCompletionResult> {
    if changes.is_empty() {
        return Ok(AutoCompletionResult::default());
    }

    let keys = order_lookup_keys(changes);
    let open_orders = repository::list_open_for_devices(&keys).await?;
    if open_orders.is_empty() {
        return Ok(AutoCompletionResult::default());
    }

    let device_ids: Vec<String> = changes
        .iter()
        .map(|c| c.device_id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let thresholds = a004_alert_settings::repository::replacement_thresholds(&device_ids).await?;

    let planned = detect_toner_replacements(changes, &open_orders, &thresholds);
    Ok(apply_planned_completions(&planned, complete_order).await)
}

/// Закрывает один заказ. Ошибка смены статуса означает, что заказ не закрыт;
/// событие и дата замены тонера пишутся без отката статуса.
async fn complete_order(plan: PlannedCompletion) -> anyhow::Result<()> {
    let order_uuid = plan.order_id.value();
    if !repository::update_status(order_uuid, OrderStatus::Completed).await? {
        anyhow::bail!("order not found");
    }

    let mut event = p904_order_lifecycle::repository::new_event(
        &plan.order_id.as_string(),
        OrderLifecycleEventType::AutoCompleted,
        Some(plan.toner_color),
    );
    event.toner_level_before = Some(plan.level_before);
    event.toner_level_after = Some(plan.level_after);
    event.auto_completed = true;
    event.notes = Some(plan.note());
    if let Err(e) = p904_order_lifecycle::repository::insert(&event).await {
        tracing::warn!("Lifecycle event for order {} not saved: {:#}", order_uuid, e);
    }

    if let Err(e) =
        a001_gas_gage::repository::set_toner_replacement_date(&plan.device_id, plan.toner_color, Utc::now())
            .await
    {
        tracing::warn!(
            "Toner replacement date for device {} not saved: {:#}",
            plan.device_id,
            e
        );
    }
    Ok(())
}

/// Применяет план по одному заказу; неудачный заказ пропускается,
/// в результат попадают только закрытые.
async fn apply_planned_completions<F, Fut>(planned: &[PlannedCompletion], mut complete: F) -> AutoCompletionResult
where
    F: FnMut(PlannedCompletion) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut result = AutoCompletionResult::default();

    for plan in planned {
        if let Err(e) = complete(plan.clone()).await {
            tracing::warn!("Order {} was not auto-completed: {:#}", plan.order_id.value(), e);
            continue;
        }

        tracing::info!(
            "Order {} auto-completed: {} {:.0}% -> {:.0}%",
            plan.order_id.value(),
            plan.toner_color.code(),
            plan.level_before,
            plan.level_after
        );
        result.orders_completed += 1;
        result.completion_details.push(AutoCompletionDetail::from(plan));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a003_supply_order::aggregate::OrderId;
    use contracts::enums::TonerColor;

    fn plan(device_id: &str) -> PlannedCompletion {
        PlannedCompletion {
            order_id: OrderId::new_v4(),
            device_id: device_id.to_string(),
            toner_color: TonerColor::Black,
            level_before: 4.0,
            level_after: 95.0,
            threshold: 70.0,
        }
    }

    #[tokio::test]
    async fn test_failed_order_is_skipped_and_rest_are_completed() {
        let planned = vec![plan("D1"), plan("D2")];
        let failing = planned[0].order_id.value();

        let result = apply_planned_completions(&planned, |p| {
            let fails = p.order_id.value() == failing;
            async move {
                if fails {
                    anyhow::bail!("database is locked");
                }
                Ok(())
            }
        })
        .await;

        assert_eq!(result.orders_completed, 1);
        assert_eq!(result.completion_details.len(), 1);
        assert_eq!(result.completion_details[0].device_id, "D2");
    }
}
