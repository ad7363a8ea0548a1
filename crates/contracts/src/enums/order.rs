use serde::{Deserialize, Serialize};
use std::fmt;

use super::toner_color::TonerColor;

/// Что заказываем: тонер конкретного цвета или бункер отработки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderScope {
    Black,
    Cyan,
    Magenta,
    Yellow,
    Waste,
}

impl OrderScope {
    pub const ALL: [OrderScope; 5] = [
        OrderScope::Black,
        OrderScope::Cyan,
        OrderScope::Magenta,
        OrderScope::Yellow,
        OrderScope::Waste,
    ];

    /// Ключ для дедупликации активных заказов (цвет или "waste")
    pub fn code(&self) -> &'static str {
        match self {
            OrderScope::Black => "black",
            OrderScope::Cyan => "cyan",
            OrderScope::Magenta => "magenta",
            OrderScope::Yellow => "yellow",
            OrderScope::Waste => "waste",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderScope::Black => "Black toner",
            OrderScope::Cyan => "Cyan toner",
            OrderScope::Magenta => "Magenta toner",
            OrderScope::Yellow => "Yellow toner",
            OrderScope::Waste => "Waste toner",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "black" => Some(OrderScope::Black),
            "cyan" => Some(OrderScope::Cyan),
            "magenta" => Some(OrderScope::Magenta),
            "yellow" => Some(OrderScope::Yellow),
            "waste" => Some(OrderScope::Waste),
            _ => None,
        }
    }

    pub fn order_type(&self) -> OrderType {
        match self {
            OrderScope::Waste => OrderType::WasteToner,
            _ => OrderType::Toner,
        }
    }

    pub fn toner_color(&self) -> Option<TonerColor> {
        match self {
            OrderScope::Black => Some(TonerColor::Black),
            OrderScope::Cyan => Some(TonerColor::Cyan),
            OrderScope::Magenta => Some(TonerColor::Magenta),
            OrderScope::Yellow => Some(TonerColor::Yellow),
            OrderScope::Waste => None,
        }
    }
}

impl From<TonerColor> for OrderScope {
    fn from(color: TonerColor) -> Self {
        match color {
            TonerColor::Black => OrderScope::Black,
            TonerColor::Cyan => OrderScope::Cyan,
            TonerColor::Magenta => OrderScope::Magenta,
            TonerColor::Yellow => OrderScope::Yellow,
        }
    }
}

impl fmt::Display for OrderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Тип заказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Toner,
    WasteToner,
    Service,
}

impl OrderType {
    pub fn code(&self) -> &'static str {
        match self {
            OrderType::Toner => "toner",
            OrderType::WasteToner => "waste_toner",
            OrderType::Service => "service",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "toner" => Some(OrderType::Toner),
            "waste_toner" => Some(OrderType::WasteToner),
            "service" => Some(OrderType::Service),
            _ => None,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Статус заказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    InProgress,
    Completed,
    Archived,
}

impl OrderStatus {
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Archived => "archived",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Open => "Open",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Archived => "Archived",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "open" => Some(OrderStatus::Open),
            "in_progress" => Some(OrderStatus::InProgress),
            "completed" => Some(OrderStatus::Completed),
            "archived" => Some(OrderStatus::Archived),
            _ => None,
        }
    }

    /// Активный заказ: открыт или в работе
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::InProgress)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Событие жизненного цикла заказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLifecycleEventType {
    Created,
    Opened,
    InProgress,
    Completed,
    AutoCompleted,
    Cancelled,
    Archived,
}

impl OrderLifecycleEventType {
    pub fn code(&self) -> &'static str {
        match self {
            OrderLifecycleEventType::Created => "created",
            OrderLifecycleEventType::Opened => "opened",
            OrderLifecycleEventType::InProgress => "in_progress",
            OrderLifecycleEventType::Completed => "completed",
            OrderLifecycleEventType::AutoCompleted => "auto_completed",
            OrderLifecycleEventType::Cancelled => "cancelled",
            OrderLifecycleEventType::Archived => "archived",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "created" => Some(OrderLifecycleEventType::Created),
            "opened" => Some(OrderLifecycleEventType::Opened),
            "in_progress" => Some(OrderLifecycleEventType::InProgress),
            "completed" => Some(OrderLifecycleEventType::Completed),
            "auto_completed" => Some(OrderLifecycleEventType::AutoCompleted),
            "cancelled" => Some(OrderLifecycleEventType::Cancelled),
            "archived" => Some(OrderLifecycleEventType::Archived),
            _ => None,
        }
    }
}

impl From<OrderStatus> for OrderLifecycleEventType {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Open => OrderLifecycleEventType::Opened,
            OrderStatus::InProgress => OrderLifecycleEventType::InProgress,
            OrderStatus::Completed => OrderLifecycleEventType::Completed,
            OrderStatus::Archived => OrderLifecycleEventType::Archived,
        }
    }
}

impl fmt::Display for OrderLifecycleEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_maps_to_order_type_and_color() {
        assert_eq!(OrderScope::Waste.order_type(), OrderType::WasteToner);
        assert_eq!(OrderScope::Waste.toner_color(), None);
        assert_eq!(OrderScope::Cyan.order_type(), OrderType::Toner);
        assert_eq!(OrderScope::Cyan.toner_color(), Some(TonerColor::Cyan));
    }

    #[test]
    fn test_active_statuses() {
        assert!(OrderStatus::Open.is_active());
        assert!(OrderStatus::InProgress.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Archived.is_active());
        assert_eq!(OrderStatus::from_code("in_progress"), Some(OrderStatus::InProgress));
    }
}
