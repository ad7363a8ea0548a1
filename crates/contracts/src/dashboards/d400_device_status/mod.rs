//! Дашборд парка устройств: статусы, фильтры и активные заказы.

pub mod active_orders;
pub mod dashboard;
pub mod status;
