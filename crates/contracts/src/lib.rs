//! Общие типы и бизнес-правила MPS-дашборда.
//!
//! Крейт не зависит от БД и HTTP: здесь живут DTO, перечисления и чистые
//! функции (статусы устройств, нормализация CSV, дедупликация заказов).

pub mod dashboards;
pub mod domain;
pub mod enums;
pub mod projections;
pub mod shared;
pub mod usecases;
