pub mod a001_gas_gage;
pub mod a002_device;
pub mod a003_supply_order;
pub mod a004_alert_settings;
pub mod a005_warning_override;
