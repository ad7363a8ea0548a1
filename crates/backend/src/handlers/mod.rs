pub mod a002_device;
pub mod a003_supply_order;
pub mod a004_alert_settings;
pub mod a005_warning_override;
pub mod d400_device_status;
pub mod u501_import_device_csv;
pub mod u502_connectivity_check;
