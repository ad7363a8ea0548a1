pub mod u501_import_device_csv;
pub mod u502_connectivity_check;
