pub mod p900_toner_snapshots;
pub mod p901_meter_readings;
pub mod p902_warning_events;
pub mod p903_consumable_events;
pub mod p904_order_lifecycle;
pub mod p905_connection_events;
