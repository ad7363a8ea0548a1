pub mod csv_reader;
pub mod executor;
pub mod repository;
pub mod transform;

pub use csv_reader::parse_device_csv_bytes;
pub use executor::ImportExecutor;
