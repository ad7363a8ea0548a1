pub mod aggregate;
pub mod detail;
