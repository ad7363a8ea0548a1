pub mod job;
pub mod request;
pub mod response;
pub mod schema;

pub use job::{ImportJobDto, ImportJobStatus};
pub use request::ImportChunkRequest;
pub use response::ImportDeviceCsvResponse;
pub use schema::{DeviceImportRow, DeviceImportType};

use crate::usecases::common::UseCaseMetadata;

pub struct ImportDeviceCsv;

impl UseCaseMetadata for ImportDeviceCsv {
    fn usecase_index() -> &'static str {
        "u501"
    }

    fn usecase_name() -> &'static str {
        "import_device_csv"
    }

    fn display_name() -> &'static str {
        "Device CSV import"
    }

    fn description() -> &'static str {
        "Gas Gage, LatestTotal, WarningHistory and Yields/Consumables exports"
    }
}
