pub mod check;
pub mod response;

pub use check::{evaluate_connectivity, ConnectivityInput, ConnectivityTransition};
pub use response::{ConnectionEventsQuery, ConnectivityCheckResponse};

use crate::usecases::common::UseCaseMetadata;

pub struct ConnectivityCheck;

impl UseCaseMetadata for ConnectivityCheck {
    fn usecase_index() -> &'static str {
        "u502"
    }

    fn usecase_name() -> &'static str {
        "connectivity_check"
    }

    fn display_name() -> &'static str {
        "Device connectivity check"
    }
}
