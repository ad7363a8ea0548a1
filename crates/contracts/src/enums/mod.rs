pub mod connection_event;
pub mod device_status;
pub mod order;
pub mod toner_color;
pub mod warning_scope;

pub use connection_event::ConnectionEventType;
pub use device_status::DeviceStatus;
pub use order::{OrderLifecycleEventType, OrderScope, OrderStatus, OrderType};
pub use toner_color::{TonerColor, TonerLevels};
pub use warning_scope::WarningScope;
