pub mod worker;

pub use worker::ConnectivityWorker;
