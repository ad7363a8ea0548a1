pub mod auto_completion;
pub mod repository;
pub mod service;
