pub mod aggregate;
pub mod bulk;
pub mod auto_completion;
