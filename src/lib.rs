pub mod brief;
pub mod config;
pub mod errors;
pub mod foreman_config;
pub mod gates;
pub mod init;
pub mod phase;
pub mod state;
pub mod ui;
pub mod validate;
pub mod workflow;

pub use errors::WorkflowError;
