pub mod api;
pub mod config;
pub mod poller;
pub mod session;
pub mod types;
pub mod wizard;
