pub mod api;
pub mod clock;
pub mod config;
pub mod models;
pub mod notify;
pub mod queue;
pub mod share;
pub mod workers;
