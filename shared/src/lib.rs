//! Types shared between the poller library and the HTTP control surface.

pub mod api;
pub mod models;

pub use models::MessageSummary;
