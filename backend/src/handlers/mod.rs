pub mod emails;
pub mod health;
pub mod notify;
pub mod status;
pub mod sync;
