pub mod appointments;
pub mod auth;
pub mod notifications;
pub mod session;
pub mod store;
pub mod visitors;
