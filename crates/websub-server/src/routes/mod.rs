//! HTTP route handlers.

pub mod health;
pub mod hub;
pub mod root;
