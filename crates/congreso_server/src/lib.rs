//! congreso_server — HTTP surface over the registration engine.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
