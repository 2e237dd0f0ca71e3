//! Domain layer for the API Gateway.

pub mod config;
pub mod error;
pub mod types;
