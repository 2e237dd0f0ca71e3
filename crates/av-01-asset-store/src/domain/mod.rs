//! # Domain Layer
//!
//! Pure domain types for the Asset Store: entities and procedure outcomes,
//! error taxonomy, configuration and credential hashing.

pub mod config;
pub mod entities;
pub mod errors;
pub mod password;
