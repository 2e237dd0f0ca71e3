//! # Ports
//!
//! - `inbound` - the gateway API consumed by the HTTP front-end
//! - `outbound` - storage and time dependencies the service requires

pub mod inbound;
pub mod outbound;
