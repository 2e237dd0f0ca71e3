//! Middleware stack for the API Gateway.
//!
//! Layer order: Request → Drain → Tracing → ClientIp → Handler
//!
//! Authorization is not a layer. Each handler calls the gateway itself so
//! the token check stays visible next to the procedure it guards.

pub mod client_ip;
pub mod drain;
pub mod tracing;

pub use client_ip::{ClientIp, ClientIpLayer, TrustedProxyConfig};
pub use drain::{DrainLayer, InFlight};
pub use tracing::TracingLayer;
