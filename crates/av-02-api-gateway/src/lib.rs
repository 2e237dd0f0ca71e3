//! AV-02 API Gateway - HTTP front-end for the asset vault.
//!
//! Maps each HTTP request onto one or two atomic procedures of an
//! [`AssetGateway`] and translates the outcome into a JSON (or raw binary)
//! response.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     API GATEWAY (av-02)                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  TcpListener (0.0.0.0:8086) + ConnectInfo<SocketAddr>        │
//! │                          │                                   │
//! │  ┌───────────────────────┴──────────────────────────┐        │
//! │  │ Drain → Tracing → ClientIp                       │        │
//! │  └───────────────────────┬──────────────────────────┘        │
//! │                          │                                   │
//! │  ┌───────────────────────┴──────────────────────────┐        │
//! │  │ Handlers (authorization inline, fixed order)     │        │
//! │  └───────────────────────┬──────────────────────────┘        │
//! └──────────────────────────┼───────────────────────────────────┘
//!                            │  Arc<dyn AssetGateway>
//!                            ▼
//!                   av-01-asset-store
//! ```
//!
//! # Endpoints
//!
//! | Method | Path                       | Success                    |
//! |--------|----------------------------|----------------------------|
//! | POST   | `/api/auth`                | `{"token": ...}`           |
//! | POST   | `/api/upload-asset/{name}` | `{"status": "ok"}`         |
//! | GET    | `/api/asset/{name}`        | raw bytes                  |
//! | DELETE | `/api/asset/{name}`        | `{"status": "ok"}`         |
//! | GET    | `/api/asset`               | `{"assets": [...]}`        |
//! | GET    | `/health`                  | `{"status": "ok"}`         |
//!
//! # Error Precedence
//!
//! Every handler short-circuits in the same order: backend error (500,
//! logged) → unauthorized (401) → not found (404) → success. Existence of
//! an asset is never evaluated for a caller that failed authorization.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::config::ApiConfig;
pub use domain::error::{ApiError, GatewayError};
pub use domain::types::{Credentials, ResponseBody};
pub use handlers::AppState;
pub use middleware::{ClientIp, InFlight};
pub use router::build_router;
pub use service::ApiServer;
