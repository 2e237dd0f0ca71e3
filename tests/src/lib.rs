//! # Asset-Vault Test Suite
//!
//! Cross-crate flows that need the real asset store behind the real router.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs       # Login → upload → download → delete over the router
//!     ├── persistence.rs # RocksDB-backed flows surviving a reopen
//!     └── lifecycle.rs   # Real TCP listener, shutdown ordering
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p av-tests
//! cargo test -p av-tests integration::flows
//! ```

pub mod integration;
