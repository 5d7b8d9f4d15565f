//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → request ID + trace + timeout layers
//!     → request_log_middleware (event log HTTP entry, metrics)
//!     → rate_limit_middleware (auth routes only)
//!     → handlers.rs (validate, delegate to Authenticator, audit)
//!     → JSON envelope response (+ X-RateLimit-* headers)
//! ```

pub mod handlers;
pub mod server;

pub use server::HttpServer;
