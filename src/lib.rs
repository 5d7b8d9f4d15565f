//! Operational core of the authgate service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │                   AUTHGATE                     │
//!                      │                                                │
//!   Client Request     │  ┌─────────┐   ┌───────────┐   ┌────────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ security  │──▶│    auth    │  │
//!                      │  │ server  │   │rate_limit │   │ directory  │  │
//!                      │  └─────────┘   └───────────┘   └──────┬─────┘  │
//!                      │                                       │        │
//!   Client Response    │                                       ▼        │
//!   ◀──────────────────┼── JSON envelope + X-RateLimit-* headers        │
//!                      │                                                │
//!                      │  ┌──────────────────────────────────────────┐  │
//!                      │  │          Cross-Cutting Concerns          │  │
//!                      │  │  ┌────────┐ ┌─────────────┐ ┌─────────┐  │  │
//!                      │  │  │ config │ │observability│ │  admin  │  │  │
//!                      │  │  │        │ │ log+metrics │ │   API   │  │  │
//!                      │  │  └────────┘ └─────────────┘ └─────────┘  │  │
//!                      │  └──────────────────────────────────────────┘  │
//!                      └────────────────────────────────────────────────┘
//! ```
//!
//! Two leaf components carry the interesting state: the sliding-window
//! [`RateLimiter`](security::rate_limit::RateLimiter) guarding auth
//! endpoints and the bounded, retrievable
//! [`EventLog`](observability::event_log::EventLog). Everything else is
//! wiring in the same style: config with defaults, axum middleware, an
//! authenticated admin surface.

// Core subsystems
pub mod auth;
pub mod config;
pub mod http;
pub mod security;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::event_log::{EventLog, LogConfig, LogLevel};
pub use security::rate_limit::RateLimiter;
