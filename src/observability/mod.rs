//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handlers and middleware produce:
//!     → event_log.rs (structured entries: HTTP, AUDIT, SECURITY)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Console sink (stdout/stderr, JSON or human-readable)
//!     → Admin API (GET /admin/logs reads the in-memory buffer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The event log is a product feature: bounded, retrievable, stable
//!   schema. The `tracing` crate remains the process's own diagnostic
//!   channel and is initialized separately in `main`
//! - Entries evicted from the ring buffer are gone; this is an
//!   observability convenience, not a durable audit store

pub mod event_log;
pub mod metrics;

pub use event_log::{EventLog, LogConfig, LogEntry, LogLevel};
