//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming auth request:
//!     → rate_limit.rs (per-identifier sliding window)
//!     → pass to handler, quota headers on the way out
//!     → rejection: 429 + Retry-After, SECURITY log event
//! ```
//!
//! # Design Decisions
//! - Exact sliding-window semantics (no fixed-window boundary bursts) at
//!   the cost of one timestamp per in-window request
//! - Best-effort, per-process state; restart clears all quotas
//! - The limiter raises no alerts itself; callers translate failures into
//!   responses and log events

pub mod rate_limit;

pub use rate_limit::{RateLimitExceeded, RateLimiter};
