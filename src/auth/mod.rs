//! Authentication domain seam.
//!
//! The gateway's operational core (rate limiting, event logging) treats
//! credential handling as an external collaborator behind [`Authenticator`].
//! The real product backs this with an ORM-backed user store; this crate
//! ships [`MemoryDirectory`] for development and tests.

use serde::Serialize;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryDirectory;

/// Domain errors surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(String),
    #[error("internal auth failure: {0}")]
    Internal(String),
}

/// An established session, returned on successful register/login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: String,
    pub name: String,
    pub email: String,
    /// Opaque bearer token for subsequent requests.
    pub token: String,
}

/// Credential operations the gateway depends on. Implementations must be
/// shareable across the runtime's worker threads.
pub trait Authenticator: Send + Sync {
    fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Invalidate the session behind `token`, returning the owning user id.
    fn logout(&self, token: &str) -> Result<String, AuthError>;
}
