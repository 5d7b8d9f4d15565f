//! In-memory credential directory.
//!
//! Development and test collaborator: users and sessions live only for the
//! process lifetime. Passwords are stored as SHA-256 digests so plaintext
//! never sits in memory, but this is not a substitute for a real password
//! hash with a work factor.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{AuthError, AuthSession, Authenticator};

struct UserRecord {
    user_id: String,
    name: String,
    password_digest: String,
}

#[derive(Default)]
struct DirectoryState {
    /// Keyed by email.
    users: HashMap<String, UserRecord>,
    /// token -> user id.
    sessions: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

fn digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

impl Authenticator for MemoryDirectory {
    fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        if state.users.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }

        let user_id = Uuid::new_v4().to_string();
        state.users.insert(
            email.to_string(),
            UserRecord {
                user_id: user_id.clone(),
                name: name.to_string(),
                password_digest: digest(password),
            },
        );

        let token = Uuid::new_v4().to_string();
        state.sessions.insert(token.clone(), user_id.clone());

        Ok(AuthSession {
            user_id,
            name: name.to_string(),
            email: email.to_string(),
            token,
        })
    }

    fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        let (user_id, name) = match state.users.get(email) {
            Some(record) if record.password_digest == digest(password) => {
                (record.user_id.clone(), record.name.clone())
            }
            // Same error for unknown email and wrong password; the
            // response must not reveal which one failed.
            _ => return Err(AuthError::InvalidCredentials),
        };

        let token = Uuid::new_v4().to_string();
        state.sessions.insert(token.clone(), user_id.clone());

        Ok(AuthSession {
            user_id,
            name,
            email: email.to_string(),
            token,
        })
    }

    fn logout(&self, token: &str) -> Result<String, AuthError> {
        let mut state = self.state.lock().expect("directory mutex poisoned");
        state
            .sessions
            .remove(token)
            .ok_or(AuthError::InvalidCredentials)
    }
}
