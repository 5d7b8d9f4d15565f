//! Authentication endpoints.
//!
//! Handlers run behind the rate-limit middleware, delegate credential work
//! to the [`Authenticator`](crate::auth::Authenticator) seam, and record
//! the outcome in the event log: AUDIT entries for state changes, SECURITY
//! entries for failed logins.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthError;
use crate::http::server::AppState;
use crate::observability::event_log::{
    AuditEvent, LogFields, Metadata, SecurityEvent, SecuritySeverity,
};
use crate::observability::metrics;
use crate::security::rate_limit::client_identifier;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let ip = client_identifier(&headers, Some(addr));

    if let Err(err) = validate_register(&body) {
        return error_response(&state, err);
    }

    match state.auth.register(&body.name, &body.email, &body.password) {
        Ok(session) => {
            metrics::record_auth_event("register", true);
            let mut metadata = Metadata::new();
            metadata.insert("email".to_string(), json!(session.email));
            state.log.audit(
                "USER_REGISTERED",
                AuditEvent {
                    user_id: Some(session.user_id.clone()),
                    ip: Some(ip),
                    success: true,
                    metadata: Some(metadata),
                },
            );
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "data": session })),
            )
                .into_response()
        }
        Err(err) => {
            metrics::record_auth_event("register", false);
            error_response(&state, err)
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Response {
    let ip = client_identifier(&headers, Some(addr));

    if let Err(err) = validate_login(&body) {
        return error_response(&state, err);
    }

    match state.auth.login(&body.email, &body.password) {
        Ok(session) => {
            metrics::record_auth_event("login", true);
            let mut metadata = Metadata::new();
            metadata.insert("email".to_string(), json!(session.email));
            state.log.audit(
                "USER_LOGIN",
                AuditEvent {
                    user_id: Some(session.user_id.clone()),
                    ip: Some(ip),
                    success: true,
                    metadata: Some(metadata),
                },
            );
            Json(json!({ "success": true, "data": session })).into_response()
        }
        Err(err) => {
            metrics::record_auth_event("login", false);
            if matches!(err, AuthError::InvalidCredentials) {
                let mut metadata = Metadata::new();
                metadata.insert("email".to_string(), json!(body.email));
                state.log.security(
                    "LOGIN_FAILED",
                    SecurityEvent {
                        user_id: None,
                        ip: Some(ip),
                        severity: SecuritySeverity::Medium,
                        metadata: Some(metadata),
                    },
                );
            }
            error_response(&state, err)
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let ip = client_identifier(&headers, Some(addr));

    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Unauthorized" })),
        )
            .into_response();
    };

    match state.auth.logout(token) {
        Ok(user_id) => {
            state.log.audit(
                "USER_LOGOUT",
                AuditEvent {
                    user_id: Some(user_id),
                    ip: Some(ip),
                    success: true,
                    metadata: None,
                },
            );
            Json(json!({ "success": true, "message": "Logged out successfully" })).into_response()
        }
        Err(err) => error_response(&state, err),
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() => Some(token),
        _ => None,
    }
}

fn validate_register(body: &RegisterRequest) -> Result<(), AuthError> {
    if body.name.trim().is_empty() {
        return Err(AuthError::InvalidInput("name is required".to_string()));
    }
    validate_email(&body.email)?;
    validate_password(&body.password)
}

fn validate_login(body: &LoginRequest) -> Result<(), AuthError> {
    validate_email(&body.email)?;
    if body.password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(
            "a valid email address is required".to_string(),
        ))
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::InvalidInput(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

fn error_response(state: &AppState, err: AuthError) -> Response {
    let status = match &err {
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        state
            .log
            .log_error(&err, "Auth operation failed", LogFields::default());
    }

    (
        status,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}
