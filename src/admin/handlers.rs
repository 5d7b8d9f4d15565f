//! Admin endpoints: operational inspection and overrides.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::event_log::{AuditEvent, LogFields, LogLevel, Metadata};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub count: Option<usize>,
    pub level: Option<String>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Read the tail of the in-memory event log. `count` defaults to 100;
/// `level` restricts to entries at or above the given severity.
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let count = query.count.unwrap_or(100);
    let level = match query.level.as_deref() {
        Some(raw) => match raw.parse::<LogLevel>() {
            Ok(level) => Some(level),
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "error": err.to_string() })),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let logs = state.log.recent(count, level);
    let total = logs.len();

    let mut metadata = Metadata::new();
    metadata.insert("count".to_string(), json!(total));
    metadata.insert(
        "level".to_string(),
        json!(level.map(|l| l.as_str())),
    );
    state.log.info(
        "Logs retrieved",
        LogFields {
            context: Some("ADMIN".to_string()),
            metadata: Some(metadata),
            ..Default::default()
        },
    );

    Json(json!({
        "success": true,
        "data": {
            "logs": logs,
            "total": total,
            "retrievedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }))
    .into_response()
}

/// Administrative override: drop all rate-limit state for an identifier.
pub async fn reset_rate_limit(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Json<serde_json::Value> {
    state.limiter.reset(&identifier);

    let mut metadata = Metadata::new();
    metadata.insert("identifier".to_string(), json!(identifier));
    state.log.audit(
        "RATE_LIMIT_RESET",
        AuditEvent {
            user_id: None,
            ip: None,
            success: true,
            metadata: Some(metadata),
        },
    );

    Json(json!({ "success": true }))
}
