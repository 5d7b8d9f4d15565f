//! Structured, retrievable event logging.
//!
//! # Responsibilities
//! - Leveled log entries with a stable, machine-readable schema
//! - Bounded in-memory retention for admin inspection
//! - Console mirroring (JSON or colorized human-readable)
//! - Audit, security and HTTP-request helpers with fixed field names
//!
//! # Design Decisions
//! - Explicit instance threaded through app state, not a hidden global;
//!   the single effective instance lives at the composition root
//! - Logging is fail-safe: no call returns an error or panics, sink
//!   failures are dropped
//! - Buffer order is append order; eviction is strictly FIFO

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::Write as _;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Free-form key-value fields attached to an entry.
pub type Metadata = serde_json::Map<String, Value>;

/// Entries retained in memory before FIFO eviction.
pub const MAX_ENTRIES_IN_MEMORY: usize = 1000;

/// Severity rank: `Debug < Info < Warn < Error`. The derived ordering is
/// the filtering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn color(self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// Severity of a security event. High and Critical are emitted at error
/// level, Low and Medium at warn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecuritySeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SecuritySeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            SecuritySeverity::Low => "low",
            SecuritySeverity::Medium => "medium",
            SecuritySeverity::High => "high",
            SecuritySeverity::Critical => "critical",
        }
    }
}

/// Captured error information for the `error` field of an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorDetails {
    /// Capture an error's type name, display message and source chain.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            name: short_type_name::<E>().to_string(),
            message: err.to_string(),
            stack: if chain.is_empty() {
                None
            } else {
                Some(chain.join("\n"))
            },
        }
    }
}

fn short_type_name<E: ?Sized>() -> &'static str {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

/// One log entry. Field names are the wire schema downstream consumers
/// rely on; optional fields are omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Optional per-call fields for the level methods.
#[derive(Debug, Clone, Default)]
pub struct LogFields {
    pub context: Option<String>,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub status_code: Option<u16>,
    pub duration: Option<u64>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub error: Option<ErrorDetails>,
    pub metadata: Option<Metadata>,
}

/// Runtime configuration of the log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Entries below this level are discarded.
    pub min_level: LogLevel,
    /// Mirror entries to stdout/stderr.
    pub enable_console: bool,
    /// Emit JSON lines instead of the human-readable format.
    pub enable_structured: bool,
    pub service_name: String,
    pub environment: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            enable_console: true,
            enable_structured: false,
            service_name: "authgate".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Partial configuration merge: only the given fields change.
#[derive(Debug, Clone, Default)]
pub struct LogConfigPatch {
    pub min_level: Option<LogLevel>,
    pub enable_console: Option<bool>,
    pub enable_structured: Option<bool>,
    pub service_name: Option<String>,
    pub environment: Option<String>,
}

/// Fields of an AUDIT entry. Audit records are non-discretionary: always
/// emitted at info level regardless of outcome.
#[derive(Debug, Clone, Default)]
pub struct AuditEvent {
    pub user_id: Option<String>,
    pub ip: Option<String>,
    pub success: bool,
    pub metadata: Option<Metadata>,
}

/// Fields of a SECURITY entry.
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub user_id: Option<String>,
    pub ip: Option<String>,
    pub severity: SecuritySeverity,
    pub metadata: Option<Metadata>,
}

struct LogState {
    config: LogConfig,
    entries: VecDeque<LogEntry>,
}

/// Process-wide structured event log.
///
/// Shared via `Arc` and mutated behind a single mutex, so append order is
/// total and eviction never races. All operations are synchronous and
/// in-memory; nothing here blocks on I/O beyond the console write.
pub struct EventLog {
    state: Mutex<LogState>,
}

impl EventLog {
    pub fn new(config: LogConfig) -> Self {
        Self {
            state: Mutex::new(LogState {
                config,
                entries: VecDeque::with_capacity(MAX_ENTRIES_IN_MEMORY),
            }),
        }
    }

    pub fn debug(&self, message: impl Into<String>, fields: LogFields) {
        self.append(LogLevel::Debug, message.into(), fields);
    }

    pub fn info(&self, message: impl Into<String>, fields: LogFields) {
        self.append(LogLevel::Info, message.into(), fields);
    }

    pub fn warn(&self, message: impl Into<String>, fields: LogFields) {
        self.append(LogLevel::Warn, message.into(), fields);
    }

    pub fn error(&self, message: impl Into<String>, fields: LogFields) {
        self.append(LogLevel::Error, message.into(), fields);
    }

    /// Emit at error level with the error's name, message and source chain
    /// captured into the entry's `error` field.
    pub fn log_error<E>(&self, err: &E, message: impl Into<String>, fields: LogFields)
    where
        E: std::error::Error + ?Sized,
    {
        let fields = LogFields {
            error: Some(ErrorDetails::from_error(err)),
            ..fields
        };
        self.append(LogLevel::Error, message.into(), fields);
    }

    /// Record a handled HTTP request. Level follows the status code:
    /// 5xx → error, 4xx → warn, everything else → info.
    pub fn log_request(
        &self,
        method: &str,
        path: &str,
        status_code: u16,
        duration_ms: u64,
        fields: LogFields,
    ) {
        let level = if status_code >= 500 {
            LogLevel::Error
        } else if status_code >= 400 {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        let fields = LogFields {
            context: Some("HTTP".to_string()),
            method: Some(method.to_string()),
            path: Some(path.to_string()),
            status_code: Some(status_code),
            duration: Some(duration_ms),
            ..fields
        };
        self.append(level, format!("HTTP {method} {path}"), fields);
    }

    /// Record a security-relevant state change (registration, login,
    /// logout). `metadata.action` and `metadata.success` are always set;
    /// caller metadata wins on key collisions.
    pub fn audit(&self, action: &str, event: AuditEvent) {
        let mut metadata = Metadata::new();
        metadata.insert("action".to_string(), Value::String(action.to_string()));
        metadata.insert("success".to_string(), Value::Bool(event.success));
        if let Some(extra) = event.metadata {
            metadata.extend(extra);
        }
        let fields = LogFields {
            context: Some("AUDIT".to_string()),
            user_id: event.user_id,
            ip: event.ip,
            metadata: Some(metadata),
            ..Default::default()
        };
        self.append(LogLevel::Info, format!("AUDIT: {action}"), fields);
    }

    /// Record a security event. `metadata.event` and `metadata.severity`
    /// are always set; caller metadata wins on key collisions.
    pub fn security(&self, event: &str, details: SecurityEvent) {
        let level = match details.severity {
            SecuritySeverity::High | SecuritySeverity::Critical => LogLevel::Error,
            SecuritySeverity::Low | SecuritySeverity::Medium => LogLevel::Warn,
        };
        let mut metadata = Metadata::new();
        metadata.insert("event".to_string(), Value::String(event.to_string()));
        metadata.insert(
            "severity".to_string(),
            Value::String(details.severity.as_str().to_string()),
        );
        if let Some(extra) = details.metadata {
            metadata.extend(extra);
        }
        let fields = LogFields {
            context: Some("SECURITY".to_string()),
            user_id: details.user_id,
            ip: details.ip,
            metadata: Some(metadata),
            ..Default::default()
        };
        self.append(level, format!("SECURITY: {event}"), fields);
    }

    /// Up to the last `count` retained entries, oldest first, optionally
    /// restricted to entries at or above `min_level`. Entries already
    /// evicted by the ring buffer are unrecoverable.
    pub fn recent(&self, count: usize, min_level: Option<LogLevel>) -> Vec<LogEntry> {
        let state = self.lock();
        let filtered: Vec<LogEntry> = state
            .entries
            .iter()
            .filter(|entry| min_level.map_or(true, |floor| entry.level >= floor))
            .cloned()
            .collect();
        let start = filtered.len().saturating_sub(count);
        filtered[start..].to_vec()
    }

    /// Merge the given fields into the live configuration. Takes effect
    /// for subsequent calls only; retained entries are untouched.
    pub fn configure(&self, patch: LogConfigPatch) {
        let mut state = self.lock();
        let config = &mut state.config;
        if let Some(min_level) = patch.min_level {
            config.min_level = min_level;
        }
        if let Some(enable_console) = patch.enable_console {
            config.enable_console = enable_console;
        }
        if let Some(enable_structured) = patch.enable_structured {
            config.enable_structured = enable_structured;
        }
        if let Some(service_name) = patch.service_name {
            config.service_name = service_name;
        }
        if let Some(environment) = patch.environment {
            config.environment = environment;
        }
    }

    /// Empty the buffer. Used for test isolation and administrative reset.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn append(&self, level: LogLevel, message: String, fields: LogFields) {
        let mut state = self.lock();
        if level < state.config.min_level {
            return;
        }

        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            message,
            context: fields.context,
            user_id: fields.user_id,
            request_id: fields.request_id,
            method: fields.method,
            path: fields.path,
            status_code: fields.status_code,
            duration: fields.duration,
            ip: fields.ip,
            user_agent: fields.user_agent,
            error: fields.error,
            metadata: fields.metadata,
        };

        if state.config.enable_console {
            write_console(&entry, &state.config);
        }

        state.entries.push_back(entry);
        if state.entries.len() > MAX_ENTRIES_IN_MEMORY {
            state.entries.pop_front();
        }
    }

    // Logging must survive a panic on another thread holding the lock.
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

fn write_console(entry: &LogEntry, config: &LogConfig) {
    let line = if config.enable_structured {
        format_structured(entry, config)
    } else {
        Some(format_pretty(entry, config))
    };
    let Some(line) = line else { return };

    // Sink failures are dropped: the log never fails the request it
    // instruments.
    let _ = match entry.level {
        LogLevel::Warn | LogLevel::Error => writeln!(std::io::stderr().lock(), "{line}"),
        _ => writeln!(std::io::stdout().lock(), "{line}"),
    };
}

fn format_structured(entry: &LogEntry, config: &LogConfig) -> Option<String> {
    let mut value = serde_json::to_value(entry).ok()?;
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "service".to_string(),
            Value::String(config.service_name.clone()),
        );
        object.insert("env".to_string(), Value::String(config.environment.clone()));
    }
    serde_json::to_string(&value).ok()
}

fn format_pretty(entry: &LogEntry, config: &LogConfig) -> String {
    const RESET: &str = "\x1b[0m";

    let mut out = format!(
        "{}[{}] [{}]{}",
        entry.level.color(),
        entry.timestamp,
        entry.level.label(),
        RESET
    );
    if let Some(context) = &entry.context {
        let _ = write!(out, " [{context}]");
    }
    let _ = write!(out, " {}", entry.message);

    if let (Some(method), Some(path)) = (&entry.method, &entry.path) {
        let _ = write!(out, " | {method} {path}");
    }
    if let Some(status) = entry.status_code {
        let _ = write!(out, " | Status: {status}");
    }
    if let Some(duration) = entry.duration {
        let _ = write!(out, " | Duration: {duration}ms");
    }
    if let Some(user_id) = &entry.user_id {
        let _ = write!(out, " | User: {user_id}");
    }
    if let Some(metadata) = &entry.metadata {
        if !metadata.is_empty() {
            if let Ok(json) = serde_json::to_string(metadata) {
                let _ = write!(out, " | {json}");
            }
        }
    }
    if let Some(error) = &entry.error {
        let _ = write!(out, "\n  Error: {}: {}", error.name, error.message);
        if let Some(stack) = &error.stack {
            if config.environment != "production" {
                let _ = write!(out, "\n  Stack: {stack}");
            }
        }
    }
    out
}
