//! Integration audit log
//!
//! Append-only trail of every integration event. Each entry carries the
//! event kind, status, optional error, response time, and a structured
//! payload; metrics and investigations read from here and nowhere else.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// What kind of integration event happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    Fetch,
    Transform,
    Validate,
    Generate,
    Submit,
    HealthCheck,
    WebhookTest,
    Schedule,
}

/// Outcome classification of the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Error,
    Warning,
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event kind
    pub event: AuditEventKind,
    /// Outcome
    pub status: AuditStatus,
    /// Report configuration involved, when applicable
    pub config_id: Option<String>,
    /// Connector involved, when applicable
    pub connector_id: Option<String>,
    /// Error message for error/warning events
    pub error: Option<String>,
    /// Wall time of the operation in milliseconds
    pub response_time_ms: Option<u64>,
    /// Structured event detail
    pub payload: Value,
    /// When the event happened
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event stamped now
    pub fn new(event: AuditEventKind, status: AuditStatus) -> Self {
        Self {
            event,
            status,
            config_id: None,
            connector_id: None,
            error: None,
            response_time_ms: None,
            payload: Value::Null,
            at: Utc::now(),
        }
    }

    /// Attach the report configuration id
    #[must_use]
    pub fn config(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    /// Attach the connector id
    #[must_use]
    pub fn connector(mut self, connector_id: impl Into<String>) -> Self {
        self.connector_id = Some(connector_id.into());
        self
    }

    /// Attach an error message
    #[must_use]
    pub fn error_message(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach the operation's wall time
    #[must_use]
    pub fn response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }

    /// Attach structured detail
    #[must_use]
    pub fn detail(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Append-only audit sink
pub trait AuditLog: Send + Sync {
    /// Append one event; must never fail the calling operation
    fn append(&self, event: AuditEvent);
}

/// In-memory audit log for tests and dry runs
#[derive(Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in append order
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Events of one kind
    pub fn events_of(&self, kind: AuditEventKind) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event == kind)
            .cloned()
            .collect()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

/// JSONL file audit log, one event per line
pub struct FileAuditLog {
    file: Mutex<File>,
}

impl FileAuditLog {
    /// Open (or create) the log file for appending
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditLog for FileAuditLog {
    fn append(&self, event: AuditEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to serialize audit event");
                return;
            }
        };
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{}", line) {
            warn!(error = %e, "failed to append audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_log_preserves_order() {
        let log = MemoryAuditLog::new();
        log.append(AuditEvent::new(AuditEventKind::Fetch, AuditStatus::Success).connector("grc"));
        log.append(
            AuditEvent::new(AuditEventKind::Submit, AuditStatus::Error)
                .config("osfi_q")
                .error_message("rejected"),
        );

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, AuditEventKind::Fetch);
        assert_eq!(events[1].error.as_deref(), Some("rejected"));
        assert_eq!(log.events_of(AuditEventKind::Submit).len(), 1);
    }

    #[test]
    fn test_file_log_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let log = FileAuditLog::new(&path).unwrap();
        log.append(
            AuditEvent::new(AuditEventKind::HealthCheck, AuditStatus::Warning)
                .connector("grc")
                .response_time(42)
                .detail(json!({"status": "degraded"})),
        );
        log.append(AuditEvent::new(AuditEventKind::Fetch, AuditStatus::Success));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "health_check");
        assert_eq!(first["response_time_ms"], 42);
        assert_eq!(first["payload"]["status"], "degraded");
    }
}
