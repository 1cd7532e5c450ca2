use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// Append-only JSONL log shared by every worker of one session.
///
/// Each line carries `type`, `session_id` and `ts`; payload keys are merged on top.
/// A writer without a path builds events but writes nothing.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: Option<PathBuf>,
    session_id: String,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self::build(Some(path.into()), session_id.into())
    }

    pub fn disabled() -> Self {
        Self::build(None, new_session_id())
    }

    /// Writes to `path` when given, otherwise returns a disabled writer.
    pub fn for_session(path: Option<PathBuf>) -> Self {
        Self::build(path, new_session_id())
    }

    fn build(path: Option<PathBuf>, session_id: String) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path,
                session_id,
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.path.is_some()
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> Result<Value> {
        let mut event = self.envelope(event_type);
        event.extend(payload);
        let event = Value::Object(event);
        if let Some(path) = self.inner.path.as_deref() {
            self.append(path, &event)?;
        }
        Ok(event)
    }

    fn envelope(&self, event_type: &str) -> EventPayload {
        let mut event = EventPayload::new();
        event.insert("type".to_string(), Value::from(event_type));
        event.insert(
            "session_id".to_string(),
            Value::from(self.inner.session_id.as_str()),
        );
        event.insert("ts".to_string(), Value::from(now_utc_iso()));
        event
    }

    fn append(&self, path: &Path, event: &Value) -> Result<()> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let line = serde_json::to_string(event)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow!("event log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open event log {}", path.display()))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Like `emit`, for call sites where a failed log write must not change the outcome.
    pub fn record(&self, event_type: &str, payload: EventPayload) {
        let _ = self.emit(event_type, payload);
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
