//! Logger Sink
//!
//! Recovered faults (a failing computed-value factory, a missing property
//! registration, an unknown time event) are reported here instead of being
//! propagated to the caller. The sink is pluggable so an embedding editor can
//! surface these records in its own UI.
//!
//! The default sink forwards to `tracing::error!`.

use std::sync::{Arc, OnceLock, RwLock};

/// A structured log record for a recovered fault.
#[derive(Debug, Clone)]
pub struct LogPayload {
    /// Human-readable description of what went wrong.
    pub message: String,

    /// Captured stack trace, when available.
    pub stack: Option<String>,

    /// Structured identification of the owning node or property, for
    /// inspector integration.
    pub inspect: Option<serde_json::Value>,
}

impl LogPayload {
    /// Create a payload carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            inspect: None,
        }
    }

    /// Attach a captured stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attach structured inspection metadata.
    pub fn with_inspect(mut self, inspect: serde_json::Value) -> Self {
        self.inspect = Some(inspect);
        self
    }
}

/// Destination for recovered-fault records.
pub trait LogSink: Send + Sync {
    /// Consume one log record.
    fn log(&self, payload: LogPayload);
}

/// Default sink: forwards to the `tracing` subscriber.
struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, payload: LogPayload) {
        tracing::error!(
            stack = payload.stack.as_deref(),
            inspect = payload
                .inspect
                .as_ref()
                .map(|v| v.to_string())
                .as_deref(),
            "{}",
            payload.message
        );
    }
}

// Process-wide sink slot. Kept behind a lock so tests and embedders can
// swap sinks at runtime.
static SINK: OnceLock<RwLock<Arc<dyn LogSink>>> = OnceLock::new();

fn sink_slot() -> &'static RwLock<Arc<dyn LogSink>> {
    SINK.get_or_init(|| RwLock::new(Arc::new(TracingSink)))
}

/// Replace the process-wide log sink, returning the previous one.
pub fn set_log_sink(sink: Arc<dyn LogSink>) -> Arc<dyn LogSink> {
    let mut slot = sink_slot().write().expect("log sink lock poisoned");
    std::mem::replace(&mut *slot, sink)
}

/// Route a record to the current sink.
pub fn report(payload: LogPayload) {
    let sink = sink_slot().read().expect("log sink lock poisoned").clone();
    sink.log(payload);
}

/// A sink that retains every payload, for assertions in tests.
#[derive(Default)]
pub struct CapturingSink {
    records: RwLock<Vec<LogPayload>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured records.
    pub fn records(&self) -> Vec<LogPayload> {
        self.records.read().expect("records lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("records lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for CapturingSink {
    fn log(&self, payload: LogPayload) {
        self.records
            .write()
            .expect("records lock poisoned")
            .push(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_sink_retains_payloads() {
        let sink = CapturingSink::new();
        sink.log(LogPayload::message("first"));
        sink.log(
            LogPayload::message("second")
                .with_stack("at foo")
                .with_inspect(serde_json::json!({"key": "node.opacity"})),
        );

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].stack.as_deref(), Some("at foo"));
        assert_eq!(
            records[1].inspect,
            Some(serde_json::json!({"key": "node.opacity"}))
        );
    }

    #[test]
    fn report_goes_through_installed_sink() {
        let sink = Arc::new(CapturingSink::new());
        let previous = set_log_sink(sink.clone());

        report(LogPayload::message("routed"));
        // Other tests may report concurrently; only require our record.
        assert!(sink.records().iter().any(|r| r.message == "routed"));

        set_log_sink(previous);
    }
}
