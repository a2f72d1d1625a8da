//! Component-scoped logging
//!
//! Each component receives a [`ComponentLogger`] at construction instead of
//! writing to a process-wide logger directly. The default sink forwards to
//! the `log` facade using the component name as the target; tests inject a
//! [`MemorySink`] to capture records.

use std::fmt::Display;
use std::sync::{Arc, Mutex};

use log::Level;

/// Destination for log records emitted by components
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, component: &'static str, message: &str);
}

/// Sink that forwards every record to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log(&self, level: Level, component: &'static str, message: &str) {
        log::log!(target: component, level, "{}", message);
    }
}

/// A captured log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub component: &'static str,
    pub message: String,
}

/// Sink that keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records captured so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Records at exactly the given level
    pub fn at_level(&self, level: Level) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, component: &'static str, message: &str) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(LogRecord {
                level,
                component,
                message: message.to_string(),
            });
        }
    }
}

/// Logger bound to one component name
#[derive(Clone)]
pub struct ComponentLogger {
    component: &'static str,
    sink: Arc<dyn LogSink>,
}

impl ComponentLogger {
    /// Create a logger that writes to the given sink
    pub fn new(component: &'static str, sink: Arc<dyn LogSink>) -> Self {
        Self { component, sink }
    }

    /// Create a logger backed by the `log` facade
    pub fn from_log_crate(component: &'static str) -> Self {
        Self::new(component, Arc::new(LogCrateSink))
    }

    /// The same sink, re-tagged for another component
    pub fn for_component(&self, component: &'static str) -> Self {
        Self {
            component,
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    pub fn debug(&self, message: impl Display) {
        self.emit(Level::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.emit(Level::Info, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.emit(Level::Warn, message);
    }

    pub fn error(&self, message: impl Display) {
        self.emit(Level::Error, message);
    }

    fn emit(&self, level: Level, message: impl Display) {
        self.sink.log(level, self.component, &message.to_string());
    }
}

impl std::fmt::Debug for ComponentLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentLogger")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}
