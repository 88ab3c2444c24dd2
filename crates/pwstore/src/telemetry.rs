//! Reporting capability injected into each component.
//!
//! Components never log through a process-wide handle directly. They are
//! handed a [`Reporter`] at construction; the CLI passes [`LogReporter`],
//! which forwards to the `log` facade, and tests pass a
//! [`RecordingReporter`] to assert on what was said.

use std::sync::{Arc, Mutex};

use log::Level;

/// Sink for operational notifications.
pub trait Reporter: Send + Sync {
    /// Emit one message at the given severity.
    fn report(&self, level: Level, message: &str);
}

/// Shared handle to a reporter, cloned into every component.
pub type SharedReporter = Arc<dyn Reporter>;

/// Forwards every notification to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, level: Level, message: &str) {
        log::log!(target: "pwstore", level, "{message}");
    }
}

impl LogReporter {
    /// Wrap in a [`SharedReporter`].
    pub fn shared() -> SharedReporter {
        Arc::new(LogReporter)
    }
}

/// Captures notifications in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything reported so far, oldest first.
    pub fn entries(&self) -> Vec<(Level, String)> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Entries at exactly `level`.
    pub fn at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, level: Level, message: &str) {
        let mut guard = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, message.to_string()));
    }
}
