//! Mock validators, stores, and loggers for orchestrator tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use credential_precheck::checks::{
    ActionLabel, Credential, CredentialCheck, CredentialValidator, Credentials, StatusCode,
};
use credential_precheck::engine::logger::{TaskLogLevel, TaskLogger};
use credential_precheck::engine::store::{ResultStore, StoreError};

/// Validator returning a fixed status and counting its invocations
pub struct CountingValidator {
    status: StatusCode,
    calls: Arc<AtomicUsize>,
}

impl CountingValidator {
    /// The validator and a handle on its call counter
    pub fn new(status: StatusCode) -> (Box<dyn CredentialValidator>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let validator = CountingValidator {
            status,
            calls: calls.clone(),
        };
        (Box::new(validator), calls)
    }
}

impl CredentialValidator for CountingValidator {
    fn credential(&self) -> Credential {
        self.status.credential()
    }

    fn check(&self, _credentials: &Credentials) -> CredentialCheck {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CredentialCheck::new(self.status)
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// One recorded task log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: TaskLogLevel,
    pub message: String,
    pub action: ActionLabel,
}

/// Logger that keeps every entry
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl TaskLogger for RecordingLogger {
    fn log(&self, level: TaskLogLevel, message: &str, action: ActionLabel) {
        self.entries.lock().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
            action,
        });
    }
}

/// Store whose writes always fail
#[derive(Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ResultStore for FailingStore {
    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Rejected("disk full".to_string()))
    }
}
