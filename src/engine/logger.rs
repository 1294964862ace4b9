//! Operator-facing task log.
//!
//! Distinct from diagnostic tracing: messages sent here are shown to the
//! operator running the task, together with an action label.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::checks::ActionLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for TaskLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskLogLevel::Info => write!(f, "info"),
            TaskLogLevel::Warn => write!(f, "warn"),
            TaskLogLevel::Error => write!(f, "error"),
        }
    }
}

pub trait TaskLogger {
    fn log(&self, level: TaskLogLevel, message: &str, action: ActionLabel);
}

impl<T: TaskLogger + ?Sized> TaskLogger for &T {
    fn log(&self, level: TaskLogLevel, message: &str, action: ActionLabel) {
        (**self).log(level, message, action)
    }
}

impl<T: TaskLogger + ?Sized> TaskLogger for Arc<T> {
    fn log(&self, level: TaskLogLevel, message: &str, action: ActionLabel) {
        (**self).log(level, message, action)
    }
}

/// Forwards task log entries to `tracing` under the `task` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TaskLogger for TracingLogger {
    fn log(&self, level: TaskLogLevel, message: &str, action: ActionLabel) {
        match level {
            TaskLogLevel::Info => info!(target: "task", action = %action, "{}", message),
            TaskLogLevel::Warn => warn!(target: "task", action = %action, "{}", message),
            TaskLogLevel::Error => error!(target: "task", action = %action, "{}", message),
        }
    }
}
