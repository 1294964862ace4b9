//! Precheck report.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::checks::CredentialCheck;

/// Result summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub valid: u32,
    pub invalid: u32,
    pub total: u32,
}

/// Checks performed during one precheck invocation
#[derive(Debug, Clone, Serialize)]
pub struct PrecheckReport {
    pub round: Option<String>,
    pub timestamp: u64,
    pub checks: Vec<CredentialCheck>,
    pub total_duration_ms: u64,
}

impl PrecheckReport {
    /// Create a new empty report
    pub fn new(round: Option<&str>) -> Self {
        PrecheckReport {
            round: round.map(str::to_string),
            timestamp: unix_timestamp(),
            checks: Vec::new(),
            total_duration_ms: 0,
        }
    }

    pub fn push(&mut self, check: CredentialCheck) {
        self.checks.push(check);
    }

    /// True when every check in the report passed
    pub fn all_valid(&self) -> bool {
        self.checks.iter().all(|c| c.valid())
    }

    /// Calculate summary statistics
    pub fn summary(&self) -> ResultSummary {
        let mut summary = ResultSummary::default();

        for check in &self.checks {
            summary.total += 1;
            if check.valid() {
                summary.valid += 1;
            } else {
                summary.invalid += 1;
            }
        }

        summary
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
