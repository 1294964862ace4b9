//! Precheck orchestrator.
//!
//! Runs the registered validators in order before a task round and stops at
//! the first credential that fails. A failure is reported to the operator
//! through the task logger and persisted through the result store before it
//! is returned as a [`PrecheckError`], so both exist by the time the caller
//! aborts the round.
//!
//! The standard order is Anthropic first: it is one request and gates the
//! expensive part of the round, so a bad key fails fastest.

use std::time::Instant;

use tracing::{error, info};

use crate::checks::{CredentialCheck, CredentialValidator, Credentials, StatusCode};
use crate::engine::logger::{TaskLogLevel, TaskLogger};
use crate::engine::result::PrecheckReport;
use crate::engine::store::{result_key, ResultStore};
use crate::PrecheckError;

/// Check orchestrator
pub struct PrecheckOrchestrator<S, L> {
    validators: Vec<Box<dyn CredentialValidator>>,
    store: S,
    logger: L,
}

impl<S: ResultStore, L: TaskLogger> PrecheckOrchestrator<S, L> {
    /// Create an orchestrator with no validators
    pub fn new(store: S, logger: L) -> Self {
        PrecheckOrchestrator {
            validators: Vec::new(),
            store,
            logger,
        }
    }

    /// Append a validator; validators run in registration order
    pub fn register_validator(&mut self, validator: Box<dyn CredentialValidator>) {
        self.validators.push(validator);
    }

    pub fn with_validator(mut self, validator: Box<dyn CredentialValidator>) -> Self {
        self.register_validator(validator);
        self
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Run the precheck for `round`.
    ///
    /// Returns the passing checks, or the first rejection. Validators after a
    /// rejected one are not run.
    pub fn run(&self, round: &str, credentials: &Credentials) -> Result<PrecheckReport, PrecheckError> {
        let start = Instant::now();
        let mut report = PrecheckReport::new(Some(round));

        info!(round, validators = self.validators.len(), "starting precheck");

        for validator in &self.validators {
            let check = validator.check(credentials);

            if !check.valid() {
                self.reject(round, check.status());
                return Err(PrecheckError::CredentialRejected {
                    round: round.to_string(),
                    status: check.status(),
                });
            }

            report.push(check);
        }

        report.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(round, duration_ms = report.total_duration_ms, "precheck passed");
        Ok(report)
    }

    /// Run every validator without stopping, logging or persisting.
    pub fn diagnose(&self, credentials: &Credentials) -> PrecheckReport {
        let start = Instant::now();
        let mut report = PrecheckReport::new(None);

        for validator in &self.validators {
            let check: CredentialCheck = validator.check(credentials);
            info!(credential = %validator.credential(), status = %check.status(), "diagnosed");
            report.push(check);
        }

        report.total_duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    fn reject(&self, round: &str, status: StatusCode) {
        self.logger
            .log(TaskLogLevel::Error, status.remediation(), status.action());

        if let Err(e) = self.store.set(&result_key(round), status.label()) {
            error!(round, status = %status, error = %e, "failed to persist precheck result");
        }
    }
}
