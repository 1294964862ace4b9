//! Precheck engine.
//!
//! Provides the orchestrator, its report, and the collaborator traits it
//! reports through.

pub mod logger;
pub mod orchestrator;
pub mod result;
pub mod store;
