//! Mock implementations for testing without network access.
//!
//! Scripted transports stand in for the Anthropic and GitHub APIs, the
//! collaborator mocks record what the orchestrator logged and persisted, and
//! the local server exercises the real HTTP client over a socket.

#![allow(dead_code)]

pub mod collaborators;
pub mod server;

pub use collaborators::*;
pub use server::*;
pub use transport::*;

/// A key that passes the format check
pub const GOOD_KEY: &str = "sk-ant-REDACTED";
