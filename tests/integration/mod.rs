//! Integration tests for credential-precheck.

mod cli_tests;
mod http_tests;
