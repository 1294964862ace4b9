//! credential-precheck CLI entry point
//!
//! Validates task credentials from the environment before a round runs.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use credential_precheck::build_orchestrator;
use credential_precheck::checks::Credentials;
use credential_precheck::cli::args::{Args, Command};
use credential_precheck::cli::output::{get_formatter, OutputFormatter};
use credential_precheck::config::PrecheckConfig;
use credential_precheck::engine::logger::TracingLogger;
use credential_precheck::engine::store::{FileStore, MemoryStore};
use credential_precheck::logging;
use credential_precheck::version::get_build_info;
use credential_precheck::PrecheckError;

const EXIT_REJECTED: u8 = 1;
const EXIT_RUNTIME_ERROR: u8 = 3;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_RUNTIME_ERROR),
            };
        }
    };

    logging::init(args.log_level, args.log_json);

    let no_color = args.no_color || std::env::var_os("NO_COLOR").is_some();
    let formatter = get_formatter(args.format, no_color);

    match args.command {
        Command::Version => {
            println!("{}", get_build_info());
            ExitCode::SUCCESS
        }
        Command::Statuses => {
            println!("{}", formatter.format_statuses());
            ExitCode::SUCCESS
        }
        Command::Check => match args.load_config() {
            Ok(config) => run_check(&config, formatter.as_ref()),
            Err(e) => runtime_error(e),
        },
        Command::Run { ref round, .. } => match args.load_config() {
            Ok(config) => run_round(&config, round, formatter.as_ref()),
            Err(e) => runtime_error(e),
        },
    }
}

fn run_round(config: &PrecheckConfig, round: &str, formatter: &dyn OutputFormatter) -> ExitCode {
    let store = FileStore::new(&config.store_path);
    let orchestrator = match build_orchestrator(config, store, TracingLogger) {
        Ok(orchestrator) => orchestrator,
        Err(e) => return runtime_error(e),
    };

    match orchestrator.run(round, &Credentials::from_env()) {
        Ok(report) => {
            println!("{}", formatter.format(&report));
            ExitCode::SUCCESS
        }
        Err(e @ PrecheckError::CredentialRejected { .. }) => {
            println!("{}", formatter.format_rejection(&e));
            ExitCode::from(EXIT_REJECTED)
        }
        Err(e) => runtime_error(e),
    }
}

fn run_check(config: &PrecheckConfig, formatter: &dyn OutputFormatter) -> ExitCode {
    let orchestrator = match build_orchestrator(config, MemoryStore::new(), TracingLogger) {
        Ok(orchestrator) => orchestrator,
        Err(e) => return runtime_error(e),
    };

    let report = orchestrator.diagnose(&Credentials::from_env());
    println!("{}", formatter.format(&report));

    if report.all_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    }
}

fn runtime_error(e: impl std::fmt::Display) -> ExitCode {
    eprintln!("Error: {}", e);
    eprintln!("Run 'credential-precheck --help' for usage information.");
    ExitCode::from(EXIT_RUNTIME_ERROR)
}
