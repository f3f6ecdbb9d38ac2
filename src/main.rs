use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod domain;
mod linalg;
mod services;

use cli::Cli;
use domain::error::InferenceError;
use services::output::print_error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();

    match commands::handle_analyze(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<InferenceError>()
                .map(InferenceError::code)
                .unwrap_or("INTERNAL_ERROR");
            if cli.json() {
                let _ = print_error(code, &err.to_string());
            }
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
