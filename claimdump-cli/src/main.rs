//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use claimdump_cli::CliError;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    match claimdump_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("claimdump: {err}");
            std::process::exit(1);
        }
    }
}

/// Route `log` records from the library crates to stderr, filtered by `RUST_LOG`.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
