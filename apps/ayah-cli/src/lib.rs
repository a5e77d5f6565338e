//! Shared pieces of the `ayah` and `ayah-indexer` binaries.

pub mod output;

use std::path::Path;
use std::process::ExitCode;

use ayah_core::config::{AppConfig, Config};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; `RUST_LOG` wins over the default level.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_app_config(dir: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match dir {
        Some(dir) => Config::load_in(dir)?,
        None => Config::load()?,
    };
    config.app()
}

/// Client mistakes exit with 2 and their message; anything else exits with 1
/// and only a generic message, the detail going to the log.
pub fn report(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<ayah_core::Error>() {
        if e.is_client_error() {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    }
    tracing::error!(error = %format!("{err:#}"), "command failed");
    eprintln!("internal error; see log for details");
    ExitCode::from(1)
}
