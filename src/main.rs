//! This file defines the energy-compare server binary entry point.

use energy_compare::app;
use energy_compare::app_state::AppState;
use energy_compare::cli;
use energy_compare::error::error_chain;
use energy_compare::loader;
use energy_compare::metrics;
use energy_compare::query::QueryService;
use energy_compare::server;
use energy_compare::tracing;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ::tracing::{event, Level};
use expanduser::expanduser;

/// Expand `~` in a path given on the command line.
fn expand(path: &str) -> Result<PathBuf, String> {
    expanduser(path).map_err(|e| {
        format!("failed to expand ~ in {path}: {e}. Please provide an absolute path instead.")
    })
}

/// Application entry point
#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    tracing::init_tracing();
    metrics::register_metrics();

    let catalog = match expand(&args.catalog).and_then(|manifest| {
        let data_dir = args.data_dir.as_deref().map(expand).transpose()?;
        loader::load_catalog(&manifest, data_dir.as_deref())
            .map_err(|e| error_chain(&e).join(": "))
    }) {
        Ok(catalog) => catalog,
        Err(message) => {
            event!(Level::ERROR, "failed to load catalog: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let state = Arc::new(AppState::new(
        &args,
        QueryService::new(Arc::new(catalog)),
    ));
    let service = app::service(state);
    if let Err(error) = server::serve(&args, service).await {
        event!(Level::ERROR, "server error: {}", error);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
