//! This file defines the energy-compare-client binary entry point.
//!
//! Compares several datasets served by a remote energy-compare server and prints the result as
//! JSON. Exits with status 2 if any dataset could not be queried.

use energy_compare::comparison::{compare, DatasetSource, QueryState};
use energy_compare::dataset_source_http::HttpDatasetSource;
use energy_compare::models::FilterParams;
use energy_compare::tracing;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ::tracing::{event, Level};
use clap::Parser;
use url::Url;

/// energy-compare-client command line interface
#[derive(Clone, Debug, Parser)]
struct ClientArgs {
    /// Base URL of the energy-compare server
    #[arg(long, default_value = "http://localhost:3001/", env = "ENERGY_COMPARE_SERVER")]
    server: Url,
    /// Comma separated dataset ids to compare
    #[arg(long, value_delimiter = ',', required = true)]
    ids: Vec<String>,
    /// First year to include
    #[arg(long)]
    start_year: Option<i64>,
    /// Last year to include
    #[arg(long)]
    end_year: Option<i64>,
    /// Comma separated energy types to include
    #[arg(long)]
    energy_types: Option<String>,
    /// Maximum time in seconds for each dataset query
    #[arg(long)]
    timeout: Option<u64>,
}

impl ClientArgs {
    /// The filter options as request parameters.
    fn filter_params(&self) -> FilterParams {
        FilterParams {
            start_year: self.start_year.map(|year| year.to_string()),
            end_year: self.end_year.map(|year| year.to_string()),
            energy_types: self.energy_types.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = ClientArgs::parse();
    tracing::init_client_tracing();

    let source: Arc<dyn DatasetSource> = Arc::new(HttpDatasetSource::new(args.server.clone()));
    let ids = args.ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty());
    let state = compare(
        source,
        ids,
        args.filter_params().to_filter_spec(),
        args.timeout.map(Duration::from_secs),
    )
    .await;

    for (id, state) in state.slots() {
        if let QueryState::Failed(error) = state {
            event!(Level::WARN, id, "{}", error);
        }
    }
    match serde_json::to_string_pretty(&state.status()) {
        Ok(json) => println!("{json}"),
        Err(error) => {
            eprintln!("failed to serialise comparison result: {error}");
            return ExitCode::FAILURE;
        }
    }
    if state.any_failed() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}
