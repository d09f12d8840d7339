use crate::cli::CommandLineArgs;
use crate::query::QueryService;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Query service over the loaded catalog.
    pub query_service: Arc<QueryService>,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs, query_service: QueryService) -> Self {
        Self {
            args: args.clone(),
            query_service: Arc::new(query_service),
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
