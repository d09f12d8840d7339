//! Multi-dataset comparison
//!
//! A [Comparison] issues one filtered query per requested dataset, each in its own tokio task,
//! and publishes per-dataset progress through a [watch] channel. A failure for one dataset never
//! affects the others. [Comparison::refetch] starts a new generation of queries; results from
//! older generations are discarded when they arrive.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hashbrown::HashSet;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{event, Level};

use crate::error::QueryError;
use crate::filter::FilterSpec;
use crate::metrics::COMPARISON_OUTCOMES;
use crate::query::QueryService;
use crate::types::{Dataset, OrderedMap};

/// Source of filtered datasets for a comparison.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Returns the dataset `id` filtered by `filter`.
    ///
    /// # Arguments
    ///
    /// * `id`: Dataset identifier
    /// * `filter`: Filter to apply
    async fn filtered(&self, id: &str, filter: &FilterSpec) -> Result<Dataset, QueryError>;
}

#[async_trait]
impl DatasetSource for QueryService {
    async fn filtered(&self, id: &str, filter: &FilterSpec) -> Result<Dataset, QueryError> {
        self.get_filtered(id, filter).map_err(QueryError::from)
    }
}

/// Successful results of a comparison keyed by dataset id, in request order.
pub type ComparisonResult = OrderedMap<Arc<Dataset>>;

/// State of the query for a single dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryState {
    Pending,
    Succeeded(Arc<Dataset>),
    Failed(QueryError),
}

/// State of every query in a comparison.
#[derive(Clone, Debug, Default)]
pub struct ComparisonState {
    /// Incremented on each refetch
    generation: u64,
    /// Query state per dataset id, in request order
    slots: Vec<(String, QueryState)>,
}

impl ComparisonState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Iterate over dataset ids and their query states in request order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &QueryState)> {
        self.slots.iter().map(|(id, state)| (id.as_str(), state))
    }

    /// Returns the query state of dataset `id`.
    pub fn get(&self, id: &str) -> Option<&QueryState> {
        self.slots().find(|(slot, _)| *slot == id).map(|(_, s)| s)
    }

    /// Returns true while any query is still pending.
    pub fn any_loading(&self) -> bool {
        self.slots
            .iter()
            .any(|(_, state)| matches!(state, QueryState::Pending))
    }

    /// Returns true if any query has failed.
    pub fn any_failed(&self) -> bool {
        self.first_error().is_some()
    }

    /// Returns the error of the first failed query in request order.
    pub fn first_error(&self) -> Option<&QueryError> {
        self.slots.iter().find_map(|(_, state)| match state {
            QueryState::Failed(error) => Some(error),
            _ => None,
        })
    }

    /// Returns the datasets of every successful query.
    pub fn result(&self) -> ComparisonResult {
        self.slots
            .iter()
            .filter_map(|(id, state)| match state {
                QueryState::Succeeded(dataset) => Some((id.as_str(), Arc::clone(dataset))),
                _ => None,
            })
            .collect()
    }

    /// Returns the externally visible status of the comparison.
    pub fn status(&self) -> ComparisonStatus {
        ComparisonStatus {
            data: self.result(),
            is_loading: self.any_loading(),
            is_error: self.any_failed(),
            error: self.first_error().cloned(),
        }
    }
}

/// Point in time view of a comparison.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStatus {
    pub data: ComparisonResult,
    pub is_loading: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

/// A running comparison of several datasets under one filter.
///
/// Must be started from within a tokio runtime.
pub struct Comparison {
    source: Arc<dyn DatasetSource>,
    ids: Vec<String>,
    filter: Arc<FilterSpec>,
    timeout: Option<Duration>,
    state: Arc<watch::Sender<ComparisonState>>,
}

impl Comparison {
    /// Start querying every dataset in `ids`.
    ///
    /// Repeated ids are queried once, at the position of their first occurrence.
    ///
    /// # Arguments
    ///
    /// * `source`: Where to query datasets from
    /// * `ids`: Dataset identifiers in request order
    /// * `filter`: Filter applied to every dataset
    /// * `timeout`: Optional limit on the duration of each query
    pub fn start<I, S>(
        source: Arc<dyn DatasetSource>,
        ids: I,
        filter: FilterSpec,
        timeout: Option<Duration>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| seen.insert(id.clone()))
            .collect();
        let (state, _) = watch::channel(ComparisonState::default());
        let comparison = Self {
            source,
            ids,
            filter: Arc::new(filter),
            timeout,
            state: Arc::new(state),
        };
        comparison.refetch();
        comparison
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Reset every dataset to pending and query them all again.
    ///
    /// Queries from earlier generations are not cancelled, but their results are discarded.
    pub fn refetch(&self) {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            state.slots = self
                .ids
                .iter()
                .map(|id| (id.clone(), QueryState::Pending))
                .collect();
        });
        event!(
            Level::DEBUG,
            generation,
            ids = ?self.ids,
            "starting comparison queries"
        );
        for (index, id) in self.ids.iter().enumerate() {
            self.spawn_query(generation, index, id.clone());
        }
    }

    fn spawn_query(&self, generation: u64, index: usize, id: String) {
        let source = Arc::clone(&self.source);
        let filter = Arc::clone(&self.filter);
        let timeout = self.timeout;
        let query_id = id.clone();
        let query = tokio::spawn(async move {
            let query = source.filtered(&query_id, &filter);
            match timeout {
                Some(limit) => tokio::time::timeout(limit, query)
                    .await
                    .unwrap_or_else(|_| {
                        Err(QueryError::query_failure(
                            &query_id,
                            format!("query timed out after {limit:?}"),
                        ))
                    }),
                None => query.await,
            }
        });

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let outcome = query.await.unwrap_or_else(|error| {
                Err(QueryError::query_failure(
                    &id,
                    format!("query task failed: {error}"),
                ))
            });
            let label = match &outcome {
                Ok(_) => "succeeded".to_string(),
                Err(error) => error.kind.to_string(),
            };
            COMPARISON_OUTCOMES.with_label_values(&[&label]).inc();
            if let Err(error) = &outcome {
                event!(Level::WARN, generation, "{}", error);
            }
            let current = state.send_if_modified(|state| {
                if state.generation != generation {
                    return false;
                }
                state.slots[index].1 = match outcome {
                    Ok(dataset) => QueryState::Succeeded(Arc::new(dataset)),
                    Err(error) => QueryState::Failed(error),
                };
                true
            });
            if !current {
                event!(
                    Level::DEBUG,
                    generation,
                    id = id.as_str(),
                    "discarding stale result"
                );
            }
        });
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> ComparisonState {
        self.state.borrow().clone()
    }

    /// Returns the current externally visible status.
    pub fn status(&self) -> ComparisonStatus {
        self.state.borrow().status()
    }

    /// Returns a receiver notified of every state change.
    pub fn subscribe(&self) -> watch::Receiver<ComparisonState> {
        self.state.subscribe()
    }

    /// Wait until no query of the current generation is pending, and return the state.
    pub async fn settled(&self) -> ComparisonState {
        let mut receiver = self.subscribe();
        loop {
            {
                let state = receiver.borrow_and_update();
                if !state.any_loading() {
                    return state.clone();
                }
            }
            // The sender lives as long as self, so this cannot fail.
            if receiver.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}

/// Run a comparison to completion.
pub async fn compare<I, S>(
    source: Arc<dyn DatasetSource>,
    ids: I,
    filter: FilterSpec,
    timeout: Option<Duration>,
) -> ComparisonState
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Comparison::start(source, ids, filter, timeout)
        .settled()
        .await
}
