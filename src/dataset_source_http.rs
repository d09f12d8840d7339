use crate::comparison::DatasetSource;
use crate::error::{error_chain, ErrorKind, QueryError};
use crate::filter::FilterSpec;
use crate::types::Dataset;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// Filter response body. Fields other than `data` are ignored.
#[derive(Deserialize)]
struct FilterBody {
    data: Dataset,
}

/// HTTP dataset source.
///
/// Implements [DatasetSource] by querying the filter endpoint of a remote server.
#[derive(Clone, Debug)]
pub struct HttpDatasetSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpDatasetSource {
    /// Create a new HTTP dataset source.
    ///
    /// # Arguments
    ///
    /// * `base`: Base URL of the server, e.g. `http://localhost:3001/`
    pub fn new(base: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    /// Create a new HTTP dataset source using an existing client.
    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Returns the URL of the filter endpoint for `id` with `filter` as query parameters.
    pub fn filter_url(&self, id: &str, filter: &FilterSpec) -> Result<Url, QueryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| QueryError::query_failure(id, format!("invalid base URL {}", self.base)))?
            .pop_if_empty()
            .extend(["api", "datasets", id, "filter"]);

        let mut pairs = Vec::new();
        if let Some(start) = filter.years.start {
            pairs.push(("startYear", start.to_string()));
        }
        if let Some(end) = filter.years.end {
            pairs.push(("endYear", end.to_string()));
        }
        if let Some(selection) = &filter.attributes {
            let names = selection.iter().collect::<Vec<_>>().join(",");
            // A blank value means no selection, so an empty selection is sent as a lone comma.
            let names = if names.is_empty() {
                ",".to_string()
            } else {
                names
            };
            pairs.push(("energyTypes", names));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    /// Fetch a filtered dataset from the server.
    ///
    /// # Arguments
    ///
    /// * `id`: Dataset identifier
    /// * `filter`: Filter to apply
    #[tracing::instrument(level = "DEBUG", skip(self, filter))]
    async fn filtered(&self, id: &str, filter: &FilterSpec) -> Result<Dataset, QueryError> {
        let url = self.filter_url(id, filter)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| QueryError::query_failure(id, error_chain(&e).join(": ")))?;
        let kind = match response.status() {
            StatusCode::OK => {
                let body: FilterBody = response.json().await.map_err(|e| {
                    QueryError::query_failure(id, error_chain(&e).join(": "))
                })?;
                return Ok(body.data);
            }
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::INTERNAL_SERVER_ERROR => ErrorKind::LoadFailure,
            _ => ErrorKind::QueryFailure,
        };
        let status = response.status();
        let message = response
            .bytes()
            .await
            .ok()
            .and_then(|body| error_message(&body))
            .unwrap_or_else(|| format!("unexpected status {status}"));
        Err(QueryError::new(id, kind, message))
    }
}

/// Extract the message from an error response body.
fn error_message(body: &[u8]) -> Option<String> {
    let body: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = body.get("error")?;
    let mut message = error.get("message")?.as_str()?.to_string();
    for cause in error
        .get("caused_by")
        .and_then(|c| c.as_array())
        .into_iter()
        .flatten()
        .filter_map(|c| c.as_str())
    {
        message.push_str(": ");
        message.push_str(cause);
    }
    Some(message)
}
