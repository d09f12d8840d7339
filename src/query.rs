//! Dataset query service
//!
//! Resolves dataset ids against the [Catalog] and applies filters and summaries. All operations
//! are read-only; the service can be shared between any number of concurrent requests.

use std::sync::Arc;

use tracing::{event, Level};

use crate::catalog::{Catalog, DatasetDescriptor};
use crate::error::DatasetError;
use crate::filter::{self, FilterSpec};
use crate::metrics::DATASET_QUERIES;
use crate::models::{
    DatasetList, DatasetResponse, FilterParams, FilteredDatasetResponse, Metadata,
    SummaryResponse,
};
use crate::summary::{self, Summary};
use crate::types::Dataset;

/// Query service over a shared, immutable catalog.
#[derive(Clone, Debug)]
pub struct QueryService {
    catalog: Arc<Catalog>,
}

impl QueryService {
    /// Return a new QueryService.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Descriptors of every available dataset, in catalog order.
    pub fn list_datasets(&self) -> Vec<DatasetDescriptor> {
        count("list");
        self.catalog.list_all().cloned().collect()
    }

    /// Returns the full dataset for `id`.
    pub fn get_dataset(&self, id: &str) -> Result<Arc<Dataset>, DatasetError> {
        count("get");
        self.catalog.dataset(id)
    }

    /// Returns the dataset for `id` filtered by `spec`.
    ///
    /// A filter that matches nothing is not an error; the result is an empty dataset.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub fn get_filtered(&self, id: &str, spec: &FilterSpec) -> Result<Dataset, DatasetError> {
        count("filter");
        let dataset = self.catalog.dataset(id)?;
        let filtered = filter::filter(&dataset, spec);
        event!(Level::DEBUG, records = filtered.len(), "filtered dataset");
        Ok(filtered)
    }

    /// Returns summary statistics of the dataset for `id` after filtering by `spec`.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub fn get_summary(&self, id: &str, spec: &FilterSpec) -> Result<Summary, DatasetError> {
        count("summary");
        let dataset = self.catalog.dataset(id)?;
        Ok(summary::summarize(&filter::filter(&dataset, spec)))
    }

    /// Returns the catalog listing response.
    pub fn dataset_list(&self) -> DatasetList {
        DatasetList {
            datasets: self.list_datasets(),
        }
    }

    /// Returns the response for a full dataset fetch.
    pub fn dataset_response(&self, id: &str) -> Result<DatasetResponse, DatasetError> {
        let data = self.get_dataset(id)?;
        Ok(DatasetResponse {
            id: id.to_string(),
            metadata: Metadata::of(&data),
            data,
        })
    }

    /// Returns the response for a filtered dataset fetch.
    pub fn filtered_response(
        &self,
        id: &str,
        params: &FilterParams,
    ) -> Result<FilteredDatasetResponse, DatasetError> {
        let data = self.get_filtered(id, &params.to_filter_spec())?;
        Ok(FilteredDatasetResponse {
            id: id.to_string(),
            metadata: Metadata::of(&data),
            filters: params.echo(),
            data,
        })
    }

    /// Returns the response for a summary request.
    ///
    /// The metadata describes the dataset the summary was computed over.
    pub fn summary_response(
        &self,
        id: &str,
        params: &FilterParams,
    ) -> Result<SummaryResponse, DatasetError> {
        let spec = params.to_filter_spec();
        let dataset = self.get_filtered(id, &spec)?;
        Ok(SummaryResponse {
            id: id.to_string(),
            summary: summary::summarize(&dataset),
            metadata: Metadata::of(&dataset),
        })
    }
}

fn count(operation: &str) {
    DATASET_QUERIES.with_label_values(&[operation]).inc();
}
