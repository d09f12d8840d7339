//! Year range and attribute filtering.
//!
//! Filtering is a pure function of a [Dataset] and a [FilterSpec]. The input dataset is never
//! modified, so a single loaded dataset can be filtered by any number of concurrent requests.

use crate::types::{AttributeSelection, Dataset, YearRange};

/// A filter to apply to a dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSpec {
    /// Requested year range. Clamped against each dataset's bounds.
    pub years: YearRange,
    /// Attributes to retain, or `None` to retain all of them.
    pub attributes: Option<AttributeSelection>,
}

impl FilterSpec {
    /// A filter that retains everything.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Returns a new dataset containing the records of `dataset` that match `spec`.
///
/// # Arguments
///
/// * `dataset`: Dataset to filter
/// * `spec`: Year range and optional attribute selection
pub fn filter(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    let Some(years) = dataset
        .year_bounds()
        .and_then(|(min, max)| spec.years.clamp(min, max))
    else {
        return Dataset::default();
    };
    let records = dataset.records();
    // Records are sorted by year, so the range maps onto a contiguous slice.
    let lo = records.partition_point(|record| record.year() < *years.start());
    let hi = records.partition_point(|record| record.year() <= *years.end());
    let selected = &records[lo..hi];
    let records = match &spec.attributes {
        Some(selection) => selected
            .iter()
            .map(|record| record.project(selection))
            .collect(),
        None => selected.to_vec(),
    };
    Dataset::from_ordered(records)
}
