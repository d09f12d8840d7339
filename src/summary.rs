//! Per-attribute summary statistics.

use serde::{Deserialize, Serialize};

use crate::types::{Dataset, OrderedMap};

/// Summary statistics for one attribute over the non-absent values of a dataset.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct SummaryStat {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub total: f64,
}

impl SummaryStat {
    /// Compute statistics over a sequence of values.
    ///
    /// Returns `None` if the sequence is empty.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut values = values.into_iter();
        let first = values.next()?;
        let (min, max, total, count) = values.fold(
            (first, first, first, 1_usize),
            |(min, max, total, count), value| {
                (min.min(value), max.max(value), total + value, count + 1)
            },
        );
        Some(Self {
            min,
            max,
            average: total / count as f64,
            total,
        })
    }
}

/// Summary statistics keyed by attribute name, in attribute universe order.
pub type Summary = OrderedMap<SummaryStat>;

/// Returns summary statistics for each attribute of `dataset`.
///
/// Absent values are skipped, and attributes with no values at all are left out.
pub fn summarize(dataset: &Dataset) -> Summary {
    dataset
        .attributes()
        .iter()
        .filter_map(|name| {
            let values = dataset.records().iter().filter_map(|r| r.value(name));
            SummaryStat::from_values(values).map(|stat| (name.as_str(), stat))
        })
        .collect()
}
