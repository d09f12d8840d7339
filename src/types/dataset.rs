//! Datasets: ordered sequences of annual records

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use thiserror::Error;

use crate::types::{Record, Year};

/// Violation of the dataset ordering invariant.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetShapeError {
    /// Years must be positive
    #[error("record year must be positive")]
    NonPositiveYear,

    /// Years must be strictly ascending (this also rules out duplicates)
    #[error("record year {year} does not follow {previous}")]
    NotAscending { previous: Year, year: Year },
}

/// An immutable, year-ordered sequence of records.
///
/// Records are strictly ascending by year. The attribute universe is the union of the attribute
/// names of all records, in the order each name is first seen.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Record>")]
pub struct Dataset {
    records: Vec<Record>,
    attributes: Vec<String>,
}

impl Dataset {
    /// Build a dataset, checking that years are positive and strictly ascending.
    pub fn new(records: Vec<Record>) -> Result<Self, DatasetShapeError> {
        let mut previous: Option<Year> = None;
        for record in &records {
            let year = record.year();
            if year == 0 {
                return Err(DatasetShapeError::NonPositiveYear);
            }
            if let Some(previous) = previous {
                if year <= previous {
                    return Err(DatasetShapeError::NotAscending { previous, year });
                }
            }
            previous = Some(year);
        }
        Ok(Self::from_ordered(records))
    }

    /// Build a dataset from records already known to be ordered, such as a slice of another
    /// dataset.
    pub(crate) fn from_ordered(records: Vec<Record>) -> Self {
        let mut attributes: Vec<String> = Vec::new();
        for record in &records {
            for name in record.attributes() {
                if !attributes.iter().any(|known| known == name) {
                    attributes.push(name.to_string());
                }
            }
        }
        Self {
            records,
            attributes,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Attribute universe, in first-seen order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last year, or `None` for an empty dataset.
    pub fn year_bounds(&self) -> Option<(Year, Year)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.year(), last.year())),
            _ => None,
        }
    }
}

impl TryFrom<Vec<Record>> for Dataset {
    type Error = DatasetShapeError;

    fn try_from(records: Vec<Record>) -> Result<Self, Self::Error> {
        Self::new(records)
    }
}

impl Serialize for Dataset {
    /// Serialise as a sequence of records.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.records)
    }
}
