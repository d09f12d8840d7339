pub mod dataset;
pub mod ordered_map;
pub mod record;
pub mod selection;
pub mod year_range;

// Re-export types for convenience.
pub use crate::types::dataset::{Dataset, DatasetShapeError};
pub use crate::types::ordered_map::OrderedMap;
pub use crate::types::record::{AttributeValue, Record, Year, YEAR_KEY};
pub use crate::types::selection::AttributeSelection;
pub use crate::types::year_range::YearRange;
