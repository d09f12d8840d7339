//! Requested year ranges

use std::ops::RangeInclusive;

use crate::types::Year;

/// An inclusive year range as requested by a client.
///
/// Either bound may be missing, in which case the corresponding bound of the dataset is used.
/// Bounds are held as `i64` so that any integer a client sends can be represented; they are only
/// converted to a [Year] once clamped against a dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct YearRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl YearRange {
    /// The full range of whichever dataset the range is applied to.
    pub fn full() -> Self {
        Self::default()
    }

    /// A range with both bounds set.
    pub fn between(start: i64, end: i64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Clamp the range against dataset bounds `[min, max]`.
    ///
    /// Each bound is clamped into `[min, max]`, so a start beyond the last year selects the last
    /// year and an end before the first year selects the first year. Returns `None` when the
    /// clamped start is after the clamped end.
    pub fn clamp(&self, min: Year, max: Year) -> Option<RangeInclusive<Year>> {
        let start = self.start.map_or(min, |start| clamp_year(start, min, max));
        let end = self.end.map_or(max, |end| clamp_year(end, min, max));
        (start <= end).then_some(start..=end)
    }
}

fn clamp_year(year: i64, min: Year, max: Year) -> Year {
    // Within [min, max] after clamping, so the cast is lossless.
    year.clamp(i64::from(min), i64::from(max)) as Year
}
