//! Request and response data types and associated functions and methods

use std::sync::Arc;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::catalog::DatasetDescriptor;
use crate::comparison::{ComparisonResult, ComparisonStatus};
use crate::error::QueryError;
use crate::filter::FilterSpec;
use crate::summary::Summary;
use crate::types::{AttributeSelection, Dataset, OrderedMap, Year, YearRange};

/// Maximum number of datasets in one comparison request.
pub const MAX_COMPARE_DATASETS: usize = 16;

/// Value echoed for a filter dimension that was not supplied.
const ALL: &str = "all";

/// Query parameters for filtered fetches and summaries.
///
/// Values are kept as the raw strings sent by the client so that they can be echoed back
/// unchanged. Unparsable years are treated as not supplied.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// First year to include
    #[validate(length(max = 32, message = "startYear must be at most 32 characters"))]
    pub start_year: Option<String>,
    /// Last year to include
    #[validate(length(max = 32, message = "endYear must be at most 32 characters"))]
    pub end_year: Option<String>,
    /// Comma separated attribute names to retain
    #[validate(length(max = 4096, message = "energyTypes must be at most 4096 characters"))]
    pub energy_types: Option<String>,
}

impl FilterParams {
    /// Resolve the parameters into a [FilterSpec].
    pub fn to_filter_spec(&self) -> FilterSpec {
        FilterSpec {
            years: YearRange {
                start: parse_year(&self.start_year),
                end: parse_year(&self.end_year),
            },
            attributes: non_blank(&self.energy_types).map(|names| {
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .collect::<AttributeSelection>()
            }),
        }
    }

    /// The parameters as echoed back in filtered responses.
    pub fn echo(&self) -> FilterEcho {
        let echo = |value: &Option<String>| non_blank(value).unwrap_or(ALL).to_string();
        FilterEcho {
            start_year: echo(&self.start_year),
            end_year: echo(&self.end_year),
            energy_types: echo(&self.energy_types),
        }
    }
}

/// Returns the parameter value unless it is missing or blank.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_year(value: &Option<String>) -> Option<i64> {
    non_blank(value).and_then(|v| v.trim().parse().ok())
}

/// Query parameters for comparisons.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Validate)]
#[validate(schema(function = "validate_compare_params"))]
pub struct CompareParams {
    /// Comma separated dataset ids
    pub ids: Option<String>,
    /// Filter shared by every dataset in the comparison
    #[serde(flatten)]
    #[validate]
    pub filter: FilterParams,
}

impl CompareParams {
    /// Requested dataset ids in order, without blanks or repeats.
    pub fn ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        non_blank(&self.ids)
            .into_iter()
            .flat_map(|ids| ids.split(','))
            .map(str::trim)
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .map(str::to_string)
            .collect()
    }
}

/// Validate comparison parameters
fn validate_compare_params(params: &CompareParams) -> Result<(), ValidationError> {
    let count = params.ids().len();
    if count > MAX_COMPARE_DATASETS {
        let mut error = ValidationError::new("Too many datasets to compare");
        error.add_param("count".into(), &count);
        error.add_param("max".into(), &MAX_COMPARE_DATASETS);
        return Err(error);
    }
    Ok(())
}

/// Metadata describing a dataset in a response.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub total_records: usize,
    /// `[first, last]`, or empty if there are no records
    pub years: Vec<Year>,
    pub energy_types: Vec<String>,
}

impl Metadata {
    /// Return the Metadata of a dataset.
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            total_records: dataset.len(),
            years: dataset
                .year_bounds()
                .map(|(first, last)| vec![first, last])
                .unwrap_or_default(),
            energy_types: dataset.attributes().to_vec(),
        }
    }
}

/// Filter values echoed in filtered responses.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEcho {
    pub start_year: String,
    pub end_year: String,
    pub energy_types: String,
}

/// Response to a catalog listing.
#[derive(Debug, Serialize)]
pub struct DatasetList {
    pub datasets: Vec<DatasetDescriptor>,
}

/// Response containing a whole dataset.
#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub id: String,
    pub data: Arc<Dataset>,
    pub metadata: Metadata,
}

/// Response containing a filtered dataset.
#[derive(Debug, PartialEq, Serialize)]
pub struct FilteredDatasetResponse {
    pub id: String,
    pub data: Dataset,
    pub filters: FilterEcho,
    pub metadata: Metadata,
}

/// Response containing summary statistics.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub id: String,
    pub summary: Summary,
    pub metadata: Metadata,
}

/// Response to a comparison.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResponse {
    pub data: ComparisonResult,
    pub is_loading: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
    pub filters: FilterEcho,
}

impl ComparisonResponse {
    /// Return a ComparisonResponse from a comparison status.
    pub fn new(status: ComparisonStatus, filters: FilterEcho) -> Self {
        Self {
            data: status.data,
            is_loading: status.is_loading,
            is_error: status.is_error,
            error: status.error,
            filters,
        }
    }
}

/// Response to the API root, listing the available endpoints.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    /// Route to description
    pub endpoints: OrderedMap<String>,
}

/// Liveness response.
#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 time of the response
    pub timestamp: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_de_tokens, Token};

    fn params(start: Option<&str>, end: Option<&str>, types: Option<&str>) -> FilterParams {
        FilterParams {
            start_year: start.map(str::to_string),
            end_year: end.map(str::to_string),
            energy_types: types.map(str::to_string),
        }
    }

    // The following tests use serde_test to validate the correct function of the deserialiser.

    #[test]
    fn test_no_fields() {
        assert_de_tokens(
            &FilterParams::default(),
            &[
                Token::Struct {
                    name: "FilterParams",
                    len: 0,
                },
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_all_fields() {
        assert_de_tokens(
            &params(Some("2030"), Some("2040"), Some("solar,wind")),
            &[
                Token::Struct {
                    name: "FilterParams",
                    len: 3,
                },
                Token::Str("startYear"),
                Token::Some,
                Token::Str("2030"),
                Token::Str("endYear"),
                Token::Some,
                Token::Str("2040"),
                Token::Str("energyTypes"),
                Token::Some,
                Token::Str("solar,wind"),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_unknown_fields_ignored() {
        assert_de_tokens(
            &params(Some("2030"), None, None),
            &[
                Token::Struct {
                    name: "FilterParams",
                    len: 2,
                },
                Token::Str("startYear"),
                Token::Some,
                Token::Str("2030"),
                Token::Str("page"),
                Token::Str("2"),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_filter_spec_defaults() {
        assert_eq!(FilterSpec::all(), FilterParams::default().to_filter_spec());
    }

    #[test]
    fn test_filter_spec_years() {
        let spec = params(Some("2030"), Some(" 2040 "), None).to_filter_spec();
        assert_eq!(YearRange::between(2030, 2040), spec.years);
        assert_eq!(None, spec.attributes);
    }

    #[test]
    fn test_filter_spec_bad_year_is_no_filter() {
        let spec = params(Some("soon"), Some(""), None).to_filter_spec();
        assert_eq!(YearRange::full(), spec.years);
    }

    #[test]
    fn test_filter_spec_out_of_range_year_kept() {
        let spec = params(Some("9999"), Some("-5"), None).to_filter_spec();
        assert_eq!(YearRange::between(9999, -5), spec.years);
    }

    #[test]
    fn test_filter_spec_energy_types() {
        let spec = params(None, None, Some(" solar, ,wind,solar ")).to_filter_spec();
        let attributes = spec.attributes.unwrap();
        assert_eq!(vec!["solar", "wind"], attributes.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_spec_blank_energy_types() {
        assert_eq!(None, params(None, None, Some("  ")).to_filter_spec().attributes);
    }

    #[test]
    fn test_filter_spec_only_commas() {
        let attributes = params(None, None, Some(",,")).to_filter_spec().attributes;
        assert_eq!(Some(0), attributes.map(|a| a.len()));
    }

    #[test]
    fn test_echo() {
        let echo = params(Some("9999"), None, Some("solar,wind")).echo();
        assert_eq!(
            FilterEcho {
                start_year: "9999".to_string(),
                end_year: "all".to_string(),
                energy_types: "solar,wind".to_string(),
            },
            echo
        );
    }

    #[test]
    fn test_echo_blank_is_all() {
        let echo = params(Some(""), Some("soon"), Some("")).echo();
        assert_eq!("all", echo.start_year);
        assert_eq!("soon", echo.end_year);
        assert_eq!("all", echo.energy_types);
    }

    #[test]
    #[should_panic(expected = "energyTypes must be at most 4096 characters")]
    fn test_energy_types_too_long() {
        params(None, None, Some(&"a".repeat(4097)))
            .validate()
            .unwrap()
    }

    #[test]
    fn test_compare_ids() {
        let params = CompareParams {
            ids: Some("b, a,,b,c".to_string()),
            filter: FilterParams::default(),
        };
        assert_eq!(vec!["b", "a", "c"], params.ids());
        params.validate().unwrap();
    }

    #[test]
    fn test_compare_no_ids() {
        assert!(CompareParams::default().ids().is_empty());
        CompareParams::default().validate().unwrap();
    }

    #[test]
    #[should_panic(expected = "Too many datasets to compare")]
    fn test_compare_too_many_ids() {
        let ids = (0..=MAX_COMPARE_DATASETS)
            .map(|i| format!("d{i}"))
            .collect::<Vec<_>>()
            .join(",");
        let params = CompareParams {
            ids: Some(ids),
            filter: FilterParams::default(),
        };
        params.validate().unwrap()
    }

    #[test]
    #[should_panic(expected = "startYear must be at most 32 characters")]
    fn test_compare_nested_filter_validated() {
        let params = CompareParams {
            ids: None,
            filter: params(Some(&"1".repeat(33)), None, None),
        };
        params.validate().unwrap()
    }

    #[test]
    fn test_metadata_empty() {
        let metadata = Metadata::of(&Dataset::default());
        assert_eq!(
            r#"{"totalRecords":0,"years":[],"energyTypes":[]}"#,
            serde_json::to_string(&metadata).unwrap()
        );
    }
}
