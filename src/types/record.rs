//! Annual records
//!
//! A record holds the attribute values for a single calendar year. On the wire a record is a JSON
//! object with the year under the `"x"` key and one key per attribute:
//!
//! ```json
//! {"x": 2023, "solar": 10.5, "wind-onshore": null}
//! ```
//!
//! A `null` attribute value is an explicit absence marker. Absent values are carried through
//! unfiltered fetches but never take part in aggregation.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Unexpected, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{AttributeSelection, OrderedMap};

/// Calendar year. Always positive.
pub type Year = u32;

/// A numeric attribute value, or `None` for an explicit absence.
pub type AttributeValue = Option<f64>;

/// Key holding the year in serialised records.
pub const YEAR_KEY: &str = "x";

/// One year of attribute values.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    year: Year,
    values: OrderedMap<AttributeValue>,
}

impl Record {
    /// Return a new Record with no attributes.
    pub fn new(year: Year) -> Self {
        Self {
            year,
            values: OrderedMap::new(),
        }
    }

    /// Builder style helper that sets an attribute value.
    ///
    /// [YEAR_KEY] is not an attribute name; setting it is ignored.
    pub fn with_value(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        let name = name.into();
        if name != YEAR_KEY {
            self.values.insert(name, value);
        }
        self
    }

    pub fn year(&self) -> Year {
        self.year
    }

    /// Returns the value of an attribute if it is present and not absent.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }

    /// Returns true if the record has a key for the attribute, even if its value is absent.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate over attribute names, in the order they appear in the record.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.values.keys()
    }

    pub fn values(&self) -> &OrderedMap<AttributeValue> {
        &self.values
    }

    /// Return a new record restricted to the selected attributes.
    ///
    /// Only attributes that both appear in the selection and carry a value are kept. The year is
    /// always kept.
    pub fn project(&self, selection: &AttributeSelection) -> Record {
        let values = self
            .values
            .iter()
            .filter(|(name, value)| value.is_some() && selection.contains(name))
            .map(|(name, value)| (name, *value))
            .collect();
        Record {
            year: self.year,
            values,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(YEAR_KEY, &self.year)?;
        for (name, value) in self.values.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a record object with a `{}` year key", YEAR_KEY)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
        let mut year: Option<Year> = None;
        let mut values = OrderedMap::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == YEAR_KEY {
                if year.is_some() {
                    return Err(de::Error::duplicate_field(YEAR_KEY));
                }
                let value: Year = map.next_value()?;
                if value == 0 {
                    return Err(de::Error::invalid_value(
                        Unexpected::Unsigned(0),
                        &"a positive year",
                    ));
                }
                year = Some(value);
            } else {
                let value: AttributeValue = map.next_value()?;
                if values.insert(key.as_str(), value).is_some() {
                    return Err(de::Error::custom(format!("duplicate attribute `{}`", key)));
                }
            }
        }
        let year = year.ok_or_else(|| de::Error::missing_field(YEAR_KEY))?;
        Ok(Record { year, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_json() {
        let record: Record =
            serde_json::from_str(r#"{"x": 2023, "solar": 10, "wind": null, "hydro": 1.5}"#)
                .unwrap();
        assert_eq!(2023, record.year());
        assert_eq!(Some(10.0), record.value("solar"));
        assert_eq!(None, record.value("wind"));
        assert!(record.contains("wind"));
        assert!(!record.contains("nuclear"));
        assert_eq!(
            vec!["solar", "wind", "hydro"],
            record.attributes().collect::<Vec<_>>()
        );
    }

    #[test]
    fn deserialise_year_anywhere() {
        let record: Record = serde_json::from_str(r#"{"solar": 1, "x": 2030}"#).unwrap();
        assert_eq!(2030, record.year());
        assert_eq!(Some(1.0), record.value("solar"));
    }

    #[test]
    fn deserialise_missing_year() {
        let err = serde_json::from_str::<Record>(r#"{"solar": 1}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `x`"), "{err}");
    }

    #[test]
    fn deserialise_zero_year() {
        let err = serde_json::from_str::<Record>(r#"{"x": 0}"#).unwrap_err();
        assert!(err.to_string().contains("a positive year"), "{err}");
    }

    #[test]
    fn deserialise_negative_year() {
        assert!(serde_json::from_str::<Record>(r#"{"x": -2023}"#).is_err());
    }

    #[test]
    fn deserialise_duplicate_attribute() {
        let err = serde_json::from_str::<Record>(r#"{"x": 2023, "solar": 1, "solar": 2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate attribute `solar`"), "{err}");
    }

    #[test]
    fn deserialise_non_numeric_value() {
        assert!(serde_json::from_str::<Record>(r#"{"x": 2023, "solar": "lots"}"#).is_err());
    }

    #[test]
    fn serialise_year_first() {
        let record = Record::new(2024)
            .with_value("wind", None)
            .with_value("solar", Some(12.0));
        assert_eq!(
            r#"{"x":2024,"wind":null,"solar":12.0}"#,
            serde_json::to_string(&record).unwrap()
        );
    }

    #[test]
    fn with_value_ignores_year_key() {
        let record = Record::new(2024)
            .with_value(YEAR_KEY, Some(1999.0))
            .with_value("solar", Some(1.0));
        assert!(!record.contains(YEAR_KEY));
        assert_eq!(
            r#"{"x":2024,"solar":1.0}"#,
            serde_json::to_string(&record).unwrap()
        );
    }

    #[test]
    fn project_drops_unselected_and_absent() {
        let record = Record::new(2024)
            .with_value("solar", Some(12.0))
            .with_value("wind", None)
            .with_value("hydro", Some(3.0));
        let selection = AttributeSelection::from_iter(["wind", "hydro", "nuclear"]);
        let projected = record.project(&selection);
        assert_eq!(Record::new(2024).with_value("hydro", Some(3.0)), projected);
        // The source record is untouched.
        assert_eq!(3, record.values().len());
    }
}
