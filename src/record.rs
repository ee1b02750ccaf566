//! Access to caller-owned input records.

use std::fmt::Display;

use itertools::Itertools;
use serde_json::{Map, Value};

use crate::error::{GeoJsonRecordsError, Result};

/// A single record: a JSON object mapping field names to values.
pub type Record = Map<String, Value>;

/// The input of a parse call.
///
/// A list produces a `FeatureCollection`; a single record produces a bare `Feature`.
#[derive(Debug, Clone)]
pub enum Records<'a> {
    Single(&'a Record),
    List(Vec<&'a Record>),
}

impl<'a> Records<'a> {
    pub fn len(&self) -> usize {
        match self {
            Records::Single(_) => 1,
            Records::List(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a Record> for Records<'a> {
    fn from(value: &'a Record) -> Self {
        Records::Single(value)
    }
}

impl<'a> From<&'a [Record]> for Records<'a> {
    fn from(value: &'a [Record]) -> Self {
        Records::List(value.iter().collect())
    }
}

impl<'a> From<&'a Vec<Record>> for Records<'a> {
    fn from(value: &'a Vec<Record>) -> Self {
        value.as_slice().into()
    }
}

impl<'a> TryFrom<&'a Value> for Records<'a> {
    type Error = GeoJsonRecordsError;

    fn try_from(value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(record) => Ok(Records::Single(record)),
            Value::Array(values) => values
                .iter()
                .enumerate()
                .map(|(idx, value)| {
                    value.as_object().ok_or_else(|| {
                        GeoJsonRecordsError::Configuration(format!(
                            "records must be an object or an array of objects, found {} at index {idx}",
                            json_type_name(value)
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Records::List),
            _ => Err(GeoJsonRecordsError::Configuration(format!(
                "records must be an object or an array of objects, found {}",
                json_type_name(value)
            ))),
        }
    }
}

/// A reference to one field of a record, possibly through nested objects (`"location.lat"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self> {
        let segments = path.split('.').map(String::from).collect_vec();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(GeoJsonRecordsError::Configuration(format!(
                "Invalid field reference {path:?}: empty path segment"
            )));
        }
        Ok(Self { segments })
    }

    /// The top-level field of the record this path starts at.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Walk the path through nested objects.
    ///
    /// Returns `None` when a segment is missing, or when an intermediate value is null or not
    /// an object.
    pub fn lookup<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = record;
        for segment in parents {
            current = current.get(segment)?.as_object()?;
        }
        current.get(last)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.iter().join("."))
    }
}

/// Coerce a field value to a coordinate number.
///
/// Strings are trimmed and parsed (the empty string is zero), booleans map to one and zero
/// and null maps to zero. Anything else is NaN.
pub(crate) fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
