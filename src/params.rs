//! User-supplied parameters and caller-owned defaults.

use std::fmt::Debug;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{GeoJsonRecordsError, Result};
use crate::geometry::{Geometry, GeometryValidator};
use crate::record::json_type_name;

/// The raw mapping passed to a parse call.
///
/// Keys follow the option names of the mapping (`Point`, `include`, `crs`, `doThrows`, ...).
/// A custom geometry validator, which has no JSON form, is attached with
/// [`Params::with_geometry_validator`].
///
/// ```
/// use geojson_records::Params;
/// use serde_json::json;
///
/// let params = Params::try_from(json!({"Point": ["lat", "lng"], "exclude": ["id"]})).unwrap();
/// assert!(params.get("Point").is_some());
/// ```
#[derive(Clone, Default)]
pub struct Params {
    options: Map<String, Value>,
    geometry_validator: Option<GeometryValidator>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one option, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.options.insert(key.into(), value.into())
    }

    /// Unset `key`, keeping the order of the remaining options.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.options.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Options in insertion order.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Attach a predicate every geometry must satisfy in addition to the structural check.
    pub fn with_geometry_validator<F>(self, validator: F) -> Self
    where
        F: Fn(&Geometry) -> bool + Send + Sync + 'static,
    {
        Self {
            geometry_validator: Some(Arc::new(validator)),
            ..self
        }
    }

    pub fn geometry_validator(&self) -> Option<&GeometryValidator> {
        self.geometry_validator.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.geometry_validator.is_none()
    }

    /// Shallow-merge these params over `defaults`.
    ///
    /// Keys set (and not null) here win. Keys only present in `defaults` are appended after the
    /// keys of `self`, so the insertion order of the params decides between geometry keys before
    /// any defaulted ones. Neither side is modified.
    pub fn merged_over(&self, defaults: &Params) -> Params {
        let mut options = self.options.clone();
        for (key, value) in defaults.options.iter() {
            let unset = options.get(key).map_or(true, Value::is_null);
            if unset {
                options.insert(key.clone(), value.clone());
            }
        }
        Params {
            options,
            geometry_validator: self
                .geometry_validator
                .clone()
                .or_else(|| defaults.geometry_validator.clone()),
        }
    }
}

impl Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Params")
            .field("options", &self.options)
            .field("geometry_validator", &self.geometry_validator.is_some())
            .finish()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(options: Map<String, Value>) -> Self {
        Self {
            options,
            geometry_validator: None,
        }
    }
}

impl TryFrom<Value> for Params {
    type Error = GeoJsonRecordsError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(options) => Ok(options.into()),
            Value::Null => Ok(Params::default()),
            other => Err(GeoJsonRecordsError::Configuration(format!(
                "params must be an object, found {}",
                json_type_name(&other)
            ))),
        }
    }
}
