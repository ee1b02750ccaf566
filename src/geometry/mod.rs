//! Geometry objects produced for each record and the rules that resolve them.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::crs::Crs;
use crate::datatypes::GeometryType;

pub use resolver::{resolve, Resolution};

mod resolver;

/// A caller-supplied predicate that every emitted geometry must also satisfy.
pub type GeometryValidator = Arc<dyn Fn(&Geometry) -> bool + Send + Sync>;

/// A GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    geometry_type: GeometryType,

    coordinates: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    crs: Option<Crs>,

    /// Members of a passthrough geometry other than `type` and `coordinates`, kept verbatim.
    #[serde(flatten)]
    foreign_members: Map<String, Value>,
}

impl Geometry {
    pub fn new(geometry_type: GeometryType, coordinates: Value) -> Self {
        Self {
            geometry_type,
            coordinates,
            crs: None,
            foreign_members: Map::new(),
        }
    }

    pub(crate) fn with_foreign_members(self, foreign_members: Map<String, Value>) -> Self {
        Self {
            foreign_members,
            ..self
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn coordinates(&self) -> &Value {
        &self.coordinates
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub(crate) fn set_crs(&mut self, crs: Crs) {
        self.foreign_members.shift_remove("crs");
        self.crs = Some(crs);
    }

    pub fn foreign_members(&self) -> &Map<String, Value> {
        &self.foreign_members
    }

    /// The structural check: `coordinates` must be a non-empty array without null positions.
    pub fn is_structurally_valid(&self) -> bool {
        match &self.coordinates {
            Value::Array(coords) => !coords.is_empty() && coords.iter().all(has_no_null),
            _ => false,
        }
    }

    /// The structural check combined with an optional caller-supplied validator.
    pub fn is_valid(&self, validator: Option<&GeometryValidator>) -> bool {
        self.is_structurally_valid() && validator.map_or(true, |validator| validator(self))
    }
}

fn has_no_null(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(values) => values.iter().all(has_no_null),
        _ => true,
    }
}
