use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::crs::Crs;
use crate::error::{InvalidGeometryError, Result};
use crate::geometry::{resolve, Geometry, Resolution};
use crate::properties::select_properties;
use crate::record::Record;
use crate::settings::Settings;

/// The `geometry` member of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// A geometry that passed validation.
    Geometry(Geometry),

    /// No entry of the mapping applied, or the geometry failed validation. Serialized as `null`.
    Null,

    /// A nested path of the mapping does not exist in the record. Serialized as `false`.
    Absent,
}

impl FeatureGeometry {
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            FeatureGeometry::Geometry(geometry) => Some(geometry),
            FeatureGeometry::Null | FeatureGeometry::Absent => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.as_geometry().is_some()
    }
}

impl Serialize for FeatureGeometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FeatureGeometry::Geometry(geometry) => geometry.serialize(serializer),
            FeatureGeometry::Null => serializer.serialize_none(),
            FeatureGeometry::Absent => serializer.serialize_bool(false),
        }
    }
}

/// A GeoJSON feature built from one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    geometry: FeatureGeometry,

    properties: Map<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    crs: Option<Crs>,

    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<Value>,
}

impl Feature {
    pub fn new(geometry: FeatureGeometry, properties: Map<String, Value>) -> Self {
        Self {
            geometry,
            properties,
            crs: None,
            bbox: None,
        }
    }

    pub fn geometry(&self) -> &FeatureGeometry {
        &self.geometry
    }

    pub(crate) fn geometry_mut(&mut self) -> &mut FeatureGeometry {
        &mut self.geometry
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn bbox(&self) -> Option<&Value> {
        self.bbox.as_ref()
    }

    pub(crate) fn set_crs(&mut self, crs: Crs) {
        self.crs = Some(crs);
    }

    pub(crate) fn set_bbox(&mut self, bbox: Value) {
        self.bbox = Some(bbox);
    }

    /// Split into the geometry and the properties.
    pub fn into_parts(self) -> (FeatureGeometry, Map<String, Value>) {
        (self.geometry, self.properties)
    }
}

/// Build the feature of one record, applying the failure policy of `settings`.
///
/// Returns `Ok(None)` when the feature is dropped by `removeInvalidGeometries`, and an
/// [`InvalidGeometryError`] when `doThrows.invalidGeometry` is set and the geometry is not
/// valid.
pub fn build_feature(record: &Record, settings: &Settings) -> Result<Option<Feature>> {
    let feature = assemble_feature(record, settings)?;
    if settings.failure().remove_invalid && !feature.geometry().is_valid() {
        log::trace!("Dropping record without a valid geometry");
        return Ok(None);
    }
    Ok(Some(feature))
}

/// As [`build_feature`], without dropping features.
pub(crate) fn assemble_feature(record: &Record, settings: &Settings) -> Result<Feature> {
    let failure = settings.failure();
    let geometry = match resolve(record, settings.geometry()) {
        Resolution::Resolved(geometry) if geometry.is_valid(failure.validator.as_ref()) => {
            FeatureGeometry::Geometry(geometry)
        }
        Resolution::Resolved(_) | Resolution::Unmatched => FeatureGeometry::Null,
        Resolution::Absent => FeatureGeometry::Absent,
    };

    if failure.throw_on_invalid && !geometry.is_valid() {
        return Err(Box::new(InvalidGeometryError::new(record.clone(), settings.clone())).into());
    }

    let properties = select_properties(record, settings.registry(), settings.properties());
    Ok(Feature::new(geometry, properties))
}
