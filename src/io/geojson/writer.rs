use geojson::JsonObject;
use serde_json::Value;

use crate::collection::{FeatureCollection, GeoJsonOutput};
use crate::error::Result;
use crate::feature::{Feature, FeatureGeometry};
use crate::geometry::Geometry;

impl Geometry {
    /// Convert to a [`geojson::Geometry`].
    ///
    /// Fails if the coordinates do not have the nesting the geometry type requires.
    pub fn to_geojson(&self) -> Result<geojson::Geometry> {
        let value = serde_json::to_value(self)?;
        Ok(geojson::Geometry::try_from(value)?)
    }
}

impl Feature {
    /// Convert to a [`geojson::Feature`].
    pub fn to_geojson(&self) -> Result<geojson::Feature> {
        let geometry = match self.geometry() {
            FeatureGeometry::Geometry(geometry) => Some(geometry.to_geojson()?),
            FeatureGeometry::Null | FeatureGeometry::Absent => None,
        };

        let mut foreign_members = JsonObject::new();
        if let Some(crs) = self.crs() {
            foreign_members.insert("crs".to_string(), serde_json::to_value(crs)?);
        }

        Ok(geojson::Feature {
            bbox: bbox(self.bbox())?,
            geometry,
            id: None,
            properties: Some(self.properties().clone()),
            foreign_members: non_empty(foreign_members),
        })
    }
}

impl FeatureCollection {
    /// Convert to a [`geojson::FeatureCollection`].
    pub fn to_geojson(&self) -> Result<geojson::FeatureCollection> {
        let features = self
            .features()
            .iter()
            .map(Feature::to_geojson)
            .collect::<Result<Vec<_>>>()?;

        let mut foreign_members = JsonObject::new();
        if let Some(crs) = self.crs() {
            foreign_members.insert("crs".to_string(), serde_json::to_value(crs)?);
        }
        if let Some(properties) = self.properties() {
            foreign_members.insert(
                "properties".to_string(),
                Value::Object(properties.clone()),
            );
        }

        Ok(geojson::FeatureCollection {
            bbox: bbox(self.bbox())?,
            features,
            foreign_members: non_empty(foreign_members),
        })
    }
}

impl GeoJsonOutput {
    /// Convert to a [`geojson::GeoJson`].
    pub fn to_geojson(&self) -> Result<geojson::GeoJson> {
        let geojson = match self {
            GeoJsonOutput::Feature(feature) => geojson::GeoJson::Feature(feature.to_geojson()?),
            GeoJsonOutput::FeatureCollection(collection) => {
                geojson::GeoJson::FeatureCollection(collection.to_geojson()?)
            }
        };
        Ok(geojson)
    }
}

fn bbox(value: Option<&Value>) -> Result<Option<geojson::Bbox>> {
    value
        .map(|value| serde_json::from_value(value.clone()))
        .transpose()
        .map_err(Into::into)
}

fn non_empty(object: JsonObject) -> Option<JsonObject> {
    (!object.is_empty()).then_some(object)
}
