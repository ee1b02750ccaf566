use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeoJsonRecordsError;

/// The key under which a field holding an already-formed GeoJSON geometry is named.
pub const PASSTHROUGH_KEY: &str = "GeoJSON";

/// One of the six GeoJSON geometry types this crate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }
}

impl FromStr for GeometryType {
    type Err = GeoJsonRecordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let geometry_type = match s {
            "Point" => GeometryType::Point,
            "MultiPoint" => GeometryType::MultiPoint,
            "LineString" => GeometryType::LineString,
            "MultiLineString" => GeometryType::MultiLineString,
            "Polygon" => GeometryType::Polygon,
            "MultiPolygon" => GeometryType::MultiPolygon,
            _ => {
                return Err(GeoJsonRecordsError::Configuration(format!(
                    "Unknown geometry type: {s}"
                )))
            }
        };
        Ok(geometry_type)
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key of the geometry mapping.
///
/// Every [`GeometryType`] may be used directly, and [`GeometryKind::Passthrough`] names a field
/// that already holds a GeoJSON geometry object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Typed(GeometryType),
    Passthrough,
}

impl GeometryKind {
    /// Parse a mapping key, returning `None` for keys that are not geometry keys.
    pub fn from_key(key: &str) -> Option<Self> {
        if key == PASSTHROUGH_KEY {
            Some(GeometryKind::Passthrough)
        } else {
            key.parse().ok().map(GeometryKind::Typed)
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, GeometryKind::Passthrough)
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryKind::Typed(geometry_type) => write!(f, "{geometry_type}"),
            GeometryKind::Passthrough => f.write_str(PASSTHROUGH_KEY),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn geometry_keys() {
        assert_eq!(
            GeometryKind::from_key("Polygon"),
            Some(GeometryKind::Typed(GeometryType::Polygon))
        );
        assert_eq!(
            GeometryKind::from_key("GeoJSON"),
            Some(GeometryKind::Passthrough)
        );
        assert_eq!(GeometryKind::from_key("include"), None);
        assert_eq!(GeometryKind::from_key("point"), None);
    }

    #[test]
    fn serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&GeometryType::MultiLineString).unwrap(),
            r#""MultiLineString""#
        );
        assert!("GeometryCollection".parse::<GeometryType>().is_err());
    }
}
