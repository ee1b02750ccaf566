use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GeoJsonRecordsError, Result};
use crate::record::json_type_name;

/// A coordinate reference system descriptor attached to the output.
///
/// Serialized in the
/// [2008 GeoJSON form](https://geojson.org/geojson-spec.html#coordinate-reference-system-objects),
/// either a named CRS:
///
/// ```json
/// {"type": "name", "properties": {"name": "urn:ogc:def:crs:OGC:1.3:CRS84"}}
/// ```
///
/// or a linked CRS:
///
/// ```json
/// {"type": "link", "properties": {"href": "http://example.com/crs/42", "type": "proj4"}}
/// ```
///
/// The value is never interpreted, only validated for shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
pub enum Crs {
    Name {
        name: String,
    },
    Link {
        href: String,
        #[serde(rename = "type")]
        link_type: String,
    },
}

impl Crs {
    /// Construct a named CRS.
    pub fn from_name(name: impl Into<String>) -> Self {
        Crs::Name { name: name.into() }
    }

    /// Construct a linked CRS.
    pub fn from_link(href: impl Into<String>, link_type: impl Into<String>) -> Self {
        Crs::Link {
            href: href.into(),
            link_type: link_type.into(),
        }
    }

    fn validate(self) -> Result<Self> {
        match &self {
            Crs::Name { name } if name.is_empty() => Err(GeoJsonRecordsError::Crs(
                r#"Invalid CRS. Properties must contain "name" key"#.to_string(),
            )),
            Crs::Link { href, link_type } if href.is_empty() || link_type.is_empty() => {
                Err(GeoJsonRecordsError::Crs(
                    r#"Invalid CRS. Properties must contain "href" and "type" key"#.to_string(),
                ))
            }
            _ => Ok(self),
        }
    }
}

impl TryFrom<&Value> for Crs {
    type Error = GeoJsonRecordsError;

    /// Validate a user-supplied CRS. A bare string is taken as the name of a named CRS.
    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Crs::from_name(name.as_str()).validate(),
            Value::Object(object) => match object.get("type").and_then(Value::as_str) {
                Some("name") | Some("link") => {
                    let crs: Crs = serde_json::from_value(value.clone()).map_err(|err| {
                        GeoJsonRecordsError::Crs(format!("Invalid CRS {value}: {err}"))
                    })?;
                    crs.validate()
                }
                _ => Err(GeoJsonRecordsError::Crs(
                    r#"Invalid CRS. Type attribute must be "name" or "link""#.to_string(),
                )),
            },
            _ => Err(GeoJsonRecordsError::Crs(format!(
                "Invalid CRS. Expected a string or an object, found {}",
                json_type_name(value)
            ))),
        }
    }
}
