//! Normalization of the geometry part of the mapping.

use indexmap::IndexSet;
use itertools::Itertools;
use serde_json::{Map, Value};

use crate::datatypes::GeometryKind;
use crate::error::{GeoJsonRecordsError, Result};
use crate::record::{json_type_name, FieldPath};

/// The field that [`GeometrySpecEntry::NestedCoordinatePairRef`] reads.
pub const COORDINATES_FIELD: &str = "coordinates";

/// Latitude, longitude and optional altitude fields of a point.
///
/// Input order is always `[lat, lng]` or `[lat, lng, alt]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRef {
    lat: FieldPath,
    lng: FieldPath,
    alt: Option<FieldPath>,
}

impl PairRef {
    pub fn new(lat: FieldPath, lng: FieldPath, alt: Option<FieldPath>) -> Self {
        Self { lat, lng, alt }
    }

    fn try_from_values(kind: GeometryKind, values: &[Value]) -> Result<Self> {
        let paths: Vec<FieldPath> = values
            .iter()
            .map(|value| match value {
                Value::String(path) => FieldPath::parse(path),
                other => Err(GeoJsonRecordsError::Configuration(format!(
                    "{kind}: coordinate field names must be strings, found {}",
                    json_type_name(other)
                ))),
            })
            .collect::<Result<_>>()?;

        match <[FieldPath; 2]>::try_from(paths) {
            Ok([lat, lng]) => Ok(Self::new(lat, lng, None)),
            Err(paths) => match <[FieldPath; 3]>::try_from(paths) {
                Ok([lat, lng, alt]) => Ok(Self::new(lat, lng, Some(alt))),
                Err(paths) => Err(GeoJsonRecordsError::Configuration(format!(
                    "{kind}: expected 2 or 3 coordinate fields, found {}",
                    paths.len()
                ))),
            },
        }
    }

    pub fn lat(&self) -> &FieldPath {
        &self.lat
    }

    pub fn lng(&self) -> &FieldPath {
        &self.lng
    }

    pub fn alt(&self) -> Option<&FieldPath> {
        self.alt.as_ref()
    }

    /// All referenced fields, in input order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldPath> {
        [&self.lat, &self.lng].into_iter().chain(self.alt.as_ref())
    }

    /// `true` if any of the fields goes through a nested object.
    pub fn is_nested(&self) -> bool {
        self.fields().any(FieldPath::is_nested)
    }
}

/// How one geometry key of the mapping locates its coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySpecEntry {
    /// `"coords"`: one field holding the whole coordinate structure.
    FieldRef(String),

    /// `"location.coords"`: as [`GeometrySpecEntry::FieldRef`] through nested objects.
    DottedFieldRef(FieldPath),

    /// `["lat", "lng"]` or `["lat", "lng", "alt"]`, each possibly dotted.
    PairRef(PairRef),

    /// `{"northeast": ["lat", "lng"], "southwest": ["lat", "lng"]}`: one point per nested
    /// object, concatenated in key order.
    CompositeRef(Vec<(String, PairRef)>),

    /// `[{"coordinates": ["lng", "lat"]}]`: the record's `coordinates` array, with the position
    /// of each label naming the index of that component.
    NestedCoordinatePairRef { lat_index: usize, lng_index: usize },
}

impl GeometrySpecEntry {
    fn try_from_value(kind: GeometryKind, value: &Value) -> Result<Self> {
        let entry = match value {
            Value::String(name) => {
                let path = FieldPath::parse(name)?;
                if path.is_nested() {
                    GeometrySpecEntry::DottedFieldRef(path)
                } else {
                    GeometrySpecEntry::FieldRef(name.clone())
                }
            }
            Value::Array(values) if kind.is_passthrough() => {
                return Err(GeoJsonRecordsError::Configuration(format!(
                    "{kind}: expected the name of a field, found an array of {} values",
                    values.len()
                )))
            }
            Value::Array(values) => match values.as_slice() {
                [Value::Object(element)] => Self::nested_coordinate_pair(kind, element)?,
                values => GeometrySpecEntry::PairRef(PairRef::try_from_values(kind, values)?),
            },
            Value::Object(_) if kind.is_passthrough() => {
                return Err(GeoJsonRecordsError::Configuration(format!(
                    "{kind}: expected the name of a field, found an object"
                )))
            }
            Value::Object(sub_points) => {
                if sub_points.is_empty() {
                    return Err(GeoJsonRecordsError::Configuration(format!(
                        "{kind}: composite mapping must name at least one field"
                    )));
                }
                let sub_points = sub_points
                    .iter()
                    .map(|(sub_key, pair)| match pair {
                        Value::Array(values) => {
                            Ok((sub_key.clone(), PairRef::try_from_values(kind, values)?))
                        }
                        other => Err(GeoJsonRecordsError::Configuration(format!(
                            "{kind}: composite entry {sub_key:?} must be an array of field names, found {}",
                            json_type_name(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                GeometrySpecEntry::CompositeRef(sub_points)
            }
            other => {
                return Err(GeoJsonRecordsError::Configuration(format!(
                    "{kind}: unsupported geometry attribute of type {}",
                    json_type_name(other)
                )))
            }
        };
        Ok(entry)
    }

    fn nested_coordinate_pair(kind: GeometryKind, element: &Map<String, Value>) -> Result<Self> {
        let labels = match element.get(COORDINATES_FIELD) {
            Some(Value::Array(labels)) if element.len() == 1 => labels,
            _ => {
                return Err(GeoJsonRecordsError::Configuration(format!(
                    r#"{kind}: expected [{{"coordinates": [...]}}], found keys [{}]"#,
                    element.keys().join(", ")
                )))
            }
        };
        let position = |label: &str| {
            labels
                .iter()
                .position(|value| value.as_str() == Some(label))
                .ok_or_else(|| {
                    GeoJsonRecordsError::Configuration(format!(
                        "{kind}: coordinates labels must contain {label:?}"
                    ))
                })
        };
        Ok(GeometrySpecEntry::NestedCoordinatePairRef {
            lat_index: position("lat")?,
            lng_index: position("lng")?,
        })
    }

    /// Top-level record fields consumed by this entry.
    fn referenced_fields(&self) -> Vec<&str> {
        match self {
            GeometrySpecEntry::FieldRef(name) => vec![name.as_str()],
            GeometrySpecEntry::DottedFieldRef(path) => vec![path.root()],
            GeometrySpecEntry::PairRef(pair) => pair.fields().map(FieldPath::root).collect(),
            GeometrySpecEntry::CompositeRef(sub_points) => {
                sub_points.iter().map(|(key, _)| key.as_str()).collect()
            }
            GeometrySpecEntry::NestedCoordinatePairRef { .. } => vec![COORDINATES_FIELD],
        }
    }
}

/// The top-level field names consumed by the geometry mapping.
///
/// These fields are left out of the default feature properties. Built anew for every parse
/// call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryFieldRegistry(IndexSet<String>);

impl GeometryFieldRegistry {
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of distinct top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn register(&mut self, field: &str) {
        if !self.0.contains(field) {
            self.0.insert(field.to_string());
        }
    }
}

/// The normalized geometry mapping: entries in the caller's insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometrySpec {
    entries: Vec<(GeometryKind, GeometrySpecEntry)>,
    registry: GeometryFieldRegistry,
}

impl GeometrySpec {
    /// Pick the geometry keys out of an option mapping.
    ///
    /// Fails if no geometry key is set or an entry has an unsupported shape.
    pub fn try_from_options(options: &Map<String, Value>) -> Result<Self> {
        let mut entries = vec![];
        let mut registry = GeometryFieldRegistry::default();

        for (key, value) in options.iter() {
            let Some(kind) = GeometryKind::from_key(key) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let entry = GeometrySpecEntry::try_from_value(kind, value)?;
            entry
                .referenced_fields()
                .into_iter()
                .for_each(|field| registry.register(field));
            entries.push((kind, entry));
        }

        if entries.is_empty() {
            return Err(GeoJsonRecordsError::Configuration(
                "No geometry attributes specified".to_string(),
            ));
        }

        log::debug!(
            "Normalized geometry mapping [{}] consuming fields [{}]",
            entries.iter().map(|(kind, _)| kind).join(", "),
            registry.iter().join(", ")
        );

        Ok(Self { entries, registry })
    }

    pub fn entries(&self) -> &[(GeometryKind, GeometrySpecEntry)] {
        &self.entries
    }

    pub fn registry(&self) -> &GeometryFieldRegistry {
        &self.registry
    }
}
