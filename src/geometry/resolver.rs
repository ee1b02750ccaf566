use serde_json::{Map, Value};

use crate::datatypes::{GeometryKind, GeometryType};
use crate::geometry::Geometry;
use crate::record::{coerce_number, Record};
use crate::settings::spec::COORDINATES_FIELD;
use crate::settings::{GeometrySpec, GeometrySpecEntry, PairRef};

/// The geometry found for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// An entry of the mapping applied to the record. The geometry has not been validated yet.
    Resolved(Geometry),

    /// No entry of the mapping applied to the record.
    Unmatched,

    /// A nested path of the mapping does not exist in the record.
    Absent,
}

/// Locate the geometry of `record`.
///
/// Entries are tried in mapping order and the first one that applies wins. A nested path that
/// can not be followed ends the search with [`Resolution::Absent`].
pub fn resolve(record: &Record, spec: &GeometrySpec) -> Resolution {
    for (kind, entry) in spec.entries() {
        let resolution = match kind {
            GeometryKind::Passthrough => resolve_passthrough(record, entry),
            GeometryKind::Typed(geometry_type) => resolve_typed(record, *geometry_type, entry),
        };
        if let Some(resolution) = resolution {
            return resolution;
        }
    }
    Resolution::Unmatched
}

/// The lookup of a single point; `NotApplicable` lets the next entry be tried.
enum PointLookup {
    Found(Value),
    NotApplicable,
    Absent,
}

fn resolve_passthrough(record: &Record, entry: &GeometrySpecEntry) -> Option<Resolution> {
    match entry {
        GeometrySpecEntry::FieldRef(name) => record.get(name).and_then(passthrough_geometry),
        GeometrySpecEntry::DottedFieldRef(path) => match path.lookup(record) {
            Some(value) => passthrough_geometry(value),
            None => Some(Resolution::Absent),
        },
        // Rejected during normalization.
        GeometrySpecEntry::PairRef(_)
        | GeometrySpecEntry::CompositeRef(_)
        | GeometrySpecEntry::NestedCoordinatePairRef { .. } => None,
    }
}

fn passthrough_geometry(value: &Value) -> Option<Resolution> {
    let object = value.as_object()?;
    let geometry_type: GeometryType = object.get("type")?.as_str()?.parse().ok()?;
    let coordinates = object.get(COORDINATES_FIELD)?.clone();
    let foreign_members: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "type" | COORDINATES_FIELD))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Some(Resolution::Resolved(
        Geometry::new(geometry_type, coordinates).with_foreign_members(foreign_members),
    ))
}

fn resolve_typed(
    record: &Record,
    geometry_type: GeometryType,
    entry: &GeometrySpecEntry,
) -> Option<Resolution> {
    let resolved = |coordinates: Value| {
        Some(Resolution::Resolved(Geometry::new(
            geometry_type,
            coordinates,
        )))
    };

    match entry {
        GeometrySpecEntry::FieldRef(name) => resolved(record.get(name)?.clone()),
        GeometrySpecEntry::DottedFieldRef(path) => match path.lookup(record) {
            Some(value) => resolved(value.clone()),
            None => {
                log::trace!("No value at {path} for {geometry_type}");
                Some(Resolution::Absent)
            }
        },
        GeometrySpecEntry::PairRef(pair) => match point_coordinates(record, pair) {
            PointLookup::Found(coordinates) => resolved(coordinates),
            PointLookup::NotApplicable => None,
            PointLookup::Absent => Some(Resolution::Absent),
        },
        GeometrySpecEntry::CompositeRef(sub_points) => {
            let mut coordinates = Vec::with_capacity(sub_points.len());
            for (sub_key, pair) in sub_points {
                let sub_record = record.get(sub_key)?.as_object()?;
                match point_coordinates(sub_record, pair) {
                    PointLookup::Found(point) => coordinates.push(point),
                    PointLookup::NotApplicable => return None,
                    PointLookup::Absent => return Some(Resolution::Absent),
                }
            }
            resolved(Value::Array(coordinates))
        }
        GeometrySpecEntry::NestedCoordinatePairRef {
            lat_index,
            lng_index,
        } => {
            let coords = record.get(COORDINATES_FIELD)?.as_array()?;
            let lat = coords.get(*lat_index)?;
            let lng = coords.get(*lng_index)?;
            resolved(Value::Array(vec![coordinate(lng), coordinate(lat)]))
        }
    }
}

/// Read `[lat, lng, alt?]` and emit `[lng, lat, alt?]` as numbers.
fn point_coordinates(record: &Record, pair: &PairRef) -> PointLookup {
    let lat = pair.lat().lookup(record);
    let lng = pair.lng().lookup(record);
    let alt = pair.alt().map(|alt| alt.lookup(record));
    match (lat, lng, alt) {
        (Some(lat), Some(lng), None) => {
            PointLookup::Found(Value::Array(vec![coordinate(lng), coordinate(lat)]))
        }
        (Some(lat), Some(lng), Some(Some(alt))) => PointLookup::Found(Value::Array(vec![
            coordinate(lng),
            coordinate(lat),
            coordinate(alt),
        ])),
        _ if pair.is_nested() => PointLookup::Absent,
        _ => PointLookup::NotApplicable,
    }
}

/// A coerced coordinate; non-finite numbers become `null`.
fn coordinate(value: &Value) -> Value {
    Value::from(coerce_number(value))
}
