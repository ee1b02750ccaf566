//! Convert plain records into [GeoJSON](https://geojson.org/) features.
//!
//! A declarative mapping names the fields of each record that hold its geometry. Every other
//! field becomes a feature property:
//!
//! ```
//! use geojson_records::{parse, Params, Records};
//! use serde_json::json;
//!
//! let records = json!([
//!     {"name": "Location A", "category": "Store", "lat": 39.984, "lng": -75.343},
//!     {"name": "Location B", "category": "House", "lat": 39.284, "lng": -75.833},
//! ]);
//! let params = Params::try_from(json!({"Point": ["lat", "lng"], "include": ["name"]})).unwrap();
//!
//! let output = parse(Records::try_from(&records).unwrap(), &params).unwrap();
//! let collection = output.as_feature_collection().unwrap();
//! assert_eq!(collection.len(), 2);
//! ```
//!
//! Coordinates given as separate latitude and longitude fields are swapped into GeoJSON's
//! `[longitude, latitude]` order and coerced to numbers.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub use collection::{parse, parse_with_callback, FeatureCollection, GeoJsonOutput, Parser};
pub use crs::Crs;
pub use datatypes::{GeometryKind, GeometryType};
pub use error::{GeoJsonRecordsError, InvalidGeometryError, Result};
pub use feature::{build_feature, Feature, FeatureGeometry};
pub use geometry::{Geometry, GeometryValidator};
pub use params::Params;
pub use record::{FieldPath, Record, Records};
pub use settings::Settings;

pub mod collection;
pub mod crs;
pub mod datatypes;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod io;
pub mod params;
pub mod properties;
pub mod record;
pub mod settings;
