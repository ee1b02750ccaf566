//! Interoperability with other GeoJSON implementations.

pub mod geojson;
