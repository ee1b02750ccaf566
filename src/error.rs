//! Defines [`GeoJsonRecordsError`], representing all errors returned by this crate.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::settings::Settings;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GeoJsonRecordsError {
    /// The parameters or the input records could not be understood.
    ///
    /// Always raised before any record is processed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// CRS related error
    #[error("CRS related error: {0}")]
    Crs(String),

    /// A record produced an invalid geometry while `doThrows.invalidGeometry` was set.
    #[error(transparent)]
    InvalidGeometry(#[from] Box<InvalidGeometryError>),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    /// [geojson::Error]
    #[error(transparent)]
    GeoJsonError(#[from] geojson::Error),
}

impl GeoJsonRecordsError {
    /// Returns `true` for errors raised while normalizing parameters, before any record was
    /// processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GeoJsonRecordsError::Configuration(_) | GeoJsonRecordsError::Crs(_)
        )
    }
}

/// The record whose geometry failed validation, together with the settings in effect.
#[derive(Error, Debug, Clone)]
#[error("Invalid geometry for record: {record:?}")]
pub struct InvalidGeometryError {
    record: Map<String, Value>,
    settings: Settings,
}

impl InvalidGeometryError {
    pub(crate) fn new(record: Map<String, Value>, settings: Settings) -> Self {
        Self { record, settings }
    }

    /// The offending record.
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Snapshot of the settings used for the aborted call.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, GeoJsonRecordsError>;
