//! The effective, normalized configuration of one parse call.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::crs::Crs;
use crate::datatypes::GeometryKind;
use crate::error::{GeoJsonRecordsError, Result};
use crate::geometry::GeometryValidator;
use crate::params::Params;

pub use spec::{GeometryFieldRegistry, GeometrySpec, GeometrySpecEntry, PairRef};

pub(crate) mod spec;

/// Options controlling which record fields become feature properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyOptions {
    /// Copy exactly these fields. Takes precedence over `exclude` and over the geometry
    /// field registry.
    pub include: Option<Vec<String>>,

    /// Leave these fields out of the default copy.
    pub exclude: Option<Vec<String>>,

    /// Merged into every feature's properties, overwriting same-named fields.
    pub extra: Option<Map<String, Value>>,
}

impl PropertyOptions {
    pub fn with_include(self, include: Vec<String>) -> Self {
        Self {
            include: Some(include),
            ..self
        }
    }

    pub fn with_exclude(self, exclude: Vec<String>) -> Self {
        Self {
            exclude: Some(exclude),
            ..self
        }
    }

    pub fn with_extra(self, extra: Map<String, Value>) -> Self {
        Self {
            extra: Some(extra),
            ..self
        }
    }
}

/// Members copied onto the top-level output object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeOptions {
    pub crs: Option<Crs>,

    /// Copied verbatim.
    pub bbox: Option<Value>,

    /// Attached as the `properties` member of a `FeatureCollection`.
    pub extra_global: Option<Map<String, Value>>,

    /// Attach the CRS to the geometry of a single `Feature` output instead of the top level.
    pub is_postgres: bool,
}

/// `doThrows` option object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DoThrows {
    pub invalid_geometry: bool,
}

/// What happens to a record whose geometry is absent or fails validation.
#[derive(Clone, Default)]
pub struct FailurePolicy {
    /// Drop such features from the output.
    pub remove_invalid: bool,

    /// Abort the call with [`GeoJsonRecordsError::InvalidGeometry`].
    pub throw_on_invalid: bool,

    /// Composes with the structural validity check.
    pub validator: Option<GeometryValidator>,
}

impl Debug for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailurePolicy")
            .field("remove_invalid", &self.remove_invalid)
            .field("throw_on_invalid", &self.throw_on_invalid)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Settings derived once per call from the params merged over the defaults.
///
/// The caller's params are never modified; the geometry field registry lives in
/// [`GeometrySpec`] and therefore only as long as these settings.
#[derive(Debug, Clone)]
pub struct Settings {
    geometry: GeometrySpec,
    properties: PropertyOptions,
    envelope: EnvelopeOptions,
    failure: FailurePolicy,
}

impl Settings {
    pub fn geometry(&self) -> &GeometrySpec {
        &self.geometry
    }

    pub fn registry(&self) -> &GeometryFieldRegistry {
        self.geometry.registry()
    }

    pub fn properties(&self) -> &PropertyOptions {
        &self.properties
    }

    pub fn envelope(&self) -> &EnvelopeOptions {
        &self.envelope
    }

    pub fn failure(&self) -> &FailurePolicy {
        &self.failure
    }
}

impl TryFrom<&Params> for Settings {
    type Error = GeoJsonRecordsError;

    fn try_from(params: &Params) -> Result<Self> {
        let geometry = GeometrySpec::try_from_options(params.options())?;

        let mut properties = PropertyOptions::default();
        let mut envelope = EnvelopeOptions::default();
        let mut failure = FailurePolicy {
            validator: params.geometry_validator().cloned(),
            ..Default::default()
        };

        for (key, value) in params.options().iter() {
            if value.is_null() || GeometryKind::from_key(key).is_some() {
                continue;
            }
            match key.as_str() {
                "include" => properties.include = Some(from_option(key, value)?),
                "exclude" => properties.exclude = Some(from_option(key, value)?),
                "extra" => properties.extra = Some(from_option(key, value)?),
                "extraGlobal" => envelope.extra_global = Some(from_option(key, value)?),
                "crs" => envelope.crs = Some(Crs::try_from(value)?),
                "bbox" => {
                    let bbox: Vec<Value> = from_option(key, value)?;
                    envelope.bbox = Some(Value::Array(bbox));
                }
                "isPostgres" => envelope.is_postgres = from_option(key, value)?,
                "removeInvalidGeometries" => failure.remove_invalid = from_option(key, value)?,
                "doThrows" => {
                    let do_throws: DoThrows = from_option(key, value)?;
                    failure.throw_on_invalid = do_throws.invalid_geometry;
                }
                _ => log::debug!("Ignoring unknown option {key:?}"),
            }
        }

        Ok(Self {
            geometry,
            properties,
            envelope,
            failure,
        })
    }
}

fn from_option<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|err| {
        GeoJsonRecordsError::Configuration(format!("Invalid value for option {key:?}: {err}"))
    })
}
