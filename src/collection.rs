//! Entry points: turn records into a `FeatureCollection` or a single `Feature`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::crs::Crs;
use crate::error::Result;
use crate::feature::{assemble_feature, build_feature, Feature, FeatureGeometry};
use crate::params::Params;
use crate::record::Records;
use crate::settings::{EnvelopeOptions, Settings};

/// A GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    features: Vec<Feature>,

    #[serde(skip_serializing_if = "Option::is_none")]
    crs: Option<Crs>,

    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<Value>,

    /// Collection-level properties from `extraGlobal`.
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<Map<String, Value>>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            ..Default::default()
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The features, without the collection envelope.
    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn bbox(&self) -> Option<&Value> {
        self.bbox.as_ref()
    }

    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.properties.as_ref()
    }

    fn apply_envelope(&mut self, envelope: &EnvelopeOptions) {
        self.crs = envelope.crs.clone();
        self.bbox = envelope.bbox.clone();
        self.properties = envelope.extra_global.clone();
    }
}

/// The result of a parse call: a collection for a list of records, a feature for a single one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeoJsonOutput {
    Feature(Feature),
    FeatureCollection(FeatureCollection),
}

impl GeoJsonOutput {
    pub fn as_feature(&self) -> Option<&Feature> {
        match self {
            GeoJsonOutput::Feature(feature) => Some(feature),
            GeoJsonOutput::FeatureCollection(_) => None,
        }
    }

    pub fn as_feature_collection(&self) -> Option<&FeatureCollection> {
        match self {
            GeoJsonOutput::Feature(_) => None,
            GeoJsonOutput::FeatureCollection(collection) => Some(collection),
        }
    }
}

impl From<Feature> for GeoJsonOutput {
    fn from(value: Feature) -> Self {
        GeoJsonOutput::Feature(value)
    }
}

impl From<FeatureCollection> for GeoJsonOutput {
    fn from(value: FeatureCollection) -> Self {
        GeoJsonOutput::FeatureCollection(value)
    }
}

/// Converts records with caller-owned default params.
///
/// The defaults are merged under the params of every call and are only changed through
/// [`Parser::set_defaults`], [`Parser::defaults_mut`] and [`Parser::reset_defaults`].
///
/// ```
/// use geojson_records::{Params, Parser, Records};
/// use serde_json::json;
///
/// let mut parser = Parser::new();
/// parser.set_defaults(Params::try_from(json!({"Point": ["lat", "lng"]})).unwrap());
///
/// let records = json!([{"name": "A", "lat": 39.984, "lng": -75.343}]);
/// let output = parser
///     .parse(Records::try_from(&records).unwrap(), &Params::new())
///     .unwrap();
/// let collection = output.as_feature_collection().unwrap();
/// assert_eq!(collection.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    defaults: Params,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: Params) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut Params {
        &mut self.defaults
    }

    pub fn set_defaults(&mut self, defaults: Params) {
        self.defaults = defaults;
    }

    pub fn reset_defaults(&mut self) {
        self.defaults = Params::default();
    }

    /// Normalize `params` merged over the defaults.
    pub fn settings(&self, params: &Params) -> Result<Settings> {
        Settings::try_from(&params.merged_over(&self.defaults))
    }

    /// Convert `records`.
    ///
    /// All configuration errors are raised before the first record is looked at. With
    /// `doThrows.invalidGeometry` the first record without a valid geometry aborts the call.
    pub fn parse<'a>(
        &self,
        records: impl Into<Records<'a>>,
        params: &Params,
    ) -> Result<GeoJsonOutput> {
        let records = records.into();
        let settings = self.settings(params)?;
        log::debug!("Parsing {} record(s)", records.len());

        let output = match records {
            Records::List(records) => {
                let mut features = Vec::with_capacity(records.len());
                for record in records {
                    if let Some(feature) = build_feature(record, &settings)? {
                        features.push(feature);
                    }
                }
                let mut collection = FeatureCollection::new(features);
                collection.apply_envelope(settings.envelope());
                log::debug!("Built {} feature(s)", collection.len());
                GeoJsonOutput::FeatureCollection(collection)
            }
            Records::Single(record) => {
                // A lone feature is never dropped; an invalid geometry is already null.
                let feature = assemble_feature(record, &settings)?;
                GeoJsonOutput::Feature(single_feature_envelope(feature, settings.envelope()))
            }
        };
        Ok(output)
    }

    /// Convert `records` and hand the result to `callback` before returning.
    ///
    /// The callback is not called when the conversion fails.
    pub fn parse_with_callback<'a, F>(
        &self,
        records: impl Into<Records<'a>>,
        params: &Params,
        callback: F,
    ) -> Result<()>
    where
        F: FnOnce(GeoJsonOutput),
    {
        callback(self.parse(records, params)?);
        Ok(())
    }
}

fn single_feature_envelope(mut feature: Feature, envelope: &EnvelopeOptions) -> Feature {
    if let Some(crs) = &envelope.crs {
        if envelope.is_postgres {
            match feature.geometry_mut() {
                FeatureGeometry::Geometry(geometry) => geometry.set_crs(crs.clone()),
                FeatureGeometry::Null | FeatureGeometry::Absent => {
                    log::warn!("Feature has no valid geometry to attach the CRS to; dropping it")
                }
            }
        } else {
            feature.set_crs(crs.clone());
        }
    }
    if let Some(bbox) = &envelope.bbox {
        feature.set_bbox(bbox.clone());
    }
    if envelope.extra_global.is_some() {
        log::debug!("Ignoring extraGlobal for a single feature output");
    }
    feature
}

/// Convert `records` with no defaults.
///
/// ```
/// use geojson_records::{parse, Params, Records};
/// use serde_json::json;
///
/// let records = json!([
///     {"name": "Location A", "lat": 39.984, "lng": -75.343},
///     {"name": "Location B", "lat": 39.284, "lng": -75.833},
/// ]);
/// let params = Params::try_from(json!({"Point": ["lat", "lng"]})).unwrap();
/// let output = parse(Records::try_from(&records).unwrap(), &params).unwrap();
///
/// assert_eq!(
///     serde_json::to_value(&output).unwrap()["features"][0],
///     json!({
///         "type": "Feature",
///         "geometry": {"type": "Point", "coordinates": [-75.343, 39.984]},
///         "properties": {"name": "Location A"}
///     })
/// );
/// ```
pub fn parse<'a>(records: impl Into<Records<'a>>, params: &Params) -> Result<GeoJsonOutput> {
    Parser::new().parse(records, params)
}

/// Convert `records` with no defaults and hand the result to `callback` before returning.
pub fn parse_with_callback<'a, F>(
    records: impl Into<Records<'a>>,
    params: &Params,
    callback: F,
) -> Result<()>
where
    F: FnOnce(GeoJsonOutput),
{
    Parser::new().parse_with_callback(records, params, callback)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::error::GeoJsonRecordsError;
    use crate::test::records;

    fn params(value: Value) -> Params {
        Params::try_from(value).unwrap()
    }

    fn collection(output: GeoJsonOutput) -> FeatureCollection {
        match output {
            GeoJsonOutput::FeatureCollection(collection) => collection,
            GeoJsonOutput::Feature(feature) => panic!("expected a collection, got {feature:?}"),
        }
    }

    #[test]
    fn one_feature_per_record() {
        let records = records::locations();
        let output = parse(&records, &params(json!({"Point": ["lat", "lng"]}))).unwrap();
        let collection = collection(output);
        assert_eq!(collection.len(), records.len());

        for (feature, record) in collection.features().iter().zip(&records) {
            assert!(feature.properties().get("lat").is_none());
            assert!(feature.properties().get("lng").is_none());
            assert_eq!(feature.properties()["name"], record["name"]);
            assert_eq!(feature.properties()["category"], record["category"]);
            assert_eq!(feature.properties()["street"], record["street"]);
        }

        let first = collection.features()[0].geometry().as_geometry().unwrap();
        assert_eq!(first.coordinates(), &json!([-75.343, 39.984]));

        let features = collection.into_features();
        assert_eq!(features.len(), records.len());
    }

    #[test]
    fn altitude() {
        let records = records::locations_with_altitude();
        let output = parse(&records, &params(json!({"Point": ["lat", "lng", "alt"]}))).unwrap();
        let collection = collection(output);
        let first = collection.features()[0].geometry().as_geometry().unwrap();
        assert_eq!(first.coordinates(), &json!([-75.343, 39.984, 22026.46]));
        assert!(collection.features()[0].properties().get("alt").is_none());
    }

    #[test]
    fn include_and_exclude() {
        let records = records::locations();
        let output = parse(
            &records,
            &params(json!({"Point": ["lat", "lng"], "include": ["name", "lat"]})),
        )
        .unwrap();
        for feature in collection(output).features() {
            assert_eq!(
                feature.properties().keys().collect::<Vec<_>>(),
                vec!["name", "lat"]
            );
        }

        let output = parse(
            &records,
            &params(json!({"Point": ["lat", "lng"], "exclude": ["name"]})),
        )
        .unwrap();
        for feature in collection(output).features() {
            assert!(feature.properties().get("name").is_none());
            assert!(feature.properties().get("street").is_some());
        }
    }

    #[test]
    fn mixed_geometries() {
        let records = records::mixed_geometries();
        let output = parse(
            &records,
            &params(json!({"Point": ["x", "y"], "LineString": "line", "Polygon": "polygon"})),
        )
        .unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["features"][0]["geometry"]["type"], json!("Point"));
        assert_eq!(value["features"][1]["geometry"]["type"], json!("LineString"));
        assert_eq!(value["features"][2]["geometry"]["type"], json!("Polygon"));
        assert_eq!(
            value["features"][2]["properties"],
            json!({"prop0": "value0", "prop1": {"this": "that"}})
        );
    }

    #[test]
    fn nested_miss_is_local_to_its_record() {
        let records = records::nested_locations();
        let output = parse(
            &records,
            &params(json!({"Point": ["location.point.lat", "location.point.lng"]})),
        )
        .unwrap();
        let collection = collection(output);
        assert_eq!(collection.len(), 3);
        assert!(collection.features()[0].geometry().is_valid());
        assert!(collection.features()[1].geometry().is_valid());
        assert_eq!(collection.features()[2].geometry(), &FeatureGeometry::Absent);
        // The registry holds top-level names, so the container is not a property.
        assert!(collection.features()[0].properties().get("location").is_none());
    }

    #[test]
    fn remove_invalid_geometries() {
        let records = records::one_malformed();
        let output = parse(
            &records,
            &params(json!({"Point": "coords", "removeInvalidGeometries": true})),
        )
        .unwrap();
        let collection = collection(output);
        assert_eq!(collection.len(), 4);
        let names: Vec<&Value> = collection
            .features()
            .iter()
            .map(|feature| &feature.properties()["name"])
            .collect();
        assert_eq!(names, vec!["A", "B", "C", "E"]);

        let output = parse(&records, &params(json!({"Point": "coords"}))).unwrap();
        let collection = self::collection(output);
        assert_eq!(collection.len(), 5);
        assert_eq!(collection.features()[3].geometry(), &FeatureGeometry::Null);
    }

    #[test]
    fn do_throws_invalid_geometry() {
        let records = records::one_malformed();
        let mut called = false;
        let err = parse_with_callback(
            &records,
            &params(json!({"Point": "coords", "doThrows": {"invalidGeometry": true}})),
            |_| called = true,
        )
        .unwrap_err();
        assert!(!called);
        match err {
            GeoJsonRecordsError::InvalidGeometry(err) => {
                assert_eq!(err.record()["name"], json!("D"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn string_coordinates() {
        let records = vec![json!({"lat": "39.343", "lng": "-74.454"})
            .as_object()
            .unwrap()
            .clone()];
        let output = parse(&records, &params(json!({"Point": ["lat", "lng"]}))).unwrap();
        let value = serde_json::to_value(output).unwrap();
        assert_eq!(
            value["features"][0]["geometry"]["coordinates"],
            json!([-74.454, 39.343])
        );
    }

    #[test]
    fn crs_round_trip() {
        let crs = json!({"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}});
        let records = records::locations();
        let output = parse(
            &records,
            &params(json!({"Point": ["lat", "lng"], "crs": crs.clone()})),
        )
        .unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["crs"], crs);
    }

    #[test]
    fn invalid_crs_is_raised_before_records() {
        let mut called = false;
        let err = parse_with_callback(
            &records::locations(),
            &params(json!({"Point": ["lat", "lng"], "crs": {"type": "foo"}})),
            |_| called = true,
        )
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(!called);

        // Configuration errors win over invalid geometries.
        let err = parse(
            &records::one_malformed(),
            &params(json!({
                "Point": "coords",
                "doThrows": {"invalidGeometry": true},
                "crs": {"type": "foo"},
            })),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn no_geometry_attributes() {
        let err = parse(&records::locations(), &params(json!({"include": ["name"]}))).unwrap_err();
        assert!(matches!(err, GeoJsonRecordsError::Configuration(_)));
    }

    #[test]
    fn envelope() {
        let output = parse(
            &records::locations(),
            &params(json!({
                "Point": ["lat", "lng"],
                "bbox": [-76, 39, -74, 40],
                "extraGlobal": {"title": "Locations"},
                "crs": "EPSG:4326",
            })),
        )
        .unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["type"], json!("FeatureCollection"));
        assert_eq!(value["bbox"], json!([-76, 39, -74, 40]));
        assert_eq!(value["properties"], json!({"title": "Locations"}));
        assert_eq!(
            value["crs"],
            json!({"type": "name", "properties": {"name": "EPSG:4326"}})
        );
    }

    #[test]
    fn single_record_is_a_feature() {
        let record = records::locations().remove(0);
        let output = parse(&record, &params(json!({"Point": ["lat", "lng"]}))).unwrap();
        let feature = output.as_feature().unwrap();
        assert!(feature.geometry().is_valid());
        assert_eq!(serde_json::to_value(&output).unwrap()["type"], json!("Feature"));
    }

    #[test]
    fn single_record_postgres_crs() {
        let record = records::locations().remove(0);
        let output = parse(
            &record,
            &params(json!({"Point": ["lat", "lng"], "crs": "EPSG:4326", "isPostgres": true})),
        )
        .unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("crs").is_none());
        assert_eq!(
            value["geometry"]["crs"],
            json!({"type": "name", "properties": {"name": "EPSG:4326"}})
        );

        let output = parse(
            &record,
            &params(json!({"Point": ["lat", "lng"], "crs": "EPSG:4326"})),
        )
        .unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert!(value["geometry"].get("crs").is_none());
        assert_eq!(value["crs"]["properties"]["name"], json!("EPSG:4326"));
    }

    #[test]
    fn single_record_envelope_without_geometry() {
        let record = json!({"name": "x"}).as_object().unwrap().clone();
        let output = parse(
            &record,
            &params(json!({
                "Point": ["lat", "lng"],
                "crs": "EPSG:4326",
                "isPostgres": true,
                "bbox": [0, 0, 1, 1],
                "extraGlobal": {"title": "Ignored"},
            })),
        )
        .unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("crs").is_none());
        assert_eq!(value["geometry"], Value::Null);
        assert_eq!(value["bbox"], json!([0, 0, 1, 1]));
        assert_eq!(value["properties"], json!({"name": "x"}));
    }

    #[test]
    fn single_record_nested_polygon_postgres() {
        let record = json!({
            "northeast": {"crap": {"lat": 29.8399961, "lng": -82.38140709999999}},
            "southwest": {"crap1": {"lat": 29.7183041}, "crap2": {"lng": -82.555449}},
        })
        .as_object()
        .unwrap()
        .clone();
        let output = parse(
            &record,
            &params(json!({
                "doThrows": {"invalidGeometry": true},
                "Polygon": {
                    "northeast": ["crap.lat", "crap.lng"],
                    "southwest": ["crap1.lat", "crap2.lng"],
                },
                "isPostgres": true,
                "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:OGC:1.3:CRS84"}},
            })),
        )
        .unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("crs").is_none());
        assert_eq!(value["geometry"]["type"], json!("Polygon"));
        assert_eq!(
            value["geometry"]["coordinates"],
            json!([[-82.38140709999999, 29.8399961], [-82.555449, 29.7183041]])
        );
        assert_eq!(
            value["geometry"]["crs"]["properties"]["name"],
            json!("urn:ogc:def:crs:OGC:1.3:CRS84")
        );
        assert_eq!(value["properties"], json!({}));
    }

    #[test]
    fn single_record_is_never_dropped() {
        let record = json!({"name": "no coords"}).as_object().unwrap().clone();
        let output = parse(
            &record,
            &params(json!({"Point": "coords", "removeInvalidGeometries": true})),
        )
        .unwrap();
        let feature = output.as_feature().unwrap();
        assert_eq!(feature.geometry(), &FeatureGeometry::Null);
        assert_eq!(feature.properties()["name"], json!("no coords"));
    }

    #[test]
    fn extra_on_every_feature() {
        let output = parse(
            &records::locations(),
            &params(json!({"Point": ["lat", "lng"], "extra": {"foo": "bar", "street": "Any"}})),
        )
        .unwrap();
        for feature in collection(output).features() {
            assert_eq!(feature.properties()["foo"], json!("bar"));
            assert_eq!(feature.properties()["street"], json!("Any"));
        }
    }

    #[test]
    fn empty_list() {
        let records: Vec<crate::record::Record> = vec![];
        let output = parse(&records, &params(json!({"Point": ["lat", "lng"]}))).unwrap();
        assert!(collection(output).is_empty());
    }

    #[test]
    fn defaults_are_merged_and_kept() {
        let mut parser = Parser::with_defaults(params(json!({
            "Point": ["lat", "lng"],
            "extra": {"source": "defaults"},
        })));
        let records = records::locations();

        let output = parser
            .parse(&records, &params(json!({"extra": {"source": "call"}})))
            .unwrap();
        assert_eq!(
            collection(output).features()[0].properties()["source"],
            json!("call")
        );

        // A second call still sees the untouched defaults.
        let output = parser.parse(&records, &Params::new()).unwrap();
        assert_eq!(
            collection(output).features()[0].properties()["source"],
            json!("defaults")
        );
        assert_eq!(parser.defaults().get("Point"), Some(&json!(["lat", "lng"])));

        parser.defaults_mut().insert("exclude", json!(["street"]));
        let output = parser.parse(&records, &Params::new()).unwrap();
        assert!(collection(output).features()[0]
            .properties()
            .get("street")
            .is_none());

        parser.reset_defaults();
        assert!(parser.parse(&records, &Params::new()).is_err());
    }

    #[test]
    fn registry_is_rebuilt_per_call() {
        let parser = Parser::new();
        let records = records::locations();

        parser
            .parse(&records, &params(json!({"Point": ["lat", "lng"]})))
            .unwrap();
        let output = parser
            .parse(&records, &params(json!({"Point": "name"})))
            .unwrap();
        let properties = collection(output).features()[0].properties().clone();
        assert!(properties.get("lat").is_some());
        assert!(properties.get("name").is_none());
    }

    #[test]
    fn callback_receives_output() {
        let mut features = 0;
        parse_with_callback(
            &records::locations(),
            &params(json!({"Point": ["lat", "lng"]})),
            |output| features = output.as_feature_collection().unwrap().len(),
        )
        .unwrap();
        assert_eq!(features, 3);
    }
}
