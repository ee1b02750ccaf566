//! Selection of the fields that become a feature's `properties`.

use serde_json::{Map, Value};

use crate::record::Record;
use crate::settings::{GeometryFieldRegistry, PropertyOptions};

/// Build the properties of one feature.
///
/// - With `include`, exactly the listed fields present on the record are copied, in `include`
///   order, even if the geometry consumes them.
/// - Otherwise every field not consumed by the geometry and not listed in `exclude` is copied,
///   in record order.
///
/// `extra` is merged last and overwrites fields of the same name.
pub fn select_properties(
    record: &Record,
    registry: &GeometryFieldRegistry,
    options: &PropertyOptions,
) -> Map<String, Value> {
    let mut properties: Map<String, Value> = match &options.include {
        Some(include) => include
            .iter()
            .filter_map(|field| Some((field.clone(), record.get(field)?.clone())))
            .collect(),
        None => {
            let exclude = options.exclude.as_deref().unwrap_or_default();
            record
                .iter()
                .filter(|(field, _)| {
                    !registry.contains(field) && !exclude.iter().any(|excluded| excluded == *field)
                })
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect()
        }
    };

    if let Some(extra) = &options.extra {
        properties.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
    }

    properties
}
