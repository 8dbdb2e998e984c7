//! GeoJSON serialization of analysis products.

use chart_common::{CenterRecord, ContourRecord};
use serde_json::{json, Value};

/// Build a FeatureCollection of LineString features for one contour set.
///
/// `value_key` names the iso-level property: "pressure", "height" or
/// "temperature".
pub fn contour_collection(records: &[ContourRecord], value_key: &str) -> Value {
    let features: Vec<Value> = records
        .iter()
        .map(|record| {
            let coordinates: Vec<[f64; 2]> = record
                .path
                .points
                .iter()
                .map(|&(lon, lat)| [lon, lat])
                .collect();
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates,
                },
                "properties": {
                    value_key: record.value,
                    "level": record.level.as_str(),
                    "time": record.observation_time.to_rfc3339(),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Build a FeatureCollection of Point features for the detected centers.
pub fn center_collection(records: &[CenterRecord], value_key: &str) -> Value {
    let features: Vec<Value> = records
        .iter()
        .map(|record| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [record.center.longitude, record.center.latitude],
                },
                "properties": {
                    "type": record.center.kind.as_str(),
                    value_key: record.center.value,
                    "level": record.level.as_str(),
                    "time": record.observation_time.to_rfc3339(),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
