//! Decoding of the serialized payloads a map container carries.

use serde_json::value::RawValue;

use crate::error::MapError;
use crate::models::{LatLng, PointRecord};

/// Parse the `data-peaks` attribute into point records.
///
/// The value may still carry HTML entities (`&quot;` and friends) depending on
/// how the page was templated, so it is unescaped first. A payload that is not
/// a JSON array yields no records; an element that does not have the record
/// shape becomes an empty record, which the marker builder then drops.
pub fn parse_point_records(raw: &str) -> Vec<PointRecord> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let decoded = htmlize::unescape(raw);
    // Elements stay raw so one bad element, e.g. a number out of f64 range,
    // only loses its own slot.
    let items: Vec<Box<RawValue>> = match serde_json::from_str(&decoded) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Peak data is not a JSON array");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match serde_json::from_str::<PointRecord>(item.get()) {
            Ok(rec) => rec,
            Err(e) => {
                tracing::debug!(index, error = %e, "Ignoring malformed peak record");
                // Keep the slot so later ids still line up with the page's list.
                PointRecord::default()
            }
        })
        .collect()
}

/// Parse a resolved track: a JSON array of `[lat, lng]` pairs or `{lat, lng}` objects.
/// Non-finite vertices are skipped.
pub fn parse_track(raw: &str) -> Result<Vec<LatLng>, MapError> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Vertex {
        Pair([f64; 2]),
        Object(LatLng),
    }

    let vertices: Vec<Vertex> =
        serde_json::from_str(raw).map_err(|e| MapError::TrackLoad { message: e.to_string() })?;

    Ok(vertices
        .into_iter()
        .map(|v| match v {
            Vertex::Pair([lat, lng]) => LatLng { lat, lng },
            Vertex::Object(p) => p,
        })
        .filter(LatLng::is_finite)
        .collect())
}
