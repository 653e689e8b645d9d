use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::geo;
use crate::models::{LatLng, MarkerDescriptor, MarkerId, PointRecord};

/// Coincidence groups larger than this spill onto a wider ring.
const RING_CAPACITY: usize = 6;

/// Coordinate fingerprint at a fixed number of decimals.
///
/// Components are rounded first and negative zero is folded into zero, so
/// `-0.0` and tiny negatives that round away share the fingerprint of `0.0`.
pub fn fingerprint(p: LatLng, precision: usize) -> String {
    let scale = 10f64.powi(precision as i32);
    let round = |v: f64| (v * scale).round() / scale + 0.0;
    format!("{:.*},{:.*}", precision, round(p.lat), precision, round(p.lng))
}

/// Ring radius in meters for a coincidence group of `count` members.
pub fn ring_radius(base_offset_m: f64, count: usize) -> f64 {
    base_offset_m * (1 + count / RING_CAPACITY) as f64
}

/// Position of member `index` of `count` on a ring of `radius_m` around `anchor`.
/// Angles run clockwise from north, so member 0 sits due north.
pub fn ring_position(anchor: LatLng, index: usize, count: usize, radius_m: f64) -> LatLng {
    let angle = std::f64::consts::TAU * index as f64 / count as f64;
    let east = radius_m * angle.sin();
    let north = radius_m * angle.cos();
    geo::offset_by_meters(anchor, east, north)
}

/// Descriptors of one map instance, addressable by id.
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: Vec<MarkerDescriptor>,
    by_id: HashMap<MarkerId, usize>,
}

impl MarkerRegistry {
    pub fn new(markers: Vec<MarkerDescriptor>) -> Self {
        let by_id = markers.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        MarkerRegistry { markers, by_id }
    }

    pub fn get(&self, id: MarkerId) -> Option<&MarkerDescriptor> {
        self.by_id.get(&id).map(|&i| &self.markers[i])
    }

    pub fn as_slice(&self) -> &[MarkerDescriptor] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Validate raw records and spread exact duplicates onto rings.
///
/// Records without finite coordinates are dropped. Every kept record becomes a
/// descriptor whose id is its index in `records`; output order follows input order.
pub fn build(records: &[PointRecord], config: &EngineConfig) -> Vec<MarkerDescriptor> {
    let mut markers: Vec<MarkerDescriptor> = records
        .iter()
        .enumerate()
        .filter_map(|(index, rec)| {
            let Some(origin) = rec.coordinates() else {
                tracing::debug!(index, "Ignoring peak with invalid coordinates");
                return None;
            };
            Some(MarkerDescriptor {
                id: MarkerId(index),
                position: origin,
                origin,
                label: rec.label.clone(),
            })
        })
        .collect();

    // Fingerprint -> positions in `markers`, first-seen order within each group
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (pos, m) in markers.iter().enumerate() {
        groups
            .entry(fingerprint(m.origin, config.fingerprint_precision))
            .or_default()
            .push(pos);
    }

    for members in groups.values().filter(|g| g.len() > 1) {
        let count = members.len();
        let anchor = markers[members[0]].origin;
        let radius = ring_radius(config.base_offset_m, count);
        for (i, &pos) in members.iter().enumerate() {
            markers[pos].position = ring_position(anchor, i, count, radius);
        }
        tracing::debug!(
            count,
            radius_m = radius,
            lat = anchor.lat,
            lng = anchor.lng,
            "Spread coincident peaks"
        );
    }

    markers
}
