use serde::Serialize;

use crate::config::{EngineConfig, TIER_COUNT};
use crate::geo;
use crate::markers::MarkerRegistry;
use crate::models::{LatLng, MarkerDescriptor, MarkerId, Point};

/// Clustering radius in pixels at `zoom`. Non-increasing in zoom, and zero
/// from `disable_clustering_at_zoom` upwards.
pub fn cluster_radius(zoom: f64, config: &EngineConfig) -> f64 {
    if zoom.is_nan() || zoom >= config.disable_clustering_at_zoom {
        return 0.0;
    }
    config
        .cluster_radii
        .iter()
        .find(|r| zoom <= r.up_to_zoom)
        .map(|r| r.radius_px)
        .unwrap_or(0.0)
}

/// A group of markers produced by one clustering pass.
///
/// The centroid is a running mean kept both in pixel space (membership tests)
/// and in geographic space (rendering).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    centroid: LatLng,
    pixel_centroid: Point,
    members: Vec<MarkerId>,
}

impl Cluster {
    fn seed(id: MarkerId, at: LatLng, px: Point) -> Self {
        Cluster {
            centroid: at,
            pixel_centroid: px,
            members: vec![id],
        }
    }

    fn join(&mut self, id: MarkerId, at: LatLng, px: Point) {
        self.members.push(id);
        let n = self.members.len() as f64;
        self.centroid.lat += (at.lat - self.centroid.lat) / n;
        self.centroid.lng += (at.lng - self.centroid.lng) / n;
        self.pixel_centroid.x += (px.x - self.pixel_centroid.x) / n;
        self.pixel_centroid.y += (px.y - self.pixel_centroid.y) / n;
    }

    pub fn centroid(&self) -> LatLng {
        self.centroid
    }

    /// Member ids in join order.
    pub fn members(&self) -> &[MarkerId] {
        &self.members
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Group `markers` at `zoom` using the default Web Mercator projection.
pub fn cluster(markers: &[MarkerDescriptor], zoom: f64, config: &EngineConfig) -> Vec<Cluster> {
    cluster_with(markers, zoom, config, geo::project)
}

/// Greedy first-fit clustering.
///
/// Markers are visited in input order; each joins the first open cluster whose
/// pixel centroid lies within the radius, otherwise it opens a new cluster.
/// The result depends on input order and is not the minimal cluster count.
pub fn cluster_with<P>(
    markers: &[MarkerDescriptor],
    zoom: f64,
    config: &EngineConfig,
    project: P,
) -> Vec<Cluster>
where
    P: Fn(LatLng, f64) -> Point,
{
    let radius = cluster_radius(zoom, config);
    let mut clusters: Vec<Cluster> = Vec::new();

    for m in markers {
        let px = project(m.position, zoom);
        let target = if radius > 0.0 {
            clusters
                .iter_mut()
                .find(|c| c.pixel_centroid.distance_to(px) <= radius)
        } else {
            None
        };
        match target {
            Some(c) => c.join(m.id, m.position, px),
            None => clusters.push(Cluster::seed(m.id, m.position, px)),
        }
    }

    tracing::debug!(
        zoom,
        radius,
        markers = markers.len(),
        clusters = clusters.len(),
        "Clustered peaks"
    );
    clusters
}

/// Icon tier 1..=5 for an aggregate of `count` members.
pub fn icon_tier(count: usize, thresholds: &[usize; TIER_COUNT]) -> u8 {
    let reached = thresholds.iter().filter(|&&t| count >= t).count();
    reached.max(1) as u8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleMarker {
    pub id: MarkerId,
    pub position: LatLng,
    /// 1-based number shown in the icon.
    pub number: usize,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateMarker {
    /// Index of the cluster in the pass that produced it.
    pub index: usize,
    pub centroid: LatLng,
    pub members: Vec<MarkerId>,
    pub tier: u8,
    pub class_name: String,
    pub size_px: f64,
    pub tooltip: String,
}

impl AggregateMarker {
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// One entry of the marker layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Renderable {
    Single(SingleMarker),
    Aggregate(AggregateMarker),
}

impl Renderable {
    pub fn position(&self) -> LatLng {
        match self {
            Renderable::Single(m) => m.position,
            Renderable::Aggregate(a) => a.centroid,
        }
    }
}

/// Turn a clustering pass into what the marker layer shows.
pub fn render_set(
    clusters: &[Cluster],
    registry: &MarkerRegistry,
    config: &EngineConfig,
) -> Vec<Renderable> {
    clusters
        .iter()
        .enumerate()
        .filter_map(|(index, c)| {
            if c.is_singleton() {
                let m = registry.get(c.members[0])?;
                return Some(Renderable::Single(SingleMarker {
                    id: m.id,
                    position: m.position,
                    number: m.number(),
                    label: m.label.clone(),
                }));
            }
            let count = c.count();
            let tier = icon_tier(count, &config.tier_thresholds);
            Some(Renderable::Aggregate(AggregateMarker {
                index,
                centroid: c.centroid,
                members: c.members.clone(),
                tier,
                class_name: format!("tour-cluster tour-cluster--tier-{tier}"),
                size_px: config.tier_sizes_px[usize::from(tier) - 1],
                tooltip: format!("{count} peaks"),
            }))
        })
        .collect()
}

/// View an aggregate click moves to: its centroid, one zoom step closer.
pub fn zoom_in_target(centroid: LatLng, current_zoom: f64, config: &EngineConfig) -> (LatLng, f64) {
    let zoom = (current_zoom + config.cluster_zoom_step).min(config.max_zoom);
    (centroid, zoom)
}
