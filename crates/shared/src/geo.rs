//! Map geometry: Web Mercator projection and the local meters/degrees
//! approximation used for marker offsets.
//!
//! World pixel space is 256 px wide at zoom 0 and doubles per zoom level.
//! X grows east, Y grows south (screen coords).

use crate::models::{LatLng, LatLngBounds, Point};

pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Meters per degree of latitude (treated as constant).
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Floor for cos(latitude) when scaling longitude, so offsets stay bounded near the poles.
pub const MIN_LNG_SCALE: f64 = 0.01;

/// World size in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a coordinate to world pixels at `zoom`.
pub fn project(p: LatLng, zoom: f64) -> Point {
    let size = world_size(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng + 180.0) / 360.0 * size;
    let sin = lat.sin();
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)) * size;
    Point { x, y }
}

/// Inverse of [`project`].
pub fn unproject(p: Point, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = p.x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * p.y / size);
    let lat = n.sinh().atan().to_degrees();
    LatLng { lat, lng }
}

/// Meters per degree of longitude at `lat`, floored near the poles.
pub fn meters_per_degree_lng(lat: f64) -> f64 {
    METERS_PER_DEGREE_LAT * lat.to_radians().cos().max(MIN_LNG_SCALE)
}

/// Shift `origin` by a metric offset (east, north) using the local approximation.
pub fn offset_by_meters(origin: LatLng, east_m: f64, north_m: f64) -> LatLng {
    LatLng {
        lat: origin.lat + north_m / METERS_PER_DEGREE_LAT,
        lng: origin.lng + east_m / meters_per_degree_lng(origin.lat),
    }
}

/// Largest zoom (in `step` increments, capped at `max_zoom`) at which `bounds`
/// fits inside a `width` x `height` viewport minus `padding` on each side.
pub fn bounds_zoom(
    bounds: &LatLngBounds,
    width: f64,
    height: f64,
    padding: (f64, f64),
    max_zoom: f64,
    step: f64,
) -> f64 {
    let avail_w = (width - 2.0 * padding.0).max(1.0);
    let avail_h = (height - 2.0 * padding.1).max(1.0);

    let sw = project(bounds.south_west, 0.0);
    let ne = project(bounds.north_east, 0.0);
    let span_w = (ne.x - sw.x).abs();
    let span_h = (sw.y - ne.y).abs();
    if span_w <= 0.0 && span_h <= 0.0 {
        return max_zoom;
    }

    let scale_w = if span_w > 0.0 { avail_w / span_w } else { f64::INFINITY };
    let scale_h = if span_h > 0.0 { avail_h / span_h } else { f64::INFINITY };
    let zoom = scale_w.min(scale_h).log2();

    let snapped = if step > 0.0 {
        (zoom / step).floor() * step
    } else {
        zoom
    };
    snapped.clamp(0.0, max_zoom)
}

/// Bounds of a track, or `None` when it has no vertices or a non-finite
/// corner. A single-vertex track yields a zero-area box.
pub fn track_bounds(track: &[LatLng]) -> Option<LatLngBounds> {
    LatLngBounds::from_points(track.iter().copied()).filter(LatLngBounds::is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_origin_is_world_center() {
        let p = project(LatLng::new(0.0, 0.0), 0.0);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_doubles_per_zoom() {
        let a = project(LatLng::new(47.3, 11.4), 10.0);
        let b = project(LatLng::new(47.3, 11.4), 11.0);
        assert!((b.x - 2.0 * a.x).abs() < 1e-6);
        assert!((b.y - 2.0 * a.y).abs() < 1e-6);
    }

    #[test]
    fn test_project_north_is_up() {
        let south = project(LatLng::new(40.0, 10.0), 5.0);
        let north = project(LatLng::new(41.0, 10.0), 5.0);
        assert!(north.y < south.y);
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let p = LatLng::new(46.8523, 10.9113);
        let back = unproject(project(p, 13.0), 13.0);
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lng - p.lng).abs() < 1e-9);
    }

    #[test]
    fn test_project_clamps_poles() {
        let p = project(LatLng::new(90.0, 0.0), 0.0);
        assert!(p.y.is_finite());
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn test_meters_per_degree_lng_floor() {
        assert!((meters_per_degree_lng(0.0) - METERS_PER_DEGREE_LAT).abs() < 1e-6);
        let polar = meters_per_degree_lng(90.0);
        assert!((polar - METERS_PER_DEGREE_LAT * MIN_LNG_SCALE).abs() < 1e-6);
    }

    #[test]
    fn test_offset_by_meters_north() {
        let o = offset_by_meters(LatLng::new(40.0, 10.0), 0.0, METERS_PER_DEGREE_LAT);
        assert!((o.lat - 41.0).abs() < 1e-12);
        assert!((o.lng - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_zoom_single_point_is_max() {
        let b = LatLngBounds::from_point(LatLng::new(47.0, 11.0));
        assert_eq!(bounds_zoom(&b, 800.0, 400.0, (20.0, 20.0), 18.0, 1.0), 18.0);
    }

    #[test]
    fn test_bounds_zoom_fits() {
        let mut b = LatLngBounds::from_point(LatLng::new(47.0, 11.0));
        b.extend(LatLng::new(47.1, 11.2));
        let z = bounds_zoom(&b, 800.0, 400.0, (20.0, 20.0), 18.0, 1.0);
        let sw = project(b.south_west, z);
        let ne = project(b.north_east, z);
        assert!((ne.x - sw.x) <= 760.0);
        assert!((sw.y - ne.y) <= 360.0);
        // one level deeper would no longer fit
        let sw2 = project(b.south_west, z + 1.0);
        let ne2 = project(b.north_east, z + 1.0);
        assert!((ne2.x - sw2.x) > 760.0 || (sw2.y - ne2.y) > 360.0);
    }

    #[test]
    fn test_track_bounds() {
        assert_eq!(track_bounds(&[]), None);
        assert_eq!(track_bounds(&[LatLng::new(f64::NAN, 11.0)]), None);

        let point = track_bounds(&[LatLng::new(47.2, 11.4)]).unwrap();
        assert_eq!(point.south_west, point.north_east);

        let b = track_bounds(&[LatLng::new(47.2, 11.4), LatLng::new(47.1, 11.5)]).unwrap();
        assert_eq!(b.south_west, LatLng::new(47.1, 11.4));
        assert_eq!(b.north_east, LatLng::new(47.2, 11.5));
    }
}
