use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Projected position in world pixels at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn from_point(p: LatLng) -> Self {
        LatLngBounds {
            south_west: p,
            north_east: p,
        }
    }

    /// Smallest bounds containing every point, or `None` when `points` is empty.
    pub fn from_points<I: IntoIterator<Item = LatLng>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = LatLngBounds::from_point(first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn is_valid(&self) -> bool {
        self.south_west.is_finite()
            && self.north_east.is_finite()
            && self.south_west.lat <= self.north_east.lat
            && self.south_west.lng <= self.north_east.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }
}

/// Stable marker identity: the zero-based index of the source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub usize);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A coordinate value as found in the page payload: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoord {
    Number(f64),
    Text(String),
}

impl RawCoord {
    /// Parse to a finite number, or `None` for anything else.
    pub fn to_finite(&self) -> Option<f64> {
        let value = match self {
            RawCoord::Number(n) => *n,
            RawCoord::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Raw point record as supplied by the page. Read-only once ingested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde(default)]
    pub lat: Option<RawCoord>,
    #[serde(default)]
    pub lng: Option<RawCoord>,
    #[serde(default)]
    pub label: Option<String>,
}

impl PointRecord {
    pub fn new(lat: f64, lng: f64, label: Option<&str>) -> Self {
        PointRecord {
            lat: Some(RawCoord::Number(lat)),
            lng: Some(RawCoord::Number(lng)),
            label: label.map(str::to_string),
        }
    }

    /// Both coordinates as finite numbers, if they parse.
    pub fn coordinates(&self) -> Option<LatLng> {
        let lat = self.lat.as_ref()?.to_finite()?;
        let lng = self.lng.as_ref()?.to_finite()?;
        Some(LatLng { lat, lng })
    }
}

/// A validated marker. `position` may be offset from `origin` when the
/// record shared its coordinates with other records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDescriptor {
    pub id: MarkerId,
    pub position: LatLng,
    pub origin: LatLng,
    pub label: Option<String>,
}

impl MarkerDescriptor {
    /// 1-based number shown inside the marker icon.
    pub fn number(&self) -> usize {
        self.id.0 + 1
    }

    pub fn is_offset(&self) -> bool {
        self.position != self.origin
    }
}
