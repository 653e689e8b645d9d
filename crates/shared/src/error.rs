use crate::models::MarkerId;

/// Terminal failure of one map instance. The `Display` text is the inline
/// message rendered in place of the map; sibling instances are unaffected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("Map cannot be loaded ({capability} not available)")]
    MissingCapability { capability: &'static str },

    #[error("No track file specified")]
    NoTrackSource,

    #[error("Track file could not be loaded")]
    TrackLoad { message: String },

    #[error("Track file contains invalid coordinates")]
    InvalidTrackBounds,
}

/// Rejected chip activation. Logged and ignored; focus state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FocusError {
    #[error("No marker with id {0}")]
    UnknownMarker(MarkerId),

    #[error("Invalid chip index {0:?}")]
    InvalidChipIndex(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Base offset must be positive, got {0}")]
    NonPositiveOffset(f64),

    #[error("Max zoom must be a non-negative number, got {0}")]
    InvalidMaxZoom(f64),

    #[error("Cluster radius table zooms must be strictly ascending and below the disable zoom")]
    ZoomsNotAscending,

    #[error("Clustering must stop at or below max zoom {max_zoom}, got {disable_at}")]
    ClusteringAboveMaxZoom { disable_at: f64, max_zoom: f64 },

    #[error("Cluster radius grows at zoom {zoom}")]
    RadiusIncreases { zoom: f64 },

    #[error("Cluster radius must not be negative")]
    NegativeRadius,

    #[error("Cluster tier thresholds must be strictly ascending and start at 2 or more")]
    TiersNotAscending,
}
