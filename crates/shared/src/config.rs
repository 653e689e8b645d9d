use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of aggregate icon tiers.
pub const TIER_COUNT: usize = 5;

/// One row of the zoom-to-radius table: zooms up to and including
/// `up_to_zoom` cluster with `radius_px`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomRadius {
    pub up_to_zoom: f64,
    pub radius_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerStyle {
    pub class_name: String,
    pub size_px: f64,
    pub anchor_px: f64,
    pub tooltip_class: String,
    pub tooltip_offset: (f64, f64),
}

impl Default for MarkerStyle {
    fn default() -> Self {
        MarkerStyle {
            class_name: "tour-peak-marker".to_string(),
            size_px: 28.0,
            anchor_px: 14.0,
            tooltip_class: "tour-peak-tooltip".to_string(),
            tooltip_offset: (0.0, -16.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackStyle {
    pub color: String,
    pub opacity: f64,
    pub weight: f64,
}

impl Default for TrackStyle {
    fn default() -> Self {
        TrackStyle {
            color: "#dc2626".to_string(),
            opacity: 0.9,
            weight: 4.0,
        }
    }
}

/// Per-instance engine settings. Every field has a default, so a container
/// may override any subset through its `data-map-config` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Ring radius in meters for a coincidence group of up to 5 members.
    pub base_offset_m: f64,
    /// Decimal places used for the coordinate fingerprint.
    pub fingerprint_precision: usize,
    pub cluster_radii: Vec<ZoomRadius>,
    /// At or above this zoom nothing is clustered.
    pub disable_clustering_at_zoom: f64,
    pub max_zoom: f64,
    /// Zoom increase when an aggregate is clicked.
    pub cluster_zoom_step: f64,
    /// Ascending member counts at which each icon tier starts.
    pub tier_thresholds: [usize; TIER_COUNT],
    /// Icon edge length per tier.
    pub tier_sizes_px: [f64; TIER_COUNT],
    pub bounds_padding: (f64, f64),
    pub marker_style: MarkerStyle,
    pub track_style: TrackStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_offset_m: 12.0,
            fingerprint_precision: 6,
            cluster_radii: vec![
                ZoomRadius { up_to_zoom: 6.0, radius_px: 100.0 },
                ZoomRadius { up_to_zoom: 9.0, radius_px: 80.0 },
                ZoomRadius { up_to_zoom: 11.0, radius_px: 60.0 },
                ZoomRadius { up_to_zoom: 13.0, radius_px: 40.0 },
                ZoomRadius { up_to_zoom: 15.0, radius_px: 20.0 },
            ],
            disable_clustering_at_zoom: 16.0,
            max_zoom: 18.0,
            cluster_zoom_step: 2.0,
            tier_thresholds: [2, 5, 10, 25, 50],
            tier_sizes_px: [30.0, 36.0, 42.0, 48.0, 56.0],
            bounds_padding: (20.0, 20.0),
            marker_style: MarkerStyle::default(),
            track_style: TrackStyle::default(),
        }
    }
}

impl EngineConfig {
    /// Check the table invariants the cluster engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_offset_m.is_finite() && self.base_offset_m > 0.0) {
            return Err(ConfigError::NonPositiveOffset(self.base_offset_m));
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= 0.0) {
            return Err(ConfigError::InvalidMaxZoom(self.max_zoom));
        }
        // A marker focused at max zoom must render on its own.
        let disable_at = self.disable_clustering_at_zoom;
        if disable_at.is_nan() || disable_at > self.max_zoom {
            return Err(ConfigError::ClusteringAboveMaxZoom {
                disable_at,
                max_zoom: self.max_zoom,
            });
        }
        for pair in self.cluster_radii.windows(2) {
            if pair[1].up_to_zoom <= pair[0].up_to_zoom {
                return Err(ConfigError::ZoomsNotAscending);
            }
            if pair[1].radius_px > pair[0].radius_px {
                return Err(ConfigError::RadiusIncreases {
                    zoom: pair[1].up_to_zoom,
                });
            }
        }
        if self.cluster_radii.iter().any(|r| r.radius_px < 0.0) {
            return Err(ConfigError::NegativeRadius);
        }
        if let Some(last) = self.cluster_radii.last() {
            if last.up_to_zoom >= self.disable_clustering_at_zoom {
                return Err(ConfigError::ZoomsNotAscending);
            }
        }
        if self.tier_thresholds[0] < 2 || self.tier_thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::TiersNotAscending);
        }
        Ok(())
    }

    /// Overlay a JSON object on the defaults. Invalid input yields the defaults.
    pub fn from_json_str(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return EngineConfig::default();
        }
        let config = match serde_json::from_str::<EngineConfig>(raw) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unparsable map config");
                return EngineConfig::default();
            }
        };
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid map config");
                EngineConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_offset() {
        let c = EngineConfig {
            base_offset_m: 0.0,
            ..EngineConfig::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::NonPositiveOffset(0.0)));
    }

    #[test]
    fn test_rejects_increasing_radius() {
        let mut c = EngineConfig::default();
        c.cluster_radii[2].radius_px = 500.0;
        assert!(matches!(c.validate(), Err(ConfigError::RadiusIncreases { .. })));
    }

    #[test]
    fn test_rejects_clustering_above_max_zoom() {
        let c = EngineConfig {
            disable_clustering_at_zoom: 25.0,
            ..EngineConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::ClusteringAboveMaxZoom {
                disable_at: 25.0,
                max_zoom: 18.0,
            })
        );

        let overlay = EngineConfig::from_json_str(
            r#"{"disableClusteringAtZoom": 25, "clusterRadii": [{"upToZoom": 20, "radiusPx": 80}]}"#,
        );
        assert_eq!(overlay, EngineConfig::default());
    }

    #[test]
    fn test_rejects_unsorted_tiers() {
        let c = EngineConfig {
            tier_thresholds: [2, 10, 5, 25, 50],
            ..EngineConfig::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::TiersNotAscending));
    }

    #[test]
    fn test_from_json_partial_override() {
        let c = EngineConfig::from_json_str(r#"{"maxZoom": 17, "baseOffsetM": 20.0}"#);
        assert_eq!(c.max_zoom, 17.0);
        assert_eq!(c.base_offset_m, 20.0);
        assert_eq!(c.cluster_radii, EngineConfig::default().cluster_radii);
    }

    #[test]
    fn test_from_json_garbage_falls_back() {
        assert_eq!(EngineConfig::from_json_str("{not json"), EngineConfig::default());
        assert_eq!(EngineConfig::from_json_str(""), EngineConfig::default());
    }

    #[test]
    fn test_from_json_invalid_falls_back() {
        let c = EngineConfig::from_json_str(r#"{"baseOffsetM": -1}"#);
        assert_eq!(c, EngineConfig::default());
    }
}
