use crate::error::MapError;

/// One-shot visibility subscription for lazy map initialization.
///
/// Observing -> Rendering on the first intersection, or Observing -> Withdrawn
/// if the target is unobserved first. Rendering is never cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityGate {
    #[default]
    Observing,
    Rendering,
    Withdrawn,
}

impl VisibilityGate {
    /// Feed one intersection notification. Returns true exactly once: when
    /// the caller should unobserve the target and start rendering.
    pub fn on_intersection(&mut self, intersecting: bool) -> bool {
        if intersecting && *self == VisibilityGate::Observing {
            *self = VisibilityGate::Rendering;
            return true;
        }
        false
    }

    /// Render without waiting, for hosts without intersection notifications.
    pub fn render_now(&mut self) -> bool {
        self.on_intersection(true)
    }

    /// Stop observing. Has no effect once rendering started.
    pub fn withdraw(&mut self) -> bool {
        if *self == VisibilityGate::Observing {
            *self = VisibilityGate::Withdrawn;
            return true;
        }
        false
    }

    pub fn is_rendering(&self) -> bool {
        *self == VisibilityGate::Rendering
    }
}

/// Lifecycle of one map container.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InstanceStatus {
    #[default]
    Pending,
    /// Markers are up; waiting for the track.
    Loading,
    Ready,
    Failed(MapError),
}

impl InstanceStatus {
    /// Value for the container's `data-map-initialized` attribute.
    pub fn marker_attribute(&self) -> Option<&'static str> {
        match self {
            InstanceStatus::Pending => None,
            InstanceStatus::Loading | InstanceStatus::Ready => Some("true"),
            InstanceStatus::Failed(_) => Some("error"),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, InstanceStatus::Failed(_))
    }
}

/// The container's track source, which is required before anything renders.
pub fn require_track_source(source: Option<&str>) -> Result<&str, MapError> {
    match source.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(MapError::NoTrackSource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_fires_once() {
        let mut gate = VisibilityGate::default();
        assert!(!gate.on_intersection(false));
        assert!(gate.on_intersection(true));
        assert!(!gate.on_intersection(true));
        assert!(gate.is_rendering());
    }

    #[test]
    fn test_gate_withdraw_before_visible() {
        let mut gate = VisibilityGate::default();
        assert!(gate.withdraw());
        assert!(!gate.on_intersection(true));
        assert_eq!(gate, VisibilityGate::Withdrawn);
    }

    #[test]
    fn test_gate_withdraw_after_render_is_noop() {
        let mut gate = VisibilityGate::default();
        assert!(gate.render_now());
        assert!(!gate.withdraw());
        assert!(gate.is_rendering());
    }

    #[test]
    fn test_status_attribute() {
        assert_eq!(InstanceStatus::Pending.marker_attribute(), None);
        assert_eq!(InstanceStatus::Loading.marker_attribute(), Some("true"));
        assert_eq!(
            InstanceStatus::Failed(MapError::InvalidTrackBounds).marker_attribute(),
            Some("error")
        );
    }

    #[test]
    fn test_require_track_source() {
        assert_eq!(require_track_source(Some(" /tracks/a.json ")), Ok("/tracks/a.json"));
        assert_eq!(require_track_source(Some("  ")), Err(MapError::NoTrackSource));
        assert_eq!(require_track_source(None), Err(MapError::NoTrackSource));
    }
}
