//! The seam between the engine and whatever draws the map.
//!
//! A host implements [`Viewport`] (and [`ChipBar`] for the page-level chips)
//! and forwards its lifecycle notifications as [`ViewportEvent`]s. Events the
//! host raises while executing an engine call must be queued and delivered
//! after that call returns.

use crate::cluster::Renderable;
use crate::geo;
use crate::models::{LatLng, LatLngBounds, MarkerId, Point};

/// Interaction toggles held back by the guard until the user opts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Dragging,
    ScrollWheelZoom,
    DoubleClickZoom,
    BoxZoom,
    Keyboard,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Dragging,
        Control::ScrollWheelZoom,
        Control::DoubleClickZoom,
        Control::BoxZoom,
        Control::Keyboard,
    ];
}

/// Optional host capabilities the engine checks for before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    MarkerLayer,
    TrackOverlay,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::MarkerLayer => "marker layer",
            Capability::TrackOverlay => "track overlay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    MoveStart,
    ZoomStart,
    /// Zoom settled after a (possibly animated) change.
    ZoomEnd,
    MoveEnd,
}

pub trait Viewport {
    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    /// World pixel position of `at` at `zoom`.
    fn project(&self, at: LatLng, zoom: f64) -> Point {
        geo::project(at, zoom)
    }

    fn zoom(&self) -> f64;

    fn set_view(&mut self, center: LatLng, zoom: f64);

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: (f64, f64));

    /// Recompute the container size after a layout change.
    fn invalidate_size(&mut self) {}

    fn set_control(&mut self, control: Control, enabled: bool);

    fn set_activation_overlay(&mut self, visible: bool);

    /// Replace the whole marker layer.
    fn render_markers(&mut self, set: &[Renderable]);

    fn open_tooltip(&mut self, id: MarkerId);

    fn close_tooltip(&mut self, id: MarkerId);

    /// Swap the map for a terminal inline message.
    fn show_error(&mut self, message: &str);
}

/// Page-level chips bound to markers by index.
pub trait ChipBar {
    fn set_chip_active(&mut self, id: MarkerId, active: bool);
}

/// What the map view was fitted to, restored when focus is toggled off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultView {
    pub bounds: LatLngBounds,
    pub padding: (f64, f64),
}
