//! Recording host doubles for engine tests.

use std::collections::{BTreeSet, HashMap};

use crate::cluster::Renderable;
use crate::models::{LatLng, LatLngBounds, MarkerId};
use crate::viewport::{Capability, ChipBar, Control, Viewport, ViewportEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetView(LatLng, f64),
    FitBounds(LatLngBounds),
    InvalidateSize,
    Control(Control, bool),
    Overlay(bool),
    Render(usize),
    OpenTooltip(MarkerId),
    CloseTooltip(MarkerId),
    Error(String),
}

/// Viewport that records every side effect and queues the lifecycle events a
/// real map would raise, for the test to deliver.
#[derive(Debug)]
pub struct FakeViewport {
    pub zoom: f64,
    pub center: Option<LatLng>,
    /// Zoom assumed after any `fit_bounds`.
    pub fit_zoom: f64,
    pub controls: HashMap<Control, bool>,
    pub overlay_visible: bool,
    pub open_tooltips: BTreeSet<MarkerId>,
    pub rendered: Vec<Renderable>,
    pub events: Vec<ViewportEvent>,
    pub calls: Vec<Call>,
    pub error: Option<String>,
    pub missing: Vec<Capability>,
}

impl FakeViewport {
    pub fn new(zoom: f64) -> Self {
        FakeViewport {
            zoom,
            center: None,
            fit_zoom: zoom,
            controls: HashMap::new(),
            overlay_visible: false,
            open_tooltips: BTreeSet::new(),
            rendered: Vec::new(),
            events: Vec::new(),
            calls: Vec::new(),
            error: None,
            missing: Vec::new(),
        }
    }

    pub fn control_enabled(&self, control: Control) -> bool {
        self.controls.get(&control).copied().unwrap_or(true)
    }

    pub fn take_events(&mut self) -> Vec<ViewportEvent> {
        std::mem::take(&mut self.events)
    }

    /// A user drag: movement without zoom.
    pub fn user_pan(&mut self) {
        self.events.push(ViewportEvent::MoveStart);
        self.events.push(ViewportEvent::MoveEnd);
    }

    /// A user wheel zoom to `zoom`.
    pub fn user_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.events.push(ViewportEvent::ZoomStart);
        self.events.push(ViewportEvent::MoveStart);
        self.events.push(ViewportEvent::ZoomEnd);
        self.events.push(ViewportEvent::MoveEnd);
    }

    fn moved(&mut self, zoom: f64) {
        let zoomed = zoom != self.zoom;
        self.zoom = zoom;
        if zoomed {
            self.events.push(ViewportEvent::ZoomStart);
        }
        self.events.push(ViewportEvent::MoveStart);
        if zoomed {
            self.events.push(ViewportEvent::ZoomEnd);
        }
        self.events.push(ViewportEvent::MoveEnd);
    }
}

impl Viewport for FakeViewport {
    fn supports(&self, capability: Capability) -> bool {
        !self.missing.contains(&capability)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.calls.push(Call::SetView(center, zoom));
        self.center = Some(center);
        self.moved(zoom);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, _padding: (f64, f64)) {
        self.calls.push(Call::FitBounds(*bounds));
        self.center = Some(bounds.center());
        self.moved(self.fit_zoom);
    }

    fn invalidate_size(&mut self) {
        self.calls.push(Call::InvalidateSize);
    }

    fn set_control(&mut self, control: Control, enabled: bool) {
        self.calls.push(Call::Control(control, enabled));
        self.controls.insert(control, enabled);
    }

    fn set_activation_overlay(&mut self, visible: bool) {
        self.calls.push(Call::Overlay(visible));
        self.overlay_visible = visible;
    }

    fn render_markers(&mut self, set: &[Renderable]) {
        self.calls.push(Call::Render(set.len()));
        self.rendered = set.to_vec();
        // Replacing the layer drops any open tooltip.
        self.open_tooltips.clear();
    }

    fn open_tooltip(&mut self, id: MarkerId) {
        self.calls.push(Call::OpenTooltip(id));
        self.open_tooltips.insert(id);
    }

    fn close_tooltip(&mut self, id: MarkerId) {
        self.calls.push(Call::CloseTooltip(id));
        self.open_tooltips.remove(&id);
    }

    fn show_error(&mut self, message: &str) {
        self.calls.push(Call::Error(message.to_string()));
        self.error = Some(message.to_string());
    }
}

#[derive(Debug, Default)]
pub struct FakeChips {
    pub active: BTreeSet<MarkerId>,
}

impl ChipBar for FakeChips {
    fn set_chip_active(&mut self, id: MarkerId, active: bool) {
        if active {
            self.active.insert(id);
        } else {
            self.active.remove(&id);
        }
    }
}
