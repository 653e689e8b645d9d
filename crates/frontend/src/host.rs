use std::collections::{BTreeSet, HashMap};

use tourmap_shared::cluster::Renderable;
use tourmap_shared::geo;
use tourmap_shared::models::{LatLng, LatLngBounds, MarkerId, Point};
use tourmap_shared::viewport::{ChipBar, Control, Viewport, ViewportEvent};

pub const MIN_ZOOM: f64 = 1.0;

/// Container size assumed until the canvas has been measured.
const DEFAULT_SIZE: (f64, f64) = (640.0, 400.0);

/// Arrow-key pan distance in screen pixels.
const KEY_PAN_PX: f64 = 80.0;

/// Map view state behind one canvas, driven by the engine through [`Viewport`]
/// and by pointer/keyboard input through the gesture methods.
///
/// Lifecycle events are queued in order and must be drained with
/// [`take_events`](Self::take_events) after each call.
#[derive(Debug, Clone, PartialEq)]
pub struct MapHost {
    center: LatLng,
    zoom: f64,
    size: (f64, f64),
    max_zoom: f64,
    controls: HashMap<Control, bool>,
    overlay: bool,
    markers: Vec<Renderable>,
    tooltips: BTreeSet<MarkerId>,
    error: Option<String>,
    events: Vec<ViewportEvent>,
    size_stale: bool,
}

impl MapHost {
    pub fn new(max_zoom: f64) -> Self {
        MapHost {
            center: LatLng::new(0.0, 0.0),
            zoom: MIN_ZOOM,
            size: DEFAULT_SIZE,
            max_zoom,
            controls: HashMap::new(),
            overlay: false,
            markers: Vec::new(),
            tooltips: BTreeSet::new(),
            error: None,
            events: Vec::new(),
            size_stale: true,
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn control_enabled(&self, control: Control) -> bool {
        self.controls.get(&control).copied().unwrap_or(true)
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay
    }

    pub fn markers(&self) -> &[Renderable] {
        &self.markers
    }

    pub fn tooltip_open(&self, id: MarkerId) -> bool {
        self.tooltips.contains(&id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_events(&mut self) -> Vec<ViewportEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether the canvas must be measured again. Clears the request.
    pub fn take_size_request(&mut self) -> bool {
        std::mem::take(&mut self.size_stale)
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.size = (width, height);
        }
        self.size_stale = false;
    }

    /// Canvas-relative pixel position of `p`.
    pub fn to_screen(&self, p: LatLng) -> Point {
        let origin = self.origin();
        let world = geo::project(p, self.zoom);
        Point::new(world.x - origin.x, world.y - origin.y)
    }

    pub fn from_screen(&self, p: Point) -> LatLng {
        let origin = self.origin();
        geo::unproject(Point::new(p.x + origin.x, p.y + origin.y), self.zoom)
    }

    /// Drag the map by a screen delta.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> bool {
        if !self.control_enabled(Control::Dragging) {
            return false;
        }
        self.pan_by(dx, dy);
        true
    }

    /// One wheel notch at `cursor`. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, cursor: Point, delta_y: f64) -> bool {
        if !self.control_enabled(Control::ScrollWheelZoom) || delta_y == 0.0 {
            return false;
        }
        let step = if delta_y < 0.0 { 1.0 } else { -1.0 };
        self.zoom_around(cursor, self.zoom + step)
    }

    pub fn double_click(&mut self, cursor: Point) -> bool {
        if !self.control_enabled(Control::DoubleClickZoom) {
            return false;
        }
        self.zoom_around(cursor, self.zoom + 1.0)
    }

    /// Fit the view to the screen rectangle spanned by `a` and `b`.
    pub fn box_zoom(&mut self, a: Point, b: Point) -> bool {
        if !self.control_enabled(Control::BoxZoom) {
            return false;
        }
        let Some(bounds) = LatLngBounds::from_points([self.from_screen(a), self.from_screen(b)]) else {
            return false;
        };
        self.fit_bounds(&bounds, (0.0, 0.0));
        true
    }

    /// Keyboard navigation. Returns whether the key was consumed.
    pub fn key(&mut self, key: &str) -> bool {
        if !self.control_enabled(Control::Keyboard) {
            return false;
        }
        match key {
            "ArrowUp" => self.pan_by(0.0, KEY_PAN_PX),
            "ArrowDown" => self.pan_by(0.0, -KEY_PAN_PX),
            "ArrowLeft" => self.pan_by(KEY_PAN_PX, 0.0),
            "ArrowRight" => self.pan_by(-KEY_PAN_PX, 0.0),
            "+" | "=" => {
                let z = self.zoom + 1.0;
                self.move_to(self.center, z);
            }
            "-" | "_" => {
                let z = self.zoom - 1.0;
                self.move_to(self.center, z);
            }
            _ => return false,
        }
        true
    }

    fn origin(&self) -> Point {
        let c = geo::project(self.center, self.zoom);
        Point::new(c.x - self.size.0 / 2.0, c.y - self.size.1 / 2.0)
    }

    fn pan_by(&mut self, dx: f64, dy: f64) {
        let mid = Point::new(self.size.0 / 2.0 - dx, self.size.1 / 2.0 - dy);
        let center = self.from_screen(mid);
        self.move_to(center, self.zoom);
    }

    /// Zoom to `zoom` keeping the coordinate under `cursor` in place.
    fn zoom_around(&mut self, cursor: Point, zoom: f64) -> bool {
        let zoom = self.clamp_zoom(zoom);
        if (zoom - self.zoom).abs() < 1e-9 {
            return false;
        }
        let anchor = self.from_screen(cursor);
        let center = center_keeping(anchor, cursor, self.size, zoom);
        self.move_to(center, zoom);
        true
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(MIN_ZOOM, self.max_zoom.max(MIN_ZOOM))
    }

    fn move_to(&mut self, center: LatLng, zoom: f64) {
        let zoom = self.clamp_zoom(zoom);
        let zoomed = (zoom - self.zoom).abs() > 1e-9;
        if zoomed {
            self.events.push(ViewportEvent::ZoomStart);
        }
        self.events.push(ViewportEvent::MoveStart);
        self.center = center;
        self.zoom = zoom;
        if zoomed {
            self.events.push(ViewportEvent::ZoomEnd);
        }
        self.events.push(ViewportEvent::MoveEnd);
    }
}

/// Center that puts `anchor` at `cursor` on a `size` canvas at `zoom`.
fn center_keeping(anchor: LatLng, cursor: Point, size: (f64, f64), zoom: f64) -> LatLng {
    let world = geo::project(anchor, zoom);
    let center = Point::new(
        world.x - (cursor.x - size.0 / 2.0),
        world.y - (cursor.y - size.1 / 2.0),
    );
    geo::unproject(center, zoom)
}

impl Viewport for MapHost {
    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.move_to(center, zoom);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: (f64, f64)) {
        let zoom = geo::bounds_zoom(bounds, self.size.0, self.size.1, padding, self.max_zoom, 1.0);
        let sw = geo::project(bounds.south_west, zoom);
        let ne = geo::project(bounds.north_east, zoom);
        let mid = Point::new((sw.x + ne.x) / 2.0, (sw.y + ne.y) / 2.0);
        self.move_to(geo::unproject(mid, zoom), zoom);
    }

    fn invalidate_size(&mut self) {
        self.size_stale = true;
    }

    fn set_control(&mut self, control: Control, enabled: bool) {
        self.controls.insert(control, enabled);
    }

    fn set_activation_overlay(&mut self, visible: bool) {
        self.overlay = visible;
    }

    fn render_markers(&mut self, set: &[Renderable]) {
        self.markers = set.to_vec();
        self.tooltips.clear();
    }

    fn open_tooltip(&mut self, id: MarkerId) {
        self.tooltips.insert(id);
    }

    fn close_tooltip(&mut self, id: MarkerId) {
        self.tooltips.remove(&id);
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.markers.clear();
        self.tooltips.clear();
        self.overlay = false;
    }
}

/// Active state of the page's peak chips.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChipSet {
    active: BTreeSet<MarkerId>,
}

impl ChipSet {
    pub fn is_active(&self, id: MarkerId) -> bool {
        self.active.contains(&id)
    }
}

impl ChipBar for ChipSet {
    fn set_chip_active(&mut self, id: MarkerId, active: bool) {
        if active {
            self.active.insert(id);
        } else {
            self.active.remove(&id);
        }
    }
}
