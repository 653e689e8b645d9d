use std::cell::RefCell;
use std::rc::Rc;

use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::html::Modifiers;
use dioxus::logger::tracing;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use tourmap_shared::cluster::Renderable;
use tourmap_shared::config::{MarkerStyle, TrackStyle};
use tourmap_shared::focus::FocusState;
use tourmap_shared::lifecycle::require_track_source;
use tourmap_shared::models::{LatLng, MarkerId, Point};
use tourmap_shared::schedule::Phase;
use tourmap_shared::viewport::Control;
use tourmap_shared::RouteMap;

use crate::api;
use crate::host::{ChipSet, MapHost};
use crate::visibility::VisibilityWatch;

/// Drag threshold in pixels; movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Touch drag threshold, larger because touch is less precise.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

/// Delay standing in for the next animation frame.
const FRAME_DELAY_MS: u32 = 16;

// ---------------------------------------------------------------------------
// Overlay markup (pure functions, easily testable)
// ---------------------------------------------------------------------------

/// SVG for the track polyline in canvas pixels.
fn track_svg(points: &[Point], style: &TrackStyle, size: (f64, f64)) -> String {
    if points.len() < 2 {
        return String::new();
    }
    let path = points
        .iter()
        .map(|p| format!("{:.1},{:.1}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}"><polyline points="{path}" fill="none" stroke="{color}" stroke-opacity="{opacity}" stroke-width="{weight}" stroke-linejoin="round" stroke-linecap="round"/></svg>"#,
        w = size.0,
        h = size.1,
        color = style.color,
        opacity = style.opacity,
        weight = style.weight,
    )
}

#[derive(Debug, Clone, PartialEq)]
struct PinView {
    id: MarkerId,
    left: f64,
    top: f64,
    number: usize,
    label: String,
    tooltip_open: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct ClusterView {
    index: usize,
    left: f64,
    top: f64,
    size: f64,
    count: usize,
    class_name: String,
    tooltip: String,
}

/// Place the current marker layer on the canvas. Coordinates are the
/// top-left corner of each icon.
fn layout(host: &MapHost, style: &MarkerStyle) -> (Vec<PinView>, Vec<ClusterView>) {
    let mut pins = Vec::new();
    let mut clusters = Vec::new();
    for renderable in host.markers() {
        let at = host.to_screen(renderable.position());
        match renderable {
            Renderable::Single(m) => pins.push(PinView {
                id: m.id,
                left: at.x - style.anchor_px,
                top: at.y - style.anchor_px,
                number: m.number,
                label: marker_label(m.number, m.label.as_deref()),
                tooltip_open: host.tooltip_open(m.id),
            }),
            Renderable::Aggregate(a) => clusters.push(ClusterView {
                index: a.index,
                left: at.x - a.size_px / 2.0,
                top: at.y - a.size_px / 2.0,
                size: a.size_px,
                count: a.count(),
                class_name: a.class_name.clone(),
                tooltip: a.tooltip.clone(),
            }),
        }
    }
    (pins, clusters)
}

fn marker_label(number: usize, label: Option<&str>) -> String {
    match label {
        Some(l) if !l.trim().is_empty() => l.trim().to_string(),
        _ => format!("Peak {}", number),
    }
}

/// Keys that press a focused marker or cluster.
fn is_press_key(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

// ---------------------------------------------------------------------------
// Instance wiring
// ---------------------------------------------------------------------------

/// Signals behind one map container.
#[derive(Clone, Copy, PartialEq)]
struct MapInstance {
    engine: Signal<RouteMap>,
    host: Signal<MapHost>,
    chips: Signal<ChipSet>,
    track: Signal<Vec<LatLng>>,
    canvas: Signal<Option<web_sys::Element>>,
    flush_scheduled: Signal<bool>,
}

impl MapInstance {
    /// Run `f` against the engine and host, then deliver every viewport event
    /// it raised and schedule any deferred work.
    fn update<R>(mut self, f: impl FnOnce(&mut RouteMap, &mut MapHost, &mut ChipSet) -> R) -> R {
        let out = {
            let mut engine = self.engine.write();
            let mut host = self.host.write();
            let mut chips = self.chips.write();
            let out = f(&mut *engine, &mut *host, &mut *chips);
            loop {
                let events = host.take_events();
                if events.is_empty() {
                    break;
                }
                for event in events {
                    engine.handle_event(event, &mut *host, &mut *chips);
                }
            }
            out
        };
        self.measure();
        self.schedule_flush();
        out
    }

    fn measure(mut self) {
        let Some(rect) = self.canvas.peek().as_ref().map(|el| el.get_bounding_client_rect()) else {
            return;
        };
        let mut host = self.host.write();
        if host.take_size_request() {
            host.set_size(rect.width(), rect.height());
        }
    }

    fn schedule_flush(mut self) {
        let pending = {
            let engine = self.engine.peek();
            engine.has_pending(Phase::Tick) || engine.has_pending(Phase::Frame)
        };
        if !pending || *self.flush_scheduled.peek() {
            return;
        }
        self.flush_scheduled.set(true);
        spawn(async move {
            TimeoutFuture::new(0).await;
            self.engine.write().run_tick();
            TimeoutFuture::new(FRAME_DELAY_MS).await;
            self.flush_scheduled.set(false);
            self.update(|engine, host, _| engine.run_frame(host));
        });
    }

    /// Canvas-relative position of a client coordinate.
    fn canvas_point(&self, client_x: f64, client_y: f64) -> Option<Point> {
        let rect = self.canvas.peek().as_ref()?.get_bounding_client_rect();
        Some(Point::new(client_x - rect.left(), client_y - rect.top()))
    }

    async fn start(mut self, track_src: Option<String>) {
        let src = match require_track_source(track_src.as_deref()) {
            Ok(src) => src.to_string(),
            Err(err) => {
                self.update(|engine, host, _| engine.fail(err, host));
                return;
            }
        };
        if self.update(|engine, host, _| engine.attach(host)).is_err() {
            return;
        }

        match api::fetch_track(&src).await {
            Ok(points) => {
                if self.update(|engine, host, _| engine.track_loaded(&points, host)).is_ok() {
                    self.track.set(points);
                }
            }
            Err(err) => {
                tracing::error!(src = %src, "Track request failed");
                self.update(|engine, host, _| engine.fail(err, host));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// One tour map container. The props mirror the container's `data-peaks`,
/// `data-track-src` and `data-map-config` attributes.
#[component]
pub fn TourMap(peaks: Option<String>, track_src: Option<String>, map_config: Option<String>) -> Element {
    let engine = use_signal(|| RouteMap::from_attributes(peaks.as_deref(), map_config.as_deref()));
    let host = use_signal(|| MapHost::new(engine.peek().config().max_zoom));
    let chips = use_signal(ChipSet::default);
    let track = use_signal(Vec::<LatLng>::new);
    let mut canvas = use_signal(|| None::<web_sys::Element>);
    let flush_scheduled = use_signal(|| false);
    let map = MapInstance {
        engine,
        host,
        chips,
        track,
        canvas,
        flush_scheduled,
    };

    let watch = use_hook(|| Rc::new(RefCell::new(None::<VisibilityWatch>)));
    let drop_watch = Rc::clone(&watch);
    use_drop(move || {
        if let Some(w) = drop_watch.borrow_mut().take() {
            w.withdraw();
        }
    });

    // Drag state (mouse)
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut box_select = use_signal(|| false);
    let mut drag_start = use_signal(|| (0.0_f64, 0.0_f64));
    let mut last_pos = use_signal(|| (0.0_f64, 0.0_f64));

    // Touch state
    let mut touch_start_pos = use_signal(|| None::<(f64, f64)>);
    let mut touch_did_pan = use_signal(|| false);

    let engine_ref = engine.read();
    let host_ref = host.read();
    let chips_ref = chips.read();
    let config = engine_ref.config();

    let status_attr = engine_ref.status().marker_attribute();
    let error = host_ref.error().map(str::to_string);
    let overlay = host_ref.overlay_visible();
    let (width, height) = host_ref.size();

    let screen_track: Vec<Point> = track.read().iter().map(|p| host_ref.to_screen(*p)).collect();
    let track_markup = track_svg(&screen_track, &config.track_style, (width, height));

    let marker_style = config.marker_style.clone();
    let (pins, clusters) = layout(&host_ref, &marker_style);
    let pin_size = marker_style.size_px;
    let (tip_dx, tip_dy) = marker_style.tooltip_offset;

    let chip_views: Vec<(MarkerId, String, bool)> = engine_ref
        .registry()
        .as_slice()
        .iter()
        .map(|m| {
            let label = format!("{}. {}", m.number(), marker_label(m.number(), m.label.as_deref()));
            (m.id, label, chips_ref.is_active(m.id))
        })
        .collect();

    let canvas_class = if *is_dragging.read() && *did_drag.read() {
        "tour-map__canvas dragging"
    } else {
        "tour-map__canvas"
    };

    rsx! {
        div {
            class: "tour-map",
            "data-tour-map-canvas": "true",
            "data-map-initialized": status_attr,

            if let Some(message) = error {
                div { class: "map-error map-error--full", role: "alert", "{message}" }
            } else {
                div {
                    class: "{canvas_class}",
                    tabindex: "0",

                    onmounted: move |evt: Event<MountedData>| {
                        let Some(element) = evt.data().downcast::<web_sys::Element>().cloned() else {
                            tracing::warn!("Map canvas is not a DOM element");
                            return;
                        };
                        canvas.set(Some(element.clone()));
                        let track_src = track_src.clone();
                        match VisibilityWatch::observe(&element) {
                            Ok((w, visible)) => {
                                *watch.borrow_mut() = Some(w);
                                spawn(async move {
                                    if visible.await.is_ok() {
                                        map.start(track_src).await;
                                    }
                                });
                            }
                            Err(err) => {
                                tracing::warn!(?err, "Lazy map loading unavailable, rendering now");
                                spawn(map.start(track_src));
                            }
                        }
                    },

                    onwheel: move |evt: Event<WheelData>| {
                        if !host.peek().control_enabled(Control::ScrollWheelZoom) {
                            return;
                        }
                        evt.prevent_default();
                        let client = evt.data().client_coordinates();
                        let Some(cursor) = map.canvas_point(client.x, client.y) else { return };
                        let delta_y = wheel_delta_y(evt.data().delta());
                        map.update(|_, h, _| h.wheel(cursor, delta_y));
                    },

                    onmousedown: move |evt: Event<MouseData>| {
                        if evt.trigger_button() != Some(MouseButton::Primary) {
                            return;
                        }
                        let client = evt.client_coordinates();
                        is_dragging.set(true);
                        did_drag.set(false);
                        box_select.set(evt.modifiers().contains(Modifiers::SHIFT));
                        drag_start.set((client.x, client.y));
                        last_pos.set((client.x, client.y));
                    },

                    onmousemove: move |evt: Event<MouseData>| {
                        if !*is_dragging.peek() {
                            return;
                        }
                        let client = evt.client_coordinates();
                        let (sx, sy) = *drag_start.peek();
                        if !*did_drag.peek()
                            && ((client.x - sx).abs() > DRAG_THRESHOLD || (client.y - sy).abs() > DRAG_THRESHOLD)
                        {
                            did_drag.set(true);
                        }
                        if *did_drag.peek() && !*box_select.peek() {
                            let (lx, ly) = *last_pos.peek();
                            map.update(|_, h, _| h.drag_by(client.x - lx, client.y - ly));
                        }
                        last_pos.set((client.x, client.y));
                    },

                    onmouseup: move |evt: Event<MouseData>| {
                        let finished_box = *is_dragging.peek() && *did_drag.peek() && *box_select.peek();
                        is_dragging.set(false);
                        if !finished_box {
                            return;
                        }
                        let (sx, sy) = *drag_start.peek();
                        let client = evt.client_coordinates();
                        if let (Some(a), Some(b)) = (map.canvas_point(sx, sy), map.canvas_point(client.x, client.y)) {
                            map.update(|_, h, _| h.box_zoom(a, b));
                        }
                    },

                    onmouseleave: move |_| is_dragging.set(false),

                    ondoubleclick: move |evt: Event<MouseData>| {
                        let client = evt.client_coordinates();
                        if let Some(cursor) = map.canvas_point(client.x, client.y) {
                            map.update(|_, h, _| h.double_click(cursor));
                        }
                    },

                    onkeydown: move |evt: Event<KeyboardData>| {
                        let key = evt.key().to_string();
                        if key == "Escape" {
                            if engine.peek().focus_state() != FocusState::Idle {
                                map.update(|e, h, c| e.reset_focus(h, c));
                            }
                            return;
                        }
                        if map.update(|_, h, _| h.key(&key)) {
                            evt.prevent_default();
                        }
                    },

                    ontouchstart: move |evt: Event<TouchData>| {
                        let touches = evt.data().touches();
                        if let [t] = touches.as_slice() {
                            let c = t.client_coordinates();
                            touch_start_pos.set(Some((c.x, c.y)));
                            last_pos.set((c.x, c.y));
                            touch_did_pan.set(false);
                        } else {
                            touch_start_pos.set(None);
                        }
                    },

                    ontouchmove: move |evt: Event<TouchData>| {
                        let Some((sx, sy)) = *touch_start_pos.peek() else { return };
                        let touches = evt.data().touches();
                        let [t] = touches.as_slice() else { return };
                        let c = t.client_coordinates();
                        if !*touch_did_pan.peek()
                            && ((c.x - sx).abs() > TOUCH_DRAG_THRESHOLD || (c.y - sy).abs() > TOUCH_DRAG_THRESHOLD)
                        {
                            touch_did_pan.set(true);
                        }
                        if *touch_did_pan.peek() {
                            let (lx, ly) = *last_pos.peek();
                            if map.update(|_, h, _| h.drag_by(c.x - lx, c.y - ly)) {
                                evt.prevent_default();
                            }
                        }
                        last_pos.set((c.x, c.y));
                    },

                    ontouchend: move |_evt: Event<TouchData>| {
                        touch_start_pos.set(None);
                        touch_did_pan.set(false);
                    },

                    div { class: "tour-map__track", dangerous_inner_html: "{track_markup}" }

                    for pin in pins {
                        div {
                            key: "peak-{pin.id}",
                            class: "{marker_style.class_name}",
                            style: "left:{pin.left}px;top:{pin.top}px;width:{pin_size}px;height:{pin_size}px;",
                            role: "button",
                            tabindex: "0",
                            "aria-label": "{pin.label}",
                            onclick: move |evt: Event<MouseData>| {
                                evt.stop_propagation();
                                map.update(|e, h, c| e.focus_marker(pin.id, h, c)).ok();
                            },
                            onkeydown: move |evt: Event<KeyboardData>| {
                                if is_press_key(&evt.key().to_string()) {
                                    evt.prevent_default();
                                    evt.stop_propagation();
                                    map.update(|e, h, c| e.focus_marker(pin.id, h, c)).ok();
                                }
                            },
                            span { "{pin.number}" }
                            if pin.tooltip_open {
                                div {
                                    class: "{marker_style.tooltip_class}",
                                    style: "transform:translate(calc(-50% + {tip_dx}px), {tip_dy}px);",
                                    "{pin.label}"
                                }
                            }
                        }
                    }

                    for cluster in clusters {
                        div {
                            key: "cluster-{cluster.index}",
                            class: "{cluster.class_name}",
                            style: "left:{cluster.left}px;top:{cluster.top}px;width:{cluster.size}px;height:{cluster.size}px;",
                            title: "{cluster.tooltip}",
                            role: "button",
                            tabindex: "0",
                            "aria-label": "{cluster.tooltip}",
                            onclick: move |evt: Event<MouseData>| {
                                evt.stop_propagation();
                                map.update(|e, h, _| e.aggregate_clicked(cluster.index, h));
                            },
                            onkeydown: move |evt: Event<KeyboardData>| {
                                if is_press_key(&evt.key().to_string()) {
                                    evt.prevent_default();
                                    evt.stop_propagation();
                                    map.update(|e, h, _| e.aggregate_clicked(cluster.index, h));
                                }
                            },
                            span { "{cluster.count}" }
                        }
                    }

                    if overlay {
                        button {
                            class: "tour-map__activate",
                            r#type: "button",
                            onclick: move |evt: Event<MouseData>| {
                                evt.stop_propagation();
                                map.update(|e, h, _| e.activate(h));
                            },
                            "Click to interact with the map"
                        }
                    }
                }
            }

            if !chip_views.is_empty() {
                div { class: "tour-peak-chips", role: "group",
                    for (id, label, active) in chip_views {
                        button {
                            key: "chip-{id}",
                            r#type: "button",
                            class: if active { "tour-peak-chip is-active" } else { "tour-peak-chip" },
                            "data-peak-index": "{id}",
                            "aria-pressed": if active { "true" } else { "false" },
                            onclick: move |_| {
                                let raw = id.to_string();
                                map.update(|e, h, c| e.chip_activated(&raw, h, c)).ok();
                            },
                            "{label}"
                        }
                    }
                }
            }
        }
    }
}
