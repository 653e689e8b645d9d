use crate::cluster::{self, Renderable};
use crate::config::EngineConfig;
use crate::error::{FocusError, MapError};
use crate::focus::{self, FocusController, FocusState, Transition};
use crate::geo;
use crate::guard::InteractionGuard;
use crate::ingest;
use crate::lifecycle::InstanceStatus;
use crate::markers::{self, MarkerRegistry};
use crate::models::{LatLng, MarkerId, PointRecord};
use crate::schedule::{Deferred, Phase, Task};
use crate::viewport::{Capability, ChipBar, DefaultView, Viewport, ViewportEvent};

/// Engine for one map container.
///
/// Owns the marker registry, the guard, the focus controller and the
/// deferred work queue. Nothing is shared between instances, so several maps
/// on one page fail or focus independently.
#[derive(Debug, Clone)]
pub struct RouteMap {
    config: EngineConfig,
    registry: MarkerRegistry,
    guard: InteractionGuard,
    focus: FocusController,
    deferred: Deferred,
    renderables: Vec<Renderable>,
    status: InstanceStatus,
}

impl RouteMap {
    pub fn new(records: &[PointRecord], config: EngineConfig) -> Self {
        let registry = MarkerRegistry::new(markers::build(records, &config));
        tracing::debug!(
            records = records.len(),
            markers = registry.len(),
            "Built peak markers"
        );
        RouteMap {
            config,
            registry,
            guard: InteractionGuard::default(),
            focus: FocusController::default(),
            deferred: Deferred::default(),
            renderables: Vec::new(),
            status: InstanceStatus::Pending,
        }
    }

    /// Build from the container's `data-peaks` and optional `data-map-config` attributes.
    pub fn from_attributes(peaks: Option<&str>, config: Option<&str>) -> Self {
        let config = config.map(EngineConfig::from_json_str).unwrap_or_default();
        let records = peaks.map(ingest::parse_point_records).unwrap_or_default();
        RouteMap::new(&records, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn status(&self) -> &InstanceStatus {
        &self.status
    }

    pub fn focus_state(&self) -> FocusState {
        self.focus.state()
    }

    pub fn guard_activated(&self) -> bool {
        self.guard.is_activated()
    }

    pub fn default_view(&self) -> Option<DefaultView> {
        self.focus.default_view()
    }

    pub fn has_pending(&self, phase: Phase) -> bool {
        self.deferred.has_pending(phase)
    }

    /// Arm the guard and show the first marker pass. The container must then
    /// deliver the track through [`track_loaded`](Self::track_loaded) or
    /// [`fail`](Self::fail).
    pub fn attach<V: Viewport + ?Sized>(&mut self, viewport: &mut V) -> Result<(), MapError> {
        if self.status != InstanceStatus::Pending {
            tracing::debug!("Map already initialized");
            return Ok(());
        }
        for capability in [Capability::MarkerLayer, Capability::TrackOverlay] {
            if !viewport.supports(capability) {
                let err = MapError::MissingCapability {
                    capability: capability.name(),
                };
                self.fail(err.clone(), viewport);
                return Err(err);
            }
        }

        self.status = InstanceStatus::Loading;
        self.guard = InteractionGuard::arm(viewport);
        self.recluster(viewport);
        Ok(())
    }

    /// Fit the view to the track plus every marker and remember that view.
    pub fn track_loaded<V: Viewport + ?Sized>(
        &mut self,
        track: &[LatLng],
        viewport: &mut V,
    ) -> Result<(), MapError> {
        if let InstanceStatus::Failed(err) = &self.status {
            return Err(err.clone());
        }
        let Some(mut bounds) = geo::track_bounds(track) else {
            self.fail(MapError::InvalidTrackBounds, viewport);
            return Err(MapError::InvalidTrackBounds);
        };
        for m in self.registry.as_slice() {
            bounds.extend(m.position);
        }

        let padding = self.config.bounds_padding;
        viewport.fit_bounds(&bounds, padding);
        self.focus.set_default_view(DefaultView { bounds, padding });
        self.deferred.schedule(Phase::Frame, Task::InvalidateSize);
        self.status = InstanceStatus::Ready;
        tracing::info!(
            vertices = track.len(),
            markers = self.registry.len(),
            "Track loaded"
        );
        Ok(())
    }

    /// Put the instance in its terminal error state.
    pub fn fail<V: Viewport + ?Sized>(&mut self, err: MapError, viewport: &mut V) {
        tracing::error!(error = ?err, "Map failed");
        viewport.show_error(&err.to_string());
        self.status = InstanceStatus::Failed(err);
    }

    /// Deliver a viewport lifecycle event.
    pub fn handle_event<V, C>(&mut self, event: ViewportEvent, viewport: &mut V, chips: &mut C)
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        if self.status.is_failed() {
            return;
        }
        match event {
            ViewportEvent::MoveStart | ViewportEvent::ZoomStart => {
                self.focus.viewport_interaction(viewport, chips);
            }
            ViewportEvent::ZoomEnd => {
                self.deferred.schedule(Phase::Frame, Task::Recluster);
            }
            ViewportEvent::MoveEnd => {}
        }
    }

    /// The activation overlay was clicked or key-activated.
    pub fn activate<V: Viewport + ?Sized>(&mut self, viewport: &mut V) -> bool {
        self.guard.activate(viewport)
    }

    /// A chip with `data-peak-index = raw_index` was activated.
    pub fn chip_activated<V, C>(
        &mut self,
        raw_index: &str,
        viewport: &mut V,
        chips: &mut C,
    ) -> Result<Transition, FocusError>
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        let id = focus::parse_chip_index(raw_index).inspect_err(|e| {
            tracing::warn!(error = %e, "Ignoring chip activation");
        })?;
        self.focus_marker(id, viewport, chips)
    }

    /// Focus `id`, or toggle it off if it is already focused. Marker clicks
    /// land here too, so chips and markers stay linked both ways.
    pub fn focus_marker<V, C>(
        &mut self,
        id: MarkerId,
        viewport: &mut V,
        chips: &mut C,
    ) -> Result<Transition, FocusError>
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        if self.status.is_failed() {
            return Ok(Transition::Unchanged);
        }
        self.focus
            .activate(
                id,
                &self.registry,
                &mut self.guard,
                viewport,
                chips,
                &mut self.deferred,
                self.config.max_zoom,
            )
            .inspect_err(|e| tracing::warn!(error = %e, "Ignoring focus request"))
    }

    /// Back to Idle and the fitted view.
    pub fn reset_focus<V, C>(&mut self, viewport: &mut V, chips: &mut C) -> Transition
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        self.focus.reset(viewport, chips, &mut self.deferred)
    }

    /// Zoom toward the aggregate rendered at `index`. Returns the new view.
    pub fn aggregate_clicked<V: Viewport + ?Sized>(
        &mut self,
        index: usize,
        viewport: &mut V,
    ) -> Option<(LatLng, f64)> {
        let centroid = self.renderables.iter().find_map(|r| match r {
            Renderable::Aggregate(a) if a.index == index => Some(a.centroid),
            _ => None,
        })?;
        let (center, zoom) = cluster::zoom_in_target(centroid, viewport.zoom(), &self.config);
        viewport.set_view(center, zoom);
        Some((center, zoom))
    }

    /// Run work queued for the next animation frame.
    pub fn run_frame<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        for task in self.deferred.take(Phase::Frame) {
            match task {
                Task::Recluster => self.recluster(viewport),
                Task::InvalidateSize => viewport.invalidate_size(),
                Task::EndProgrammaticChange => self.focus.end_programmatic_change(),
            }
        }
    }

    /// Run work queued for after the current task.
    pub fn run_tick(&mut self) {
        for task in self.deferred.take(Phase::Tick) {
            match task {
                Task::EndProgrammaticChange => self.focus.end_programmatic_change(),
                Task::Recluster | Task::InvalidateSize => {
                    self.deferred.schedule(Phase::Frame, task);
                }
            }
        }
    }

    fn recluster<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        if self.status.is_failed() {
            return;
        }
        let zoom = viewport.zoom();
        let clusters = cluster::cluster_with(self.registry.as_slice(), zoom, &self.config, |p, z| {
            viewport.project(p, z)
        });
        self.renderables = cluster::render_set(&clusters, &self.registry, &self.config);
        viewport.render_markers(&self.renderables);

        if let Some(id) = self.focus.active() {
            let visible = self
                .renderables
                .iter()
                .any(|r| matches!(r, Renderable::Single(m) if m.id == id));
            if visible {
                self.focus.reapply(viewport);
            }
        }
    }
}
