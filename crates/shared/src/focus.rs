use crate::error::FocusError;
use crate::guard::InteractionGuard;
use crate::markers::MarkerRegistry;
use crate::models::MarkerId;
use crate::schedule::{Deferred, Phase, Task};
use crate::viewport::{ChipBar, DefaultView, Viewport};

/// Which marker, if any, is emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusState {
    #[default]
    Idle,
    Focused(MarkerId),
}

/// Outcome of a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Entered(MarkerId),
    Switched { from: MarkerId, to: MarkerId },
    Left(MarkerId),
}

/// Parse a chip's `data-peak-index` value.
pub fn parse_chip_index(raw: &str) -> Result<MarkerId, FocusError> {
    raw.trim()
        .parse::<usize>()
        .map(MarkerId)
        .map_err(|_| FocusError::InvalidChipIndex(raw.to_string()))
}

/// Links chips to markers with a single active selection.
///
/// Any view change the controller makes itself is bracketed by
/// [`begin_programmatic_change`](Self::begin_programmatic_change) and a
/// [`Task::EndProgrammaticChange`] queued for the next tick, so the move
/// events it triggers are not mistaken for the user panning away.
#[derive(Debug, Clone, Default)]
pub struct FocusController {
    state: FocusState,
    programmatic: bool,
    default_view: Option<DefaultView>,
}

impl FocusController {
    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn active(&self) -> Option<MarkerId> {
        match self.state {
            FocusState::Idle => None,
            FocusState::Focused(id) => Some(id),
        }
    }

    pub fn is_programmatic(&self) -> bool {
        self.programmatic
    }

    pub fn default_view(&self) -> Option<DefaultView> {
        self.default_view
    }

    pub fn set_default_view(&mut self, view: DefaultView) {
        self.default_view = Some(view);
    }

    pub fn begin_programmatic_change(&mut self, deferred: &mut Deferred) {
        self.programmatic = true;
        deferred.schedule(Phase::Tick, Task::EndProgrammaticChange);
    }

    pub fn end_programmatic_change(&mut self) {
        self.programmatic = false;
    }

    /// Handle a chip (or marker) activation for `id`.
    ///
    /// Activating the focused marker again toggles focus off and restores the
    /// default view. Otherwise any previous focus is cleared, the guard is
    /// opened if needed, and the view centers on the marker at `max_zoom`.
    #[allow(clippy::too_many_arguments)]
    pub fn activate<V, C>(
        &mut self,
        id: MarkerId,
        registry: &MarkerRegistry,
        guard: &mut InteractionGuard,
        viewport: &mut V,
        chips: &mut C,
        deferred: &mut Deferred,
        max_zoom: f64,
    ) -> Result<Transition, FocusError>
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        let marker = registry.get(id).ok_or(FocusError::UnknownMarker(id))?;

        if self.state == FocusState::Focused(id) {
            self.clear(viewport, chips);
            self.restore_default_view(viewport, deferred);
            tracing::debug!(marker = %id, "Peak focus toggled off");
            return Ok(Transition::Left(id));
        }

        guard.activate(viewport);

        let previous = self.active();
        if previous.is_some() {
            self.clear(viewport, chips);
        }

        self.begin_programmatic_change(deferred);
        viewport.set_view(marker.position, max_zoom);
        viewport.open_tooltip(id);
        chips.set_chip_active(id, true);
        self.state = FocusState::Focused(id);
        tracing::debug!(marker = %id, "Peak focused");

        Ok(match previous {
            Some(from) => Transition::Switched { from, to: id },
            None => Transition::Entered(id),
        })
    }

    /// A move or zoom started on the viewport. Unless the controller caused it,
    /// the user is navigating away and focus is dropped (the view stays put).
    pub fn viewport_interaction<V, C>(&mut self, viewport: &mut V, chips: &mut C) -> Transition
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        if self.programmatic {
            return Transition::Unchanged;
        }
        match self.state {
            FocusState::Idle => Transition::Unchanged,
            FocusState::Focused(id) => {
                self.clear(viewport, chips);
                tracing::debug!(marker = %id, "Peak focus dropped after manual navigation");
                Transition::Left(id)
            }
        }
    }

    /// Return to Idle and the default view regardless of the current state.
    pub fn reset<V, C>(&mut self, viewport: &mut V, chips: &mut C, deferred: &mut Deferred) -> Transition
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        let left = self.active();
        self.clear(viewport, chips);
        self.restore_default_view(viewport, deferred);
        match left {
            Some(id) => Transition::Left(id),
            None => Transition::Unchanged,
        }
    }

    /// Re-open the focused tooltip after the marker layer was replaced.
    pub fn reapply<V: Viewport + ?Sized>(&self, viewport: &mut V) {
        if let FocusState::Focused(id) = self.state {
            viewport.open_tooltip(id);
        }
    }

    fn clear<V, C>(&mut self, viewport: &mut V, chips: &mut C)
    where
        V: Viewport + ?Sized,
        C: ChipBar + ?Sized,
    {
        if let FocusState::Focused(id) = self.state {
            viewport.close_tooltip(id);
            chips.set_chip_active(id, false);
        }
        self.state = FocusState::Idle;
    }

    fn restore_default_view<V: Viewport + ?Sized>(&mut self, viewport: &mut V, deferred: &mut Deferred) {
        let Some(view) = self.default_view else {
            tracing::debug!("No fitted view to restore yet");
            return;
        };
        self.begin_programmatic_change(deferred);
        viewport.fit_bounds(&view.bounds, view.padding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::markers;
    use crate::models::{LatLngBounds, PointRecord};
    use crate::testing::{Call, FakeChips, FakeViewport};
    use crate::viewport::ViewportEvent;

    struct Rig {
        focus: FocusController,
        registry: MarkerRegistry,
        guard: InteractionGuard,
        vp: FakeViewport,
        chips: FakeChips,
        deferred: Deferred,
    }

    impl Rig {
        fn new() -> Self {
            let recs = vec![
                PointRecord::new(47.00, 11.00, Some("Eins")),
                PointRecord::new(47.05, 11.05, Some("Zwei")),
                PointRecord::new(47.10, 11.10, Some("Drei")),
            ];
            let registry = MarkerRegistry::new(markers::build(&recs, &EngineConfig::default()));
            let mut vp = FakeViewport::new(12.0);
            let guard = InteractionGuard::arm(&mut vp);
            let mut focus = FocusController::default();
            let bounds = LatLngBounds::from_points(registry.as_slice().iter().map(|m| m.position));
            focus.set_default_view(DefaultView {
                bounds: bounds.unwrap(),
                padding: (20.0, 20.0),
            });
            Rig {
                focus,
                registry,
                guard,
                vp,
                chips: FakeChips::default(),
                deferred: Deferred::default(),
            }
        }

        fn activate(&mut self, id: usize) -> Result<Transition, FocusError> {
            self.focus.activate(
                MarkerId(id),
                &self.registry,
                &mut self.guard,
                &mut self.vp,
                &mut self.chips,
                &mut self.deferred,
                18.0,
            )
        }

        /// Deliver queued move events, then let the next tick run.
        fn settle(&mut self) -> Vec<Transition> {
            let mut out = Vec::new();
            for event in self.vp.take_events() {
                if matches!(event, ViewportEvent::MoveStart | ViewportEvent::ZoomStart) {
                    out.push(self.focus.viewport_interaction(&mut self.vp, &mut self.chips));
                }
            }
            for task in self.deferred.take(Phase::Tick) {
                if task == Task::EndProgrammaticChange {
                    self.focus.end_programmatic_change();
                }
            }
            out
        }
    }

    #[test]
    fn test_parse_chip_index() {
        assert_eq!(parse_chip_index("2"), Ok(MarkerId(2)));
        assert_eq!(parse_chip_index(" 0 "), Ok(MarkerId(0)));
        assert!(matches!(parse_chip_index("-1"), Err(FocusError::InvalidChipIndex(_))));
        assert!(matches!(parse_chip_index("two"), Err(FocusError::InvalidChipIndex(_))));
    }

    #[test]
    fn test_focus_recenters_at_max_zoom() {
        let mut rig = Rig::new();
        assert_eq!(rig.activate(2), Ok(Transition::Entered(MarkerId(2))));
        assert_eq!(rig.focus.state(), FocusState::Focused(MarkerId(2)));

        let target = rig.registry.get(MarkerId(2)).unwrap().position;
        assert!(rig.vp.calls.contains(&Call::SetView(target, 18.0)));
        assert!(rig.vp.open_tooltips.contains(&MarkerId(2)));
        assert_eq!(rig.chips.active.iter().copied().collect::<Vec<_>>(), vec![MarkerId(2)]);
    }

    #[test]
    fn test_focus_opens_guard() {
        let mut rig = Rig::new();
        assert!(!rig.guard.is_activated());
        rig.activate(0).unwrap();
        assert!(rig.guard.is_activated());
        assert!(!rig.vp.overlay_visible);
    }

    #[test]
    fn test_own_recenter_does_not_defocus() {
        let mut rig = Rig::new();
        rig.activate(1).unwrap();
        let transitions = rig.settle();
        assert!(transitions.iter().all(|t| *t == Transition::Unchanged));
        assert_eq!(rig.focus.state(), FocusState::Focused(MarkerId(1)));
        assert!(!rig.focus.is_programmatic());
    }

    #[test]
    fn test_manual_pan_defocuses_without_moving() {
        let mut rig = Rig::new();
        rig.activate(1).unwrap();
        rig.settle();
        rig.vp.calls.clear();

        rig.vp.user_pan();
        let transitions = rig.settle();
        assert_eq!(transitions[0], Transition::Left(MarkerId(1)));
        assert_eq!(rig.focus.state(), FocusState::Idle);
        assert!(rig.chips.active.is_empty());
        assert!(rig.vp.open_tooltips.is_empty());
        assert!(!rig.vp.calls.iter().any(|c| matches!(c, Call::SetView(..) | Call::FitBounds(_))));
    }

    #[test]
    fn test_manual_pan_before_tick_is_ignored() {
        // The flag stays up until the tick runs, covering events from the animation.
        let mut rig = Rig::new();
        rig.activate(1).unwrap();
        rig.vp.user_pan();
        for _ in rig.vp.take_events() {
            rig.focus.viewport_interaction(&mut rig.vp, &mut rig.chips);
        }
        assert_eq!(rig.focus.state(), FocusState::Focused(MarkerId(1)));
    }

    #[test]
    fn test_toggle_same_chip_restores_fitted_view() {
        let mut rig = Rig::new();
        rig.activate(2).unwrap();
        rig.settle();

        assert_eq!(rig.activate(2), Ok(Transition::Left(MarkerId(2))));
        assert_eq!(rig.focus.state(), FocusState::Idle);
        assert!(rig.chips.active.is_empty());
        assert!(rig.vp.open_tooltips.is_empty());
        let fitted = rig.focus.default_view().unwrap().bounds;
        assert_eq!(rig.vp.calls.last(), Some(&Call::FitBounds(fitted)));

        // The restore is ours too: it must not count as manual navigation.
        assert!(rig.settle().iter().all(|t| *t == Transition::Unchanged));
    }

    #[test]
    fn test_switch_clears_previous_first() {
        let mut rig = Rig::new();
        rig.activate(0).unwrap();
        rig.settle();
        rig.vp.calls.clear();

        assert_eq!(
            rig.activate(1),
            Ok(Transition::Switched {
                from: MarkerId(0),
                to: MarkerId(1)
            })
        );
        let close_at = rig.vp.calls.iter().position(|c| *c == Call::CloseTooltip(MarkerId(0)));
        let open_at = rig.vp.calls.iter().position(|c| *c == Call::OpenTooltip(MarkerId(1)));
        assert!(close_at.unwrap() < open_at.unwrap());
        assert_eq!(rig.chips.active.len(), 1);
        assert!(rig.chips.active.contains(&MarkerId(1)));
        assert_eq!(rig.vp.open_tooltips.len(), 1);
    }

    #[test]
    fn test_unknown_marker_rejected() {
        let mut rig = Rig::new();
        rig.activate(0).unwrap();
        assert_eq!(rig.activate(7), Err(FocusError::UnknownMarker(MarkerId(7))));
        assert_eq!(rig.focus.state(), FocusState::Focused(MarkerId(0)));
    }

    #[test]
    fn test_reset_from_idle_still_restores_view() {
        let mut rig = Rig::new();
        let t = rig.focus.reset(&mut rig.vp, &mut rig.chips, &mut rig.deferred);
        assert_eq!(t, Transition::Unchanged);
        assert!(matches!(rig.vp.calls.last(), Some(Call::FitBounds(_))));
    }

    #[test]
    fn test_toggle_without_default_view_only_clears() {
        let mut rig = Rig::new();
        rig.focus.default_view = None;
        rig.activate(0).unwrap();
        rig.settle();
        rig.vp.calls.clear();
        rig.activate(0).unwrap();
        assert_eq!(rig.focus.state(), FocusState::Idle);
        assert!(!rig.vp.calls.iter().any(|c| matches!(c, Call::FitBounds(_))));
    }
}
