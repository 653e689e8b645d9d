use crate::viewport::{Control, Viewport};

/// One-way gate that keeps the map inert until the user opts in, so an
/// embedded map does not capture page scrolling or arrow keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionGuard {
    activated: bool,
}

impl InteractionGuard {
    /// Disable every wrapped control and show the activation affordance.
    pub fn arm<V: Viewport + ?Sized>(viewport: &mut V) -> Self {
        for control in Control::ALL {
            viewport.set_control(control, false);
        }
        viewport.set_activation_overlay(true);
        InteractionGuard { activated: false }
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Enable all controls and drop the overlay. Only the first call has any
    /// effect; returns whether this call performed the activation.
    pub fn activate<V: Viewport + ?Sized>(&mut self, viewport: &mut V) -> bool {
        if self.activated {
            return false;
        }
        self.activated = true;
        for control in Control::ALL {
            viewport.set_control(control, true);
        }
        viewport.set_activation_overlay(false);
        tracing::debug!("Map interaction activated");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeViewport};

    #[test]
    fn test_arm_disables_all_controls() {
        let mut vp = FakeViewport::new(10.0);
        let guard = InteractionGuard::arm(&mut vp);
        assert!(!guard.is_activated());
        for control in Control::ALL {
            assert!(!vp.control_enabled(control));
        }
        assert!(vp.overlay_visible);
    }

    #[test]
    fn test_activate_enables_everything_once() {
        let mut vp = FakeViewport::new(10.0);
        let mut guard = InteractionGuard::arm(&mut vp);
        vp.calls.clear();

        assert!(guard.activate(&mut vp));
        assert!(guard.is_activated());
        for control in Control::ALL {
            assert!(vp.control_enabled(control));
        }
        assert!(!vp.overlay_visible);
        let first_calls = vp.calls.len();
        assert_eq!(first_calls, Control::ALL.len() + 1);

        assert!(!guard.activate(&mut vp));
        assert_eq!(vp.calls.len(), first_calls);
        assert_eq!(vp.calls.last(), Some(&Call::Overlay(false)));
    }
}
