//! Debounce filter: raw edge interrupts in, clean press/release events out.
//!
//! The filter is a pure state machine so it can run against real GPIO
//! interrupts on the device and against scripted edges in host tests. The
//! platform glue owns the pin and the timer; it reports edges and timer
//! expiry here and arms the hardware timer when asked.

use buzzer_proto::ButtonState;

/// Default debounce window in milliseconds. Long enough to swallow contact
/// bounce on the arcade-style domes used in the buzzers.
pub const DEBOUNCE_WINDOW_MS: u64 = 50;

/// A confirmed button state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    pub state: ButtonState,
    /// Instant of the confirmed transition, in uptime milliseconds.
    pub at_ms: u64,
}

/// Debounces a noisy edge-interrupt input.
///
/// On the first edge a fixed window is armed and further edges are coalesced
/// into it. When the window expires the settled pin level is compared with
/// the last confirmed state; only a real change produces an event. A glitch
/// that resolves before expiry therefore produces nothing, and no sequence
/// of edges can yield more than one event per window.
#[derive(Debug)]
pub struct DebounceFilter {
    window_ms: u64,
    confirmed: ButtonState,
    last_transition_ms: Option<u64>,
    window_pending: bool,
}

impl DebounceFilter {
    #[must_use]
    pub const fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            confirmed: ButtonState::Released,
            last_transition_ms: None,
            window_pending: false,
        }
    }

    /// Handle a raw edge interrupt.
    ///
    /// Interrupt-tier: does not read the pin, does not block. Returns the
    /// deadline at which the caller must arm its one-shot timer, or `None`
    /// if a window is already pending and the edge was coalesced.
    #[must_use]
    pub fn on_edge(&mut self, now_ms: u64) -> Option<u64> {
        if self.window_pending {
            return None;
        }
        self.window_pending = true;
        Some(now_ms + self.window_ms)
    }

    /// Handle debounce timer expiry with the settled pin level.
    ///
    /// Timer-tier: the caller reads the pin once, after the window, and
    /// passes the level here. Returns a [`ButtonEvent`] only if the settled
    /// state differs from the last confirmed state.
    #[must_use]
    pub fn on_window_expired(&mut self, now_ms: u64, settled_pressed: bool) -> Option<ButtonEvent> {
        self.window_pending = false;
        let settled = ButtonState::from_pressed(settled_pressed);
        if settled == self.confirmed {
            return None;
        }
        self.confirmed = settled;
        self.last_transition_ms = Some(now_ms);
        Some(ButtonEvent {
            state: settled,
            at_ms: now_ms,
        })
    }

    /// Last confirmed state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ButtonState {
        self.confirmed
    }

    /// Instant of the last confirmed transition, if any.
    #[inline]
    #[must_use]
    pub const fn last_transition_ms(&self) -> Option<u64> {
        self.last_transition_ms
    }

    /// True while a debounce window is armed.
    #[inline]
    #[must_use]
    pub const fn window_pending(&self) -> bool {
        self.window_pending
    }
}

impl Default for DebounceFilter {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edge_arms_window() {
        let mut filter = DebounceFilter::new(50);
        assert_eq!(filter.on_edge(100), Some(150));
        assert!(filter.window_pending());
    }

    #[test]
    fn edges_inside_window_are_coalesced() {
        let mut filter = DebounceFilter::new(50);
        assert_eq!(filter.on_edge(100), Some(150));
        // Bounce: several more edges before expiry, none re-arm the timer.
        assert_eq!(filter.on_edge(101), None);
        assert_eq!(filter.on_edge(120), None);
        assert_eq!(filter.on_edge(149), None);

        let event = filter.on_window_expired(150, true).unwrap();
        assert_eq!(event.state, ButtonState::Pressed);
        assert_eq!(event.at_ms, 150);
    }

    #[test]
    fn one_event_per_window_regardless_of_noise() {
        let mut filter = DebounceFilter::new(50);
        let mut events = 0;
        filter.on_edge(0);
        for t in 1..50 {
            let _ = filter.on_edge(t);
        }
        if filter.on_window_expired(50, true).is_some() {
            events += 1;
        }
        assert_eq!(events, 1);
        assert_eq!(filter.state(), ButtonState::Pressed);
    }

    #[test]
    fn glitch_shorter_than_window_produces_nothing() {
        let mut filter = DebounceFilter::new(50);
        // Spike on the line: edge fires but the pin has settled back to
        // released by the time the window expires.
        assert_eq!(filter.on_edge(200), Some(250));
        assert_eq!(filter.on_window_expired(250, false), None);
        assert_eq!(filter.state(), ButtonState::Released);
        assert_eq!(filter.last_transition_ms(), None);
    }

    #[test]
    fn press_then_release_two_windows() {
        let mut filter = DebounceFilter::new(50);

        filter.on_edge(0);
        let press = filter.on_window_expired(50, true).unwrap();
        assert_eq!(press.state, ButtonState::Pressed);

        filter.on_edge(300);
        let release = filter.on_window_expired(350, false).unwrap();
        assert_eq!(release.state, ButtonState::Released);
        assert_eq!(filter.last_transition_ms(), Some(350));
    }

    #[test]
    fn event_reflects_settled_level_not_first_edge() {
        let mut filter = DebounceFilter::new(50);
        filter.on_edge(0);
        let _ = filter.on_window_expired(50, true);

        // Window opened by a release edge, but the button is held again by
        // the time it expires: still pressed, so no event at all.
        filter.on_edge(100);
        assert_eq!(filter.on_window_expired(150, true), None);
        assert_eq!(filter.state(), ButtonState::Pressed);
    }

    #[test]
    fn window_can_rearm_after_expiry() {
        let mut filter = DebounceFilter::new(50);
        filter.on_edge(0);
        let _ = filter.on_window_expired(50, true);
        assert!(!filter.window_pending());
        assert_eq!(filter.on_edge(60), Some(110));
    }
}
