//! Illumination controller: feedback light with an auto-off safety timer.
//!
//! Board revisions differ in what "light" means. The production board has an
//! RGB driver and shows real colors; the legacy board has a single white LED
//! behind the dome and collapses any nonzero color to "on". Both plug in
//! through [`LedDriver`]; nothing here conditionally compiles on the board.

use buzzer_proto::Rgb;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Auto-off timeout. A light the host forgot to clear must not drain the
/// cell overnight.
pub const LED_AUTO_OFF_TIMEOUT_MS: u64 = 5_000;

/// Number of on/off cycles in the connection acknowledgment blink.
pub const CONNECT_ACK_BLINKS: u8 = 5;
/// On and off time of each acknowledgment blink cycle.
pub const CONNECT_ACK_STEP_MS: u32 = 100;

/// Duration of each startup self-test color step.
pub const SELF_TEST_STEP_MS: u32 = 150;

/// Boot-time self-test: step each channel and finish off. On the legacy
/// board this degrades to three blinks of the single LED, which still proves
/// the driver and wiring. Blocking; run before the radio comes up.
pub fn startup_self_test<D: LedDriver, T: DelayNs>(driver: &mut D, delay: &mut T) {
    for color in [Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255)] {
        driver.apply(color);
        delay.delay_ms(SELF_TEST_STEP_MS);
        driver.apply(Rgb::OFF);
        delay.delay_ms(SELF_TEST_STEP_MS);
    }
}

/// Feedback light driver, implemented per board revision.
pub trait LedDriver {
    /// Apply a color. Drivers without color depth map any nonzero channel
    /// to fully lit.
    fn apply(&mut self, color: Rgb);
}

/// Legacy single-LED board driver: one GPIO, on or off.
pub struct OnOffLed<P> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> OnOffLed<P> {
    /// LED wired anode-to-pin (pin high = lit).
    #[must_use]
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// LED wired cathode-to-pin (pin low = lit), like the onboard status
    /// LED on the legacy controller.
    #[must_use]
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }
}

impl<P: OutputPin> LedDriver for OnOffLed<P> {
    fn apply(&mut self, color: Rgb) {
        let lit = !color.is_off();
        let high = lit != self.active_low;
        // A failed pin write leaves the previous light state; nothing useful
        // to do about it at this layer.
        let _ = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }
}

/// Owns the current color and the auto-off deadline.
pub struct IlluminationController<D> {
    driver: D,
    current: Rgb,
    auto_off_ms: u64,
    off_deadline_ms: Option<u64>,
}

impl<D: LedDriver> IlluminationController<D> {
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            current: Rgb::OFF,
            auto_off_ms: LED_AUTO_OFF_TIMEOUT_MS,
            off_deadline_ms: None,
        }
    }

    /// Override the auto-off timeout.
    #[must_use]
    pub fn with_auto_off_ms(mut self, auto_off_ms: u64) -> Self {
        self.auto_off_ms = auto_off_ms;
        self
    }

    /// Apply a color now. Any lit color arms the auto-off deadline; turning
    /// the light off disarms it.
    pub fn set(&mut self, color: Rgb, now_ms: u64) {
        self.driver.apply(color);
        self.current = color;
        self.off_deadline_ms = if color.is_off() {
            None
        } else {
            Some(now_ms + self.auto_off_ms)
        };
    }

    /// Timer-tier tick: turns the light off once the deadline has passed.
    /// Returns true if the light was turned off by this call.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match self.off_deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.driver.apply(Rgb::OFF);
                self.current = Rgb::OFF;
                self.off_deadline_ms = None;
                true
            }
            _ => false,
        }
    }

    /// Current color, as readable through the illumination characteristic.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> Rgb {
        self.current
    }

    /// Direct driver access for blocking sequences run from the work queue
    /// (connection acknowledgment, startup self-test).
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    #[derive(Default)]
    struct RecordingDriver {
        applied: Rc<RefCell<Vec<Rgb>>>,
    }

    impl LedDriver for RecordingDriver {
        fn apply(&mut self, color: Rgb) {
            self.applied.borrow_mut().push(color);
        }
    }

    struct FakePin {
        levels: Rc<RefCell<Vec<bool>>>,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.levels.borrow_mut().push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.levels.borrow_mut().push(true);
            Ok(())
        }
    }

    #[test]
    fn set_applies_verbatim_and_arms_auto_off() {
        let driver = RecordingDriver::default();
        let applied = driver.applied.clone();
        let mut led = IlluminationController::new(driver).with_auto_off_ms(5000);

        led.set(Rgb::new(10, 20, 30), 0);
        assert_eq!(led.current(), Rgb::new(10, 20, 30));
        assert!(!led.tick(4999));
        assert!(led.tick(5000));
        assert_eq!(led.current(), Rgb::OFF);
        assert_eq!(*applied.borrow(), vec![Rgb::new(10, 20, 30), Rgb::OFF]);
    }

    #[test]
    fn explicit_off_disarms_auto_off() {
        let mut led = IlluminationController::new(RecordingDriver::default());
        led.set(Rgb::GREEN, 0);
        led.set(Rgb::OFF, 100);
        assert!(!led.tick(u64::MAX));
    }

    #[test]
    fn tick_without_deadline_is_inert() {
        let mut led = IlluminationController::new(RecordingDriver::default());
        assert!(!led.tick(1_000_000));
    }

    #[derive(Default)]
    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn self_test_exercises_each_channel_and_ends_off() {
        let mut driver = RecordingDriver::default();
        let applied = driver.applied.clone();
        startup_self_test(&mut driver, &mut NoDelay);

        let applied = applied.borrow();
        assert_eq!(applied.len(), 6);
        assert_eq!(applied[0], Rgb::new(255, 0, 0));
        assert_eq!(applied[2], Rgb::new(0, 255, 0));
        assert_eq!(applied[4], Rgb::new(0, 0, 255));
        assert_eq!(*applied.last().unwrap(), Rgb::OFF);
    }

    #[test]
    fn on_off_driver_collapses_color_active_high() {
        let levels = Rc::new(RefCell::new(Vec::new()));
        let mut driver = OnOffLed::active_high(FakePin {
            levels: levels.clone(),
        });
        driver.apply(Rgb::new(0, 0, 1));
        driver.apply(Rgb::OFF);
        driver.apply(Rgb::WHITE);
        assert_eq!(*levels.borrow(), vec![true, false, true]);
    }

    #[test]
    fn on_off_driver_inverts_for_active_low() {
        let levels = Rc::new(RefCell::new(Vec::new()));
        let mut driver = OnOffLed::active_low(FakePin {
            levels: levels.clone(),
        });
        driver.apply(Rgb::GREEN);
        driver.apply(Rgb::OFF);
        assert_eq!(*levels.borrow(), vec![false, true]);
    }
}
