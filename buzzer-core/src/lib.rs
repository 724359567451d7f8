//! Platform-agnostic firmware logic for the quiz buzzer peripherals.
//!
//! Everything that makes a buzzer a buzzer lives here: button debouncing,
//! battery measurement, illumination control, and the peripheral protocol
//! state machine. Hardware access goes through small traits so one board
//! revision plugs in an RGB driver and a real battery sense channel while
//! the legacy board plugs in a single on/off LED and no sensing at all.
//!
//! # Execution tiers
//!
//! Firmware entry points are split across three tiers with strict rules:
//!
//! 1. **Interrupt**: a GPIO edge calls [`DeviceSession::on_button_edge`],
//!    which may only arm the debounce timer.
//! 2. **Timer expiry**: the debounce or LED timer fires; handlers may read
//!    settled pin state and update session state but never touch the radio
//!    or sleep.
//! 3. **Deferred work**: [`DeviceSession::run_pending`] drains the work
//!    queue; this is the only place radio operations and blocking LED
//!    sequences happen. In particular, the advertising restart after a link
//!    loss must go through the queue because the radio stack forbids
//!    reentrant calls from inside the disconnect callback.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for the radio-equipped button controllers it targets.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod battery;
pub mod button;
pub mod led;
pub mod service;
pub mod session;

pub use battery::{counts_to_millivolts, percent_from_millivolts, AdcConfig, BatterySense,
    PowerMonitor, SenseError};
pub use button::{ButtonEvent, DebounceFilter, DEBOUNCE_WINDOW_MS};
pub use led::{
    startup_self_test, IlluminationController, LedDriver, OnOffLed, LED_AUTO_OFF_TIMEOUT_MS,
};
pub use service::{BuzzerService, GattError, LinkState, NotifyOutcome};
pub use session::{Characteristic, DeviceSession, Radio, Work, WorkQueue};
