//! Wire protocol for the quiz buzzer devices.
//!
//! Each buzzer is a BLE peripheral exposing one custom service with three
//! characteristics (button state, illumination control, device identity) plus
//! the standard battery service. All payloads are little-endian and fixed
//! width; a write of the wrong length is a protocol error, never truncated
//! or padded.
//!
//! | Characteristic       | Properties   | Payload                          |
//! |----------------------|--------------|----------------------------------|
//! | Button State         | read, notify | 1 byte: 0 released, 1 pressed    |
//! | Illumination Control | read, write  | 3 bytes: R, G, B (0-255 each)    |
//! | Device Identity      | read         | 1 byte: 1 = green, 2 = red       |
//! | Battery Level        | read, notify | 1 byte: 0-100 percent            |
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for the host crate)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod identity;
pub mod ids;
pub mod payload;

pub use identity::BuzzerId;
pub use ids::{
    ADV_INTERVAL_MAX, ADV_INTERVAL_MIN, CONN_INTERVAL_MAX, CONN_INTERVAL_MIN, DEVICE_NAME_PREFIX,
    UUID_BATTERY_LEVEL, UUID_BATTERY_SERVICE, UUID_BUTTON_STATE, UUID_BUZZER_SERVICE,
    UUID_DEVICE_IDENTITY, UUID_ILLUMINATION_CONTROL,
};
pub use payload::{
    battery_level_from_wire, battery_level_to_wire, ButtonState, PayloadError, Rgb,
    BATTERY_LEVEL_LEN, BUTTON_STATE_LEN, IDENTITY_LEN, ILLUMINATION_LEN,
};
