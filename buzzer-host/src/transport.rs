//! Transport traits between the connection manager and the BLE stack.
//!
//! The manager never talks to `bluest` directly; it goes through these
//! traits so its connection bookkeeping, event fan-out, and feedback logic
//! can be exercised against mock links. [`crate::ble`] provides the real
//! implementation.

use async_trait::async_trait;
use buzzer_proto::{ButtonState, BuzzerId, Rgb};
use tokio::sync::mpsc;

use crate::error::{ConnectError, LinkError};

/// Event pushed from an established link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Debounced button state notification.
    Button(ButtonState),
    /// Battery level notification.
    Battery(u8),
    /// The link is gone, voluntarily or not. Always the final event.
    Dropped,
}

/// An established connection to one buzzer peripheral.
#[async_trait]
pub trait BuzzerLink: Send + Sync {
    /// Read the identity characteristic.
    async fn read_identity(&self) -> Result<BuzzerId, LinkError>;

    /// Read the battery level, or `None` if the peripheral has no battery
    /// service. Absence is not an error.
    async fn read_battery(&self) -> Result<Option<u8>, LinkError>;

    /// Write the fixed-width illumination payload.
    async fn write_illumination(&self, color: Rgb) -> Result<(), LinkError>;

    /// Subscribe to button and battery notifications. Events arrive on the
    /// returned channel; [`LinkEvent::Dropped`] terminates it.
    async fn subscribe(&self) -> Result<mpsc::Receiver<LinkEvent>, LinkError>;

    /// Tear the link down. Idempotent.
    async fn disconnect(&self) -> Result<(), LinkError>;
}

/// Discovery and connection establishment.
///
/// `discover` suspends for as long as device selection takes; when selection
/// is interactive it may never resume until the user acts, and backing out
/// is the distinguished [`ConnectError::Cancelled`] outcome, not a timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn discover(&self, identity: BuzzerId) -> Result<Box<dyn BuzzerLink>, ConnectError>;
}
