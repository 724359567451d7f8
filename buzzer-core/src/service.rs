//! Peripheral protocol service: characteristic values, subscription state,
//! and the advertising/connected state machine.
//!
//! This is the GATT-facing half of the firmware. It owns the characteristic
//! values and validates writes; it never talks to the radio itself. Anything
//! that must reach the radio (notifications, the advertising restart after a
//! link loss) is surfaced to [`DeviceSession`](crate::session::DeviceSession)
//! and executed from the deferred work queue.

use buzzer_proto::{
    battery_level_to_wire, ButtonState, BuzzerId, Rgb, BATTERY_LEVEL_LEN, BUTTON_STATE_LEN,
    IDENTITY_LEN, ILLUMINATION_LEN,
};

/// Radio link state. The service starts out advertising, accepts one central
/// at a time, and goes back to advertising when the link drops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Advertising,
    Connected,
}

/// Protocol-level error returned to the central for a malformed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GattError {
    /// Write payload is not the characteristic's fixed width.
    InvalidLength { expected: usize, actual: usize },
    /// Partial writes are not supported on any characteristic.
    InvalidOffset(usize),
}

/// Whether a value update should be pushed to the central.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyOutcome {
    /// Connected and subscribed: send the notification.
    Notify,
    /// No central connected; value stored, nothing sent.
    NotConnected,
    /// Central connected but not subscribed; soft no-op.
    NotSubscribed,
}

/// Characteristic values and subscription flags for one buzzer.
pub struct BuzzerService {
    identity: BuzzerId,
    state: LinkState,
    button_state: ButtonState,
    illumination: Rgb,
    battery_level: u8,
    button_notify: bool,
    battery_notify: bool,
}

impl BuzzerService {
    #[must_use]
    pub fn new(identity: BuzzerId) -> Self {
        Self {
            identity,
            state: LinkState::Advertising,
            button_state: ButtonState::Released,
            illumination: Rgb::OFF,
            battery_level: 100,
            button_notify: false,
            battery_notify: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    #[inline]
    #[must_use]
    pub const fn identity(&self) -> BuzzerId {
        self.identity
    }

    /// Inbound link established.
    pub fn on_connect(&mut self) {
        self.state = LinkState::Connected;
    }

    /// Link lost, voluntarily or not. Subscriptions are per-connection and
    /// reset here; the advertising restart itself is the session's job.
    pub fn on_disconnect(&mut self) {
        self.state = LinkState::Advertising;
        self.button_notify = false;
        self.battery_notify = false;
    }

    /// Button state characteristic read.
    #[must_use]
    pub const fn read_button_state(&self) -> [u8; BUTTON_STATE_LEN] {
        self.button_state.to_wire()
    }

    /// Illumination characteristic read.
    #[must_use]
    pub const fn read_illumination(&self) -> [u8; ILLUMINATION_LEN] {
        self.illumination.to_wire()
    }

    /// Identity characteristic read.
    #[must_use]
    pub const fn read_identity(&self) -> [u8; IDENTITY_LEN] {
        [self.identity.to_wire()]
    }

    /// Battery level characteristic read.
    #[must_use]
    pub const fn read_battery_level(&self) -> [u8; BATTERY_LEVEL_LEN] {
        battery_level_to_wire(self.battery_level)
    }

    /// Validate and store an illumination write. The payload must be exactly
    /// three bytes at offset zero; a malformed write is rejected with a
    /// protocol error and leaves the stored color untouched.
    pub fn write_illumination(&mut self, offset: usize, data: &[u8]) -> Result<Rgb, GattError> {
        if offset != 0 {
            return Err(GattError::InvalidOffset(offset));
        }
        let color = Rgb::from_wire_bytes(data).map_err(|_| GattError::InvalidLength {
            expected: ILLUMINATION_LEN,
            actual: data.len(),
        })?;
        self.illumination = color;
        Ok(color)
    }

    /// Central subscribed to or unsubscribed from button notifications.
    pub fn set_button_notify(&mut self, enabled: bool) {
        self.button_notify = enabled;
    }

    /// Central subscribed to or unsubscribed from battery notifications.
    pub fn set_battery_notify(&mut self, enabled: bool) {
        self.battery_notify = enabled;
    }

    /// Store a confirmed button state and decide whether to notify.
    pub fn update_button(&mut self, state: ButtonState) -> NotifyOutcome {
        self.button_state = state;
        self.notify_outcome(self.button_notify)
    }

    /// Store a measured battery level and decide whether to notify.
    pub fn update_battery(&mut self, level: u8) -> NotifyOutcome {
        self.battery_level = level;
        self.notify_outcome(self.battery_notify)
    }

    const fn notify_outcome(&self, subscribed: bool) -> NotifyOutcome {
        match self.state {
            LinkState::Advertising => NotifyOutcome::NotConnected,
            LinkState::Connected if !subscribed => NotifyOutcome::NotSubscribed,
            LinkState::Connected => NotifyOutcome::Notify,
        }
    }
}
