//! Fixed-width characteristic payloads.
//!
//! Every characteristic carries an exact number of bytes. Decoding validates
//! the length and reports both the expected and actual sizes so a malformed
//! write can be rejected with a precise protocol error instead of being
//! silently truncated or padded.

/// Button state payload width.
pub const BUTTON_STATE_LEN: usize = 1;
/// Illumination control payload width (R, G, B).
pub const ILLUMINATION_LEN: usize = 3;
/// Device identity payload width.
pub const IDENTITY_LEN: usize = 1;
/// Battery level payload width.
pub const BATTERY_LEVEL_LEN: usize = 1;

/// Error produced when a payload fails validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Payload has the wrong number of bytes.
    Length { expected: usize, actual: usize },
    /// A byte held a value outside the characteristic's domain.
    Value(u8),
}

#[cfg(feature = "std")]
impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Length { expected, actual } => {
                write!(f, "payload length mismatch: expected {expected}, got {actual}")
            }
            PayloadError::Value(value) => write!(f, "value {value} outside characteristic domain"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PayloadError {}

/// Debounced button state as carried on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ButtonState {
    #[default]
    Released = 0,
    Pressed = 1,
}

impl ButtonState {
    #[inline]
    #[must_use]
    pub const fn is_pressed(self) -> bool {
        matches!(self, ButtonState::Pressed)
    }

    #[inline]
    #[must_use]
    pub const fn from_pressed(pressed: bool) -> Self {
        if pressed {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }

    /// Encode as the 1-byte characteristic value.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> [u8; BUTTON_STATE_LEN] {
        [self as u8]
    }

    /// Decode a button state notification payload.
    pub fn from_wire_bytes(data: &[u8]) -> Result<Self, PayloadError> {
        if data.len() != BUTTON_STATE_LEN {
            return Err(PayloadError::Length {
                expected: BUTTON_STATE_LEN,
                actual: data.len(),
            });
        }
        match data[0] {
            0 => Ok(ButtonState::Released),
            1 => Ok(ButtonState::Pressed),
            other => Err(PayloadError::Value(other)),
        }
    }
}

/// Illumination color, one intensity byte per channel.
///
/// On the legacy single-LED board the three channels collapse to on/off:
/// any nonzero channel lights the LED.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const OFF: Self = Self::new(0, 0, 0);
    /// Full green, the "correct answer" feedback color.
    pub const GREEN: Self = Self::new(0, 255, 0);
    /// Full red, the "incorrect answer" feedback color.
    pub const RED: Self = Self::new(255, 0, 0);
    /// Full white, used by the host test pattern and startup self-test.
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    #[must_use]
    pub const fn is_off(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Encode as the 3-byte characteristic value.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> [u8; ILLUMINATION_LEN] {
        [self.r, self.g, self.b]
    }

    /// Decode an illumination control write. The write must be exactly three
    /// bytes at offset zero; anything else is a protocol error.
    pub fn from_wire_bytes(data: &[u8]) -> Result<Self, PayloadError> {
        if data.len() != ILLUMINATION_LEN {
            return Err(PayloadError::Length {
                expected: ILLUMINATION_LEN,
                actual: data.len(),
            });
        }
        Ok(Self::new(data[0], data[1], data[2]))
    }
}

/// Encode a battery percentage, clamping to the 0-100 characteristic domain.
#[inline]
#[must_use]
pub const fn battery_level_to_wire(percent: u8) -> [u8; BATTERY_LEVEL_LEN] {
    [if percent > 100 { 100 } else { percent }]
}

/// Decode a battery level payload.
pub fn battery_level_from_wire(data: &[u8]) -> Result<u8, PayloadError> {
    if data.len() != BATTERY_LEVEL_LEN {
        return Err(PayloadError::Length {
            expected: BATTERY_LEVEL_LEN,
            actual: data.len(),
        });
    }
    match data[0] {
        level @ 0..=100 => Ok(level),
        other => Err(PayloadError::Value(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_state_round_trip() {
        for state in [ButtonState::Released, ButtonState::Pressed] {
            assert_eq!(ButtonState::from_wire_bytes(&state.to_wire()), Ok(state));
        }
    }

    #[test]
    fn button_state_rejects_bad_input() {
        assert_eq!(
            ButtonState::from_wire_bytes(&[2]),
            Err(PayloadError::Value(2))
        );
        assert_eq!(
            ButtonState::from_wire_bytes(&[0, 0]),
            Err(PayloadError::Length {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn rgb_exact_width_only() {
        assert_eq!(Rgb::from_wire_bytes(&[1, 2, 3]), Ok(Rgb::new(1, 2, 3)));
        for bad in [&[][..], &[1][..], &[1, 2][..], &[1, 2, 3, 4][..]] {
            assert_eq!(
                Rgb::from_wire_bytes(bad),
                Err(PayloadError::Length {
                    expected: 3,
                    actual: bad.len()
                })
            );
        }
    }

    #[test]
    fn rgb_off_detection() {
        assert!(Rgb::OFF.is_off());
        assert!(!Rgb::new(0, 0, 1).is_off());
        assert!(!Rgb::GREEN.is_off());
    }

    #[test]
    fn battery_level_clamps_on_encode() {
        assert_eq!(battery_level_to_wire(42), [42]);
        assert_eq!(battery_level_to_wire(100), [100]);
        assert_eq!(battery_level_to_wire(250), [100]);
    }

    #[test]
    fn battery_level_rejects_out_of_range_decode() {
        assert_eq!(battery_level_from_wire(&[100]), Ok(100));
        assert_eq!(battery_level_from_wire(&[101]), Err(PayloadError::Value(101)));
        assert_eq!(
            battery_level_from_wire(&[]),
            Err(PayloadError::Length {
                expected: 1,
                actual: 0
            })
        );
    }
}
