//! Buzzer identity: which of the two physical units a device is.
//!
//! Each unit is flashed with one identity at build time and exposes it
//! read-only over the identity characteristic. The game maps identity A to
//! the green buzzer and identity B to the red one.

use crate::payload::{PayloadError, IDENTITY_LEN};

/// Fixed role of a physical buzzer unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BuzzerId {
    /// Identity A, the green buzzer.
    A = 1,
    /// Identity B, the red buzzer.
    B = 2,
}

impl BuzzerId {
    /// Both identities, in fixed order. Handy for "do this to every buzzer"
    /// loops on the host.
    pub const ALL: [BuzzerId; 2] = [BuzzerId::A, BuzzerId::B];

    /// Wire encoding of the identity characteristic value.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        self as u8
    }

    /// Game-facing color name for this identity.
    #[must_use]
    pub const fn color_name(self) -> &'static str {
        match self {
            BuzzerId::A => "green",
            BuzzerId::B => "red",
        }
    }

    /// Full advertised device name for this identity.
    #[must_use]
    pub const fn device_name(self) -> &'static str {
        match self {
            BuzzerId::A => "Quiz Buzzer - Green",
            BuzzerId::B => "Quiz Buzzer - Red",
        }
    }

    /// Decode an identity characteristic payload. Any value other than 1 or
    /// 2 means a mis-flashed or foreign device and is rejected.
    pub fn from_wire_bytes(data: &[u8]) -> Result<Self, PayloadError> {
        if data.len() != IDENTITY_LEN {
            return Err(PayloadError::Length {
                expected: IDENTITY_LEN,
                actual: data.len(),
            });
        }
        match data[0] {
            1 => Ok(BuzzerId::A),
            2 => Ok(BuzzerId::B),
            other => Err(PayloadError::Value(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        for id in BuzzerId::ALL {
            let decoded = BuzzerId::from_wire_bytes(&[id.to_wire()]).unwrap();
            assert_eq!(decoded, id);
        }
    }

    #[test]
    fn rejects_unknown_identity_value() {
        assert_eq!(
            BuzzerId::from_wire_bytes(&[0]),
            Err(PayloadError::Value(0))
        );
        assert_eq!(
            BuzzerId::from_wire_bytes(&[3]),
            Err(PayloadError::Value(3))
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            BuzzerId::from_wire_bytes(&[1, 2]),
            Err(PayloadError::Length {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(
            BuzzerId::from_wire_bytes(&[]),
            Err(PayloadError::Length {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn names_match_game_convention() {
        assert_eq!(BuzzerId::A.color_name(), "green");
        assert_eq!(BuzzerId::B.color_name(), "red");
        assert!(BuzzerId::A.device_name().starts_with(crate::DEVICE_NAME_PREFIX));
        assert!(BuzzerId::B.device_name().starts_with(crate::DEVICE_NAME_PREFIX));
    }
}
