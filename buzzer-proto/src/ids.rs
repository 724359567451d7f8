//! Service and characteristic identifiers plus radio timing constants.
//!
//! The custom service UUID family shares one base; the third byte group
//! selects the characteristic.

use uuid::Uuid;

/// Advertised name prefix shared by both buzzers. The host discovery filter
/// matches on this plus the custom service UUID.
pub const DEVICE_NAME_PREFIX: &str = "Quiz Buzzer";

/// Custom quiz buzzer service.
pub const UUID_BUZZER_SERVICE: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);

/// Button state characteristic (read, notify).
pub const UUID_BUTTON_STATE: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);

/// Illumination control characteristic (read, write).
pub const UUID_ILLUMINATION_CONTROL: Uuid =
    Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// Device identity characteristic (read).
pub const UUID_DEVICE_IDENTITY: Uuid = Uuid::from_u128(0x6e400004_b5a3_f393_e0a9_e50e24dcca9e);

/// Standard Battery Service. Optional on the wire: a peripheral without
/// voltage sensing may omit it and the host must still connect.
pub const UUID_BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

/// Standard Battery Level characteristic (read, notify).
pub const UUID_BATTERY_LEVEL: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);

/// Advertising interval bounds in 0.625 ms units. Moderate interval: quick
/// enough to find at the table, slow enough to last on an 18650 cell.
pub const ADV_INTERVAL_MIN: u16 = 0x0050; // 50 ms
pub const ADV_INTERVAL_MAX: u16 = 0x00a0; // 100 ms

/// Connection interval bounds in 1.25 ms units. Kept short so a press shows
/// up on the scoreboard without visible lag.
pub const CONN_INTERVAL_MIN: u16 = 8; // 10 ms
pub const CONN_INTERVAL_MAX: u16 = 12; // 15 ms

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_uuids_share_base() {
        let base = UUID_BUZZER_SERVICE.as_u128() & !(0xffff << 96);
        for uuid in [
            UUID_BUTTON_STATE,
            UUID_ILLUMINATION_CONTROL,
            UUID_DEVICE_IDENTITY,
        ] {
            assert_eq!(uuid.as_u128() & !(0xffff << 96), base);
        }
    }

    #[test]
    fn battery_uuids_are_standard() {
        assert_eq!(
            UUID_BATTERY_SERVICE.as_u128() >> 96,
            0x0000180f,
            "battery service must be the SIG-assigned 0x180F"
        );
        assert_eq!(UUID_BATTERY_LEVEL.as_u128() >> 96, 0x00002a19);
    }
}
