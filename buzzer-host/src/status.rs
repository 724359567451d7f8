//! Status snapshot: the read-only projection of the connection records
//! consumed by the game UI.

use buzzer_proto::BuzzerId;
use serde::Serialize;

/// State of one buzzer as last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuzzerStatus {
    /// Whether a live connection record exists for this identity.
    pub connected: bool,
    /// Last battery level received, if the peripheral reports one.
    pub battery: Option<u8>,
}

/// Connection state of both buzzers. Produced from the connection records;
/// never mutated directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub green: BuzzerStatus,
    pub red: BuzzerStatus,
}

impl StatusSnapshot {
    #[must_use]
    pub fn get(&self, id: BuzzerId) -> BuzzerStatus {
        match id {
            BuzzerId::A => self.green,
            BuzzerId::B => self.red,
        }
    }

    pub(crate) fn set(&mut self, id: BuzzerId, status: BuzzerStatus) {
        match id {
            BuzzerId::A => self.green = status,
            BuzzerId::B => self.red = status,
        }
    }
}
