//! Error types for the host-side connection manager.

use buzzer_proto::BuzzerId;
use thiserror::Error;

/// Failure of a link-level operation on an established connection.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// The underlying BLE operation failed. Covers a link dropping with the
    /// operation in flight; the stack reports that as a failed operation.
    #[error("link operation failed: {0}")]
    Io(String),
    /// The peripheral returned a payload the protocol does not allow.
    #[error("malformed payload: {0}")]
    Payload(#[from] buzzer_proto::PayloadError),
}

/// Failure of a `connect` call.
///
/// Cancellation is deliberately its own variant: a user backing out of the
/// pairing dialog is a normal outcome, not an error to surface, and callers
/// match on it to stay silent.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The user dismissed the device selection without picking a device.
    #[error("device selection cancelled")]
    Cancelled,
    /// No Bluetooth adapter is present or powered.
    #[error("no bluetooth adapter available")]
    NoAdapter,
    /// Scanning finished without a matching peripheral.
    #[error("no buzzer found for {0:?}")]
    NotFound(BuzzerId),
    /// The peripheral lacks a required service or characteristic.
    #[error("missing characteristic: {0}")]
    MissingCharacteristic(&'static str),
    /// The device reports a different identity than the one requested.
    /// Treated as a hard failure; relabeling would swap the players.
    #[error("identity mismatch: requested {requested:?}, device reports {reported:?}")]
    IdentityMismatch {
        requested: BuzzerId,
        reported: BuzzerId,
    },
    /// Any other connection failure, with enough detail to retry.
    #[error("connection failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl ConnectError {
    /// True for the distinguished user-cancelled outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConnectError::Cancelled)
    }
}

/// `disconnect_all` failure: only raised when every disconnect failed.
#[derive(Debug, Error)]
#[error("all disconnects failed: {0:?}")]
pub struct DisconnectAllError(pub Vec<(BuzzerId, LinkError)>);
