//! Host side of the quiz buzzer subsystem.
//!
//! The [`BuzzerManager`] discovers and connects the two buzzer peripherals,
//! keeps one connection record per identity, and fans out press and status
//! events to the game. The [`FeedbackDispatcher`] sits between the manager
//! and the game loop: it gates presses on whether a question is open and
//! flashes the answering buzzer green or red once the answer is scored.
//!
//! BLE access goes through the [`transport`] traits; [`ble`] provides the
//! real implementation and tests substitute mock links.

pub mod ble;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod manager;
pub mod status;
pub mod transport;

pub use buzzer_proto::{BuzzerId, Rgb};
pub use config::HostConfig;
pub use dispatcher::{Answer, AnswerSink, FeedbackDispatcher, Verdict};
pub use error::{ConnectError, DisconnectAllError, LinkError};
pub use events::Observers;
pub use manager::{BuzzerManager, PressEvent};
pub use status::{BuzzerStatus, StatusSnapshot};
pub use transport::{BuzzerLink, LinkEvent, Transport};
