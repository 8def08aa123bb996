//! Connection lifecycle for a motor-controller link.
//!
//! A [`LinkSession`] opens a serial port, turns the incoming byte stream
//! into telemetry records, writes commands, and reports what happens to
//! subscribed [`LinkObserver`]s. Unplugging the device closes the session
//! and emits exactly one [`LinkEvent::Disconnected`].

pub mod error;
pub mod event;
pub mod session;

pub use error::{Result, SessionError};
pub use event::{LinkEvent, LinkObserver};
pub use session::{LinkSession, LinkState};
