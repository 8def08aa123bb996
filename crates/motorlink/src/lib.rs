//! Serial telemetry and control link for motor-controller boards.
//!
//! The controller streams 35-byte telemetry frames and accepts 7-byte
//! command frames over a plain serial line. This crate bundles the layers
//! that speak that protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial port setup, enumeration and fault classification
//! - [`frame`]: frame encoding, checksums and the resynchronising de-framer
//! - [`session`]: connection lifecycle and telemetry events (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use motorlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use motorlink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use motorlink_session::*;
}
