//! Fixed-size framing for motor-controller serial links.
//!
//! Two frame shapes share the link, each starting with its own marker byte
//! and ending with an XOR checksum of every preceding byte:
//! - Telemetry (device → host): `0xA5`, eight little-endian f32 fields, a
//!   mode byte, checksum. 35 bytes.
//! - Command (host → device): `0xB5`, type tag, little-endian f32 payload,
//!   checksum. 7 bytes.
//!
//! The [`Deframer`] recovers telemetry frames from a byte stream cut at
//! arbitrary points and resynchronises on the next marker after garbage or
//! a corrupt frame.

pub mod codec;
pub mod command;
pub mod deframer;
pub mod error;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_command, decode_telemetry, encode_command, encode_telemetry, xor_checksum, HexBytes,
    TelemetryRecord, COMMAND_FRAME_SIZE, COMMAND_MARKER, TELEMETRY_FRAME_SIZE, TELEMETRY_MARKER,
};
pub use command::{CommandKind, CommandRequest, ControlMode, DUTY_PER_PERCENT};
pub use deframer::{DeframeEvent, DeframeStats, Deframer};
pub use error::{FrameError, Result};
pub use writer::CommandWriter;

#[cfg(feature = "async")]
pub use async_codec::TelemetryCodec;
