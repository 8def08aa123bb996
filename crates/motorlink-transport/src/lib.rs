//! Serial transport for motor-controller links.
//!
//! Opens and configures serial ports (8-N-1, no flow control), lists the
//! ports present on the host, and classifies transport failures so the
//! session layer can tell an unplugged device from a transient glitch.
//!
//! This is the lowest layer of motorlink. Everything else builds on top of
//! the [`Connector`] trait and the [`SerialStream`] type provided here.

pub mod config;
pub mod error;
pub mod serial;
pub mod traits;

pub use config::{
    is_standard_baud, SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT, STANDARD_BAUD_RATES,
};
pub use error::{Direction, Result, TransportError, TransportFault};
pub use serial::{available_ports, open, PortInfo, PortKind};
pub use traits::{Connector, SerialConnector, SerialStream};
