use std::io::{Read, Write};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};

/// An open serial port, readable and writable.
///
/// This is the I/O type handed to the session layer. Reads honour the
/// configured timeout and fail with `TimedOut` when no byte arrived.
pub struct SerialStream {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl SerialStream {
    pub(crate) fn from_port(port: Box<dyn serialport::SerialPort>, name: impl Into<String>) -> Self {
        Self {
            port,
            name: name.into(),
        }
    }

    /// Discard anything the driver buffered before we started listening.
    pub fn clear_input(&self) -> Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(serial_to_transport_error)
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("name", &self.name)
            .finish()
    }
}

/// Opens byte streams to a device.
///
/// The session layer is generic over this so it can run against in-memory
/// streams as well as real serial ports.
pub trait Connector {
    type Stream: Read + Write;

    /// Open `port` with the given line configuration.
    fn connect(&mut self, port: &str, config: &SerialConfig) -> Result<Self::Stream>;
}

/// [`Connector`] backed by the host's serial ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Stream = SerialStream;

    fn connect(&mut self, port: &str, config: &SerialConfig) -> Result<SerialStream> {
        crate::serial::open(port, config)
    }
}

pub(crate) fn serial_to_transport_error(err: serialport::Error) -> TransportError {
    TransportError::Io(std::io::Error::from(err))
}
