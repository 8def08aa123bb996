use std::fmt;
use std::io;

/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open or configure the named port.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Failed to enumerate the serial ports on this host.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred on an open port.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Which half of the link an I/O error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Classification of a transport-level failure.
///
/// Only [`TransportFault::ResourceGone`] is fatal to a session: the device
/// was unplugged or the driver tore the port down. Every other class is
/// reported and the link stays as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// The underlying device vanished.
    ResourceGone,
    /// The OS refused access to the port.
    PermissionDenied,
    /// The named port does not exist.
    NotFound,
    /// An operation did not complete within the configured timeout.
    Timeout,
    /// Reading from the port failed.
    Read,
    /// Writing to the port failed.
    Write,
    /// Anything not covered above.
    Other,
}

impl TransportFault {
    /// Classify an I/O error raised while reading or writing an open port.
    pub fn from_io(err: &io::Error, direction: Direction) -> Self {
        if err
            .raw_os_error()
            .is_some_and(|code| RESOURCE_GONE_OS_CODES.contains(&code))
        {
            return Self::ResourceGone;
        }

        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::ResourceGone,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            _ => match direction {
                Direction::Read => Self::Read,
                Direction::Write => Self::Write,
            },
        }
    }

    /// Classify an error reported by the serial port driver.
    pub fn from_serial(err: &serialport::Error) -> Self {
        match err.kind {
            serialport::ErrorKind::NoDevice => Self::ResourceGone,
            serialport::ErrorKind::Io(kind) => {
                Self::from_io(&io::Error::from(kind), Direction::Read)
            }
            serialport::ErrorKind::InvalidInput | serialport::ErrorKind::Unknown => Self::Other,
        }
    }

    /// Returns true if this fault ends the session.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::ResourceGone)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResourceGone => "resource gone",
            Self::PermissionDenied => "permission denied",
            Self::NotFound => "not found",
            Self::Timeout => "timeout",
            Self::Read => "read error",
            Self::Write => "write error",
            Self::Other => "unknown error",
        }
    }
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransportError {
    /// Fault class of this error, for callers that only care whether it is fatal.
    pub fn fault(&self) -> TransportFault {
        match self {
            TransportError::Open { source, .. } | TransportError::Enumerate(source) => {
                TransportFault::from_serial(source)
            }
            TransportError::Io(err) => TransportFault::from_io(err, Direction::Read),
        }
    }
}

// USB-serial adapters that are pulled mid-read surface as EIO/ENXIO/ENODEV.
#[cfg(unix)]
const RESOURCE_GONE_OS_CODES: &[i32] = &[libc::EIO, libc::ENXIO, libc::ENODEV];

// ERROR_BAD_COMMAND, ERROR_OPERATION_ABORTED, ERROR_DEVICE_NOT_CONNECTED, ERROR_DEVICE_REMOVED
#[cfg(windows)]
const RESOURCE_GONE_OS_CODES: &[i32] = &[22, 995, 1167, 1617];

#[cfg(not(any(unix, windows)))]
const RESOURCE_GONE_OS_CODES: &[i32] = &[];
