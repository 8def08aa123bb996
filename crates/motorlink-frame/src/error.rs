/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The trailing byte does not match the XOR of the preceding bytes.
    #[error("checksum mismatch (computed {expected:#04x}, frame carries {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The window is not the fixed size for its frame shape.
    #[error("invalid frame length ({actual} bytes, expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    /// The first byte is not the start marker for this frame shape.
    #[error("invalid start marker {found:#04x} (expected {expected:#04x})")]
    InvalidMarker { expected: u8, found: u8 },

    /// A command frame carries a type tag outside the known set.
    #[error("unknown command tag {0:#04x}")]
    UnknownCommand(u8),

    /// An I/O error occurred while writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream stopped accepting bytes before a frame was fully written.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
