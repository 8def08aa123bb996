/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport could not be opened; the session stays closed.
    #[error("open failed: {0}")]
    Open(#[source] motorlink_transport::TransportError),

    /// Transport-level error on an open link.
    #[error("transport error: {0}")]
    Transport(#[from] motorlink_transport::TransportError),

    /// Frame-level error while writing a command.
    #[error("frame error: {0}")]
    Frame(#[from] motorlink_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
