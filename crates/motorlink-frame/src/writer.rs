use std::io::{ErrorKind, Write};

use tracing::debug;

use crate::codec::{encode_command, HexBytes};
use crate::command::{CommandKind, CommandRequest};
use crate::error::{FrameError, Result};

/// Writes command frames to any `Write` stream.
///
/// Every frame is written in full and flushed before `send` returns; there
/// is no acknowledgement from the device to wait for.
pub struct CommandWriter<T> {
    inner: T,
}

impl<T: Write> CommandWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Write a complete command frame (blocking).
    pub fn write_request(&mut self, request: &CommandRequest) -> Result<()> {
        self.send(request.kind, request.value)
    }

    /// Encode and send one command.
    pub fn send(&mut self, kind: CommandKind, value: f32) -> Result<()> {
        let frame = encode_command(kind, value);

        let mut offset = 0usize;
        while offset < frame.len() {
            match self.inner.write(&frame[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        debug!(%kind, value, frame = %HexBytes(&frame), "sent command frame");
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
