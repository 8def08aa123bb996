use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::{decode_telemetry, HexBytes, TelemetryRecord, TELEMETRY_FRAME_SIZE, TELEMETRY_MARKER};
use crate::error::FrameError;

const INITIAL_BUFFER_CAPACITY: usize = 4 * TELEMETRY_FRAME_SIZE;

/// Outcome of one candidate telemetry window.
#[derive(Debug)]
pub enum DeframeEvent {
    /// A window passed validation.
    Telemetry(TelemetryRecord),
    /// A window was cut at a start marker but failed validation and was dropped.
    Rejected(FrameError),
}

/// Running counters for one receive buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeframeStats {
    /// Windows decoded successfully.
    pub frames: u64,
    /// Windows dropped after failing validation.
    pub rejected: u64,
    /// Bytes dropped while searching for a start marker.
    pub discarded: u64,
}

/// Recovers telemetry frames from an arbitrarily chunked byte stream.
///
/// Bytes are appended with [`Deframer::push`]; [`Deframer::next_event`] is
/// then called until it returns `None`. The result does not depend on how
/// the stream was split across pushes.
#[derive(Debug)]
pub struct Deframer {
    buf: BytesMut,
    stats: DeframeStats,
}

impl Deframer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            stats: DeframeStats::default(),
        }
    }

    /// Append newly arrived bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        trace!(buffered = %HexBytes(&self.buf), "receive buffer");
    }

    /// Cut the next candidate window, if enough bytes are buffered.
    ///
    /// Returns `None` once the buffer holds no complete window.
    pub fn next_event(&mut self) -> Option<DeframeEvent> {
        deframe(&mut self.buf, &mut self.stats)
    }

    /// Drain every event the buffered bytes currently yield.
    pub fn drain_events(&mut self) -> Vec<DeframeEvent> {
        std::iter::from_fn(|| self.next_event()).collect()
    }

    /// Drop everything buffered. Counters are kept.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Number of bytes waiting for more input.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn stats(&self) -> DeframeStats {
        self.stats
    }
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

/// One step of the de-framing loop over `src`.
///
/// While a full window could be present: find the first start marker,
/// dropping everything before it (or the whole buffer if there is none),
/// wait if fewer than a window's worth of bytes follow it, otherwise cut and
/// decode one window. A rejected window is consumed whole, so the next call
/// resumes scanning after it.
pub(crate) fn deframe(src: &mut BytesMut, stats: &mut DeframeStats) -> Option<DeframeEvent> {
    if src.len() < TELEMETRY_FRAME_SIZE {
        return None;
    }

    let Some(start) = src.iter().position(|&b| b == TELEMETRY_MARKER) else {
        debug!(
            dropped = src.len(),
            "no start marker (0xA5) in buffer, clearing"
        );
        stats.discarded += src.len() as u64;
        src.clear();
        return None;
    };

    if start > 0 {
        debug!(dropped = %HexBytes(&src[..start]), "dropping bytes before start marker");
        stats.discarded += start as u64;
        src.advance(start);
    }

    if src.len() < TELEMETRY_FRAME_SIZE {
        trace!(
            have = src.len(),
            need = TELEMETRY_FRAME_SIZE,
            "waiting for rest of frame"
        );
        return None;
    }

    let window = src.split_to(TELEMETRY_FRAME_SIZE);
    match decode_telemetry(&window) {
        Ok(record) => {
            trace!(frame = %HexBytes(&window), "telemetry frame");
            stats.frames += 1;
            Some(DeframeEvent::Telemetry(record))
        }
        Err(err) => {
            debug!(frame = %HexBytes(&window), %err, "rejected telemetry window");
            stats.rejected += 1;
            Some(DeframeEvent::Rejected(err))
        }
    }
}
