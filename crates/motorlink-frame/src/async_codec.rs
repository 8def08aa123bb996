use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::COMMAND_FRAME_SIZE;
use crate::command::CommandRequest;
use crate::deframer::{deframe, DeframeEvent, DeframeStats};
use crate::error::FrameError;

/// `tokio_util` codec for a motor-controller link.
///
/// Decodes telemetry with the same resynchronising rules as
/// [`Deframer`](crate::Deframer) and encodes [`CommandRequest`]s.
/// Rejected windows are yielded as [`DeframeEvent::Rejected`] rather than as
/// stream errors, so one corrupt frame never ends a `FramedRead`.
#[derive(Debug, Default)]
pub struct TelemetryCodec {
    stats: DeframeStats,
}

impl TelemetryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DeframeStats {
        self.stats
    }
}

impl Decoder for TelemetryCodec {
    type Item = DeframeEvent;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(deframe(src, &mut self.stats))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(event) => Ok(Some(event)),
            None => {
                // A trailing partial frame can never complete.
                self.stats.discarded += buf.len() as u64;
                buf.clear();
                Ok(None)
            }
        }
    }
}

impl Encoder<CommandRequest> for TelemetryCodec {
    type Error = FrameError;

    fn encode(&mut self, item: CommandRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(COMMAND_FRAME_SIZE);
        dst.put_slice(&item.to_frame());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::codec::{encode_telemetry, TelemetryRecord};

    #[test]
    fn encoder_appends_command_frames() {
        let mut codec = TelemetryCodec::new();
        let mut dst = BytesMut::new();

        codec.encode(CommandRequest::start(), &mut dst).unwrap();
        codec
            .encode(CommandRequest::new(crate::CommandKind::Pwm, 55.0), &mut dst)
            .unwrap();

        assert_eq!(dst.len(), 2 * COMMAND_FRAME_SIZE);
        assert_eq!(&dst[7..], &[0xB5, 0x01, 0x00, 0x00, 0x5C, 0x42, 0xAA]);
    }

    #[test]
    fn decode_eof_drops_partial_tail() {
        let frame = encode_telemetry(&TelemetryRecord::default());
        let mut codec = TelemetryCodec::new();
        let mut src = BytesMut::from(&frame[..12]);

        assert!(codec.decode_eof(&mut src).unwrap().is_none());
        assert!(src.is_empty());
        assert_eq!(codec.stats().discarded, 12);
    }

    #[tokio::test]
    async fn framed_read_yields_records_in_order() {
        let first = TelemetryRecord {
            rpm: 900.0,
            ..TelemetryRecord::default()
        };
        let second = TelemetryRecord {
            rpm: 950.0,
            mode: 1,
            ..TelemetryRecord::default()
        };

        let mut wire = vec![0x07, 0x08];
        wire.extend_from_slice(&encode_telemetry(&first));
        wire.extend_from_slice(&encode_telemetry(&second));
        wire.extend_from_slice(&[0xA5, 0x00]);

        let mut framed = FramedRead::new(wire.as_slice(), TelemetryCodec::new());
        let mut seen = Vec::new();
        while let Some(event) = framed.next().await {
            match event.unwrap() {
                DeframeEvent::Telemetry(record) => seen.push(record),
                DeframeEvent::Rejected(err) => panic!("unexpected rejection: {err}"),
            }
        }

        assert_eq!(seen, vec![first, second]);
    }
}
