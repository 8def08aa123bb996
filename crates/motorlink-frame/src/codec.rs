use std::fmt;

use bytes::{Buf, BufMut};

use crate::command::{CommandKind, CommandRequest, ControlMode, DUTY_PER_PERCENT};
use crate::error::{FrameError, Result};

/// Start marker of a device → host telemetry frame.
pub const TELEMETRY_MARKER: u8 = 0xA5;

/// Start marker of a host → device command frame.
pub const COMMAND_MARKER: u8 = 0xB5;

/// Telemetry frame: marker (1) + eight f32 fields (32) + mode (1) + checksum (1).
pub const TELEMETRY_FRAME_SIZE: usize = 35;

/// Command frame: marker (1) + tag (1) + f32 payload (4) + checksum (1).
pub const COMMAND_FRAME_SIZE: usize = 7;

/// One decoded telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryRecord {
    /// Shaft speed, rev/min.
    pub rpm: f32,
    /// PWM duty on the device's 0-255 scale.
    pub pwm: f32,
    /// Motor current, mA.
    pub current: f32,
    /// Supply voltage, V.
    pub voltage: f32,
    /// Electrical power, W.
    pub power: f32,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Raw mode byte; see [`TelemetryRecord::mode`].
    pub mode: u8,
}

impl TelemetryRecord {
    /// Typed control mode, `None` if the device sent an unknown value.
    pub fn control_mode(&self) -> Option<ControlMode> {
        ControlMode::from_wire(self.mode)
    }

    /// PWM duty expressed as 0-100 %.
    pub fn pwm_percent(&self) -> f32 {
        self.pwm / DUTY_PER_PERCENT
    }
}

/// XOR of every byte in `bytes`.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Decode a telemetry window.
///
/// Wire format (all fields little-endian):
/// ```text
/// ┌──────┬─────┬─────┬─────────┬─────────┬───────┬────┬────┬────┬──────┬──────┐
/// │ 0xA5 │ rpm │ pwm │ current │ voltage │ power │ kp │ ki │ kd │ mode │ xor  │
/// │  1B  │ f32 │ f32 │   f32   │   f32   │  f32  │f32 │f32 │f32 │  u8  │  u8  │
/// └──────┴─────┴─────┴─────────┴─────────┴───────┴────┴────┴────┴──────┴──────┘
/// ```
/// The checksum byte is the XOR of bytes 0-33.
pub fn decode_telemetry(window: &[u8]) -> Result<TelemetryRecord> {
    verify(window, TELEMETRY_FRAME_SIZE, TELEMETRY_MARKER)?;

    let mut fields = &window[1..TELEMETRY_FRAME_SIZE - 1];
    Ok(TelemetryRecord {
        rpm: fields.get_f32_le(),
        pwm: fields.get_f32_le(),
        current: fields.get_f32_le(),
        voltage: fields.get_f32_le(),
        power: fields.get_f32_le(),
        kp: fields.get_f32_le(),
        ki: fields.get_f32_le(),
        kd: fields.get_f32_le(),
        mode: fields.get_u8(),
    })
}

/// Encode a telemetry record exactly as the device firmware does.
pub fn encode_telemetry(record: &TelemetryRecord) -> [u8; TELEMETRY_FRAME_SIZE] {
    let mut frame = [0u8; TELEMETRY_FRAME_SIZE];
    {
        let mut dst = &mut frame[..TELEMETRY_FRAME_SIZE - 1];
        dst.put_u8(TELEMETRY_MARKER);
        dst.put_f32_le(record.rpm);
        dst.put_f32_le(record.pwm);
        dst.put_f32_le(record.current);
        dst.put_f32_le(record.voltage);
        dst.put_f32_le(record.power);
        dst.put_f32_le(record.kp);
        dst.put_f32_le(record.ki);
        dst.put_f32_le(record.kd);
        dst.put_u8(record.mode);
    }
    frame[TELEMETRY_FRAME_SIZE - 1] = xor_checksum(&frame[..TELEMETRY_FRAME_SIZE - 1]);
    frame
}

/// Encode a command frame.
///
/// Wire format:
/// ```text
/// ┌──────┬──────┬─────────────┬──────┐
/// │ 0xB5 │ tag  │ value f32LE │ xor  │
/// └──────┴──────┴─────────────┴──────┘
/// ```
/// PWM and RPM values are truncated to a whole number in 0-255 before
/// encoding; the firmware reads them as a duty byte.
pub fn encode_command(kind: CommandKind, value: f32) -> [u8; COMMAND_FRAME_SIZE] {
    let value = if kind.narrows_to_u8() {
        // `as` saturates and maps NaN to 0.
        f32::from(value as u8)
    } else {
        value
    };

    let mut frame = [0u8; COMMAND_FRAME_SIZE];
    {
        let mut dst = &mut frame[..COMMAND_FRAME_SIZE - 1];
        dst.put_u8(COMMAND_MARKER);
        dst.put_u8(kind.tag());
        dst.put_f32_le(value);
    }
    frame[COMMAND_FRAME_SIZE - 1] = xor_checksum(&frame[..COMMAND_FRAME_SIZE - 1]);
    frame
}

/// Decode a command window, as the device side would.
pub fn decode_command(window: &[u8]) -> Result<CommandRequest> {
    verify(window, COMMAND_FRAME_SIZE, COMMAND_MARKER)?;

    let kind = CommandKind::try_from(window[1])?;
    let mut payload = &window[2..COMMAND_FRAME_SIZE - 1];
    Ok(CommandRequest::new(kind, payload.get_f32_le()))
}

impl CommandRequest {
    /// Wire bytes for this request.
    pub fn to_frame(&self) -> [u8; COMMAND_FRAME_SIZE] {
        encode_command(self.kind, self.value)
    }
}

fn verify(window: &[u8], size: usize, marker: u8) -> Result<()> {
    if window.len() != size {
        return Err(FrameError::InvalidLength {
            expected: size,
            actual: window.len(),
        });
    }

    let (body, trailer) = window.split_at(size - 1);
    let expected = xor_checksum(body);
    if expected != trailer[0] {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual: trailer[0],
        });
    }

    if body[0] != marker {
        return Err(FrameError::InvalidMarker {
            expected: marker,
            found: body[0],
        });
    }

    Ok(())
}

/// Upper-case, space-separated hex rendering for frame dumps in logs.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TelemetryRecord {
        TelemetryRecord {
            rpm: 1480.5,
            pwm: 127.0,
            current: 312.25,
            voltage: 11.9,
            power: 3.72,
            kp: 0.8,
            ki: 0.05,
            kd: 0.01,
            mode: 1,
        }
    }

    #[test]
    fn test_telemetry_roundtrip() {
        let record = sample();
        let frame = encode_telemetry(&record);

        assert_eq!(frame.len(), TELEMETRY_FRAME_SIZE);
        assert_eq!(frame[0], TELEMETRY_MARKER);
        assert_eq!(decode_telemetry(&frame).unwrap(), record);
    }

    #[test]
    fn test_telemetry_field_offsets() {
        let frame = encode_telemetry(&sample());

        assert_eq!(&frame[1..5], &1480.5f32.to_le_bytes());
        assert_eq!(&frame[5..9], &127.0f32.to_le_bytes());
        assert_eq!(&frame[9..13], &312.25f32.to_le_bytes());
        assert_eq!(&frame[29..33], &0.01f32.to_le_bytes());
        assert_eq!(frame[33], 1);
        assert_eq!(frame[34], xor_checksum(&frame[..34]));
    }

    #[test]
    fn test_decode_wrong_length() {
        let frame = encode_telemetry(&sample());
        let result = decode_telemetry(&frame[..TELEMETRY_FRAME_SIZE - 1]);
        assert!(matches!(
            result,
            Err(FrameError::InvalidLength {
                expected: TELEMETRY_FRAME_SIZE,
                actual: 34
            })
        ));
    }

    #[test]
    fn test_any_single_byte_mutation_fails_telemetry() {
        let frame = encode_telemetry(&sample());
        for index in 0..TELEMETRY_FRAME_SIZE - 1 {
            for flip in [0x01u8, 0x80, 0xFF] {
                let mut corrupt = frame;
                corrupt[index] ^= flip;
                let result = decode_telemetry(&corrupt);
                assert!(
                    matches!(result, Err(FrameError::ChecksumMismatch { .. })),
                    "byte {index} flipped with {flip:#04x} decoded as {result:?}"
                );
            }
        }
    }

    #[test]
    fn test_wrong_marker_with_valid_checksum() {
        let mut frame = encode_telemetry(&sample());
        frame[0] = 0x5A;
        frame[34] = xor_checksum(&frame[..34]);
        assert!(matches!(
            decode_telemetry(&frame),
            Err(FrameError::InvalidMarker {
                expected: TELEMETRY_MARKER,
                found: 0x5A
            })
        ));
    }

    #[test]
    fn test_unknown_mode_is_preserved() {
        let record = TelemetryRecord {
            mode: 9,
            ..sample()
        };
        let decoded = decode_telemetry(&encode_telemetry(&record)).unwrap();
        assert_eq!(decoded.mode, 9);
        assert_eq!(decoded.control_mode(), None);
        assert_eq!(sample().control_mode(), Some(ControlMode::Automatic));
    }

    #[test]
    fn test_pwm_percent() {
        let record = TelemetryRecord {
            pwm: 255.0,
            ..TelemetryRecord::default()
        };
        assert!((record.pwm_percent() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_command_frame_shape() {
        for kind in CommandKind::ALL {
            let frame = encode_command(kind, 3.5);
            assert_eq!(frame.len(), COMMAND_FRAME_SIZE);
            assert_eq!(frame[0], COMMAND_MARKER);
            assert_eq!(frame[1], kind.tag());
            assert_eq!(frame[6], xor_checksum(&frame[..6]));
        }
    }

    #[test]
    fn test_set_pwm_55_wire_bytes() {
        let frame = encode_command(CommandKind::Pwm, 55.0);
        assert_eq!(frame, [0xB5, 0x01, 0x00, 0x00, 0x5C, 0x42, 0xAA]);
    }

    #[test]
    fn test_duty_commands_are_narrowed() {
        let cases = [
            (127.5f32, 127.0f32),
            (300.0, 255.0),
            (-4.0, 0.0),
            (f32::NAN, 0.0),
        ];
        for (input, expected) in cases {
            let frame = encode_command(CommandKind::Pwm, input);
            assert_eq!(&frame[2..6], &expected.to_le_bytes(), "input {input}");
        }

        let frame = encode_command(CommandKind::Rpm, 99.9);
        assert_eq!(&frame[2..6], &99.0f32.to_le_bytes());
    }

    #[test]
    fn test_gain_commands_keep_fraction() {
        let frame = encode_command(CommandKind::Kp, 0.35);
        assert_eq!(&frame[2..6], &0.35f32.to_le_bytes());
    }

    #[test]
    fn test_decode_command_roundtrip() {
        let request = CommandRequest::kd(0.125);
        let decoded = decode_command(&request.to_frame()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_any_single_byte_mutation_fails_command() {
        let frame = encode_command(CommandKind::Ki, 0.2);
        for index in 0..COMMAND_FRAME_SIZE - 1 {
            let mut corrupt = frame;
            corrupt[index] ^= 0x10;
            assert!(matches!(
                decode_command(&corrupt),
                Err(FrameError::ChecksumMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_decode_command_unknown_tag() {
        let mut frame = encode_command(CommandKind::Pwm, 1.0);
        frame[1] = 0x2A;
        frame[6] = xor_checksum(&frame[..6]);
        assert!(matches!(
            decode_command(&frame),
            Err(FrameError::UnknownCommand(0x2A))
        ));
    }

    #[test]
    fn test_command_frame_is_not_telemetry() {
        let frame = encode_command(CommandKind::StartStop, 1.0);
        assert!(matches!(
            decode_telemetry(&frame),
            Err(FrameError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_hex_rendering() {
        assert_eq!(HexBytes(&[0xB5, 0x01, 0x0a]).to_string(), "B5 01 0A");
        assert_eq!(HexBytes(&[]).to_string(), "");
    }
}
