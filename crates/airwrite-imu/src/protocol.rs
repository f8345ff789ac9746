use crate::types::RawImuSample;
use airwrite_config::StreamKind;
use glam::{Quat, Vec3};
use std::collections::VecDeque;
use std::num::ParseFloatError;
use thiserror::Error;

/// Longest line kept while waiting for a newline. A record is ~40 bytes.
const MAX_LINE_LEN: usize = 1024;

/// Fields in a fused record: `q0,q1,q2,q3`.
pub const QUATERNION_FIELDS: usize = 4;
/// Fields in a raw record: `gx,gy,gz,ax,ay,az`.
pub const RAW_FIELDS: usize = 6;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Empty record")]
    Empty,
    #[error("Expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("Field {index} is not a number")]
    InvalidNumber {
        index: usize,
        #[source]
        source: ParseFloatError,
    },
    #[error("Field {index} is not finite")]
    NonFinite { index: usize },
    #[error("Sample has non-finite components")]
    NonFiniteSample,
    #[error("Quaternion has zero length")]
    DegenerateQuaternion,
    #[error("Line exceeded {MAX_LINE_LEN} bytes without a terminator")]
    LineTooLong,
}

/// One decoded line of the sample stream.
#[derive(Debug, Clone, Copy)]
pub enum Record {
    /// Attitude fused on the board.
    Quaternion(Quat),
    /// Sensor reading still to be fused.
    Raw(RawImuSample),
}

/// Streaming line splitter for the serial sample stream.
///
/// Feed raw bytes via `push_data`, then drain decoded records via `next_record`.
pub struct RecordParser {
    buffer: VecDeque<u8>,
    kind: StreamKind,
}

impl RecordParser {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_LINE_LEN),
            kind,
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Try to extract the next complete line from the buffer.
    /// Returns `None` until a newline arrives.
    pub fn next_record(&mut self) -> Option<Result<Record, ProtocolError>> {
        let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
            if self.buffer.len() > MAX_LINE_LEN {
                self.buffer.clear();
                return Some(Err(ProtocolError::LineTooLong));
            }
            return None;
        };

        let line: Vec<u8> = self.buffer.drain(..=newline).collect();
        // The board occasionally emits garbage bytes on reset; keep what decodes.
        let text = String::from_utf8_lossy(&line);
        Some(parse_record(self.kind, &text))
    }
}

/// Decode one line according to the stream layout.
pub fn parse_record(kind: StreamKind, line: &str) -> Result<Record, ProtocolError> {
    match kind {
        StreamKind::Quaternion => parse_quaternion_record(line).map(Record::Quaternion),
        StreamKind::Raw => parse_raw_record(line).map(Record::Raw),
    }
}

/// Parse `q0,q1,q2,q3` (scalar first). Extra trailing fields are ignored.
///
/// The result is renormalized; four printed decimals rarely land exactly on
/// the unit sphere.
pub fn parse_quaternion_record(line: &str) -> Result<Quat, ProtocolError> {
    let [q0, q1, q2, q3] = parse_fields::<QUATERNION_FIELDS>(line)?;
    check_quaternion(Quat::from_xyzw(q1, q2, q3, q0))
}

/// Parse `gx,gy,gz,ax,ay,az` (rad/s, g).
pub fn parse_raw_record(line: &str) -> Result<RawImuSample, ProtocolError> {
    let [gx, gy, gz, ax, ay, az] = parse_fields::<RAW_FIELDS>(line)?;
    check_raw(RawImuSample::new(
        Vec3::new(gx, gy, gz),
        Vec3::new(ax, ay, az),
    ))
}

/// Accept a quaternion only if it is finite and not zero-length; return it normalized.
pub fn check_quaternion(q: Quat) -> Result<Quat, ProtocolError> {
    if !q.is_finite() {
        return Err(ProtocolError::NonFiniteSample);
    }
    if q.length_squared() <= f32::EPSILON {
        return Err(ProtocolError::DegenerateQuaternion);
    }
    // Components near f32::MAX overflow the length and normalize to zero.
    let unit = q.normalize();
    if unit.is_normalized() {
        Ok(unit)
    } else {
        Err(ProtocolError::DegenerateQuaternion)
    }
}

/// Accept a raw sample only if its gyro and accel readings are finite.
///
/// A zero accelerometer vector is allowed; the estimator falls back to the gyro.
pub fn check_raw(sample: RawImuSample) -> Result<RawImuSample, ProtocolError> {
    if sample.gyro.is_finite() && sample.accel.is_finite() {
        Ok(sample)
    } else {
        Err(ProtocolError::NonFiniteSample)
    }
}

/// Format a quaternion the way the board prints it: `q0,q1,q2,q3\n`, 4 decimals.
pub fn format_quaternion_record(q: Quat) -> String {
    format!("{:.4},{:.4},{:.4},{:.4}\n", q.w, q.x, q.y, q.z)
}

fn parse_fields<const N: usize>(line: &str) -> Result<[f32; N], ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < N {
        return Err(ProtocolError::TooFewFields {
            expected: N,
            found: parts.len(),
        });
    }

    let mut out = [0.0f32; N];
    for (index, (slot, part)) in out.iter_mut().zip(&parts).enumerate() {
        let value: f32 = part
            .trim()
            .parse()
            .map_err(|source| ProtocolError::InvalidNumber { index, source })?;
        if !value.is_finite() {
            return Err(ProtocolError::NonFinite { index });
        }
        *slot = value;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_first_quaternion() {
        let q = parse_quaternion_record("0.7071,0.0000,0.0000,0.7071\r\n").unwrap();
        assert!((q.w - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
        assert!((q.z - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
        assert!((q.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ignores_extra_fields() {
        let q = parse_quaternion_record("1.0,0.0,0.0,0.0,42,extra").unwrap();
        assert!(q.angle_between(Quat::IDENTITY) < 1e-6);
    }

    #[test]
    fn rejects_short_and_garbled_lines() {
        assert_eq!(
            parse_quaternion_record("1.0,0.0,0.0"),
            Err(ProtocolError::TooFewFields {
                expected: 4,
                found: 3
            })
        );
        assert_eq!(parse_quaternion_record("   "), Err(ProtocolError::Empty));
        assert!(matches!(
            parse_quaternion_record("1.0,abc,0.0,0.0"),
            Err(ProtocolError::InvalidNumber { index: 1, .. })
        ));
        assert_eq!(
            parse_quaternion_record("1.0,nan,0.0,0.0"),
            Err(ProtocolError::NonFinite { index: 1 })
        );
        assert_eq!(
            parse_quaternion_record("0.0,0.0,0.0,0.0"),
            Err(ProtocolError::DegenerateQuaternion)
        );
    }

    #[test]
    fn formats_with_four_decimals() {
        let q = Quat::from_rotation_z(90f32.to_radians());
        assert_eq!(format_quaternion_record(q), "0.7071,0.0000,0.0000,0.7071\n");
    }

    #[test]
    fn formatted_record_parses_back_to_the_same_attitude() {
        let q = Quat::from_rotation_y(0.3) * Quat::from_rotation_z(-1.2);
        let back = parse_quaternion_record(&format_quaternion_record(q)).unwrap();
        assert!(back.angle_between(q) < 1e-3);
    }

    #[test]
    fn parses_raw_record() {
        let s = parse_raw_record("0.1,-0.2,0.3,0.0,0.0,1.0").unwrap();
        assert_eq!(s.gyro, Vec3::new(0.1, -0.2, 0.3));
        assert_eq!(s.accel, Vec3::new(0.0, 0.0, 1.0));
        assert!(s.mag.is_none());
        assert!(matches!(
            parse_raw_record("0.1,0.2,0.3,0.0"),
            Err(ProtocolError::TooFewFields {
                expected: 6,
                found: 4
            })
        ));
    }

    #[test]
    fn checks_reject_unusable_samples() {
        assert_eq!(
            check_quaternion(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0)),
            Err(ProtocolError::NonFiniteSample)
        );
        assert_eq!(
            check_quaternion(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)),
            Err(ProtocolError::DegenerateQuaternion)
        );
        assert_eq!(
            check_quaternion(Quat::from_xyzw(f32::MAX, 0.0, 0.0, f32::MAX)),
            Err(ProtocolError::DegenerateQuaternion)
        );
        let q = check_quaternion(Quat::from_xyzw(0.0, 0.0, 0.0, 2.0)).unwrap();
        assert_eq!(q, Quat::IDENTITY);

        let bad_gyro = RawImuSample::new(Vec3::new(f32::INFINITY, 0.0, 0.0), Vec3::Z);
        assert_eq!(check_raw(bad_gyro).unwrap_err(), ProtocolError::NonFiniteSample);
        let bad_accel = RawImuSample::new(Vec3::ZERO, Vec3::new(0.0, f32::NAN, 1.0));
        assert_eq!(check_raw(bad_accel).unwrap_err(), ProtocolError::NonFiniteSample);
        assert!(check_raw(RawImuSample::new(Vec3::Z, Vec3::ZERO)).is_ok());
    }

    #[test]
    fn parser_splits_fragmented_lines() {
        let mut parser = RecordParser::new(StreamKind::Quaternion);

        parser.push_data(b"1.0000,0.00");
        assert!(parser.next_record().is_none());

        parser.push_data(b"00,0.0000,0.0000\n0.7071,0.0000,0.0000,0.7071\n");
        assert!(matches!(
            parser.next_record(),
            Some(Ok(Record::Quaternion(_)))
        ));
        match parser.next_record() {
            Some(Ok(Record::Quaternion(q))) => assert!((q.z - 0.7071).abs() < 1e-3),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parser.next_record().is_none());
    }

    #[test]
    fn parser_reports_bad_line_and_keeps_going() {
        let mut parser = RecordParser::new(StreamKind::Quaternion);
        parser.push_data(b"\xff\xfe,garbage\n1,0,0,0\n");

        assert!(matches!(parser.next_record(), Some(Err(_))));
        assert!(matches!(
            parser.next_record(),
            Some(Ok(Record::Quaternion(_)))
        ));
    }

    #[test]
    fn parser_drops_runaway_line() {
        let mut parser = RecordParser::new(StreamKind::Raw);
        parser.push_data(&[b'1'; MAX_LINE_LEN + 1]);
        assert_eq!(parser.next_record().unwrap().unwrap_err(), ProtocolError::LineTooLong);

        parser.push_data(b"0,0,0,0,0,1\n");
        assert!(matches!(parser.next_record(), Some(Ok(Record::Raw(_)))));
    }
}
