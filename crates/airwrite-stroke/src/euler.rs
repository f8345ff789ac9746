use crate::types::EulerAngles;
use glam::Quat;

/// Closed-form quaternion to yaw/pitch/roll, in degrees.
///
/// `q.w` is the scalar part. The pitch argument is clamped to [-1, 1] so
/// attitudes near ±90° pitch never produce NaN.
pub fn to_euler(q: Quat) -> EulerAngles {
    let (q0, q1, q2, q3) = (q.w, q.x, q.y, q.z);

    let roll = (q0 * q1 + q2 * q3).atan2(0.5 - (q1 * q1 + q2 * q2));
    let pitch = (-2.0 * (q1 * q3 - q0 * q2)).clamp(-1.0, 1.0).asin();
    let yaw = (q1 * q2 + q0 * q3).atan2(0.5 - (q2 * q2 + q3 * q3));

    EulerAngles {
        yaw: yaw.to_degrees(),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}
