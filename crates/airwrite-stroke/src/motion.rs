use crate::types::{ConditionedDelta, EulerAngles, MotionDelta};
use airwrite_config::MotionConfig;
use glam::Vec2;

/// Bring an angle difference into (-180, 180] with at most one 360° shift.
pub fn wrap_degrees(d: f32) -> f32 {
    if d > 180.0 {
        d - 360.0
    } else if d <= -180.0 {
        d + 360.0
    } else {
        d
    }
}

/// Wrap-corrected `curr - prev` on every axis.
pub fn delta(prev: EulerAngles, curr: EulerAngles) -> MotionDelta {
    MotionDelta {
        yaw: wrap_degrees(curr.yaw - prev.yaw),
        pitch: wrap_degrees(curr.pitch - prev.pitch),
        roll: wrap_degrees(curr.roll - prev.roll),
    }
}

/// Turns successive attitudes into deltas and deltas into writing-plane motion.
///
/// Yaw drives the horizontal axis, pitch the vertical one. The current roll
/// rotates that pair, so twisting the wrist tilts the plane instead of
/// moving the cursor.
pub struct MotionMapper {
    prev: Option<EulerAngles>,
    horizontal_sign: f32,
    vertical_sign: f32,
    swap_pitch_roll: bool,
}

impl MotionMapper {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            prev: None,
            horizontal_sign: if config.invert_horizontal { -1.0 } else { 1.0 },
            vertical_sign: if config.invert_vertical { -1.0 } else { 1.0 },
            swap_pitch_roll: config.swap_pitch_roll,
        }
    }

    /// Apply the board-mounting correction to freshly converted angles.
    pub fn mount(&self, euler: EulerAngles) -> EulerAngles {
        if self.swap_pitch_roll {
            EulerAngles {
                yaw: euler.yaw,
                pitch: euler.roll,
                roll: euler.pitch,
            }
        } else {
            euler
        }
    }

    /// Delta against the previous call. The first call after construction
    /// or `reset` yields zero.
    pub fn next(&mut self, curr: EulerAngles) -> MotionDelta {
        let d = match self.prev {
            Some(prev) => delta(prev, curr),
            None => MotionDelta::default(),
        };
        self.prev = Some(curr);
        d
    }

    /// Map a conditioned delta onto the writing plane, rotated by `roll_deg`.
    pub fn project(&self, d: &ConditionedDelta, roll_deg: f32) -> Vec2 {
        let planar = Vec2::new(d.yaw * self.horizontal_sign, d.pitch * self.vertical_sign);
        Vec2::from_angle(roll_deg.to_radians()).rotate(planar)
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euler::to_euler;
    use glam::Quat;

    fn yaw(yaw: f32) -> EulerAngles {
        EulerAngles {
            yaw,
            ..Default::default()
        }
    }

    #[test]
    fn wraps_across_the_discontinuity() {
        assert!((delta(yaw(179.0), yaw(-179.0)).yaw - 2.0).abs() < 1e-4);
        assert!((delta(yaw(-179.0), yaw(179.0)).yaw + 2.0).abs() < 1e-4);
    }

    #[test]
    fn wrap_interval_is_half_open() {
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(-90.0), -90.0);
        assert_eq!(wrap_degrees(270.0), -90.0);
        assert_eq!(wrap_degrees(-270.0), 90.0);
    }

    #[test]
    fn same_attitude_gives_zero_delta() {
        let steps = [-2.5f32, -1.0, 0.0, 0.7, 2.9];
        for &a in &steps {
            for &b in &steps {
                let e = to_euler(Quat::from_rotation_z(a) * Quat::from_rotation_x(b));
                assert_eq!(delta(e, e), MotionDelta::default());
            }
        }
    }

    #[test]
    fn first_call_is_zero_then_tracks() {
        let mut mapper = MotionMapper::new(&MotionConfig::default());
        assert_eq!(mapper.next(yaw(40.0)), MotionDelta::default());
        assert!((mapper.next(yaw(45.0)).yaw - 5.0).abs() < 1e-5);

        mapper.reset();
        assert!(mapper.prev.is_none());
        assert_eq!(mapper.next(yaw(-100.0)), MotionDelta::default());
    }

    #[test]
    fn projects_yaw_and_pitch_onto_plane() {
        let mapper = MotionMapper::new(&MotionConfig::default());
        let d = ConditionedDelta {
            yaw: 2.0,
            pitch: -1.0,
            roll: 0.0,
        };
        let v = mapper.project(&d, 0.0);
        assert!((v - Vec2::new(2.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn roll_rotates_the_plane() {
        let mapper = MotionMapper::new(&MotionConfig::default());
        let d = ConditionedDelta {
            yaw: 1.0,
            pitch: 0.0,
            roll: 0.0,
        };
        let v = mapper.project(&d, 90.0);
        assert!((v - Vec2::new(0.0, 1.0)).length() < 1e-5, "{v:?}");
    }

    #[test]
    fn inversion_and_mount_swap() {
        let config = MotionConfig {
            invert_horizontal: true,
            swap_pitch_roll: true,
            ..MotionConfig::default()
        };
        let mapper = MotionMapper::new(&config);

        let v = mapper.project(
            &ConditionedDelta {
                yaw: 3.0,
                pitch: 1.0,
                roll: 0.0,
            },
            0.0,
        );
        assert!((v - Vec2::new(-3.0, 1.0)).length() < 1e-6);

        let mounted = mapper.mount(EulerAngles {
            yaw: 1.0,
            pitch: 2.0,
            roll: 3.0,
        });
        assert_eq!(
            mounted,
            EulerAngles {
                yaw: 1.0,
                pitch: 3.0,
                roll: 2.0
            }
        );
    }
}
