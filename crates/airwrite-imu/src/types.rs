use airwrite_config::{AxisRemap, ImuConfig};
use glam::Vec3;

/// One raw reading from the wrist board.
#[derive(Debug, Clone, Copy)]
pub struct RawImuSample {
    /// Gyroscope angular velocity (rad/s), bias not yet removed.
    pub gyro: Vec3,
    /// Accelerometer linear acceleration (g).
    pub accel: Vec3,
    /// Magnetometer field. Carried through but not fused.
    pub mag: Option<Vec3>,
}

impl RawImuSample {
    pub fn new(gyro: Vec3, accel: Vec3) -> Self {
        Self {
            gyro,
            accel,
            mag: None,
        }
    }
}

/// Per-unit gyroscope bias, measured once while the board lies still.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibrationOffsets {
    pub gx: f32,
    pub gy: f32,
    pub gz: f32,
}

impl CalibrationOffsets {
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.gx, self.gy, self.gz)
    }
}

impl From<Vec3> for CalibrationOffsets {
    fn from(v: Vec3) -> Self {
        Self {
            gx: v.x,
            gy: v.y,
            gz: v.z,
        }
    }
}

/// Turns a raw sample into estimator input: bias removal, then axis remap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImuInputAdapter {
    pub offsets: CalibrationOffsets,
    pub remap: AxisRemap,
}

impl ImuInputAdapter {
    pub fn new(offsets: CalibrationOffsets, remap: AxisRemap) -> Self {
        Self { offsets, remap }
    }

    pub fn from_config(config: &ImuConfig) -> Self {
        Self::new(config.gyro_offsets.into(), config.axis_remap)
    }

    /// Returns `(gyro, accel)` in the filter's body frame.
    pub fn adapt(&self, sample: &RawImuSample) -> (Vec3, Vec3) {
        let gyro = sample.gyro - self.offsets.as_vec3();
        (remap(self.remap, gyro), remap(self.remap, sample.accel))
    }
}

fn remap(remap: AxisRemap, v: Vec3) -> Vec3 {
    match remap {
        AxisRemap::Identity => v,
        AxisRemap::SwapXy => Vec3::new(v.y, v.x, v.z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_offsets_before_swapping() {
        let adapter = ImuInputAdapter::new(
            CalibrationOffsets {
                gx: 0.1,
                gy: 0.2,
                gz: 0.3,
            },
            AxisRemap::SwapXy,
        );
        let sample = RawImuSample::new(Vec3::new(1.1, 2.2, 3.3), Vec3::new(0.0, 1.0, 0.0));

        let (gyro, accel) = adapter.adapt(&sample);

        assert!((gyro.x - 2.0).abs() < 1e-6);
        assert!((gyro.y - 1.0).abs() < 1e-6);
        assert!((gyro.z - 3.0).abs() < 1e-6);
        assert_eq!(accel, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn identity_leaves_axes_alone() {
        let adapter = ImuInputAdapter::default();
        let sample = RawImuSample::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));

        let (gyro, accel) = adapter.adapt(&sample);

        assert_eq!(gyro, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(accel, Vec3::new(4.0, 5.0, 6.0));
    }
}
