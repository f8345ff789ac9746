use crate::types::CalibrationOffsets;
use glam::Vec3;

/// Stationary samples averaged into a gyro bias.
pub const DEFAULT_CALIBRATION_SAMPLES: usize = 1000;

/// Averages gyro readings taken while the board lies still.
///
/// The result goes into `imu.gyro_offsets`; the pipeline itself never
/// calibrates.
pub struct GyroBiasCollector {
    samples: Vec<Vec3>,
    target: usize,
}

impl GyroBiasCollector {
    pub fn new(target: usize) -> Self {
        Self {
            samples: Vec::with_capacity(target),
            target: target.max(1),
        }
    }

    /// Record one reading. Returns the offsets once `target` readings are in.
    pub fn push(&mut self, gyro: Vec3) -> Option<CalibrationOffsets> {
        if self.samples.len() < self.target {
            self.samples.push(gyro);
        }
        self.offsets()
    }

    pub fn offsets(&self) -> Option<CalibrationOffsets> {
        if self.samples.len() < self.target {
            return None;
        }
        let sum: Vec3 = self.samples.iter().copied().sum();
        let bias = sum / self.samples.len() as f32;
        tracing::info!(
            bias_x = bias.x,
            bias_y = bias.y,
            bias_z = bias.z,
            "Gyro bias calibration complete"
        );
        Some(bias.into())
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.samples.len(), self.target)
    }
}

impl Default for GyroBiasCollector {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_SAMPLES)
    }
}
