use crate::types::{ImuInputAdapter, RawImuSample};
use ahrs::{Ahrs, Madgwick};
use airwrite_config::ImuConfig;
use glam::{Quat, Vec3};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Orientation estimator built on the Madgwick AHRS filter.
///
/// Runs one IMU-only fusion step per sample with a fixed period of
/// `1 / sample_rate_hz`. Samples that arrive late are still integrated with
/// the nominal period; the board paces the stream, not the host.
pub struct OrientationEstimator {
    filter: Madgwick<f64>,
    adapter: ImuInputAdapter,
    sample_period: f64,
}

impl OrientationEstimator {
    pub fn new(sample_rate_hz: f32, beta: f32, adapter: ImuInputAdapter) -> Self {
        let sample_period = 1.0 / sample_rate_hz as f64;
        Self {
            filter: Madgwick::new(sample_period, beta as f64),
            adapter,
            sample_period,
        }
    }

    pub fn from_config(config: &ImuConfig) -> Self {
        Self::new(
            config.sample_rate_hz,
            config.madgwick_beta,
            ImuInputAdapter::from_config(config),
        )
    }

    /// Fuse one bias-corrected sample and return the new attitude.
    ///
    /// A zero or non-finite `accel` skips the tilt correction for this step
    /// and integrates the gyro alone. A non-finite `gyro` leaves the attitude
    /// unchanged.
    pub fn update(&mut self, gyro: Vec3, accel: Vec3) -> Quat {
        if !gyro.is_finite() {
            tracing::trace!("Non-finite gyro sample, attitude held");
            return self.quaternion();
        }
        let gyro = Vector3::new(gyro.x as f64, gyro.y as f64, gyro.z as f64);

        if accel.is_finite() && accel.length_squared() > f32::EPSILON {
            let accel = Vector3::new(accel.x as f64, accel.y as f64, accel.z as f64);
            let prev = self.filter.quat;
            // A zero gradient (gravity already aligned) normalizes to NaN.
            let fused = self
                .filter
                .update_imu(&gyro, &accel)
                .map(|q| q.coords.iter().all(|c| c.is_finite()))
                .unwrap_or(false);
            if !fused {
                self.filter.quat = prev;
                self.integrate_gyro(&gyro);
            }
        } else {
            tracing::trace!("Degenerate accelerometer sample, gyro-only step");
            self.integrate_gyro(&gyro);
        }

        self.quaternion()
    }

    /// Run a raw sample through the input adapter, then fuse it.
    pub fn update_raw(&mut self, sample: &RawImuSample) -> Quat {
        let (gyro, accel) = self.adapter.adapt(sample);
        self.update(gyro, accel)
    }

    /// Current attitude as a unit quaternion.
    pub fn quaternion(&self) -> Quat {
        let q = self.filter.quat;
        Quat::from_xyzw(
            q.coords[0] as f32,
            q.coords[1] as f32,
            q.coords[2] as f32,
            q.coords[3] as f32, // w component
        )
        .normalize()
    }

    // q' = q + ½ q ⊗ (0, ω) dt, renormalized.
    fn integrate_gyro(&mut self, gyro: &Vector3<f64>) {
        let q = self.filter.quat.into_inner();
        let omega = Quaternion::new(0.0, gyro[0], gyro[1], gyro[2]);
        let q_dot = (q * omega) * 0.5;
        let next = q + q_dot * self.sample_period;
        if next.coords.iter().all(|c| c.is_finite()) && next.norm() > f64::EPSILON {
            self.filter.quat = UnitQuaternion::from_quaternion(next);
        }
    }
}
