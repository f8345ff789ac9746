use anyhow::{ensure, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where orientation records come from.
    pub transport: TransportConfig,
    /// Orientation estimator and input adapter.
    pub imu: ImuConfig,
    /// Delta mapping and conditioning.
    pub motion: MotionConfig,
    /// Stroke path bookkeeping.
    pub stroke: StrokeConfig,
}

impl AppConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.imu.sample_rate_hz > 0.0,
            "imu.sample_rate_hz must be positive (got {})",
            self.imu.sample_rate_hz
        );
        ensure!(
            self.imu.madgwick_beta > 0.0,
            "imu.madgwick_beta must be positive (got {})",
            self.imu.madgwick_beta
        );
        ensure!(
            self.motion.alpha > 0.0 && self.motion.alpha <= 1.0,
            "motion.alpha must be in (0, 1] (got {})",
            self.motion.alpha
        );
        ensure!(
            self.motion.deadzone >= 0.0,
            "motion.deadzone must not be negative (got {})",
            self.motion.deadzone
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Serial device the board enumerates as.
    pub port: String,
    pub baud_rate: u32,
    /// Record layout carried by each line.
    pub stream: StreamKind,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud_rate: 115_200,
            stream: StreamKind::Quaternion,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// `q0,q1,q2,q3` fused on the device.
    Quaternion,
    /// `gx,gy,gz,ax,ay,az` fused on the host.
    Raw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    /// Nominal sample rate. The filter integrates with a fixed `1 / rate` step.
    pub sample_rate_hz: f32,
    /// Madgwick filter beta parameter (convergence speed). Higher = more responsive, less smooth.
    pub madgwick_beta: f32,
    /// Per-unit gyroscope bias in rad/s, subtracted before fusion.
    #[serde(with = "vec3_serde")]
    pub gyro_offsets: Vec3,
    /// Mounting correction applied after bias removal.
    pub axis_remap: AxisRemap,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 104.0,
            madgwick_beta: 0.1,
            gyro_offsets: Vec3::ZERO,
            axis_remap: AxisRemap::Identity,
        }
    }
}

/// How sensor axes map onto the filter's body frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisRemap {
    #[default]
    Identity,
    /// Exchange X and Y on both gyro and accelerometer. Needed when the
    /// board is mounted rotated a quarter turn on the wrist strap.
    SwapXy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Smoothing factor in (0, 1]. Smaller = smoother, more lag.
    pub alpha: f32,
    /// Smoothed deltas below this magnitude (degrees) are treated as noise.
    pub deadzone: f32,
    /// Degrees of rotation to screen units.
    pub scale: f32,
    /// Mirror the horizontal axis (yaw).
    pub invert_horizontal: bool,
    /// Mirror the vertical axis (pitch).
    pub invert_vertical: bool,
    /// Exchange pitch and roll after Euler conversion, for boards whose
    /// pitch axis points along the forearm.
    pub swap_pitch_roll: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            deadzone: 0.02,
            scale: 18.0,
            invert_horizontal: false,
            invert_vertical: false,
            swap_pitch_roll: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    /// Oldest points are dropped past this length. `0` keeps everything.
    pub max_path_len: usize,
}

impl StrokeConfig {
    /// The path bound, or `None` when the path is unbounded.
    pub fn path_bound(&self) -> Option<usize> {
        (self.max_path_len > 0).then_some(self.max_path_len)
    }
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self { max_path_len: 400 }
    }
}

// glam vectors as plain TOML arrays.
mod vec3_serde {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec3, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec3, D::Error> {
        let [x, y, z] = <[f32; 3]>::deserialize(d)?;
        Ok(Vec3::new(x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [imu]
            gyro_offsets = [0.01, -0.02, 0.003]
            axis_remap = "swap_xy"

            [motion]
            alpha = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.imu.axis_remap, AxisRemap::SwapXy);
        assert!((config.imu.gyro_offsets.y + 0.02).abs() < 1e-6);
        assert!((config.imu.sample_rate_hz - 104.0).abs() < 1e-6);
        assert!((config.motion.alpha - 0.5).abs() < 1e-6);
        assert!((config.motion.deadzone - 0.02).abs() < 1e-6);
        assert_eq!(config.transport.stream, StreamKind::Quaternion);
        assert_eq!(config.stroke.path_bound(), Some(400));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = AppConfig::default();
        config.transport.stream = StreamKind::Raw;
        config.stroke.max_path_len = 0;

        let text = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();

        assert_eq!(back.transport.stream, StreamKind::Raw);
        assert_eq!(back.stroke.path_bound(), None);
        assert_eq!(back.transport.port, "/dev/ttyACM0");
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let mut config = AppConfig::default();
        config.motion.alpha = 0.0;
        assert!(config.validate().is_err());

        config.motion.alpha = 1.5;
        assert!(config.validate().is_err());

        config.motion.alpha = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_path_bound_from_file_is_unbounded() {
        let config: AppConfig = toml::from_str(
            r#"
            [stroke]
            max_path_len = 0
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.stroke.path_bound(), None);
    }
}
