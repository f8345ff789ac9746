use crate::types::{ConditionedDelta, MotionDelta};
use airwrite_config::MotionConfig;

/// Per-axis exponential smoothing followed by a deadzone.
///
/// `smoothed = alpha * raw + (1 - alpha) * smoothed_prev`, then any axis with
/// `|smoothed| < deadzone` reads as zero. The deadzone only masks the output;
/// the running average keeps its value.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    alpha: f32,
    deadzone: f32,
    smoothed: MotionDelta,
}

impl SignalConditioner {
    pub fn new(alpha: f32, deadzone: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::MIN_POSITIVE, 1.0),
            deadzone: deadzone.max(0.0),
            smoothed: MotionDelta::default(),
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.alpha, config.deadzone)
    }

    pub fn condition(&mut self, raw: MotionDelta) -> ConditionedDelta {
        self.smoothed = MotionDelta {
            yaw: self.smooth(raw.yaw, self.smoothed.yaw),
            pitch: self.smooth(raw.pitch, self.smoothed.pitch),
            roll: self.smooth(raw.roll, self.smoothed.roll),
        };

        ConditionedDelta {
            yaw: self.gate(self.smoothed.yaw),
            pitch: self.gate(self.smoothed.pitch),
            roll: self.gate(self.smoothed.roll),
        }
    }

    /// Running average before the deadzone.
    pub fn smoothed(&self) -> MotionDelta {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = MotionDelta::default();
    }

    fn smooth(&self, raw: f32, prev: f32) -> f32 {
        self.alpha * raw + (1.0 - self.alpha) * prev
    }

    fn gate(&self, v: f32) -> f32 {
        if v.abs() < self.deadzone {
            0.0
        } else {
            v
        }
    }
}
