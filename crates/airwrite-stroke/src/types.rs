use glam::Vec2;

/// Attitude as yaw/pitch/roll, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerAngles {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Frame-to-frame change in attitude. Every axis lies in (-180, 180].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionDelta {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// A `MotionDelta` after smoothing and deadzone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConditionedDelta {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Whether a stroke is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No sample since start or the last reset.
    #[default]
    Idle,
    Tracking,
}

/// What the renderer sees after each processed sample.
#[derive(Debug, Clone, Default)]
pub struct StrokeFrame {
    pub cursor: Vec2,
    /// Oldest point first.
    pub path: Vec<Vec2>,
    pub state: SessionState,
}
