use crate::accumulator::StrokeAccumulator;
use crate::conditioner::SignalConditioner;
use crate::euler::to_euler;
use crate::motion::MotionMapper;
use crate::types::{ConditionedDelta, EulerAngles, MotionDelta, SessionState, StrokeFrame};
use airwrite_config::{AppConfig, StreamKind};
use airwrite_imu::fusion::OrientationEstimator;
use airwrite_imu::protocol::{check_quaternion, check_raw, parse_record, ProtocolError, Record};
use airwrite_imu::types::RawImuSample;
use glam::{Quat, Vec2};

/// Everything one sample produced, from attitude to cursor.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub quaternion: Quat,
    pub euler: EulerAngles,
    pub delta: MotionDelta,
    pub conditioned: ConditionedDelta,
    pub planar: Vec2,
    pub cursor: Vec2,
}

/// The motion-to-stroke pipeline, driven one sample at a time.
///
/// Samples enter either as raw gyro/accel readings (fused here) or as
/// quaternions fused on the board. A sample that fails to decode, or that
/// carries non-finite or zero-length values, is skipped and leaves every
/// piece of state untouched.
pub struct StrokePipeline {
    estimator: OrientationEstimator,
    mapper: MotionMapper,
    conditioner: SignalConditioner,
    accumulator: StrokeAccumulator,
    stream: StreamKind,
    state: SessionState,
    samples: u64,
    skipped: u64,
}

impl StrokePipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            estimator: OrientationEstimator::from_config(&config.imu),
            mapper: MotionMapper::new(&config.motion),
            conditioner: SignalConditioner::from_config(&config.motion),
            accumulator: StrokeAccumulator::new(config.motion.scale, config.stroke.path_bound()),
            stream: config.transport.stream,
            state: SessionState::Idle,
            samples: 0,
            skipped: 0,
        }
    }

    /// Post-fusion entry: the board already produced the attitude.
    pub fn push_quaternion(&mut self, quaternion: Quat) -> Option<Step> {
        match check_quaternion(quaternion) {
            Ok(q) => Some(self.advance(q)),
            Err(e) => {
                self.skip(&e);
                None
            }
        }
    }

    /// Pre-fusion entry: bias removal, axis remap and one filter step first.
    pub fn push_raw(&mut self, sample: &RawImuSample) -> Option<Step> {
        match check_raw(*sample) {
            Ok(sample) => {
                let quaternion = self.estimator.update_raw(&sample);
                Some(self.advance(quaternion))
            }
            Err(e) => {
                self.skip(&e);
                None
            }
        }
    }

    pub fn push_record(&mut self, record: Record) -> Option<Step> {
        match record {
            Record::Quaternion(q) => self.push_quaternion(q),
            Record::Raw(sample) => self.push_raw(&sample),
        }
    }

    /// Decode one wire line and run it. Returns `None` for a skipped cycle.
    pub fn push_line(&mut self, line: &str) -> Option<Step> {
        match parse_record(self.stream, line) {
            Ok(record) => self.push_record(record),
            Err(e) => {
                self.skip(&e);
                None
            }
        }
    }

    fn advance(&mut self, quaternion: Quat) -> Step {
        let euler = self.mapper.mount(to_euler(quaternion));
        let delta = self.mapper.next(euler);
        let conditioned = self.conditioner.condition(delta);
        let planar = self.mapper.project(&conditioned, euler.roll);
        let cursor = self.accumulator.advance(planar);

        if self.state == SessionState::Idle {
            tracing::debug!("Stroke tracking started");
        }
        self.state = SessionState::Tracking;
        self.samples += 1;
        if self.samples % 1000 == 0 {
            tracing::debug!(
                samples = self.samples,
                skipped = self.skipped,
                "Stroke samples processed"
            );
        }

        Step {
            quaternion,
            euler,
            delta,
            conditioned,
            planar,
            cursor,
        }
    }

    /// Account for a cycle that produced no usable sample.
    pub fn skip(&mut self, err: &ProtocolError) {
        self.skipped += 1;
        tracing::trace!(%err, "Skipping sample");
    }

    /// Pen up: drop the stroke and wait for the next sample to start a new one.
    pub fn reset(&mut self) {
        self.mapper.reset();
        self.conditioner.reset();
        self.accumulator.reset();
        self.state = SessionState::Idle;
        tracing::info!("Stroke reset");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stream_kind(&self) -> StreamKind {
        self.stream
    }

    pub fn cursor(&self) -> Vec2 {
        self.accumulator.cursor()
    }

    pub fn current_path(&self) -> Vec<Vec2> {
        self.accumulator.current_path()
    }

    /// `(processed, skipped)` sample counts since start.
    pub fn counts(&self) -> (u64, u64) {
        (self.samples, self.skipped)
    }

    pub fn frame(&self) -> StrokeFrame {
        StrokeFrame {
            cursor: self.accumulator.cursor(),
            path: self.accumulator.current_path(),
            state: self.state,
        }
    }
}
