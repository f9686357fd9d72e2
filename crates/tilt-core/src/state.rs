use crate::constants::GYRO_DELTA_THRESHOLD;
use crate::host::{FrameHandle, TimerHandle};
use crate::values::Geometry;
use glam::DVec2;

/// Interaction phase of one bound target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// Pointer inside the target, geometry measured, no move yet.
    Entered,
    Tracking,
    Touching,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GyroSample {
    pub gamma: f64,
    pub beta: f64,
}

/// Absolute change between two consecutive orientation samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GyroDelta {
    pub gamma: f64,
    pub beta: f64,
}

impl GyroDelta {
    /// Any movement at all; enough to re-measure geometry.
    #[inline]
    pub fn is_motion(&self) -> bool {
        self.gamma > 0.0 || self.beta > 0.0
    }

    /// Movement above sensor jitter; only this schedules a write.
    #[inline]
    pub fn is_significant(&self) -> bool {
        self.gamma > GYRO_DELTA_THRESHOLD || self.beta > GYRO_DELTA_THRESHOLD
    }
}

/// What a scheduled frame write will do when it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingWrite {
    Update,
    Reset,
}

#[derive(Debug, Default)]
pub struct InteractionState {
    pub phase: Phase,
    pub geometry: Geometry,
    pub pointer: DVec2,
    pub gyro: GyroSample,
    pub prev_gyro: GyroSample,
    pub touch_engaged: bool,
    pub scheduled_write: Option<(FrameHandle, PendingWrite)>,
    pub transition_timeout: Option<TimerHandle>,
}

impl InteractionState {
    /// Shifts the current orientation sample into `prev_gyro` and returns the delta.
    pub fn sample_gyro(&mut self, gamma: f64, beta: f64) -> GyroDelta {
        self.prev_gyro = self.gyro;
        self.gyro = GyroSample { gamma, beta };
        GyroDelta {
            gamma: (self.prev_gyro.gamma - gamma).abs(),
            beta: (self.prev_gyro.beta - beta).abs(),
        }
    }
}
