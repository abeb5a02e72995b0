//! Fixed-step scheduling for hosts without their own physics clock.

use crate::error::ConfigError;

/// Largest frame delta fed into the accumulator (seconds).
///
/// Keeps a long stall from turning into a burst of catch-up steps.
pub const MAX_FRAME_DT_S: f32 = 0.25;

/// Upper bound on fixed steps run for a single frame.
pub const MAX_STEPS_PER_FRAME: u32 = 8;

const STEP_ROUNDING: f32 = 1.0e-4;

/// Accumulates variable frame time and hands out whole fixed steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedTimestep {
    fixed_dt: f32,
    accumulator_s: f32,
}

impl FixedTimestep {
    pub fn new(fixed_dt: f32) -> Result<Self, ConfigError> {
        if !(fixed_dt.is_finite() && fixed_dt > 0.0) {
            return Err(ConfigError::NonPositiveFixedDt { dt: fixed_dt });
        }
        Ok(Self {
            fixed_dt,
            accumulator_s: 0.0,
        })
    }

    #[inline]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Fraction of a step left in the accumulator, for render interpolation.
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.accumulator_s / self.fixed_dt
    }

    /// Add a frame's worth of time and return how many fixed steps to run now.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT_S)
        } else {
            0.0
        };
        self.accumulator_s =
            (self.accumulator_s + frame_dt).min(self.fixed_dt * MAX_STEPS_PER_FRAME as f32);

        // Whole steps, tolerant of the rounding left by repeated additions.
        let steps = ((self.accumulator_s / self.fixed_dt + STEP_ROUNDING).floor() as u32).min(MAX_STEPS_PER_FRAME);
        self.accumulator_s = (self.accumulator_s - steps as f32 * self.fixed_dt).max(0.0);
        steps
    }
}
