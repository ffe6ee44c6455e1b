//! Smoothed gain stage
//!
//! One-pole smoothing towards a target linear gain so profile switches never
//! step the signal. With time constant `tau` the per-sample coefficient is
//! `1 - exp(-1 / (tau * sample_rate))`; after `tau` the remaining distance to
//! the target is about 37%, after `5 * tau` under 1%.

use std::time::Duration;

/// Relative distance below which the ramp snaps onto its target
const SETTLE_EPSILON: f32 = 1e-6;

/// Click-free gain multiplier
#[derive(Debug, Clone)]
pub struct GainRamp {
    /// Gain applied to the last sample
    current: f32,

    /// Gain being approached
    target: f32,

    /// Per-sample smoothing coefficient (1.0 = no smoothing)
    coeff: f32,
}

impl GainRamp {
    /// Create a ramp settled at unity gain
    ///
    /// # Arguments
    /// * `sample_rate` - Rate at which [`GainRamp::next_gain`] is called
    /// * `time_constant` - Smoothing time constant (zero disables smoothing)
    pub fn new(sample_rate: u32, time_constant: Duration) -> Self {
        Self {
            current: 1.0,
            target: 1.0,
            coeff: Self::calculate_coeff(sample_rate, time_constant),
        }
    }

    fn calculate_coeff(sample_rate: u32, time_constant: Duration) -> f32 {
        let tau_samples = time_constant.as_secs_f64() * f64::from(sample_rate);
        if tau_samples <= 0.0 {
            return 1.0;
        }
        (1.0 - (-1.0 / tau_samples).exp()) as f32
    }

    /// Set the linear gain to approach
    pub fn set_target(&mut self, linear: f32) {
        self.target = linear.max(0.0);
    }

    /// Gain being approached
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Gain applied to the most recent sample
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Whether the ramp has reached its target
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Advance one sample and return the gain for it
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        if self.current != self.target {
            let next = self.current + self.coeff * (self.target - self.current);
            let tolerance = SETTLE_EPSILON * self.target.abs().max(1.0);
            // Near the target the f32 step can round to nothing
            self.current = if next == self.current || (self.target - next).abs() < tolerance {
                self.target
            } else {
                next
            };
        }
        self.current
    }
}
