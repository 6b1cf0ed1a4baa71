//! One-pole DC blocker.
//!
//! PSG voices are unipolar, so their mix sits on an offset that moves with
//! the active volumes. The blocker is the classic
//! `y[n] = x[n] - x[n-1] + r * y[n-1]` high-pass with the pole derived from
//! the render sample rate, which keeps the corner frequency (and therefore
//! the settling time in milliseconds) the same at every output rate.

use std::f64::consts::TAU;

/// Corner frequency of the high-pass in Hz.
pub const CUTOFF_HZ: f64 = 10.0;

/// Fixed-point scale of the pole and of the output state (Q16).
const ONE: i64 = 1 << 16;

/// Fixed-point one-pole high-pass for one output side.
#[derive(Debug, Clone)]
pub struct DcFilter {
    sample_rate: u32,
    pole: i64,
    previous_input: i64,
    previous_output: i64,
}

impl DcFilter {
    /// Create a filter tuned for `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            pole: pole_for(sample_rate),
            previous_input: 0,
            previous_output: 0,
        }
    }

    /// Sample rate the pole is tuned for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Retune for a new render rate. The filter state is kept.
    #[inline]
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        let sample_rate = sample_rate.max(1);
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.pole = pole_for(sample_rate);
        }
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, sample: i32) -> i16 {
        let input = i64::from(sample) * ONE;
        // Division truncates toward zero, so the state decays to exactly 0
        let output = input - self.previous_input + self.previous_output * self.pole / ONE;
        self.previous_input = input;
        self.previous_output = output;
        (output / ONE).clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
    }

    /// Forget the signal history.
    pub fn reset(&mut self) {
        self.previous_input = 0;
        self.previous_output = 0;
    }
}

impl Default for DcFilter {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SAMPLE_RATE)
    }
}

fn pole_for(sample_rate: u32) -> i64 {
    let r = 1.0 - TAU * CUTOFF_HZ / f64::from(sample_rate.max(1));
    (r.clamp(0.0, 1.0) * ONE as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Milliseconds until a step of `step` decays below half.
    fn half_life_ms(sample_rate: u32) -> f64 {
        let mut filter = DcFilter::new(sample_rate);
        let step = 10_000;
        let mut samples = 0u32;
        while i32::from(filter.process(step)) > step / 2 {
            samples += 1;
        }
        f64::from(samples) * 1000.0 / f64::from(sample_rate)
    }

    #[test]
    fn test_constant_input_settles_to_zero() {
        let mut filter = DcFilter::new(44_100);
        for _ in 0..44_100 {
            filter.process(1000);
        }
        assert_eq!(filter.process(1000), 0);
    }

    #[test]
    fn test_step_passes_through() {
        let mut filter = DcFilter::new(44_100);
        for _ in 0..44_100 {
            filter.process(500);
        }
        assert!(filter.process(1500) > 900);
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut filter = DcFilter::new(48_000);
        for _ in 0..64 {
            assert_eq!(filter.process(0), 0);
        }
    }

    #[test]
    fn test_settling_time_independent_of_rate() {
        let reference = half_life_ms(44_100);
        assert_abs_diff_eq!(half_life_ms(8_000), reference, epsilon = 0.5);
        assert_abs_diff_eq!(half_life_ms(384_000), reference, epsilon = 0.5);
        // ln 2 / (2 pi fc)
        assert_abs_diff_eq!(reference, 11.0, epsilon = 0.5);
    }

    #[test]
    fn test_retune_changes_pole_only() {
        let mut filter = DcFilter::new(44_100);
        filter.process(3000);
        let state = filter.previous_output;
        filter.set_sample_rate(8_000);
        assert_eq!(filter.sample_rate(), 8_000);
        assert_eq!(filter.previous_output, state);
        assert_eq!(filter.pole, pole_for(8_000));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = DcFilter::new(44_100);
        for i in 0..100 {
            filter.process(i * 100);
        }
        filter.reset();
        assert_eq!(filter.process(0), 0);
    }
}
