//! Per-voice stereo placement
//!
//! Each voice carries a pan position in `-1.0..=1.0` (hard left to hard
//! right). The stereo depth scales every position toward the centre, so a
//! depth of `0.0` collapses all voices to mono. Gains are precomputed as
//! 8.8 fixed point so the render loop stays integer-only.

/// Unity gain in 8.8 fixed point.
pub const UNITY_GAIN: i32 = 256;

/// Fixed-point stereo panner for `N` voices.
#[derive(Debug, Clone)]
pub struct Panner<const N: usize> {
    positions: [f32; N],
    depth: f32,
    gains: [(i32, i32); N],
}

impl<const N: usize> Panner<N> {
    /// Create a panner from per-voice positions at full depth.
    pub fn new(positions: [f32; N]) -> Self {
        let mut panner = Self {
            positions,
            depth: 1.0,
            gains: [(UNITY_GAIN, UNITY_GAIN); N],
        };
        panner.recompute();
        panner
    }

    /// Current stereo depth.
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Set the stereo depth (clamped to `0.0..=1.0`).
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = if depth.is_finite() {
            depth.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.recompute();
    }

    /// Move one voice (clamped to `-1.0..=1.0`).
    pub fn set_position(&mut self, voice: usize, position: f32) {
        if let Some(slot) = self.positions.get_mut(voice) {
            *slot = if position.is_finite() {
                position.clamp(-1.0, 1.0)
            } else {
                0.0
            };
            self.recompute();
        }
    }

    /// Left/right gains for a voice in 8.8 fixed point.
    #[inline]
    pub fn gains(&self, voice: usize) -> (i32, i32) {
        self.gains[voice]
    }

    /// Split a mono voice sample into left/right contributions.
    #[inline]
    pub fn apply(&self, voice: usize, sample: i32) -> (i32, i32) {
        let (left, right) = self.gains[voice];
        ((sample * left) >> 8, (sample * right) >> 8)
    }

    fn recompute(&mut self) {
        for (gain, &position) in self.gains.iter_mut().zip(self.positions.iter()) {
            let p = position * self.depth;
            let left = ((1.0 - p).min(1.0) * UNITY_GAIN as f32).round() as i32;
            let right = ((1.0 + p).min(1.0) * UNITY_GAIN as f32).round() as i32;
            *gain = (left, right);
        }
    }
}
