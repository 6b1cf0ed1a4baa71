//! PSG tone and noise generators
//!
//! Both generators are clocked at the PSG internal rate (master clock / 8).

/// Square-wave generator for one voice.
///
/// The output flips every `period` internal ticks, giving a frequency of
/// `master_clock / (16 * period)`.
#[derive(Clone, Debug, Default)]
pub struct ToneGenerator {
    counter: u32,
    period: u32,
    output: bool,
}

impl ToneGenerator {
    /// Create a silent generator with period 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the 12-bit period.
    #[inline]
    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    /// Current period.
    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Periods 0 and 1 toggle every tick, which the DAC resolves as half amplitude.
    #[inline]
    pub fn is_half_amplitude(&self) -> bool {
        self.period <= 1
    }

    /// Advance one internal tick and return the output level.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.period {
            self.output = !self.output;
            self.counter = 0;
        }
        self.output
    }

    /// Return to power-on state.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.period = 0;
        self.output = false;
    }
}

/// Shared noise source: a 17-bit Galois LFSR clocked at half the tone rate.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    counter: u32,
    period: u32,
    lfsr: u32,
    output: bool,
    half_tick: bool,
}

impl NoiseGenerator {
    /// Create a generator with the LFSR seeded to 1.
    pub fn new() -> Self {
        Self {
            counter: 0,
            period: 0,
            lfsr: 1,
            output: false,
            half_tick: false,
        }
    }

    /// Set the 5-bit period (0 behaves like 1).
    #[inline]
    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    /// Advance one internal tick and return the output level.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.half_tick = !self.half_tick;
        if self.half_tick {
            self.counter += 1;
            if self.counter >= self.period.max(1) {
                // Taps at bits 13 and 16
                let lsb = self.lfsr & 1;
                self.lfsr >>= 1;
                if lsb != 0 {
                    self.lfsr ^= 0x12000;
                }
                self.output = lsb != 0;
                self.counter = 0;
            }
        }
        self.output
    }

    /// Return to power-on state.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.period = 0;
        self.lfsr = 1;
        self.output = false;
        self.half_tick = false;
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}
