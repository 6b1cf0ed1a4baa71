//! FM operator building blocks: phase generator, sine lookup and envelope

use std::sync::OnceLock;

/// Entries in the sine table (one full cycle).
pub const SINE_LENGTH: usize = 1024;

/// Peak sine amplitude.
pub const SINE_PEAK: i32 = 4095;

/// Bits of the 32-bit phase accumulator below the sine index.
const PHASE_SHIFT: u32 = 22;

/// Envelope level at full output (Q16).
pub const ENVELOPE_MAX: u32 = 1 << 16;

/// Reference rate the envelope step sizes are specified at.
const ENVELOPE_REFERENCE_RATE: u64 = 44_100;

fn sine_table() -> &'static [i32; SINE_LENGTH] {
    static TABLE: OnceLock<[i32; SINE_LENGTH]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i32; SINE_LENGTH];
        for (i, entry) in table.iter_mut().enumerate() {
            let angle = i as f64 * std::f64::consts::TAU / SINE_LENGTH as f64;
            *entry = (angle.sin() * f64::from(SINE_PEAK)).round() as i32;
        }
        table
    })
}

/// Look up the sine table with wrap-around.
#[inline]
pub fn sine(index: i32) -> i32 {
    sine_table()[(index as usize) & (SINE_LENGTH - 1)]
}

/// Phase generator for one operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operator {
    phase: u32,
    increment: u32,
}

impl Operator {
    /// Set the per-sample phase increment.
    #[inline]
    pub fn set_increment(&mut self, increment: u32) {
        self.increment = increment;
    }

    /// Current phase increment.
    #[inline]
    pub fn increment(&self) -> u32 {
        self.increment
    }

    /// Sine index for the current phase plus a modulation offset.
    #[inline]
    pub fn index(&self, modulation: i32) -> i32 {
        (self.phase >> PHASE_SHIFT) as i32 + modulation
    }

    /// Advance one output sample.
    #[inline]
    pub fn advance(&mut self) {
        self.phase = self.phase.wrapping_add(self.increment);
    }

    /// Restart the waveform at phase zero.
    pub fn reset_phase(&mut self) {
        self.phase = 0;
    }
}

/// Envelope stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeState {
    /// Silent, waiting for key-on
    #[default]
    Off,
    /// Rising toward full level
    Attack,
    /// Holding full level while the key is down
    Sustain,
    /// Falling toward silence after key-off
    Release,
}

/// Linear attack/release envelope in Q16.
#[derive(Debug, Clone, Copy, Default)]
pub struct Envelope {
    level: u32,
    state: EnvelopeState,
    attack_step: u32,
    release_step: u32,
}

/// Per-sample level change for a 4-bit rate (0 = no movement).
pub fn rate_step(rate: u8, sample_rate: u32) -> u32 {
    if rate == 0 {
        return 0;
    }
    let step = (1u64 << (rate & 0x0F)) * ENVELOPE_REFERENCE_RATE / u64::from(sample_rate.max(1));
    step.clamp(1, u64::from(ENVELOPE_MAX)) as u32
}

impl Envelope {
    /// Set attack and release rates for the given output rate.
    pub fn set_rates(&mut self, attack: u8, release: u8, sample_rate: u32) {
        self.attack_step = rate_step(attack, sample_rate);
        self.release_step = rate_step(release, sample_rate);
    }

    /// Begin the attack stage.
    pub fn key_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    /// Begin the release stage.
    pub fn key_off(&mut self) {
        if self.state != EnvelopeState::Off {
            self.state = EnvelopeState::Release;
        }
    }

    /// Current stage.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current level (Q16, `0..=ENVELOPE_MAX`).
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Advance one output sample and return the new level.
    #[inline]
    pub fn advance(&mut self) -> u32 {
        match self.state {
            EnvelopeState::Off | EnvelopeState::Sustain => {}
            EnvelopeState::Attack => {
                self.level = (self.level + self.attack_step).min(ENVELOPE_MAX);
                if self.level == ENVELOPE_MAX {
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Release => {
                self.level = self.level.saturating_sub(self.release_step);
                if self.level == 0 {
                    self.state = EnvelopeState::Off;
                }
            }
        }
        self.level
    }

    /// Silence immediately.
    pub fn reset(&mut self) {
        self.level = 0;
        self.state = EnvelopeState::Off;
    }
}
