//! PSG envelope generator
//!
//! The envelope walks a 5-bit level through 32 steps per segment. The four
//! shape bits written to R13 (continue, attack, alternate, hold) decide what
//! happens at the end of each segment:
//!
//! | R13 | Shape |
//! |-----|-------|
//! | `00xx` | decay once, then silence |
//! | `01xx` | attack once, then silence |
//! | `1000` | repeating decay (saw down) |
//! | `1001` | decay once, then silence |
//! | `1010` | decay/attack triangle |
//! | `1011` | decay once, then hold max |
//! | `1100` | repeating attack (saw up) |
//! | `1101` | attack once, then hold max |
//! | `1110` | attack/decay triangle |
//! | `1111` | attack once, then silence |

/// Highest step index within one segment.
const STEP_MAX: i32 = 31;

/// Envelope generator clocked at the PSG internal rate.
#[derive(Clone, Debug, Default)]
pub struct EnvelopeGenerator {
    counter: u32,
    period: u32,
    step: i32,
    attack: u32,
    alternate: bool,
    hold: bool,
    holding: bool,
}

impl EnvelopeGenerator {
    /// Create a generator holding level 0.
    pub fn new() -> Self {
        Self {
            holding: true,
            ..Self::default()
        }
    }

    /// Set the 16-bit period from R11/R12.
    #[inline]
    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    /// Load a new shape from R13 and restart the envelope.
    pub fn set_shape(&mut self, shape: u8) {
        self.attack = if shape & 0x04 != 0 { STEP_MAX as u32 } else { 0 };
        if shape & 0x08 == 0 {
            // Non-continuing shapes behave as hold + (alternate == attack)
            self.hold = true;
            self.alternate = self.attack != 0;
        } else {
            self.hold = shape & 0x01 != 0;
            self.alternate = shape & 0x02 != 0;
        }
        self.step = STEP_MAX;
        self.counter = 0;
        self.holding = false;
    }

    /// Advance one internal tick.
    #[inline]
    pub fn tick(&mut self) {
        if self.holding {
            return;
        }
        self.counter += 1;
        if self.counter < self.period {
            return;
        }
        self.counter = 0;

        self.step -= 1;
        if self.step < 0 {
            if self.hold {
                if self.alternate {
                    self.attack ^= STEP_MAX as u32;
                }
                self.holding = true;
                self.step = 0;
            } else {
                if self.alternate {
                    self.attack ^= STEP_MAX as u32;
                }
                self.step &= STEP_MAX;
            }
        }
    }

    /// Current level, 0-31.
    #[inline]
    pub fn level(&self) -> u32 {
        (self.step as u32 & STEP_MAX as u32) ^ self.attack
    }

    /// Return to power-on state (silent, holding).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
