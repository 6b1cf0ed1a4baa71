//! Programmable sound generator (AY-3-8910 / YM2149 family)
//!
//! Three square-wave voices, one shared noise source and one hardware
//! envelope, clocked at `master_clock / 8`. The internal state machine is
//! stepped with a cycle accumulator and every internal tick inside one output
//! sample is OR-ed into the channel gates, so very high tone frequencies still
//! produce sound instead of aliasing away.
//!
//! # Register map
//!
//! | Reg | Purpose |
//! |-----|---------|
//! | R0/R1 | Tone A period (12 bit) |
//! | R2/R3 | Tone B period |
//! | R4/R5 | Tone C period |
//! | R6 | Noise period (5 bit) |
//! | R7 | Mixer: bits 0-2 tone off, bits 3-5 noise off |
//! | R8-R10 | Volume A-C, bit 4 selects the envelope |
//! | R11/R12 | Envelope period (16 bit) |
//! | R13 | Envelope shape |
//! | R14/R15 | I/O ports (stored, inaudible) |

pub mod envelope;
pub mod generators;
pub mod tables;

pub use envelope::EnvelopeGenerator;
pub use generators::{NoiseGenerator, ToneGenerator};

use crate::dc_filter::DcFilter;
use crate::error::ChipError;
use crate::model::{ChipKind, ChipModel, StereoFrame, WriteOutcome};
use crate::panning::Panner;
use crate::voice::VoiceMask;
use crate::Result;
use tables::{AY_LEVELS, REGISTER_MASK, VOICE_NAMES, YM_LEVELS};

/// Number of PSG registers.
pub const REGISTER_COUNT: u16 = 16;

/// Number of square voices.
pub const NUM_VOICES: usize = 3;

/// Mixer register value at power-on (all tone and noise outputs disabled).
const MIXER_POWER_ON: u8 = 0x3F;

/// Default stereo placement: A left, B centre, C right.
const DEFAULT_PAN: [f32; NUM_VOICES] = [-0.5, 0.0, 0.5];

const IO_PORT_WARNING: &str = "I/O port registers have no audible effect";

/// Volume curve variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PsgVariant {
    /// 16-step logarithmic curve
    Ay38910,
    /// 32-step logarithmic curve
    Ym2149,
}

/// Three-voice PSG model.
#[derive(Debug, Clone)]
pub struct Psg {
    variant: PsgVariant,
    internal_clock: u32,
    registers: [u8; REGISTER_COUNT as usize],
    tones: [ToneGenerator; NUM_VOICES],
    noise: NoiseGenerator,
    envelope: EnvelopeGenerator,
    cycle_accumulator: u64,
    last_gates: [bool; NUM_VOICES],
    panner: Panner<NUM_VOICES>,
    mask: VoiceMask,
    dc_left: DcFilter,
    dc_right: DcFilter,
}

impl Psg {
    /// Create a PSG at the given master clock in the power-on state.
    ///
    /// # Arguments
    ///
    /// * `variant` - Volume curve to use
    /// * `master_clock` - Chip clock in Hz (typically 1-2 MHz)
    pub fn new(variant: PsgVariant, master_clock: u32) -> Self {
        let mut psg = Self {
            variant,
            internal_clock: (master_clock / 8).max(1),
            registers: [0; REGISTER_COUNT as usize],
            tones: Default::default(),
            noise: NoiseGenerator::new(),
            envelope: EnvelopeGenerator::new(),
            cycle_accumulator: 0,
            last_gates: [false; NUM_VOICES],
            panner: Panner::new(DEFAULT_PAN),
            mask: VoiceMask::empty(),
            dc_left: DcFilter::default(),
            dc_right: DcFilter::default(),
        };
        psg.reset();
        psg
    }

    /// Volume curve variant.
    pub fn variant(&self) -> PsgVariant {
        self.variant
    }

    /// Internal tick rate in Hz (master clock / 8).
    pub fn internal_clock(&self) -> u32 {
        self.internal_clock
    }

    /// Current envelope level (0-31).
    pub fn envelope_level(&self) -> u32 {
        self.envelope.level()
    }

    fn apply(&mut self, register: usize, value: u8) {
        match register {
            0..=5 => {
                let voice = register / 2;
                let period = u32::from(self.registers[voice * 2])
                    | (u32::from(self.registers[voice * 2 + 1]) << 8);
                self.tones[voice].set_period(period);
            }
            6 => self.noise.set_period(u32::from(value)),
            11 | 12 => {
                let period = u32::from(self.registers[11]) | (u32::from(self.registers[12]) << 8);
                self.envelope.set_period(period);
            }
            13 => self.envelope.set_shape(value),
            _ => {}
        }
    }

    /// Advance the internal state machine by one tick and return the gates.
    #[inline]
    fn tick_generators(&mut self) -> [bool; NUM_VOICES] {
        let mixer = self.registers[7];
        let noise = self.noise.tick();
        self.envelope.tick();

        let mut gates = [false; NUM_VOICES];
        for (voice, gate) in gates.iter_mut().enumerate() {
            let tone = self.tones[voice].tick();
            let tone_off = mixer & (1 << voice) != 0;
            let noise_off = mixer & (1 << (voice + 3)) != 0;
            *gate = (tone || tone_off) && (noise || noise_off);
        }
        gates
    }

    #[inline]
    fn voice_amplitude(&self, voice: usize, gate: bool) -> i32 {
        if !gate || self.mask.is_muted(voice) {
            return 0;
        }
        let volume = self.registers[8 + voice];
        let level = if volume & 0x10 != 0 {
            self.envelope.level() as usize
        } else if volume & 0x0F == 0 {
            0
        } else {
            (((volume & 0x0F) << 1) | 1) as usize
        };
        let amplitude = match self.variant {
            PsgVariant::Ym2149 => YM_LEVELS[level],
            PsgVariant::Ay38910 => AY_LEVELS[level >> 1],
        };
        let amplitude = i32::from(amplitude);
        if self.tones[voice].is_half_amplitude() {
            amplitude >> 1
        } else {
            amplitude
        }
    }

    fn next_frame(&mut self, sample_rate: u32) -> StereoFrame {
        let mut gates = [false; NUM_VOICES];
        let mut ticked = false;

        self.cycle_accumulator += u64::from(self.internal_clock);
        let step = u64::from(sample_rate);
        while self.cycle_accumulator >= step {
            self.cycle_accumulator -= step;
            let tick = self.tick_generators();
            for (acc, g) in gates.iter_mut().zip(tick) {
                *acc |= g;
            }
            ticked = true;
        }
        if ticked {
            self.last_gates = gates;
        } else {
            gates = self.last_gates;
        }

        let mut left = 0i32;
        let mut right = 0i32;
        for (voice, &gate) in gates.iter().enumerate() {
            let (l, r) = self.panner.apply(voice, self.voice_amplitude(voice, gate));
            left += l;
            right += r;
        }

        let left = self.dc_left.process(left);
        let right = self.dc_right.process(right);
        StereoFrame::new(left, right)
    }
}

impl ChipModel for Psg {
    fn kind(&self) -> ChipKind {
        match self.variant {
            PsgVariant::Ay38910 => ChipKind::Ay38910,
            PsgVariant::Ym2149 => ChipKind::Ym2149,
        }
    }

    fn reset(&mut self) {
        self.registers = [0; REGISTER_COUNT as usize];
        self.registers[7] = MIXER_POWER_ON;
        for tone in &mut self.tones {
            tone.reset();
        }
        self.noise.reset();
        self.envelope.reset();
        self.cycle_accumulator = 0;
        self.last_gates = [false; NUM_VOICES];
        self.dc_left.reset();
        self.dc_right.reset();
    }

    fn write(&mut self, register: u16, value: u8) -> Result<WriteOutcome> {
        if register >= REGISTER_COUNT {
            return Err(ChipError::InvalidRegister {
                chip: self.kind().name(),
                register,
                count: REGISTER_COUNT,
            });
        }
        let index = register as usize;
        let value = value & REGISTER_MASK[index];
        self.registers[index] = value;
        self.apply(index, value);

        if index >= 14 {
            Ok(WriteOutcome::Tolerated(IO_PORT_WARNING))
        } else {
            Ok(WriteOutcome::Applied)
        }
    }

    fn read_register(&self, register: u16) -> Option<u8> {
        self.registers.get(register as usize).copied()
    }

    fn render_into(&mut self, out: &mut [StereoFrame], sample_rate: u32) {
        let sample_rate = sample_rate.max(1);
        self.dc_left.set_sample_rate(sample_rate);
        self.dc_right.set_sample_rate(sample_rate);
        for frame in out.iter_mut() {
            *frame = self.next_frame(sample_rate);
        }
    }

    fn voice_count(&self) -> usize {
        NUM_VOICES
    }

    fn voice_name(&self, voice: usize) -> Option<&'static str> {
        VOICE_NAMES.get(voice).copied()
    }

    fn set_voice_mask(&mut self, mask: VoiceMask) {
        self.mask = mask;
    }

    fn voice_mask(&self) -> VoiceMask {
        self.mask
    }

    fn set_stereo_depth(&mut self, depth: f32) {
        self.panner.set_depth(depth);
    }
}
