//! Six-voice two-operator FM chip
//!
//! Each voice is a modulator feeding the phase of a carrier, with optional
//! modulator self-feedback and a linear attack/release envelope on the
//! carrier. Registers are grouped in blocks of eight, one slot per voice:
//!
//! | Block | Purpose |
//! |-------|---------|
//! | 0x00 | F-number low byte |
//! | 0x08 | bits 0-1 F-number high, bits 2-4 block, bit 5 key-on |
//! | 0x10 | Modulator frequency multiple (4 bit) |
//! | 0x18 | Carrier frequency multiple (4 bit) |
//! | 0x20 | Modulator total level (6 bit, 0.75dB steps) |
//! | 0x28 | Carrier attenuation (4 bit, 3dB steps) |
//! | 0x30 | Modulator feedback (3 bit) |
//! | 0x38 | Attack rate (high nibble), release rate (low nibble) |
//!
//! Slots 6 and 7 of every block are reserved: writes are stored and
//! reported as tolerated.

pub mod operator;

pub use operator::{Envelope, EnvelopeState, Operator};

use crate::error::ChipError;
use crate::model::{ChipKind, ChipModel, StereoFrame, WriteOutcome};
use crate::panning::Panner;
use crate::voice::VoiceMask;
use crate::Result;
use operator::sine;

/// Number of FM registers.
pub const REGISTER_COUNT: u16 = 0x40;

/// Number of voices.
pub const NUM_VOICES: usize = 6;

const FNUM_LOW: usize = 0x00;
const FNUM_HIGH: usize = 0x08;
const MOD_MULTIPLE: usize = 0x10;
const CAR_MULTIPLE: usize = 0x18;
const MOD_LEVEL: usize = 0x20;
const CAR_LEVEL: usize = 0x28;
const FEEDBACK: usize = 0x30;
const RATES: usize = 0x38;

const KEY_ON: u8 = 0x20;

/// Frequency multiples in half steps (index 0 is x0.5).
const MULTIPLE_X2: [u64; 16] = [1, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 20, 24, 24, 30, 30];

/// Unity operator gain (Q12).
const UNITY: i32 = 4096;

const DEFAULT_PAN: [f32; NUM_VOICES] = [-0.6, 0.6, -0.3, 0.3, -0.1, 0.1];

const VOICE_NAMES: [&str; NUM_VOICES] = ["FM 1", "FM 2", "FM 3", "FM 4", "FM 5", "FM 6"];

/// Q12 gain for an attenuation in decibels.
fn attenuation_gain(db: f32) -> i32 {
    (UNITY as f32 * 10f32.powf(-db / 20.0)).round() as i32
}

#[derive(Debug, Clone, Default)]
struct FmVoice {
    modulator: Operator,
    carrier: Operator,
    envelope: Envelope,
    feedback: [i32; 2],
    key_on: bool,
}

/// FM chip model.
#[derive(Debug, Clone)]
pub struct Fm {
    clock: u32,
    registers: [u8; REGISTER_COUNT as usize],
    voices: [FmVoice; NUM_VOICES],
    mod_gain: [i32; NUM_VOICES],
    car_gain: [i32; NUM_VOICES],
    sample_rate: u32,
    panner: Panner<NUM_VOICES>,
    mask: VoiceMask,
}

impl Fm {
    /// Create an FM chip at the given master clock in the power-on state.
    pub fn new(master_clock: u32) -> Self {
        let mut fm = Self {
            clock: master_clock.max(1),
            registers: [0; REGISTER_COUNT as usize],
            voices: Default::default(),
            mod_gain: [UNITY; NUM_VOICES],
            car_gain: [UNITY; NUM_VOICES],
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            panner: Panner::new(DEFAULT_PAN),
            mask: VoiceMask::empty(),
        };
        fm.reset();
        fm
    }

    /// Whether a voice's key is down.
    pub fn is_key_on(&self, voice: usize) -> bool {
        self.voices.get(voice).is_some_and(|v| v.key_on)
    }

    /// Carrier envelope stage of a voice.
    pub fn envelope_state(&self, voice: usize) -> Option<EnvelopeState> {
        self.voices.get(voice).map(|v| v.envelope.state())
    }

    /// Carrier phase increment per output sample.
    pub fn carrier_increment(&self, voice: usize) -> u32 {
        self.voices[voice].carrier.increment()
    }

    fn block_fnum(&self, voice: usize) -> u64 {
        let fnum = u64::from(self.registers[FNUM_LOW + voice])
            | (u64::from(self.registers[FNUM_HIGH + voice] & 0x03) << 8);
        let block = (self.registers[FNUM_HIGH + voice] >> 2) & 0x07;
        fnum << block
    }

    fn phase_increment(&self, voice: usize, multiple_reg: usize) -> u32 {
        let multiple = MULTIPLE_X2[(self.registers[multiple_reg + voice] & 0x0F) as usize];
        // f = fnum * 2^block * clock / (72 * 2^19), scaled to a 32-bit phase
        let numerator = u128::from(self.block_fnum(voice))
            * u128::from(self.clock)
            * u128::from(multiple)
            * 4096;
        let denominator = 72 * u128::from(self.sample_rate);
        (numerator / denominator).min(u128::from(u32::MAX)) as u32
    }

    fn update_voice(&mut self, voice: usize) {
        let modulator = self.phase_increment(voice, MOD_MULTIPLE);
        let carrier = self.phase_increment(voice, CAR_MULTIPLE);
        let rates = self.registers[RATES + voice];
        let sample_rate = self.sample_rate;
        let state = &mut self.voices[voice];
        state.modulator.set_increment(modulator);
        state.carrier.set_increment(carrier);
        state.envelope.set_rates(rates >> 4, rates & 0x0F, sample_rate);
    }

    fn set_key(&mut self, voice: usize, down: bool) {
        let state = &mut self.voices[voice];
        if down && !state.key_on {
            state.modulator.reset_phase();
            state.carrier.reset_phase();
            state.feedback = [0; 2];
            state.envelope.key_on();
        } else if !down && state.key_on {
            state.envelope.key_off();
        }
        state.key_on = down;
    }

    #[inline]
    fn voice_sample(&mut self, voice: usize) -> i32 {
        let feedback = i32::from(self.registers[FEEDBACK + voice] & 0x07);
        let mod_gain = self.mod_gain[voice];
        let car_gain = self.car_gain[voice];
        let state = &mut self.voices[voice];

        let fb_offset = if feedback == 0 {
            0
        } else {
            (state.feedback[0] + state.feedback[1]) >> (10 - feedback)
        };
        let modulator = (sine(state.modulator.index(fb_offset)) * mod_gain) >> 12;
        state.feedback = [state.feedback[1], modulator];

        let carrier = (sine(state.carrier.index(modulator >> 2)) * car_gain) >> 12;
        let level = state.envelope.advance();
        state.modulator.advance();
        state.carrier.advance();

        ((i64::from(carrier) * i64::from(level)) >> 16) as i32
    }

    fn next_frame(&mut self) -> StereoFrame {
        let mut left = 0i32;
        let mut right = 0i32;
        for voice in 0..NUM_VOICES {
            let sample = self.voice_sample(voice);
            if self.mask.is_muted(voice) {
                continue;
            }
            let (l, r) = self.panner.apply(voice, sample);
            left += l;
            right += r;
        }
        StereoFrame::saturating(left, right)
    }
}

impl ChipModel for Fm {
    fn kind(&self) -> ChipKind {
        ChipKind::Fm
    }

    fn reset(&mut self) {
        self.registers = [0; REGISTER_COUNT as usize];
        self.voices = Default::default();
        for voice in 0..NUM_VOICES {
            self.mod_gain[voice] = UNITY;
            self.car_gain[voice] = UNITY;
            self.update_voice(voice);
        }
    }

    fn write(&mut self, register: u16, value: u8) -> Result<WriteOutcome> {
        if register >= REGISTER_COUNT {
            return Err(ChipError::InvalidRegister {
                chip: ChipKind::Fm.name(),
                register,
                count: REGISTER_COUNT,
            });
        }
        let index = register as usize;
        let voice = index & 0x07;
        self.registers[index] = value;
        if voice >= NUM_VOICES {
            return Ok(WriteOutcome::Tolerated("FM register slot is reserved"));
        }

        match index & !0x07 {
            FNUM_HIGH => {
                self.update_voice(voice);
                self.set_key(voice, value & KEY_ON != 0);
            }
            MOD_LEVEL => {
                self.mod_gain[voice] = attenuation_gain(f32::from(value & 0x3F) * 0.75);
            }
            CAR_LEVEL => {
                self.car_gain[voice] = attenuation_gain(f32::from(value & 0x0F) * 3.0);
            }
            FNUM_LOW | MOD_MULTIPLE | CAR_MULTIPLE | RATES => self.update_voice(voice),
            _ => {}
        }
        Ok(WriteOutcome::Applied)
    }

    fn read_register(&self, register: u16) -> Option<u8> {
        self.registers.get(register as usize).copied()
    }

    fn render_into(&mut self, out: &mut [StereoFrame], sample_rate: u32) {
        let sample_rate = sample_rate.max(1);
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            for voice in 0..NUM_VOICES {
                self.update_voice(voice);
            }
        }
        for frame in out.iter_mut() {
            *frame = self.next_frame();
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
