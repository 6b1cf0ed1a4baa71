//! Five-voice wavetable chip
//!
//! Each voice loops a 32-sample signed waveform from wave RAM at a rate set
//! by its 12-bit period: `f = clock / (32 * (period + 1))`. The register
//! layout follows the Konami SCC, including the quirk that voices 4 and 5
//! share the last waveform.
//!
//! | Range | Purpose |
//! |-------|---------|
//! | 0x00-0x7F | Wave RAM, 32 bytes per waveform (voices 4 and 5 share 0x60) |
//! | 0x80-0x89 | Period low byte / high nibble per voice |
//! | 0x8A-0x8E | Volume per voice (4 bit) |
//! | 0x8F | Voice enable mask (5 bit) |
//! | 0x90-0xDF | Register mirror (stored, inaudible) |
//! | 0xE0 | Test register (stored, inaudible) |
//! | 0xE1 | Deformation register (stored, inaudible) |

use crate::error::ChipError;
use crate::model::{ChipKind, ChipModel, StereoFrame, WriteOutcome};
use crate::panning::Panner;
use crate::voice::VoiceMask;
use crate::Result;

/// Number of wavetable registers.
pub const REGISTER_COUNT: u16 = 0xE2;

/// Number of voices.
pub const NUM_VOICES: usize = 5;

/// Samples per waveform.
pub const WAVE_LENGTH: usize = 32;

const PERIOD_BASE: usize = 0x80;
const VOLUME_BASE: usize = 0x8A;
const ENABLE_REG: usize = 0x8F;

/// Periods below this value are too fast for the DAC and stay silent.
const MIN_AUDIBLE_PERIOD: u32 = 9;

/// Per-voice output scale; five voices at full volume stay inside `i16`.
const VOICE_SCALE: i32 = 3;

const DEFAULT_PAN: [f32; NUM_VOICES] = [-0.6, -0.3, 0.0, 0.3, 0.6];

const VOICE_NAMES: [&str; NUM_VOICES] = ["Wave 1", "Wave 2", "Wave 3", "Wave 4", "Wave 5"];

#[derive(Debug, Clone, Copy, Default)]
struct WaveVoice {
    position: usize,
    accumulator: u64,
}

/// Wavetable chip model.
#[derive(Debug, Clone)]
pub struct Wavetable {
    clock: u32,
    registers: [u8; REGISTER_COUNT as usize],
    voices: [WaveVoice; NUM_VOICES],
    panner: Panner<NUM_VOICES>,
    mask: VoiceMask,
}

impl Wavetable {
    /// Create a wavetable chip at the given master clock in the power-on state.
    pub fn new(master_clock: u32) -> Self {
        Self {
            clock: master_clock.max(1),
            registers: [0; REGISTER_COUNT as usize],
            voices: [WaveVoice::default(); NUM_VOICES],
            panner: Panner::new(DEFAULT_PAN),
            mask: VoiceMask::empty(),
        }
    }

    /// 12-bit period of a voice.
    pub fn period(&self, voice: usize) -> u32 {
        let low = self.registers[PERIOD_BASE + voice * 2];
        let high = self.registers[PERIOD_BASE + voice * 2 + 1] & 0x0F;
        u32::from(low) | (u32::from(high) << 8)
    }

    /// Current read position of a voice within its waveform.
    pub fn position(&self, voice: usize) -> usize {
        self.voices[voice].position
    }

    #[inline]
    fn wave_sample(&self, voice: usize, position: usize) -> i32 {
        // Voice 5 reads the waveform of voice 4
        let base = voice.min(3) * WAVE_LENGTH;
        i32::from(self.registers[base + position] as i8)
    }

    fn next_frame(&mut self, sample_rate: u32) -> StereoFrame {
        let enabled = self.registers[ENABLE_REG];
        let mut left = 0i32;
        let mut right = 0i32;

        for voice in 0..NUM_VOICES {
            let period = self.period(voice);
            let divisor = u64::from(period + 1) * u64::from(sample_rate);
            let state = &mut self.voices[voice];
            state.accumulator += u64::from(self.clock);
            let steps = state.accumulator / divisor;
            state.accumulator %= divisor;
            state.position = ((state.position as u64 + steps) % WAVE_LENGTH as u64) as usize;
            let position = state.position;

            if enabled & (1 << voice) == 0
                || period < MIN_AUDIBLE_PERIOD
                || self.mask.is_muted(voice)
            {
                continue;
            }
            let volume = i32::from(self.registers[VOLUME_BASE + voice] & 0x0F);
            let sample = self.wave_sample(voice, position) * volume * VOICE_SCALE;
            let (l, r) = self.panner.apply(voice, sample);
            left += l;
            right += r;
        }

        StereoFrame::saturating(left, right)
    }
}

impl ChipModel for Wavetable {
    fn kind(&self) -> ChipKind {
        ChipKind::Wavetable
    }

    fn reset(&mut self) {
        self.registers = [0; REGISTER_COUNT as usize];
        self.voices = [WaveVoice::default(); NUM_VOICES];
    }

    fn write(&mut self, register: u16, value: u8) -> Result<WriteOutcome> {
        if register >= REGISTER_COUNT {
            return Err(ChipError::InvalidRegister {
                chip: ChipKind::Wavetable.name(),
                register,
                count: REGISTER_COUNT,
            });
        }
        let index = register as usize;
        let (value, outcome) = match index {
            0x00..=0x7F => (value, WriteOutcome::Applied),
            0x80..=0x89 if index % 2 == 1 => (value & 0x0F, WriteOutcome::Applied),
            0x80..=0x89 => (value, WriteOutcome::Applied),
            0x8A..=0x8E => (value & 0x0F, WriteOutcome::Applied),
            ENABLE_REG => (value & 0x1F, WriteOutcome::Applied),
            0x90..=0xDF => (
                value,
                WriteOutcome::Tolerated("wavetable mirror registers are not emulated"),
            ),
            0xE0 => (
                value,
                WriteOutcome::Tolerated("wavetable test register has no effect"),
            ),
            _ => (
                value,
                WriteOutcome::Tolerated("wavetable deformation register has no effect"),
            ),
        };
        self.registers[index] = value;
        Ok(outcome)
    }

    fn read_register(&self, register: u16) -> Option<u8> {
        self.registers.get(register as usize).copied()
    }

    fn render_into(&mut self, out: &mut [StereoFrame], sample_rate: u32) {
        let sample_rate = sample_rate.max(1);
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

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCK: u32 = 3_579_545;

    fn square_voice(chip: &mut Wavetable, voice: usize) {
        let base = voice.min(3) * WAVE_LENGTH;
        for i in 0..WAVE_LENGTH {
            let value = if i < WAVE_LENGTH / 2 { 0x7F } else { 0x80 };
            chip.write((base + i) as u16, value).unwrap();
        }
        chip.write((PERIOD_BASE + voice * 2) as u16, 0xFE).unwrap();
        chip.write((VOLUME_BASE + voice) as u16, 0x0F).unwrap();
        let enabled = chip.read_register(ENABLE_REG as u16).unwrap_or(0);
        chip.write(ENABLE_REG as u16, enabled | (1 << voice)).unwrap();
    }

    #[test]
    fn test_power_on_is_silent() {
        let mut chip = Wavetable::new(CLOCK);
        let frames = chip.render(500, 44_100);
        assert!(frames.iter().all(StereoFrame::is_silent));
    }

    #[test]
    fn test_enabled_voice_sounds() {
        let mut chip = Wavetable::new(CLOCK);
        square_voice(&mut chip, 2);
        let frames = chip.render(2000, 44_100);
        assert!(frames.iter().any(|f| f.left > 1000));
        assert!(frames.iter().any(|f| f.left < -1000));
    }

    #[test]
    fn test_period_high_nibble_masked() {
        let mut chip = Wavetable::new(CLOCK);
        chip.write(0x81, 0xFF).unwrap();
        assert_eq!(chip.read_register(0x81), Some(0x0F));
        chip.write(0x80, 0x34).unwrap();
        assert_eq!(chip.period(0), 0xF34);
    }

    #[test]
    fn test_voice_five_shares_wave_four() {
        let mut chip = Wavetable::new(CLOCK);
        chip.write(0x60, 0x40).unwrap();
        assert_eq!(chip.wave_sample(3, 0), 0x40);
        assert_eq!(chip.wave_sample(4, 0), 0x40);
    }

    #[test]
    fn test_low_period_is_silent() {
        let mut chip = Wavetable::new(CLOCK);
        square_voice(&mut chip, 0);
        chip.write(0x80, 0x04).unwrap();
        let frames = chip.render(500, 44_100);
        assert!(frames.iter().all(StereoFrame::is_silent));
    }

    #[test]
    fn test_reserved_registers_tolerated() {
        let mut chip = Wavetable::new(CLOCK);
        for register in [0x90u16, 0xDF, 0xE0, 0xE1] {
            let outcome = chip.write(register, 0x55).unwrap();
            assert!(outcome.warning().is_some());
            assert_eq!(chip.read_register(register), Some(0x55));
        }
        assert!(chip.write(REGISTER_COUNT, 0).is_err());
    }

    #[test]
    fn test_mask_mutes_voice() {
        let mut chip = Wavetable::new(CLOCK);
        square_voice(&mut chip, 1);
        chip.set_voice_mask(VoiceMask::VOICE_2);
        let frames = chip.render(1000, 44_100);
        assert!(frames.iter().all(StereoFrame::is_silent));
    }

    #[test]
    fn test_position_advances_at_pitch() {
        let mut chip = Wavetable::new(32_000);
        chip.write(0x80, 99).unwrap();
        // 32000 / (100 * 1000) = 0.32 steps per frame
        chip.render(50, 1000);
        assert_eq!(chip.position(0), 16);
    }
}
