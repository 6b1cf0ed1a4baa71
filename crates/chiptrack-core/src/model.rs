//! Chip model abstraction
//!
//! Defines the interface shared by every sound-chip variant and the
//! [`ChipKind`] factory used by container parsers to instantiate units.

use crate::fm::Fm;
use crate::psg::{Psg, PsgVariant};
use crate::voice::VoiceMask;
use crate::wavetable::Wavetable;
use crate::Result;
use std::fmt;

/// One stereo output frame (left + right) in signed 16-bit PCM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StereoFrame {
    /// Left channel sample
    pub left: i16,
    /// Right channel sample
    pub right: i16,
}

impl StereoFrame {
    /// A frame of digital silence.
    pub const SILENCE: StereoFrame = StereoFrame { left: 0, right: 0 };

    /// Create a frame from left and right samples.
    #[inline]
    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Build a frame from wide intermediate values, saturating to 16 bits.
    #[inline]
    pub fn saturating(left: i32, right: i32) -> Self {
        Self {
            left: left.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            right: right.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        }
    }

    /// Whether both channels are zero.
    #[inline]
    pub fn is_silent(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Result of a register write that did not violate the chip contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was stored and will shape the next render.
    Applied,
    /// The register is reserved by this variant; the value was accepted
    /// (and is readable back) but has no audible effect.
    Tolerated(&'static str),
}

impl WriteOutcome {
    /// Warning text for tolerated writes.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            WriteOutcome::Applied => None,
            WriteOutcome::Tolerated(msg) => Some(msg),
        }
    }
}

/// Common interface for all sound-chip variants.
///
/// A model owns its entire register file and oscillator state. Writes take
/// effect on the next call to [`render_into`](ChipModel::render_into); rendering
/// is deterministic and never depends on hidden randomness.
///
/// # Example
///
/// ```
/// use chiptrack_core::{ChipKind, ChipModel, StereoFrame};
///
/// fn render_block(chip: &mut dyn ChipModel) -> Vec<StereoFrame> {
///     chip.reset();
///     chip.render(128, 48_000)
/// }
///
/// let mut fm = ChipKind::Fm.build(3_579_545);
/// assert_eq!(render_block(fm.as_mut()).len(), 128);
/// ```
pub trait ChipModel: Send {
    /// Variant of this model.
    fn kind(&self) -> ChipKind;

    /// Restore the documented power-on state.
    ///
    /// Clears the register file, oscillator phases, envelopes and output
    /// filters. Voice mask and stereo depth are user settings and survive.
    fn reset(&mut self);

    /// Write a register.
    ///
    /// # Arguments
    ///
    /// * `register` - Register address, `0..register_count()`
    /// * `value` - Raw register value
    ///
    /// # Errors
    ///
    /// [`ChipError::InvalidRegister`](crate::ChipError::InvalidRegister) when
    /// the address is outside the declared range.
    fn write(&mut self, register: u16, value: u8) -> Result<WriteOutcome>;

    /// Read back the stored value of a register, `None` when out of range.
    fn read_register(&self, register: u16) -> Option<u8>;

    /// Number of addressable registers.
    fn register_count(&self) -> u16 {
        self.kind().register_count()
    }

    /// Render exactly `out.len()` frames at `sample_rate`.
    fn render_into(&mut self, out: &mut [StereoFrame], sample_rate: u32);

    /// Render `frame_count` frames into a new buffer.
    fn render(&mut self, frame_count: usize, sample_rate: u32) -> Vec<StereoFrame> {
        let mut frames = vec![StereoFrame::SILENCE; frame_count];
        self.render_into(&mut frames, sample_rate);
        frames
    }

    /// Number of independently mutable voices.
    fn voice_count(&self) -> usize;

    /// Display name of a voice, `None` when out of range.
    fn voice_name(&self, voice: usize) -> Option<&'static str>;

    /// Mute the voices set in `mask` (set bit = muted).
    fn set_voice_mask(&mut self, mask: VoiceMask);

    /// Currently muted voices.
    fn voice_mask(&self) -> VoiceMask;

    /// Scale per-voice panning; `0.0` is mono, `1.0` the variant's full spread.
    fn set_stereo_depth(&mut self, depth: f32);
}

/// Chip variants understood by the container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipKind {
    /// General Instrument AY-3-8910 style PSG (16-step volume curve)
    Ay38910,
    /// Yamaha YM2149 style PSG (32-step volume curve)
    Ym2149,
    /// 5-voice wavetable chip (Konami SCC layout)
    Wavetable,
    /// 6-voice two-operator FM chip
    Fm,
}

impl ChipKind {
    /// All variants, in wire-code order.
    pub const ALL: [ChipKind; 4] = [
        ChipKind::Ay38910,
        ChipKind::Ym2149,
        ChipKind::Wavetable,
        ChipKind::Fm,
    ];

    /// Decode the container's chip kind byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ChipKind::Ay38910),
            1 => Some(ChipKind::Ym2149),
            2 => Some(ChipKind::Wavetable),
            3 => Some(ChipKind::Fm),
            _ => None,
        }
    }

    /// Container chip kind byte.
    pub fn code(&self) -> u8 {
        match self {
            ChipKind::Ay38910 => 0,
            ChipKind::Ym2149 => 1,
            ChipKind::Wavetable => 2,
            ChipKind::Fm => 3,
        }
    }

    /// Human-readable chip name.
    pub fn name(&self) -> &'static str {
        match self {
            ChipKind::Ay38910 => "AY-3-8910",
            ChipKind::Ym2149 => "YM2149",
            ChipKind::Wavetable => "Wavetable",
            ChipKind::Fm => "FM",
        }
    }

    /// Number of registers the variant declares.
    pub fn register_count(&self) -> u16 {
        match self {
            ChipKind::Ay38910 | ChipKind::Ym2149 => crate::psg::REGISTER_COUNT,
            ChipKind::Wavetable => crate::wavetable::REGISTER_COUNT,
            ChipKind::Fm => crate::fm::REGISTER_COUNT,
        }
    }

    /// Number of voices the variant exposes.
    pub fn voice_count(&self) -> usize {
        match self {
            ChipKind::Ay38910 | ChipKind::Ym2149 => crate::psg::NUM_VOICES,
            ChipKind::Wavetable => crate::wavetable::NUM_VOICES,
            ChipKind::Fm => crate::fm::NUM_VOICES,
        }
    }

    /// Instantiate a model of this kind at the given master clock.
    pub fn build(&self, master_clock: u32) -> Box<dyn ChipModel> {
        match self {
            ChipKind::Ay38910 => Box::new(Psg::new(PsgVariant::Ay38910, master_clock)),
            ChipKind::Ym2149 => Box::new(Psg::new(PsgVariant::Ym2149, master_clock)),
            ChipKind::Wavetable => Box::new(Wavetable::new(master_clock)),
            ChipKind::Fm => Box::new(Fm::new(master_clock)),
        }
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
