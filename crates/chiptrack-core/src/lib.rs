//! Sound-chip models for the chiptrack playback engine
//!
//! Every chip variant implements the same small capability set
//! ([`ChipModel`]): reset to power-on state, accept register writes, and render
//! a requested number of stereo frames at a caller-chosen sample rate. The
//! models are parameterized (master clock, volume curve, panning, stereo depth)
//! rather than bit-exact replicas of any particular piece of silicon.
//!
//! # Variants
//! - [`Psg`] - 3 square voices, LFSR noise and a hardware envelope, with either
//!   the AY-3-8910 (16 step) or YM2149 (32 step) volume curve
//! - [`Wavetable`] - 5 voices playing 32-sample signed wave RAM
//! - [`Fm`] - 6 two-operator FM voices with feedback and an attack/release envelope
//!
//! # Quick start
//! ```
//! use chiptrack_core::{ChipKind, ChipModel};
//!
//! let mut chip = ChipKind::Ym2149.build(2_000_000);
//! chip.write(0x00, 0x1C).unwrap(); // Tone A period low
//! chip.write(0x01, 0x01).unwrap(); // Tone A period high
//! chip.write(0x07, 0x3E).unwrap(); // Mixer: tone A on
//! chip.write(0x08, 0x0F).unwrap(); // Volume A
//! let frames = chip.render(441, 44_100);
//! assert_eq!(frames.len(), 441);
//! ```
//!
//! # Split rendering
//! All oscillator, envelope and filter state lives inside the model, so
//! `render(a)` followed by `render(b)` yields exactly the frames of
//! `render(a + b)` as long as no register is written in between.

#![warn(missing_docs)]

pub mod dc_filter;
pub mod error;
pub mod fm;
pub mod model;
pub mod panning;
pub mod psg;
pub mod voice;
pub mod wavetable;

pub use dc_filter::DcFilter;
pub use error::{ChipError, Result};
pub use fm::Fm;
pub use model::{ChipKind, ChipModel, StereoFrame, WriteOutcome};
pub use panning::Panner;
pub use psg::{Psg, PsgVariant};
pub use voice::VoiceMask;
pub use wavetable::Wavetable;

/// Sample rate a freshly built FM model assumes until its first render.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Highest sample rate the models are specified for.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
