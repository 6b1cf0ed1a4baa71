//! CHTK track container parser and pull-based playback engine.
//!
//! A CHTK image holds one or more tracks of timed register writes for up to
//! four sound-chip units. This crate provides:
//! - [`parse_header`] / [`parse_track_events`] - validating parser
//! - [`ImageBuilder`] - programmatic image construction
//! - [`SequencePlayer`] - event dispatch and mixing on the output timeline
//! - [`PlaybackSession`] - open an image, start a track, pull interleaved
//!   16-bit stereo, with looping, fading, seeking, tempo and voice muting
//!
//! Chip synthesis lives in [`chiptrack_core`].
//!
//! # Quick start
//!
//! ```
//! use chiptrack::{Event, ImageBuilder, PlaybackSession, TrackHeader};
//! use chiptrack_core::ChipKind;
//!
//! let mut builder = ImageBuilder::new(60);
//! builder.unit(ChipKind::Ay38910, 1_773_400);
//! builder.track(
//!     TrackHeader { end_tick: 60, ..TrackHeader::default() },
//!     vec![Event::new(0, 0, 0x07, 0x3E), Event::new(0, 0, 0x08, 0x0F)],
//! );
//!
//! let mut session = PlaybackSession::open(builder.build(), 44_100)?;
//! session.start(0)?;
//! let mut buffer = [0i16; 1024];
//! while !session.ended() {
//!     session.play(&mut buffer)?;
//! }
//! assert_eq!(session.played().as_secs(), 1);
//! # Ok::<(), chiptrack::Error>(())
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod error;
pub mod format;
pub mod parser;
pub mod player;
pub mod reader;
pub mod session;
pub mod shared;
pub mod warning;

pub use builder::ImageBuilder;
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use format::{Event, TrackHeader, TrackIndex, TrackProgram, UnitDescriptor};
pub use parser::{parse_header, parse_track_events};
pub use player::{PlaybackCursor, PlayerState, SequencePlayer};
pub use reader::BinaryReader;
pub use session::{PlaybackSession, TrackImage};
pub use shared::SharedSession;
pub use warning::WarningLog;
