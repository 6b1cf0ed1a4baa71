//! Data structures describing a parsed CHTK image.
//!
//! # Layout (little-endian)
//!
//! ```text
//! 0x00  [4]  "CHTK"
//! 0x04  u8   version (1)
//! 0x05  u8   unit count (1..=4)
//! 0x06  u16  track count
//! 0x08  u32  tick rate (ticks per second)
//! 0x0C       unit table, 8 bytes per unit: u8 kind, u8 + u16 reserved, u32 clock
//! ....       track offset table, u32 per track
//! ```
//!
//! Each track block holds the event stream location, timing, and seven
//! 256-byte text fields. Events are 8 bytes: `u32 tick, u8 unit, u8 value,
//! u16 register`.

use chiptrack_core::{ChipKind, ChipModel};
use std::time::Duration;

/// Container signature.
pub const MAGIC: &[u8; 4] = b"CHTK";

/// Supported container version.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum number of chip units per image.
pub const MAX_UNITS: usize = 4;

/// Size of the fixed header preceding the unit table.
pub const HEADER_SIZE: usize = 12;

/// Size of one unit table entry.
pub const UNIT_ENTRY_SIZE: usize = 8;

/// Size of one track offset table entry.
pub const TRACK_OFFSET_SIZE: usize = 4;

/// Capacity of each metadata text field.
pub const TEXT_FIELD_SIZE: usize = 256;

/// Number of metadata text fields per track.
pub const TEXT_FIELD_COUNT: usize = 7;

/// Offset of the first text field inside a track block.
pub const TRACK_TEXT_OFFSET: usize = 32;

/// Size of one track block.
pub const TRACK_BLOCK_SIZE: usize = TRACK_TEXT_OFFSET + TEXT_FIELD_COUNT * TEXT_FIELD_SIZE;

/// Size of one event record.
pub const EVENT_SIZE: usize = 8;

/// Play length assumed for tracks with no timing information.
pub const DEFAULT_PLAY_LENGTH: Duration = Duration::from_secs(150);

/// One chip unit declared by the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitDescriptor {
    /// Chip variant.
    pub kind: ChipKind,
    /// Master clock in Hz.
    pub clock: u32,
}

impl UnitDescriptor {
    /// Instantiate the chip in its power-on state.
    pub fn build(&self) -> Box<dyn ChipModel> {
        self.kind.build(self.clock)
    }
}

/// Per-track metadata.
///
/// Durations are stored in milliseconds as authored; negative values mean
/// unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackHeader {
    /// Absolute offset of the event stream.
    pub event_offset: u32,
    /// Number of event records.
    pub event_count: u32,
    /// Total length in ms.
    pub length_ms: i32,
    /// Length of the non-repeating intro in ms.
    pub intro_length_ms: i32,
    /// Length of the repeating section in ms.
    pub loop_length_ms: i32,
    /// Tick at which the track ends (0 = at the last event).
    pub end_tick: u32,
    /// Tick the loop rewinds to.
    pub loop_tick: u32,
    /// Target system.
    pub system: String,
    /// Game title.
    pub game: String,
    /// Song title.
    pub song: String,
    /// Composer.
    pub author: String,
    /// Copyright notice.
    pub copyright: String,
    /// Free-form comment.
    pub comment: String,
    /// Person who captured the track.
    pub dumper: String,
}

impl Default for TrackHeader {
    fn default() -> Self {
        Self {
            event_offset: 0,
            event_count: 0,
            length_ms: -1,
            intro_length_ms: -1,
            loop_length_ms: -1,
            end_tick: 0,
            loop_tick: 0,
            system: String::new(),
            game: String::new(),
            song: String::new(),
            author: String::new(),
            copyright: String::new(),
            comment: String::new(),
            dumper: String::new(),
        }
    }
}

fn known(ms: i32) -> Option<Duration> {
    u64::try_from(ms).ok().map(Duration::from_millis)
}

impl TrackHeader {
    /// Total length, `None` when unknown.
    pub fn length(&self) -> Option<Duration> {
        known(self.length_ms)
    }

    /// Intro length, `None` when unknown.
    pub fn intro_length(&self) -> Option<Duration> {
        known(self.intro_length_ms)
    }

    /// Loop length, `None` when unknown.
    pub fn loop_length(&self) -> Option<Duration> {
        known(self.loop_length_ms)
    }

    /// Whether the track declares a repeating section.
    pub fn has_loop(&self) -> bool {
        self.loop_length_ms > 0
    }

    /// End tick implied by the declared length at `tick_rate`.
    ///
    /// Only tracks without a repeating section end at their length; for a
    /// looping track the length covers the loops and the end tick marks the
    /// loop rewind instead. `None` when the length is unknown.
    pub fn length_end_tick(&self, tick_rate: u32) -> Option<u32> {
        if self.length_ms <= 0 || self.has_loop() {
            return None;
        }
        let ticks = self.length_ms as u64 * u64::from(tick_rate) / 1000;
        Some(u32::try_from(ticks).unwrap_or(u32::MAX))
    }

    /// Length to play before fading out.
    ///
    /// The declared length when positive, otherwise intro plus two loops,
    /// otherwise [`DEFAULT_PLAY_LENGTH`].
    pub fn play_length(&self) -> Duration {
        if self.length_ms > 0 {
            return Duration::from_millis(self.length_ms as u64);
        }
        let intro = i64::from(self.intro_length_ms.max(0));
        let looped = i64::from(self.loop_length_ms.max(0));
        let estimate = intro + 2 * looped;
        if estimate > 0 {
            Duration::from_millis(estimate as u64)
        } else {
            DEFAULT_PLAY_LENGTH
        }
    }

    /// Text fields in wire order.
    pub(crate) fn text_fields(&self) -> [&str; TEXT_FIELD_COUNT] {
        [
            &self.system,
            &self.game,
            &self.song,
            &self.author,
            &self.copyright,
            &self.comment,
            &self.dumper,
        ]
    }
}

/// Everything known about an image after header parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackIndex {
    /// Event ticks per second.
    pub tick_rate: u32,
    /// Chip units, addressed by event unit id.
    pub units: Vec<UnitDescriptor>,
    /// Track headers in image order.
    pub tracks: Vec<TrackHeader>,
}

impl TrackIndex {
    /// Number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Header of a track, `None` when out of range.
    pub fn track(&self, index: usize) -> Option<&TrackHeader> {
        self.tracks.get(index)
    }

    /// Total voices across all units.
    pub fn voice_count(&self) -> usize {
        self.units.iter().map(|u| u.kind.voice_count()).sum()
    }
}

/// One timed register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Tick offset from track start.
    pub tick: u32,
    /// Target unit id.
    pub unit: u8,
    /// Register address.
    pub register: u16,
    /// Register value.
    pub value: u8,
}

impl Event {
    /// Convenience constructor.
    pub const fn new(tick: u32, unit: u8, register: u16, value: u8) -> Self {
        Self {
            tick,
            unit,
            register,
            value,
        }
    }
}

/// Decoded, validated event stream of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackProgram {
    /// Events in dispatch order.
    pub events: Vec<Event>,
    /// Tick at which the track ends.
    pub end_tick: u32,
    /// Loop start tick when the track declares a positive loop length.
    pub loop_tick: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_block_size() {
        assert_eq!(TRACK_BLOCK_SIZE, 1824);
    }

    #[test]
    fn test_unknown_lengths() {
        let header = TrackHeader::default();
        assert_eq!(header.length(), None);
        assert_eq!(header.intro_length(), None);
        assert_eq!(header.loop_length(), None);
        assert!(!header.has_loop());
        assert_eq!(header.play_length(), DEFAULT_PLAY_LENGTH);
    }

    #[test]
    fn test_play_length_prefers_declared_length() {
        let header = TrackHeader {
            length_ms: 90_000,
            intro_length_ms: 5_000,
            loop_length_ms: 20_000,
            ..TrackHeader::default()
        };
        assert_eq!(header.play_length(), Duration::from_secs(90));
        assert!(header.has_loop());
    }

    #[test]
    fn test_play_length_from_intro_and_loop() {
        let header = TrackHeader {
            intro_length_ms: 5_000,
            loop_length_ms: 20_000,
            ..TrackHeader::default()
        };
        assert_eq!(header.play_length(), Duration::from_secs(45));
        assert_eq!(header.loop_length(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_zero_length_is_known() {
        let header = TrackHeader {
            length_ms: 0,
            ..TrackHeader::default()
        };
        assert_eq!(header.length(), Some(Duration::ZERO));
        assert_eq!(header.play_length(), DEFAULT_PLAY_LENGTH);
    }
}
