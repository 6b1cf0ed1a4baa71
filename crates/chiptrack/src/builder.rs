//! Programmatic CHTK image construction.
//!
//! The builder lays out header, tables, track blocks and event streams in
//! that order and fills in every offset. It does not validate content, so it
//! can also produce deliberately malformed images for tests.

use crate::format::{
    Event, TrackHeader, UnitDescriptor, EVENT_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC,
    TEXT_FIELD_SIZE, TRACK_BLOCK_SIZE, TRACK_OFFSET_SIZE, TRACK_TEXT_OFFSET, UNIT_ENTRY_SIZE,
};
use chiptrack_core::ChipKind;

/// Builder for CHTK images.
///
/// # Example
///
/// ```
/// use chiptrack::{parse_header, Event, ImageBuilder, TrackHeader};
/// use chiptrack_core::ChipKind;
///
/// let mut builder = ImageBuilder::new(50);
/// builder.unit(ChipKind::Ay38910, 1_773_400);
/// builder.track(TrackHeader::default(), vec![Event::new(0, 0, 8, 0x0F)]);
/// let image = builder.build();
///
/// let index = parse_header(&image).unwrap();
/// assert_eq!(index.track_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImageBuilder {
    tick_rate: u32,
    units: Vec<UnitDescriptor>,
    tracks: Vec<(TrackHeader, Vec<Event>)>,
}

impl ImageBuilder {
    /// Create an empty builder with the given tick rate.
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_rate,
            ..Self::default()
        }
    }

    /// Declare a chip unit. Units are addressed by declaration order.
    pub fn unit(&mut self, kind: ChipKind, clock: u32) -> &mut Self {
        self.units.push(UnitDescriptor { kind, clock });
        self
    }

    /// Append a track.
    ///
    /// `event_offset` and `event_count` in `header` are ignored and computed
    /// from `events` at build time. Events are written in the given order.
    pub fn track(&mut self, header: TrackHeader, events: Vec<Event>) -> &mut Self {
        self.tracks.push((header, events));
        self
    }

    /// Serialize the image.
    pub fn build(&self) -> Vec<u8> {
        let offsets_start = HEADER_SIZE + self.units.len() * UNIT_ENTRY_SIZE;
        let blocks_start = offsets_start + self.tracks.len() * TRACK_OFFSET_SIZE;
        let streams_start = blocks_start + self.tracks.len() * TRACK_BLOCK_SIZE;
        let total_events: usize = self.tracks.iter().map(|(_, events)| events.len()).sum();

        let mut out = Vec::with_capacity(streams_start + total_events * EVENT_SIZE);
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.push(self.units.len() as u8);
        out.extend_from_slice(&(self.tracks.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.tick_rate.to_le_bytes());

        for unit in &self.units {
            out.push(unit.kind.code());
            out.extend_from_slice(&[0, 0, 0]);
            out.extend_from_slice(&unit.clock.to_le_bytes());
        }

        for track in 0..self.tracks.len() {
            let offset = (blocks_start + track * TRACK_BLOCK_SIZE) as u32;
            out.extend_from_slice(&offset.to_le_bytes());
        }

        let mut stream_offset = streams_start;
        for (header, events) in &self.tracks {
            let block_start = out.len();
            out.extend_from_slice(&(stream_offset as u32).to_le_bytes());
            out.extend_from_slice(&(events.len() as u32).to_le_bytes());
            out.extend_from_slice(&header.length_ms.to_le_bytes());
            out.extend_from_slice(&header.intro_length_ms.to_le_bytes());
            out.extend_from_slice(&header.loop_length_ms.to_le_bytes());
            out.extend_from_slice(&header.end_tick.to_le_bytes());
            out.extend_from_slice(&header.loop_tick.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            debug_assert_eq!(out.len() - block_start, TRACK_TEXT_OFFSET);

            for text in header.text_fields() {
                let mut field = [0u8; TEXT_FIELD_SIZE];
                let clipped = clip_to_boundary(text, TEXT_FIELD_SIZE - 1);
                field[..clipped.len()].copy_from_slice(clipped.as_bytes());
                out.extend_from_slice(&field);
            }
            stream_offset += events.len() * EVENT_SIZE;
        }

        for (_, events) in &self.tracks {
            for event in events {
                out.extend_from_slice(&event.tick.to_le_bytes());
                out.push(event.unit);
                out.push(event.value);
                out.extend_from_slice(&event.register.to_le_bytes());
            }
        }

        out
    }
}

/// Longest prefix of `text` that fits in `max` bytes without splitting a
/// character.
fn clip_to_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
