//! CHTK parser producing a [`TrackIndex`] and per-track [`TrackProgram`]s.
//!
//! Header parsing validates every table and track block up front so that
//! later accessors never fail. Event streams are decoded lazily, one track at
//! a time, when a track is started.

use crate::error::{Error, Result};
use crate::format::{
    Event, TrackHeader, TrackIndex, TrackProgram, UnitDescriptor, EVENT_SIZE, FORMAT_VERSION,
    HEADER_SIZE, MAGIC, MAX_UNITS, TEXT_FIELD_SIZE, TRACK_BLOCK_SIZE, TRACK_OFFSET_SIZE,
    TRACK_TEXT_OFFSET, UNIT_ENTRY_SIZE,
};
use crate::reader::BinaryReader;
use chiptrack_core::ChipKind;

/// Parse the header, unit table and all track blocks of an image.
///
/// # Errors
///
/// * [`Error::Truncated`] - the image ends inside the fixed header, the
///   tables, a track block or an event stream
/// * [`Error::BadMagic`] - the signature is not `CHTK`
/// * [`Error::BadMetadata`] - a field or offset is invalid, or a track's end
///   tick and length disagree
pub fn parse_header(image: &[u8]) -> Result<TrackIndex> {
    HeaderParser {
        reader: BinaryReader::new(image),
    }
    .parse()
}

/// Decode and validate the event stream of one track.
///
/// # Errors
///
/// * [`Error::InvalidTrack`] - `track` is out of range
/// * [`Error::MalformedEvents`] - ticks go backwards, an event targets a
///   missing unit or register, or an event lies past the declared end tick
pub fn parse_track_events(image: &[u8], index: &TrackIndex, track: usize) -> Result<TrackProgram> {
    let header = index.track(track).ok_or(Error::InvalidTrack {
        index: track,
        count: index.track_count(),
    })?;
    let reader = BinaryReader::new(image);
    let base = header.event_offset as usize;
    let count = header.event_count as usize;

    let declared_end = if header.end_tick != 0 {
        Some(header.end_tick)
    } else {
        header.length_end_tick(index.tick_rate)
    };

    let mut events = Vec::with_capacity(count);
    let mut previous_tick = 0u32;
    for i in 0..count {
        let offset = base + i * EVENT_SIZE;
        let event = Event {
            tick: reader.read_u32(offset)?,
            unit: reader.read_u8(offset + 4)?,
            value: reader.read_u8(offset + 5)?,
            register: reader.read_u16(offset + 6)?,
        };

        if event.tick < previous_tick {
            return Err(Error::malformed(
                track,
                i,
                format!("tick {} after tick {}", event.tick, previous_tick),
            ));
        }
        let unit = index.units.get(event.unit as usize).ok_or_else(|| {
            Error::malformed(
                track,
                i,
                format!(
                    "unit {} outside {} declared units",
                    event.unit,
                    index.units.len()
                ),
            )
        })?;
        let register_count = unit.kind.register_count();
        if event.register >= register_count {
            return Err(Error::malformed(
                track,
                i,
                format!(
                    "register 0x{:02x} outside {} range 0x00..0x{:02x}",
                    event.register, unit.kind, register_count
                ),
            ));
        }
        if let Some(end_tick) = declared_end.filter(|&end| event.tick > end) {
            return Err(Error::malformed(
                track,
                i,
                format!("tick {} past end tick {end_tick}", event.tick),
            ));
        }

        previous_tick = event.tick;
        events.push(event);
    }

    let end_tick = declared_end.unwrap_or_else(|| events.last().map_or(0, |e| e.tick));
    let loop_tick = header.has_loop().then_some(header.loop_tick);

    Ok(TrackProgram {
        events,
        end_tick,
        loop_tick,
    })
}

struct HeaderParser<'a> {
    reader: BinaryReader<'a>,
}

impl<'a> HeaderParser<'a> {
    fn parse(&self) -> Result<TrackIndex> {
        self.require("signature", MAGIC.len())?;
        if self.reader.slice(0, MAGIC.len())? != MAGIC {
            return Err(Error::BadMagic);
        }
        self.require("header", HEADER_SIZE)?;

        let version = self.reader.read_u8(4)?;
        if version != FORMAT_VERSION {
            return Err(Error::bad_metadata(format!(
                "unsupported version {version}"
            )));
        }
        let unit_count = self.reader.read_u8(5)? as usize;
        if unit_count == 0 || unit_count > MAX_UNITS {
            return Err(Error::bad_metadata(format!(
                "unit count {unit_count} outside 1..={MAX_UNITS}"
            )));
        }
        let track_count = self.reader.read_u16(6)? as usize;
        if track_count == 0 {
            return Err(Error::bad_metadata("image declares no tracks"));
        }
        let tick_rate = self.reader.read_u32(8)?;
        if tick_rate == 0 {
            return Err(Error::bad_metadata("tick rate is zero"));
        }

        let offsets_start = HEADER_SIZE + unit_count * UNIT_ENTRY_SIZE;
        self.require("unit table", offsets_start)?;
        let tables_end = offsets_start + track_count * TRACK_OFFSET_SIZE;
        self.require("track offset table", tables_end)?;

        let units = (0..unit_count)
            .map(|unit| self.parse_unit(unit, HEADER_SIZE + unit * UNIT_ENTRY_SIZE))
            .collect::<Result<Vec<_>>>()?;

        let tracks = (0..track_count)
            .map(|track| {
                let offset = self
                    .reader
                    .read_u32(offsets_start + track * TRACK_OFFSET_SIZE)?;
                self.parse_track(track, offset as usize, tables_end, tick_rate)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TrackIndex {
            tick_rate,
            units,
            tracks,
        })
    }

    fn require(&self, section: &'static str, needed: usize) -> Result<()> {
        if self.reader.len() < needed {
            return Err(Error::Truncated {
                section,
                needed,
                len: self.reader.len(),
            });
        }
        Ok(())
    }

    fn parse_unit(&self, unit: usize, offset: usize) -> Result<UnitDescriptor> {
        let code = self.reader.read_u8(offset)?;
        let kind = ChipKind::from_code(code)
            .ok_or_else(|| Error::bad_metadata(format!("unit {unit}: unknown chip kind {code}")))?;
        let clock = self.reader.read_u32(offset + 4)?;
        if clock == 0 {
            return Err(Error::bad_metadata(format!("unit {unit}: clock is zero")));
        }
        Ok(UnitDescriptor { kind, clock })
    }

    fn parse_track(
        &self,
        track: usize,
        offset: usize,
        tables_end: usize,
        tick_rate: u32,
    ) -> Result<TrackHeader> {
        if offset < tables_end || offset > self.reader.len() {
            return Err(Error::bad_metadata(format!(
                "track {track}: block at 0x{offset:x} outside image or overlapping tables"
            )));
        }
        self.require("track block", offset.saturating_add(TRACK_BLOCK_SIZE))?;

        let event_offset = self.reader.read_u32(offset)?;
        let event_count = self.reader.read_u32(offset + 4)?;
        if event_offset as usize > self.reader.len() {
            return Err(Error::bad_metadata(format!(
                "track {track}: event stream at 0x{event_offset:x} outside image"
            )));
        }
        let stream_end = (event_count as usize)
            .saturating_mul(EVENT_SIZE)
            .saturating_add(event_offset as usize);
        self.require("event stream", stream_end)?;

        let end_tick = self.reader.read_u32(offset + 20)?;
        let loop_tick = self.reader.read_u32(offset + 24)?;
        if end_tick != 0 && loop_tick > end_tick {
            return Err(Error::bad_metadata(format!(
                "track {track}: loop tick {loop_tick} past end tick {end_tick}"
            )));
        }

        let text = |field: usize| {
            self.reader
                .read_fixed_string(offset + TRACK_TEXT_OFFSET + field * TEXT_FIELD_SIZE, TEXT_FIELD_SIZE)
        };

        let header = TrackHeader {
            event_offset,
            event_count,
            length_ms: self.reader.read_i32(offset + 8)?,
            intro_length_ms: self.reader.read_i32(offset + 12)?,
            loop_length_ms: self.reader.read_i32(offset + 16)?,
            end_tick,
            loop_tick,
            system: text(0)?,
            game: text(1)?,
            song: text(2)?,
            author: text(3)?,
            copyright: text(4)?,
            comment: text(5)?,
            dumper: text(6)?,
        };
        self.check_length(track, &header, tick_rate)?;
        Ok(header)
    }

    /// A non-looping track that declares both an end tick and a length must
    /// end at the same point either way, to within one tick of rounding.
    fn check_length(&self, track: usize, header: &TrackHeader, tick_rate: u32) -> Result<()> {
        let Some(floor) = header.length_end_tick(tick_rate) else {
            return Ok(());
        };
        if header.end_tick == 0 {
            return Ok(());
        }
        let ceil = (header.length_ms as u64 * u64::from(tick_rate)).div_ceil(1000);
        let end_tick = u64::from(header.end_tick);
        if end_tick < u64::from(floor) || end_tick > ceil {
            return Err(Error::bad_metadata(format!(
                "track {track}: end tick {} disagrees with length {} ms at {tick_rate} ticks/s",
                header.end_tick, header.length_ms
            )));
        }
        Ok(())
    }
}
