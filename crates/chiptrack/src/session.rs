//! Pull-based playback session over a CHTK image.

use crate::config::{SessionConfig, MAX_TEMPO_PERCENT, MIN_TEMPO_PERCENT};
use crate::error::{Error, Result};
use crate::format::{TrackHeader, TrackIndex, TrackProgram};
use crate::parser::{parse_header, parse_track_events};
use crate::player::{timing, SequencePlayer};
use crate::shared::SharedSession;
use chiptrack_core::{ChipModel, VoiceMask, MAX_SAMPLE_RATE};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Parsed, immutable image shared between sessions.
#[derive(Debug)]
pub struct TrackImage {
    bytes: Arc<[u8]>,
    index: TrackIndex,
}

impl TrackImage {
    /// Parse an image's header and track table.
    pub fn parse(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        let index = parse_header(&bytes)?;
        Ok(Self { bytes, index })
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parsed header and track table.
    pub fn index(&self) -> &TrackIndex {
        &self.index
    }

    /// Number of tracks.
    pub fn track_count(&self) -> usize {
        self.index.track_count()
    }

    /// Header of one track.
    pub fn track(&self, index: usize) -> Result<&TrackHeader> {
        self.index.track(index).ok_or(Error::InvalidTrack {
            index,
            count: self.index.track_count(),
        })
    }

    /// Decode the event stream of one track.
    pub fn program(&self, track: usize) -> Result<TrackProgram> {
        parse_track_events(&self.bytes, &self.index, track)
    }

    /// Instantiate every declared chip unit in its power-on state.
    pub fn build_chips(&self) -> Vec<Box<dyn ChipModel>> {
        self.index.units.iter().map(|unit| unit.build()).collect()
    }
}

struct OpenSession {
    image: Arc<TrackImage>,
    config: SessionConfig,
    player: SequencePlayer,
    current_track: Option<usize>,
    voice_names: Vec<&'static str>,
}

/// Playback handle: open an image, pick a track, pull PCM.
///
/// Mutating calls need external serialization; see
/// [`SharedSession`](crate::SharedSession) for a locked wrapper.
///
/// # Example
///
/// ```
/// use chiptrack::{Event, ImageBuilder, PlaybackSession, TrackHeader};
/// use chiptrack_core::ChipKind;
///
/// let mut builder = ImageBuilder::new(50);
/// builder.unit(ChipKind::Ym2149, 2_000_000);
/// builder.track(
///     TrackHeader { song: "Beep".into(), length_ms: 1000, end_tick: 50, ..TrackHeader::default() },
///     vec![Event::new(0, 0, 7, 0x3E), Event::new(0, 0, 8, 0x0F), Event::new(0, 0, 0, 0x80)],
/// );
///
/// let mut session = PlaybackSession::open(builder.build(), 44_100)?;
/// assert_eq!(session.track_info(0)?.song, "Beep");
/// session.start(0)?;
/// let mut buffer = vec![0i16; 2 * 44_100];
/// session.play(&mut buffer)?;
/// assert!(session.ended());
/// session.close();
/// # Ok::<(), chiptrack::Error>(())
/// ```
pub struct PlaybackSession {
    sample_rate: u32,
    inner: Option<OpenSession>,
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("PlaybackSession");
        s.field("sample_rate", &self.sample_rate);
        match &self.inner {
            Some(open) => s
                .field("tracks", &open.image.track_count())
                .field("current_track", &open.current_track)
                .field("player", &open.player),
            None => s.field("closed", &true),
        };
        s.finish()
    }
}

impl PlaybackSession {
    /// Parse an image and open a session with the default configuration.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSampleRate`] for 0 or rates above
    /// [`MAX_SAMPLE_RATE`]; parser errors are propagated.
    pub fn open(image: impl Into<Arc<[u8]>>, sample_rate: u32) -> Result<Self> {
        Self::open_with_config(image, sample_rate, SessionConfig::default())
    }

    /// Parse an image and open a session with `config`.
    pub fn open_with_config(
        image: impl Into<Arc<[u8]>>,
        sample_rate: u32,
        config: SessionConfig,
    ) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        let image = Arc::new(TrackImage::parse(image)?);
        Self::with_image(image, sample_rate, config)
    }

    /// Open a session over an already parsed image.
    pub fn with_image(
        image: Arc<TrackImage>,
        sample_rate: u32,
        config: SessionConfig,
    ) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        config.validate()?;
        let mut voice_names = Vec::new();
        for chip in image.build_chips() {
            voice_names.extend((0..chip.voice_count()).filter_map(|v| chip.voice_name(v)));
        }
        debug!(
            tracks = image.track_count(),
            units = image.index().units.len(),
            sample_rate,
            "session opened"
        );
        let player = SequencePlayer::new(sample_rate, &config);
        Ok(Self {
            sample_rate,
            inner: Some(OpenSession {
                image,
                config,
                player,
                current_track: None,
                voice_names,
            }),
        })
    }

    fn open_mut(&mut self) -> Result<&mut OpenSession> {
        self.inner.as_mut().ok_or(Error::ClosedSession)
    }

    fn open_ref(&self) -> Result<&OpenSession> {
        self.inner.as_ref().ok_or(Error::ClosedSession)
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Shared image, `None` once closed.
    pub fn image(&self) -> Option<&Arc<TrackImage>> {
        self.inner.as_ref().map(|open| &open.image)
    }

    /// Number of tracks (0 once closed).
    pub fn track_count(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |open| open.image.track_count())
    }

    /// Metadata of one track.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTrack`] for an out-of-range index,
    /// [`Error::ClosedSession`] once closed.
    pub fn track_info(&self, index: usize) -> Result<TrackHeader> {
        self.open_ref()?.image.track(index).cloned()
    }

    /// Start playing a track from the beginning.
    ///
    /// On failure the session keeps playing whatever it played before.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTrack`], [`Error::MalformedEvents`] or
    /// [`Error::ClosedSession`].
    pub fn start(&mut self, index: usize) -> Result<()> {
        let sample_rate = self.sample_rate;
        let open = self.open_mut()?;
        let header = open.image.track(index)?.clone();
        let program = open.image.program(index)?;

        debug!(
            track = index,
            song = %header.song,
            events = program.events.len(),
            "starting track"
        );
        open.player
            .start(program, open.image.index().tick_rate, open.image.build_chips());
        if open.config.fade_length_ms > 0 {
            let start = timing::duration_to_frames(header.play_length(), sample_rate);
            let length = timing::ms_to_frames(u64::from(open.config.fade_length_ms), sample_rate);
            open.player.set_fade(start, length);
        }
        open.current_track = Some(index);
        Ok(())
    }

    /// Index of the playing track, `None` before the first start or once closed.
    pub fn current_track(&self) -> Option<usize> {
        self.inner.as_ref().and_then(|open| open.current_track)
    }

    /// Time rendered since the last start, including loops.
    pub fn played(&self) -> Duration {
        self.inner
            .as_ref()
            .map_or(Duration::ZERO, |open| open.player.elapsed())
    }

    /// Whether the current track has finished. Closed sessions report `true`.
    pub fn ended(&self) -> bool {
        self.inner.as_ref().map_or(true, |open| open.player.is_ended())
    }

    /// Fill `buffer` with interleaved stereo samples.
    ///
    /// # Errors
    ///
    /// [`Error::ClosedSession`] once closed, then [`Error::NotStarted`]
    /// before the first successful start.
    pub fn play(&mut self, buffer: &mut [i16]) -> Result<()> {
        let open = self.open_mut()?;
        if open.current_track.is_none() {
            return Err(Error::NotStarted);
        }
        open.player.advance(buffer)
    }

    /// Return and clear the last warning (`""` when none or closed).
    pub fn warning(&mut self) -> String {
        self.inner
            .as_mut()
            .and_then(|open| open.player.warnings_mut().take())
            .unwrap_or_default()
    }

    /// Release the image and all chip state. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!("session closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn started_mut(&mut self) -> Result<&mut OpenSession> {
        let open = self.open_mut()?;
        if open.current_track.is_none() {
            return Err(Error::NotStarted);
        }
        Ok(open)
    }

    /// Jump to `position` (measured like [`played`](Self::played)).
    ///
    /// The track restarts and is rendered silently up to the target, so
    /// seeking backwards is as expensive as seeking forward from zero. Whole
    /// loop passes far into an endless loop are counted rather than
    /// rendered.
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        let sample_rate = self.sample_rate;
        let open = self.started_mut()?;
        let target = timing::duration_to_frames(position, sample_rate);
        debug!(target_frames = target, "seeking");
        open.player.seek(target)
    }

    /// Fade out over `length` starting at `start` (measured like
    /// [`played`](Self::played)). Replaces any automatic fade.
    pub fn set_fade(&mut self, start: Duration, length: Duration) -> Result<()> {
        let sample_rate = self.sample_rate;
        let open = self.started_mut()?;
        open.player.set_fade(
            timing::duration_to_frames(start, sample_rate),
            timing::duration_to_frames(length, sample_rate),
        );
        Ok(())
    }

    /// Total voices across all units (0 once closed).
    pub fn voice_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |open| open.voice_names.len())
    }

    /// Display name of a session-wide voice index.
    pub fn voice_name(&self, voice: usize) -> Option<&'static str> {
        self.inner
            .as_ref()
            .and_then(|open| open.voice_names.get(voice).copied())
    }

    /// Mute or unmute one session-wide voice.
    pub fn mute_voice(&mut self, voice: usize, muted: bool) -> Result<()> {
        let open = self.open_mut()?;
        let mut mask = open.player.voice_mask();
        mask.set(VoiceMask::voice(voice), muted);
        open.player.set_voice_mask(mask);
        Ok(())
    }

    /// Replace the session-wide mute mask.
    pub fn mute_voices(&mut self, mask: VoiceMask) -> Result<()> {
        self.open_mut()?.player.set_voice_mask(mask);
        Ok(())
    }

    /// Currently muted voices.
    pub fn muted_voices(&self) -> VoiceMask {
        self.inner
            .as_ref()
            .map_or(VoiceMask::empty(), |open| open.player.voice_mask())
    }

    /// Set the stereo spread of every unit (`0.0` mono to `1.0` full).
    pub fn set_stereo_depth(&mut self, depth: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&depth) {
            return Err(Error::InvalidConfig {
                msg: format!("stereo depth {depth} outside 0.0..=1.0"),
            });
        }
        let open = self.open_mut()?;
        open.config.stereo_depth = depth;
        open.player.set_stereo_depth(depth);
        Ok(())
    }

    /// Change playback speed in percent.
    pub fn set_tempo(&mut self, percent: u32) -> Result<()> {
        if !(MIN_TEMPO_PERCENT..=MAX_TEMPO_PERCENT).contains(&percent) {
            return Err(Error::InvalidConfig {
                msg: format!(
                    "tempo {percent}% outside {MIN_TEMPO_PERCENT}..={MAX_TEMPO_PERCENT}"
                ),
            });
        }
        let open = self.open_mut()?;
        open.config.tempo_percent = percent;
        open.player.set_tempo(percent);
        Ok(())
    }

    /// Chip unit of the current track, for inspection.
    pub fn chip(&self, unit: usize) -> Option<&dyn ChipModel> {
        self.inner.as_ref().and_then(|open| open.player.chip(unit))
    }

    /// Wrap the session for use from several threads.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }
}

fn validate_sample_rate(sample_rate: u32) -> Result<()> {
    if sample_rate == 0 || sample_rate > MAX_SAMPLE_RATE {
        return Err(Error::InvalidSampleRate(sample_rate));
    }
    Ok(())
}
