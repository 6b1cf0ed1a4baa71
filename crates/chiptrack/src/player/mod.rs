//! Event sequencer driving a set of chip models.
//!
//! The player walks a [`TrackProgram`] on the output frame timeline. For each
//! window it dispatches every event that is due, renders all chips up to the
//! next event (or the window end), and mixes the chip outputs into
//! interleaved 16-bit stereo.

pub mod cursor;
pub mod fade;
pub mod timing;

pub use cursor::PlaybackCursor;
pub use fade::Fade;
pub use timing::FrameClock;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::format::TrackProgram;
use crate::warning::WarningLog;
use chiptrack_core::{ChipModel, StereoFrame, VoiceMask, WriteOutcome};
use fade::FADE_UNITY;
use std::time::Duration;
use tracing::trace;

/// Largest number of frames rendered per chip call.
const RENDER_CHUNK: usize = 4096;

/// Output gain scale (Q12).
const GAIN_ONE: i64 = 1 << 12;

/// Player lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No track loaded.
    Unstarted,
    /// Producing audio.
    Playing,
    /// Track finished; output is silence.
    Ended,
}

/// Sequencer for one track at a time.
pub struct SequencePlayer {
    state: PlayerState,
    clock: FrameClock,
    program: TrackProgram,
    chips: Vec<Box<dyn ChipModel>>,
    cursor: PlaybackCursor,
    loop_event: usize,
    max_loops: Option<u32>,
    gain: i64,
    fade: Option<Fade>,
    silence_timeout: Option<u64>,
    voice_mask: VoiceMask,
    stereo_depth: f32,
    scratch: Vec<StereoFrame>,
    mix: Vec<(i32, i32)>,
    warnings: WarningLog,
}

impl std::fmt::Debug for SequencePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequencePlayer")
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("cursor", &self.cursor)
            .field("events", &self.program.events.len())
            .field("chips", &self.chips.len())
            .finish_non_exhaustive()
    }
}

impl SequencePlayer {
    /// Create an idle player.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Output frames per second
    /// * `config` - Loop budget, gain, tempo, silence timeout and stereo depth
    pub fn new(sample_rate: u32, config: &SessionConfig) -> Self {
        let mut clock = FrameClock::new(1, sample_rate);
        clock.set_tempo_percent(config.tempo_percent);
        Self {
            state: PlayerState::Unstarted,
            clock,
            program: TrackProgram {
                events: Vec::new(),
                end_tick: 0,
                loop_tick: None,
            },
            chips: Vec::new(),
            cursor: PlaybackCursor::new(),
            loop_event: 0,
            max_loops: config.max_loops,
            gain: (f64::from(config.gain) * GAIN_ONE as f64).round() as i64,
            fade: None,
            silence_timeout: config
                .silence_timeout_ms
                .map(|ms| timing::ms_to_frames(u64::from(ms), sample_rate).max(1)),
            voice_mask: VoiceMask::empty(),
            stereo_depth: config.stereo_depth,
            scratch: Vec::new(),
            mix: Vec::new(),
            warnings: WarningLog::new(),
        }
    }

    /// Load a track and begin playing from tick 0.
    ///
    /// Every chip is reset to its power-on state, voice masks and stereo
    /// depth are applied, and events due at frame 0 are dispatched
    /// immediately. Any active fade is cleared.
    pub fn start(&mut self, program: TrackProgram, tick_rate: u32, chips: Vec<Box<dyn ChipModel>>) {
        let tempo = self.clock.tempo_percent();
        self.clock = FrameClock::new(tick_rate, self.clock.sample_rate());
        self.clock.set_tempo_percent(tempo);
        self.loop_event = program
            .loop_tick
            .map_or(0, |tick| program.events.partition_point(|e| e.tick < tick));
        self.program = program;
        self.chips = chips;
        self.fade = None;
        self.apply_voice_settings();
        self.restart();
    }

    /// Restart the loaded track from the beginning.
    fn restart(&mut self) {
        for chip in &mut self.chips {
            chip.reset();
        }
        self.cursor = PlaybackCursor::new();
        self.state = PlayerState::Playing;
        self.settle();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Position bookkeeping.
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// Whether the track has ended.
    pub fn is_ended(&self) -> bool {
        self.state == PlayerState::Ended
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    /// Frames produced since start, including loops.
    pub fn elapsed_frames(&self) -> u64 {
        self.cursor.elapsed
    }

    /// Time produced since start, including loops.
    pub fn elapsed(&self) -> Duration {
        timing::frames_to_duration(self.cursor.elapsed, self.clock.sample_rate())
    }

    /// Completed loop rewinds.
    pub fn loop_count(&self) -> u64 {
        self.cursor.loops
    }

    /// Chip units of the current track.
    pub fn chips(&self) -> &[Box<dyn ChipModel>] {
        &self.chips
    }

    /// One chip unit, `None` when out of range.
    pub fn chip(&self, unit: usize) -> Option<&dyn ChipModel> {
        self.chips.get(unit).map(|chip| chip.as_ref())
    }

    /// Pending warning log.
    pub fn warnings_mut(&mut self) -> &mut WarningLog {
        &mut self.warnings
    }

    /// Set the loop budget (`None` loops forever).
    pub fn set_max_loops(&mut self, max_loops: Option<u32>) {
        self.max_loops = max_loops;
    }

    /// Fade out linearly over `length` frames starting at elapsed frame `start`.
    pub fn set_fade(&mut self, start: u64, length: u64) {
        self.fade = Some(Fade::new(start, length));
    }

    /// Remove any fade.
    pub fn clear_fade(&mut self) {
        self.fade = None;
    }

    /// Active fade.
    pub fn fade(&self) -> Option<Fade> {
        self.fade
    }

    /// Change the playback speed.
    ///
    /// The track position is rescaled so playback continues from the same
    /// musical point.
    pub fn set_tempo(&mut self, percent: u32) {
        let old = u64::from(self.clock.tempo_percent());
        self.clock.set_tempo_percent(percent);
        let new = u64::from(self.clock.tempo_percent());
        self.cursor.frame = self.cursor.frame * old / new;
        if self.state == PlayerState::Playing {
            self.settle();
        }
    }

    /// Current tempo in percent.
    pub fn tempo(&self) -> u32 {
        self.clock.tempo_percent()
    }

    /// Mute voices across all units.
    ///
    /// Bit `n` addresses the `n`-th voice when the voice lists of all units
    /// are concatenated in unit order.
    pub fn set_voice_mask(&mut self, mask: VoiceMask) {
        self.voice_mask = mask;
        self.apply_voice_settings();
    }

    /// Currently muted voices.
    pub fn voice_mask(&self) -> VoiceMask {
        self.voice_mask
    }

    /// Set the stereo spread of every unit.
    pub fn set_stereo_depth(&mut self, depth: f32) {
        self.stereo_depth = depth;
        self.apply_voice_settings();
    }

    fn apply_voice_settings(&mut self) {
        let mut offset = 0;
        for chip in &mut self.chips {
            let count = chip.voice_count();
            chip.set_voice_mask(self.voice_mask.window(offset, count));
            chip.set_stereo_depth(self.stereo_depth);
            offset += count;
        }
    }

    /// Fill `out` with interleaved stereo samples.
    ///
    /// `out.len() / 2` frames are produced; a trailing odd sample is zeroed.
    /// Once the track has ended the buffer is zero-filled.
    ///
    /// # Errors
    ///
    /// [`Error::NotPlaying`] before the first [`start`](Self::start).
    pub fn advance(&mut self, out: &mut [i16]) -> Result<()> {
        match self.state {
            PlayerState::Unstarted => return Err(Error::NotPlaying),
            PlayerState::Ended => {
                out.fill(0);
                return Ok(());
            }
            PlayerState::Playing => {}
        }

        let frames = out.len() / 2;
        if out.len() % 2 == 1 {
            out[out.len() - 1] = 0;
        }

        self.check_stop_conditions();
        let mut written = 0;
        while written < frames && self.state == PlayerState::Playing {
            let chunk = self.chunk_len(frames - written);
            self.render_chunk(&mut out[written * 2..(written + chunk) * 2]);
            written += chunk;
            self.check_stop_conditions();
            if self.state == PlayerState::Playing {
                self.settle();
            }
        }
        out[written * 2..frames * 2].fill(0);
        Ok(())
    }

    /// Frames that can be rendered before the next event, the track end, a
    /// fade end, a silence timeout or the window end.
    fn chunk_len(&self, remaining: usize) -> usize {
        let mut limit = self.end_frame();
        if let Some(event) = self.program.events.get(self.cursor.next_event) {
            limit = limit.min(self.clock.tick_to_frame(event.tick));
        }
        let mut chunk = limit.saturating_sub(self.cursor.frame);
        if let Some(fade) = self.fade.filter(|f| !f.is_complete(self.cursor.elapsed)) {
            chunk = chunk.min(fade.end() - self.cursor.elapsed);
        }
        if let Some(timeout) = self.silence_timeout {
            chunk = chunk.min(timeout.saturating_sub(self.cursor.silent_run));
        }
        chunk
            .min(remaining as u64)
            .min(RENDER_CHUNK as u64)
            .max(1) as usize
    }

    fn end_frame(&self) -> u64 {
        self.clock.tick_to_frame(self.program.end_tick)
    }

    fn loop_frame(&self) -> Option<u64> {
        self.program.loop_tick.map(|tick| self.clock.tick_to_frame(tick))
    }

    /// Dispatch due events and handle end of stream until the cursor sits
    /// strictly before the next pending event and the track end.
    fn settle(&mut self) {
        loop {
            self.dispatch_due();
            if self.cursor.frame < self.end_frame() {
                return;
            }
            if !self.try_loop() {
                trace!(elapsed = self.cursor.elapsed, "track ended");
                self.end();
                return;
            }
        }
    }

    fn dispatch_due(&mut self) {
        while let Some(&event) = self.program.events.get(self.cursor.next_event) {
            if self.clock.tick_to_frame(event.tick) > self.cursor.frame {
                break;
            }
            self.cursor.next_event += 1;
            let Some(chip) = self.chips.get_mut(event.unit as usize) else {
                self.warnings
                    .record(format!("event targets missing unit {}", event.unit));
                continue;
            };
            match chip.write(event.register, event.value) {
                Ok(WriteOutcome::Applied) => {}
                Ok(WriteOutcome::Tolerated(msg)) => self.warnings.record(format!(
                    "unit {} register 0x{:02x}: {msg}",
                    event.unit, event.register
                )),
                Err(err) => self.warnings.record(err.to_string()),
            }
        }
    }

    fn try_loop(&mut self) -> bool {
        let Some(loop_frame) = self.loop_frame() else {
            return false;
        };
        if self.end_frame() <= loop_frame {
            return false;
        }
        if self.max_loops.is_some_and(|max| self.cursor.loops >= u64::from(max)) {
            return false;
        }
        self.cursor.rewind(loop_frame, self.loop_event);
        trace!(loops = self.cursor.loops, frame = loop_frame, "loop rewind");
        true
    }

    fn end(&mut self) {
        self.state = PlayerState::Ended;
        self.cursor.ended = true;
    }

    fn check_stop_conditions(&mut self) {
        if let Some(fade) = self.fade {
            if fade.is_complete(self.cursor.elapsed) {
                trace!(elapsed = self.cursor.elapsed, "fade complete");
                self.end();
                return;
            }
        }
        if let Some(timeout) = self.silence_timeout {
            if self.cursor.silent_run >= timeout {
                trace!(elapsed = self.cursor.elapsed, "silence timeout");
                self.end();
            }
        }
    }

    /// Render `out.len() / 2` frames from every chip and mix them.
    fn render_chunk(&mut self, out: &mut [i16]) {
        let frames = out.len() / 2;
        let sample_rate = self.clock.sample_rate();

        self.mix.clear();
        self.mix.resize(frames, (0, 0));
        self.scratch.resize(frames, StereoFrame::SILENCE);
        for chip in &mut self.chips {
            chip.render_into(&mut self.scratch[..frames], sample_rate);
            for (acc, frame) in self.mix.iter_mut().zip(&self.scratch[..frames]) {
                acc.0 += i32::from(frame.left);
                acc.1 += i32::from(frame.right);
            }
        }

        let start = self.cursor.elapsed;
        for (i, (&(left, right), pair)) in self.mix.iter().zip(out.chunks_exact_mut(2)).enumerate() {
            let fade = self.fade.map_or(FADE_UNITY, |f| f.gain(start.saturating_add(i as u64)));
            let scale = |sample: i32| -> i16 {
                let scaled = i64::from(sample) * self.gain / GAIN_ONE * fade / FADE_UNITY;
                scaled.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
            };
            pair[0] = scale(left);
            pair[1] = scale(right);
            if pair[0] == 0 && pair[1] == 0 {
                self.cursor.silent_run += 1;
            } else {
                self.cursor.silent_run = 0;
            }
        }

        self.cursor.advance(frames as u64);
    }

    /// Restart the track and render silently up to elapsed frame `target`.
    ///
    /// Stops early if the track ends. Loops, loop budgets, fades and the
    /// silence timeout are honored, so the resulting register state and
    /// position match continuous playback. Whole loop passes before any fade
    /// are counted without being rendered, which keeps far seeks into an
    /// endless loop bounded. Oscillator phases are not carried across the
    /// skipped passes.
    pub fn seek(&mut self, target: u64) -> Result<()> {
        if self.state == PlayerState::Unstarted {
            return Err(Error::NotPlaying);
        }
        self.restart();

        let horizon = self.fade.map_or(target, |fade| target.min(fade.start()));
        let (skipped, horizon) = self.skippable_loops(horizon);
        let folded = horizon - skipped.frames;
        self.cursor.loops = skipped.passes;
        self.discard_until(folded)?;
        if skipped.frames > 0 && self.cursor.elapsed == folded {
            trace!(passes = skipped.passes, frames = skipped.frames, "seek skipped loop passes");
            self.cursor.elapsed += skipped.frames;
            self.check_stop_conditions();
        }
        self.discard_until(target)
    }

    /// Whole loop passes that a seek to `horizon` can count instead of
    /// render, along with the horizon clamped to the end of a bounded loop.
    ///
    /// At least the intro, one full pass and the silence timeout are always
    /// rendered so loop and silence bookkeeping reach their steady state.
    fn skippable_loops(&self, horizon: u64) -> (SkippedLoops, u64) {
        let none = SkippedLoops { passes: 0, frames: 0 };
        let Some(loop_frame) = self.loop_frame() else {
            return (none, horizon);
        };
        let end = self.end_frame();
        if end <= loop_frame {
            return (none, horizon);
        }
        let period = end - loop_frame;
        let horizon = match self.max_loops {
            Some(max) => horizon.min(end.saturating_add(u64::from(max).saturating_mul(period))),
            None => horizon,
        };
        let lead = end
            .saturating_add(period)
            .saturating_add(self.silence_timeout.unwrap_or(0));
        let passes = horizon.saturating_sub(lead) / period;
        (
            SkippedLoops {
                passes,
                frames: passes * period,
            },
            horizon,
        )
    }

    fn discard_until(&mut self, target: u64) -> Result<()> {
        let mut discard = vec![0i16; RENDER_CHUNK * 2];
        while self.cursor.elapsed < target && self.state == PlayerState::Playing {
            let frames = (target - self.cursor.elapsed).min(RENDER_CHUNK as u64) as usize;
            self.advance(&mut discard[..frames * 2])?;
        }
        Ok(())
    }
}

/// Loop passes a seek accounts for without rendering.
#[derive(Debug, Clone, Copy)]
struct SkippedLoops {
    passes: u64,
    frames: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Event;
    use chiptrack_core::ChipKind;

    const RATE: u32 = 1000;

    fn wavetable() -> Vec<Box<dyn ChipModel>> {
        vec![ChipKind::Wavetable.build(3_579_545)]
    }

    fn program(events: Vec<Event>, end_tick: u32, loop_tick: Option<u32>) -> TrackProgram {
        TrackProgram {
            events,
            end_tick,
            loop_tick,
        }
    }

    fn player() -> SequencePlayer {
        SequencePlayer::new(RATE, &SessionConfig::default())
    }

    #[test]
    fn test_advance_before_start() {
        let mut player = player();
        let mut buf = [0i16; 8];
        assert!(matches!(player.advance(&mut buf), Err(Error::NotPlaying)));
        assert_eq!(player.state(), PlayerState::Unstarted);
    }

    #[test]
    fn test_tick_zero_dispatched_on_start() {
        let mut player = player();
        player.start(program(vec![Event::new(0, 0, 0x00, 0x55)], 100, None), 1000, wavetable());
        assert_eq!(player.chip(0).and_then(|c| c.read_register(0)), Some(0x55));
    }

    #[test]
    fn test_event_due_at_window_end_is_dispatched() {
        let mut player = player();
        let events = vec![Event::new(0, 0, 0x00, 1), Event::new(50, 0, 0x01, 2)];
        player.start(program(events, 100, None), 1000, wavetable());
        let mut buf = vec![0i16; 49 * 2];
        player.advance(&mut buf).unwrap();
        assert_eq!(player.chip(0).and_then(|c| c.read_register(1)), Some(0));
        let mut buf = [0i16; 2];
        player.advance(&mut buf).unwrap();
        assert_eq!(player.elapsed_frames(), 50);
        assert_eq!(player.chip(0).and_then(|c| c.read_register(1)), Some(2));
    }

    #[test]
    fn test_ends_at_end_tick() {
        let mut player = player();
        player.start(program(vec![Event::new(0, 0, 0, 0)], 100, None), 1000, wavetable());
        let mut buf = vec![1i16; 300];
        player.advance(&mut buf).unwrap();
        assert!(player.is_ended());
        assert_eq!(player.elapsed_frames(), 100);
        assert!(buf[200..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_empty_track_ends_immediately() {
        let mut player = player();
        player.start(program(vec![], 0, None), 1000, wavetable());
        assert!(player.is_ended());
        let mut buf = [7i16; 4];
        player.advance(&mut buf).unwrap();
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn test_odd_sample_zeroed() {
        let mut player = player();
        player.start(program(vec![], 1000, None), 1000, wavetable());
        let mut buf = [9i16; 5];
        player.advance(&mut buf).unwrap();
        assert_eq!(buf[4], 0);
        assert_eq!(player.elapsed_frames(), 2);
    }

    #[test]
    fn test_loop_budget() {
        let mut config = SessionConfig::default();
        config.max_loops = Some(2);
        let mut player = SequencePlayer::new(RATE, &config);
        let events = vec![Event::new(0, 0, 0, 1), Event::new(40, 0, 1, 2)];
        player.start(program(events, 100, Some(20)), 1000, wavetable());
        let mut buf = vec![0i16; 1000];
        player.advance(&mut buf).unwrap();
        // 100 frames, then two 80-frame loops
        assert!(player.is_ended());
        assert_eq!(player.loop_count(), 2);
        assert_eq!(player.elapsed_frames(), 260);
    }

    #[test]
    fn test_infinite_loop_never_ends() {
        let mut config = SessionConfig::default();
        config.silence_timeout_ms = None;
        let mut player = SequencePlayer::new(RATE, &config);
        player.start(program(vec![Event::new(0, 0, 0, 1)], 10, Some(0)), 1000, wavetable());
        let mut buf = vec![0i16; 2000];
        for _ in 0..10 {
            player.advance(&mut buf).unwrap();
        }
        assert!(!player.is_ended());
        assert_eq!(player.loop_count(), 1000);
    }

    #[test]
    fn test_fade_ends_track() {
        let mut player = player();
        player.start(program(vec![], 10_000, None), 1000, wavetable());
        player.set_fade(100, 50);
        let mut buf = vec![0i16; 1000];
        player.advance(&mut buf).unwrap();
        assert!(player.is_ended());
        assert_eq!(player.elapsed_frames(), 150);
    }

    #[test]
    fn test_silence_timeout() {
        let mut config = SessionConfig::default();
        config.silence_timeout_ms = Some(200);
        let mut player = SequencePlayer::new(RATE, &config);
        player.start(program(vec![], 10_000, None), 1000, wavetable());
        let mut buf = vec![0i16; 2000];
        player.advance(&mut buf).unwrap();
        assert!(player.is_ended());
        assert_eq!(player.elapsed_frames(), 200);
    }

    #[test]
    fn test_seek_lands_on_target() {
        let mut player = player();
        let events = vec![Event::new(0, 0, 0, 1), Event::new(700, 0, 1, 9)];
        player.start(program(events, 1000, None), 1000, wavetable());
        player.seek(750).unwrap();
        assert_eq!(player.elapsed_frames(), 750);
        assert_eq!(player.chip(0).and_then(|c| c.read_register(1)), Some(9));
        player.seek(100).unwrap();
        assert_eq!(player.elapsed_frames(), 100);
        assert_eq!(player.chip(0).and_then(|c| c.read_register(1)), Some(0));
    }

    #[test]
    fn test_seek_skips_whole_loop_passes() {
        let mut config = SessionConfig::default();
        config.silence_timeout_ms = None;
        let mut player = SequencePlayer::new(RATE, &config);
        let events = vec![
            Event::new(0, 0, 0, 1),
            Event::new(20, 0, 1, 2),
            Event::new(60, 0, 1, 3),
        ];
        player.start(program(events, 100, Some(20)), 1000, wavetable());

        // 100-frame first pass, then 80-frame loop passes starting at frame 20
        let passes = 1_000_000_000u64;
        player.seek(100 + 80 * passes + 30).unwrap();
        assert_eq!(player.elapsed_frames(), 100 + 80 * passes + 30);
        assert_eq!(player.loop_count(), passes + 1);
        assert_eq!(player.cursor().frame, 50);
        assert_eq!(player.chip(0).and_then(|c| c.read_register(1)), Some(2));
        assert!(!player.is_ended());

        let mut buf = vec![0i16; 40 * 2];
        player.advance(&mut buf).unwrap();
        assert_eq!(player.chip(0).and_then(|c| c.read_register(1)), Some(3));
    }

    #[test]
    fn test_seek_to_far_end_of_endless_loop() {
        let mut config = SessionConfig::default();
        config.silence_timeout_ms = None;
        let mut player = SequencePlayer::new(RATE, &config);
        player.start(program(vec![Event::new(0, 0, 0, 1)], 10, Some(0)), 1000, wavetable());
        player.seek(u64::MAX).unwrap();
        assert!(!player.is_ended());
        assert_eq!(player.elapsed_frames(), u64::MAX);
        let mut buf = vec![0i16; 64];
        player.advance(&mut buf).unwrap();
        assert!(!player.is_ended());
    }

    #[test]
    fn test_seek_past_loop_budget_ends() {
        let mut config = SessionConfig::default();
        config.max_loops = Some(3);
        let mut player = SequencePlayer::new(RATE, &config);
        let events = vec![Event::new(0, 0, 0, 1), Event::new(40, 0, 1, 2)];
        player.start(program(events, 100, Some(20)), 1000, wavetable());
        player.seek(1_000_000).unwrap();
        assert!(player.is_ended());
        assert_eq!(player.loop_count(), 3);
        assert_eq!(player.elapsed_frames(), 340);
    }

    #[test]
    fn test_seek_keeps_fade_position() {
        let mut config = SessionConfig::default();
        config.silence_timeout_ms = None;
        let mut player = SequencePlayer::new(RATE, &config);
        player.start(program(vec![Event::new(0, 0, 0, 1)], 100, Some(20)), 1000, wavetable());
        player.set_fade(50_000, 100);
        player.seek(50_050).unwrap();
        assert!(!player.is_ended());
        assert_eq!(player.elapsed_frames(), 50_050);
        let mut buf = vec![0i16; 100 * 2];
        player.advance(&mut buf).unwrap();
        assert!(player.is_ended());
        assert_eq!(player.elapsed_frames(), 50_100);
    }

    #[test]
    fn test_tempo_doubles_speed() {
        let mut config = SessionConfig::default();
        config.tempo_percent = 200;
        let mut player = SequencePlayer::new(RATE, &config);
        player.start(program(vec![], 100, None), 1000, wavetable());
        let mut buf = vec![0i16; 400];
        player.advance(&mut buf).unwrap();
        assert!(player.is_ended());
        assert_eq!(player.elapsed_frames(), 50);
    }

    #[test]
    fn test_tolerated_write_recorded() {
        let mut player = player();
        player.start(program(vec![Event::new(0, 0, 0xE0, 1)], 10, None), 1000, wavetable());
        let warning = player.warnings_mut().take().unwrap();
        assert!(warning.contains("0xe0"));
    }

    #[test]
    fn test_voice_mask_split_across_units() {
        let mut player = player();
        let chips = vec![
            ChipKind::Ym2149.build(2_000_000),
            ChipKind::Wavetable.build(3_579_545),
        ];
        player.start(program(vec![], 10, None), 1000, chips);
        player.set_voice_mask(VoiceMask::voice(1) | VoiceMask::voice(4));
        assert_eq!(player.chips()[0].voice_mask(), VoiceMask::VOICE_2);
        assert_eq!(player.chips()[1].voice_mask(), VoiceMask::VOICE_2);
    }
}
