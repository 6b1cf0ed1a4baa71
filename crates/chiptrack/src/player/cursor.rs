//! Playback position bookkeeping.

/// Position of a [`SequencePlayer`](super::SequencePlayer) within its track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    /// Frame position on the track timeline (rewinds on loop).
    pub frame: u64,
    /// Index of the next event to dispatch.
    pub next_event: usize,
    /// Frames produced since start, including loops. Never rewinds.
    pub elapsed: u64,
    /// Completed loop rewinds.
    pub loops: u64,
    /// Consecutive all-zero output frames.
    pub silent_run: u64,
    /// Whether the track has ended.
    pub ended: bool,
}

impl PlaybackCursor {
    /// Cursor at the start of a track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move forward by `frames` rendered frames.
    #[inline]
    pub fn advance(&mut self, frames: u64) {
        self.frame += frames;
        self.elapsed = self.elapsed.saturating_add(frames);
    }

    /// Jump back to the loop start.
    pub fn rewind(&mut self, frame: u64, next_event: usize) {
        self.frame = frame;
        self.next_event = next_event;
        self.loops += 1;
    }
}
