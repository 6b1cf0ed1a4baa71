//! Conversions between event ticks, output frames and wall time.

use std::time::Duration;

/// Maps event ticks to output frames for one track.
///
/// `frame = tick * sample_rate * 100 / (tick_rate * tempo_percent)`, computed
/// in 64-bit integers and floored, so the mapping is exact and monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    tick_rate: u32,
    sample_rate: u32,
    tempo_percent: u32,
}

impl FrameClock {
    /// Clock at normal tempo.
    pub fn new(tick_rate: u32, sample_rate: u32) -> Self {
        Self {
            tick_rate: tick_rate.max(1),
            sample_rate,
            tempo_percent: 100,
        }
    }

    /// Ticks per second.
    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Output frames per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback speed in percent (100 = as authored).
    pub fn tempo_percent(&self) -> u32 {
        self.tempo_percent
    }

    /// Change the playback speed (0 is treated as 1).
    pub fn set_tempo_percent(&mut self, percent: u32) {
        self.tempo_percent = percent.max(1);
    }

    /// Output frame at which an event at `tick` is due.
    #[inline]
    pub fn tick_to_frame(&self, tick: u32) -> u64 {
        u64::from(tick) * u64::from(self.sample_rate) * 100
            / (u64::from(self.tick_rate) * u64::from(self.tempo_percent))
    }
}

/// Number of frames covering `ms` milliseconds at `sample_rate`.
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> u64 {
    ms * u64::from(sample_rate) / 1000
}

/// Number of frames covering `duration` at `sample_rate`.
pub fn duration_to_frames(duration: Duration, sample_rate: u32) -> u64 {
    let frames = duration.as_nanos() * u128::from(sample_rate) / 1_000_000_000;
    u64::try_from(frames).unwrap_or(u64::MAX)
}

/// Wall time covered by `frames` at `sample_rate`.
pub fn frames_to_duration(frames: u64, sample_rate: u32) -> Duration {
    let rate = u64::from(sample_rate.max(1));
    let nanos = (frames % rate) * 1_000_000_000 / rate;
    Duration::from_secs(frames / rate) + Duration::from_nanos(nanos)
}
