//! Error handling for container parsing and playback.

use chiptrack_core::ChipError;
use thiserror::Error;

/// Convenient result alias for parsing and playback.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing an image or driving a session.
///
/// Parse errors (`BadMagic`, `Truncated`, `BadMetadata`, `MalformedEvents`,
/// `OutOfBounds`) are detected at open or start and leave the session as it
/// was. Usage errors (`InvalidTrack`, `NotStarted`, `NotPlaying`,
/// `ClosedSession`) never mutate state either.
#[derive(Debug, Error)]
pub enum Error {
    /// Image does not start with the `CHTK` signature.
    #[error("image must start with CHTK signature")]
    BadMagic,
    /// A fixed-size section extends past the end of the image.
    #[error("image truncated: {section} needs {needed} bytes, image has {len}")]
    Truncated {
        /// Section being read.
        section: &'static str,
        /// Bytes required from the start of the image.
        needed: usize,
        /// Actual image length.
        len: usize,
    },
    /// Header or table content is inconsistent.
    #[error("bad metadata: {msg}")]
    BadMetadata {
        /// Human-readable explanation of the validation failure.
        msg: String,
    },
    /// A track's event stream violates ordering or addressing rules.
    #[error("malformed events in track {track} at event {event}: {msg}")]
    MalformedEvents {
        /// Track index.
        track: usize,
        /// Index of the offending event within the stream.
        event: usize,
        /// Human-readable explanation.
        msg: String,
    },
    /// A read ran past the end of the image.
    #[error("read of {width} bytes at offset 0x{offset:x} exceeds image length {len}")]
    OutOfBounds {
        /// Requested offset.
        offset: usize,
        /// Requested width in bytes.
        width: usize,
        /// Image length.
        len: usize,
    },
    /// Track index outside `0..track_count`.
    #[error("track {index} out of range (image has {count} tracks)")]
    InvalidTrack {
        /// Requested index.
        index: usize,
        /// Number of tracks in the image.
        count: usize,
    },
    /// A chip rejected a register write.
    #[error(transparent)]
    InvalidRegister(#[from] ChipError),
    /// Sample rate is zero or above the supported maximum.
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(u32),
    /// `play` was called before any track was started.
    #[error("no track has been started")]
    NotStarted,
    /// The player was advanced before `start`.
    #[error("player is not playing")]
    NotPlaying,
    /// The session has been closed.
    #[error("session is closed")]
    ClosedSession,
    /// A configuration value is out of range.
    #[error("invalid configuration: {msg}")]
    InvalidConfig {
        /// Human-readable explanation.
        msg: String,
    },
    /// Configuration text could not be deserialized.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn bad_metadata(msg: impl Into<String>) -> Self {
        Error::BadMetadata { msg: msg.into() }
    }

    pub(crate) fn malformed(track: usize, event: usize, msg: impl Into<String>) -> Self {
        Error::MalformedEvents {
            track,
            event,
            msg: msg.into(),
        }
    }
}
