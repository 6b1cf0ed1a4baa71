//! Session configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a valid
//! configuration.
//!
//! ```
//! use chiptrack::SessionConfig;
//!
//! let config = SessionConfig::from_json_str(r#"{ "max_loops": 2, "fade_length_ms": 8000 }"#).unwrap();
//! assert_eq!(config.max_loops, Some(2));
//! assert_eq!(config.tempo_percent, 100);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Slowest accepted tempo in percent.
pub const MIN_TEMPO_PERCENT: u32 = 10;

/// Fastest accepted tempo in percent.
pub const MAX_TEMPO_PERCENT: u32 = 1000;

/// Largest accepted output gain.
pub const MAX_GAIN: f32 = 16.0;

/// Continuous silence after which a track ends by default.
pub const DEFAULT_SILENCE_TIMEOUT_MS: u32 = 6000;

/// Playback options applied to every track a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Loop rewinds before a looping track ends. `None` loops forever.
    pub max_loops: Option<u32>,
    /// Stereo spread, `0.0` (mono) to `1.0` (full).
    pub stereo_depth: f32,
    /// Linear output gain applied after mixing.
    pub gain: f32,
    /// Playback speed in percent.
    pub tempo_percent: u32,
    /// When non-zero, fade out over this many ms starting at the track's
    /// play length.
    pub fade_length_ms: u32,
    /// End the track after this much continuous silence. `None` (JSON
    /// `null`) plays silent stretches to the end.
    pub silence_timeout_ms: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_loops: None,
            stereo_depth: 1.0,
            gain: 1.0,
            tempo_percent: 100,
            fade_length_ms: 0,
            silence_timeout_ms: Some(DEFAULT_SILENCE_TIMEOUT_MS),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field is within its supported range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.stereo_depth) {
            return Err(Error::InvalidConfig {
                msg: format!("stereo_depth {} outside 0.0..=1.0", self.stereo_depth),
            });
        }
        if !(0.0..=MAX_GAIN).contains(&self.gain) {
            return Err(Error::InvalidConfig {
                msg: format!("gain {} outside 0.0..={MAX_GAIN}", self.gain),
            });
        }
        if !(MIN_TEMPO_PERCENT..=MAX_TEMPO_PERCENT).contains(&self.tempo_percent) {
            return Err(Error::InvalidConfig {
                msg: format!(
                    "tempo_percent {} outside {MIN_TEMPO_PERCENT}..={MAX_TEMPO_PERCENT}",
                    self.tempo_percent
                ),
            });
        }
        if self.silence_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig {
                msg: "silence_timeout_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}
