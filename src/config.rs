//! Controller configuration

use embassy_time::Duration;

use crate::codec::DecodeLimits;
use crate::state::Preferences;

/// Default target frame rate
pub const DEFAULT_FRAME_RATE: u32 = 240;

/// Pixel count of the default strip
pub const DEFAULT_STRIP_LEN: usize = 840;

/// Name of the default strip
pub const DEFAULT_STRIP_NAME: &str = "default";

/// Brightness used until preferences say otherwise
pub const DEFAULT_BRIGHTNESS: u8 = 30;

/// Storage name of the effect state document
pub const STATE_FILE: &str = "effects.msgpack";

/// Storage name of the preferences document
pub const PREFERENCES_FILE: &str = "prefs.msgpack";

/// One physical strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripConfig {
    /// Strip id used by the protocol and the state document
    pub name: String,
    /// Pixel count
    pub len: usize,
}

impl StripConfig {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

/// Configuration of the whole controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Strips in output order
    pub strips: Vec<StripConfig>,
    /// Target frames per second of the scheduler
    pub frame_rate: u32,
    /// Scratch limits for decoding stored documents and inbound messages
    pub decode: DecodeLimits,
    /// Preferences used when none are stored
    pub preferences: Preferences,
}

impl ControllerConfig {
    /// Duration of one frame at `frame_rate`
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.frame_rate.max(1)))
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            strips: vec![StripConfig::new(DEFAULT_STRIP_NAME, DEFAULT_STRIP_LEN)],
            frame_rate: DEFAULT_FRAME_RATE,
            decode: DecodeLimits::default(),
            preferences: Preferences::default(),
        }
    }
}
