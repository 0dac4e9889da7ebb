//! Host configuration
//!
//! Values come from three layers: built-in defaults, an optional TOML file,
//! and command-line flags, each overriding the one before. Everything is
//! validated before the port is opened.

pub mod loader;

use std::time::Duration;

use chrono_tz::Tz;
use clap::ValueEnum;
use lospanel_display::ClockFace;
use lospanel_hal::SerialConfig;
use lospanel_protocol::{clamp_level, DisplayGeometry, StreamingMode};
use serde::Deserialize;

use crate::clock::{ClockOptions, SystemClock};
use crate::smoke::payload::DEFAULT_FILL;
use crate::smoke::runner::{CaptureOptions, ProbeOptions, DEFAULT_ACK_MARKER, DEFAULT_BOOT_MARKER};
use crate::staging::StagingPolicy;

pub use loader::{load, ConfigError, DEFAULT_CONFIG_FILE};

/// Streaming mode as written in config files and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StreamingChoice {
    Immediate,
    Safe,
}

impl From<StreamingChoice> for StreamingMode {
    fn from(choice: StreamingChoice) -> Self {
        match choice {
            StreamingChoice::Immediate => StreamingMode::Immediate,
            StreamingChoice::Safe => StreamingMode::Safe,
        }
    }
}

/// `[serial]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSection {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM6`
    pub port: Option<String>,
    pub baud: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            port: None,
            baud: lospanel_hal::uart::DEFAULT_BAUDRATE,
            read_timeout_ms: 100,
        }
    }
}

/// `[display]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySection {
    pub width: u8,
    pub height: u8,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            width: 20,
            height: 4,
        }
    }
}

/// `[staging]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagingSection {
    pub settle_ms: u64,
    pub after_clear_ms: u64,
    pub slot_delay_ms: u64,
    pub chunk_delay_ms: u64,
    pub mode_settle_ms: u64,
    /// Requested level; clamped into 0..=255
    pub backlight: i64,
    pub streaming: Option<StreamingChoice>,
}

impl Default for StagingSection {
    fn default() -> Self {
        Self {
            settle_ms: 3000,
            after_clear_ms: 10,
            slot_delay_ms: 15,
            chunk_delay_ms: 0,
            mode_settle_ms: 50,
            backlight: 255,
            streaming: None,
        }
    }
}

/// `[clock]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockSection {
    /// IANA zone name; local time when unset
    pub tz: Option<String>,
    pub min_sleep_ms: u64,
    /// Stop after this many ticks; run forever when unset
    pub ticks: Option<u64>,
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            tz: None,
            min_sleep_ms: 10,
            ticks: None,
        }
    }
}

/// `[smoke]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmokeSection {
    pub capture_ms: u64,
    pub join_timeout_ms: u64,
    pub fill: u8,
    pub hold_ms: u64,
    /// Probe pacing; the probe does not share the clock's glyph delays
    pub probe_slot_delay_ms: u64,
    pub probe_after_clear_ms: u64,
    pub ack_marker: String,
    pub boot_marker: String,
}

impl Default for SmokeSection {
    fn default() -> Self {
        Self {
            capture_ms: 5000,
            join_timeout_ms: 1000,
            fill: DEFAULT_FILL,
            hold_ms: 2000,
            probe_slot_delay_ms: 0,
            probe_after_clear_ms: 5,
            ack_marker: DEFAULT_ACK_MARKER.to_string(),
            boot_marker: DEFAULT_BOOT_MARKER.to_string(),
        }
    }
}

/// Complete host configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub serial: SerialSection,
    pub display: DisplaySection,
    pub staging: StagingSection,
    pub clock: ClockSection,
    pub smoke: SmokeSection,
}

impl HostConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Port name, required before anything is opened
    pub fn port(&self) -> Result<&str, ConfigError> {
        self.serial.port.as_deref().ok_or(ConfigError::MissingPort)
    }

    pub fn serial_config(&self) -> Result<SerialConfig, ConfigError> {
        if self.serial.baud == 0 {
            return Err(ConfigError::InvalidBaud);
        }
        Ok(SerialConfig::with_baudrate(self.serial.baud)
            .read_timeout(Duration::from_millis(self.serial.read_timeout_ms)))
    }

    pub fn geometry(&self) -> Result<DisplayGeometry, ConfigError> {
        DisplayGeometry::new(self.display.width, self.display.height).map_err(ConfigError::Geometry)
    }

    /// Geometry checked against the clock layout
    pub fn clock_face(&self) -> Result<ClockFace, ConfigError> {
        ClockFace::new(self.geometry()?).map_err(ConfigError::Layout)
    }

    pub fn system_clock(&self) -> Result<SystemClock, ConfigError> {
        match &self.clock.tz {
            None => Ok(SystemClock::Local),
            Some(name) => parse_timezone(name).map(SystemClock::Zoned),
        }
    }

    pub fn backlight(&self) -> u8 {
        clamp_level(self.staging.backlight)
    }

    pub fn streaming(&self) -> Option<StreamingMode> {
        self.staging.streaming.map(StreamingMode::from)
    }

    pub fn staging_policy(&self) -> StagingPolicy {
        let s = &self.staging;
        StagingPolicy {
            settle: Duration::from_millis(s.settle_ms),
            after_clear: Duration::from_millis(s.after_clear_ms),
            slot_delay: Duration::from_millis(s.slot_delay_ms),
            chunk_delay: Duration::from_millis(s.chunk_delay_ms),
            mode_settle: Duration::from_millis(s.mode_settle_ms),
        }
    }

    /// Staging policy for the probe, with its own slot and after-clear delays
    pub fn probe_policy(&self) -> StagingPolicy {
        StagingPolicy {
            slot_delay: Duration::from_millis(self.smoke.probe_slot_delay_ms),
            after_clear: Duration::from_millis(self.smoke.probe_after_clear_ms),
            ..self.staging_policy()
        }
    }

    pub fn clock_options(&self) -> ClockOptions {
        ClockOptions {
            streaming: self.streaming(),
            backlight: self.backlight(),
            min_sleep: Duration::from_millis(self.clock.min_sleep_ms),
        }
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            streaming: self.streaming(),
            capture: Duration::from_millis(self.smoke.capture_ms),
            join_timeout: Duration::from_millis(self.smoke.join_timeout_ms),
            ack_marker: self.smoke.ack_marker.clone(),
            boot_marker: self.smoke.boot_marker.clone(),
        }
    }

    /// Probe options; the backlight is only sent when asked for
    pub fn probe_options(&self, backlight: Option<i64>) -> ProbeOptions {
        ProbeOptions {
            backlight: backlight.map(clamp_level),
            hold: Duration::from_millis(self.smoke.hold_ms),
        }
    }
}

/// Resolve an IANA zone name
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
}
