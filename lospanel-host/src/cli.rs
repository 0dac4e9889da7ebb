//! Command-line interface
//!
//! Flags override the configuration file; anything left unset keeps the
//! file's value (or the built-in default).

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::{HostConfig, StreamingChoice};

#[derive(Debug, Parser)]
#[command(
    name = "lospanel",
    version,
    about = "Clock demo and smoke tests for los-panel serial displays"
)]
pub struct Cli {
    /// Configuration file (default: ./lospanel.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Big-digit clock: date, HH:MM with a flashing colon, year
    Clock(ClockArgs),
    /// Clear, home and an 80-byte fill while capturing firmware logs
    Fill(SmokeArgs),
    /// 1024-byte backlight/address/text burst while capturing firmware logs
    Stress(SmokeArgs),
    /// Program eight test glyphs and show codes 0..7 on rows 0 and 1
    Probe(ProbeArgs),
    /// Print a payload as hex without opening a port
    Dump(DumpArgs),
}

impl Commands {
    /// Fold this command's flags into `config`
    pub fn apply(&self, config: &mut HostConfig) {
        match self {
            Commands::Clock(args) => args.apply(config),
            Commands::Fill(args) | Commands::Stress(args) => args.apply(config),
            Commands::Probe(args) => args.apply(config),
            Commands::Dump(args) => args.apply(config),
        }
    }
}

/// Port selection and reset settling, shared by every command that opens a port
#[derive(Debug, Default, Args)]
pub struct LinkArgs {
    /// Serial port, e.g. /dev/ttyUSB0 or COM6
    #[arg(long)]
    pub port: Option<String>,

    #[arg(long)]
    pub baud: Option<u32>,

    /// Seconds to wait after opening the port (board auto-reset)
    #[arg(long, value_name = "SECONDS")]
    pub delay: Option<f64>,
}

impl LinkArgs {
    fn apply(&self, config: &mut HostConfig) {
        if let Some(port) = &self.port {
            config.serial.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.serial.baud = baud;
        }
        if let Some(delay) = self.delay {
            config.staging.settle_ms = secs_to_ms(delay);
        }
    }
}

/// Display size flags
#[derive(Debug, Default, Args)]
pub struct GeometryArgs {
    /// Display columns
    #[arg(long)]
    pub width: Option<u8>,

    /// Display rows
    #[arg(long)]
    pub height: Option<u8>,
}

impl GeometryArgs {
    fn apply(&self, config: &mut HostConfig) {
        if let Some(width) = self.width {
            config.display.width = width;
        }
        if let Some(height) = self.height {
            config.display.height = height;
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct ClockArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// Backlight level 0-255 (out-of-range values are clamped)
    #[arg(long, allow_negative_numbers = true)]
    pub backlight: Option<i64>,

    /// Streaming-mode hint for dual builds
    #[arg(long, value_enum)]
    pub streaming: Option<StreamingChoice>,

    /// Delay between CGRAM slot uploads
    #[arg(long)]
    pub slot_delay_ms: Option<u64>,

    /// Delay after clear/home before DDRAM writes
    #[arg(long)]
    pub after_clear_ms: Option<u64>,

    /// Timezone name, e.g. Europe/London (default: local time)
    #[arg(long)]
    pub tz: Option<String>,

    /// Stop after this many ticks
    #[arg(long)]
    pub ticks: Option<u64>,
}

impl ClockArgs {
    fn apply(&self, config: &mut HostConfig) {
        self.link.apply(config);
        self.geometry.apply(config);
        if let Some(level) = self.backlight {
            config.staging.backlight = level;
        }
        if let Some(streaming) = self.streaming {
            config.staging.streaming = Some(streaming);
        }
        if let Some(ms) = self.slot_delay_ms {
            config.staging.slot_delay_ms = ms;
        }
        if let Some(ms) = self.after_clear_ms {
            config.staging.after_clear_ms = ms;
        }
        if let Some(tz) = &self.tz {
            config.clock.tz = Some(tz.clone());
        }
        if let Some(ticks) = self.ticks {
            config.clock.ticks = Some(ticks);
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct SmokeArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    /// Seconds to keep capturing logs after sending
    #[arg(long, value_name = "SECONDS")]
    pub capture: Option<f64>,

    /// Fill byte / stress seed, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_byte)]
    pub fill: Option<u8>,

    /// Streaming mode to select before the payload
    #[arg(long, value_enum)]
    pub streaming: Option<StreamingChoice>,
}

impl SmokeArgs {
    fn apply(&self, config: &mut HostConfig) {
        self.link.apply(config);
        if let Some(capture) = self.capture {
            config.smoke.capture_ms = secs_to_ms(capture);
        }
        if let Some(fill) = self.fill {
            config.smoke.fill = fill;
        }
        if let Some(streaming) = self.streaming {
            config.staging.streaming = Some(streaming);
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// Seconds to keep the port open after sending
    #[arg(long, value_name = "SECONDS")]
    pub hold: Option<f64>,

    /// Backlight level to send first (0-255, clamped); not sent when omitted
    #[arg(long, allow_negative_numbers = true)]
    pub backlight: Option<i64>,

    /// Delay between CGRAM and DDRAM phases
    #[arg(long)]
    pub chunk_delay_ms: Option<u64>,

    /// Delay between CGRAM slot uploads [default: 0]
    #[arg(long)]
    pub slot_delay_ms: Option<u64>,

    /// Delay after clear/home before DDRAM writes [default: 5]
    #[arg(long)]
    pub after_clear_ms: Option<u64>,
}

impl ProbeArgs {
    fn apply(&self, config: &mut HostConfig) {
        self.link.apply(config);
        self.geometry.apply(config);
        if let Some(hold) = self.hold {
            config.smoke.hold_ms = secs_to_ms(hold);
        }
        if let Some(ms) = self.chunk_delay_ms {
            config.staging.chunk_delay_ms = ms;
        }
        if let Some(ms) = self.slot_delay_ms {
            config.smoke.probe_slot_delay_ms = ms;
        }
        if let Some(ms) = self.after_clear_ms {
            config.smoke.probe_after_clear_ms = ms;
        }
    }
}

/// Payloads that can be dumped
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayloadKind {
    Fill,
    Stress,
    Probe,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    #[arg(value_enum)]
    pub payload: PayloadKind,

    /// Fill byte / stress seed, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_byte)]
    pub fill: Option<u8>,

    #[command(flatten)]
    pub geometry: GeometryArgs,
}

impl DumpArgs {
    fn apply(&self, config: &mut HostConfig) {
        self.geometry.apply(config);
        if let Some(fill) = self.fill {
            config.smoke.fill = fill;
        }
    }
}

/// Parse `90`, `0x5A` or `0X5a` as a byte
pub fn parse_byte(text: &str) -> Result<u8, String> {
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    u8::from_str_radix(digits, radix).map_err(|e| format!("invalid byte '{}': {}", text, e))
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}
