//! Configuration file loading
//!
//! Reads `HostConfig` from an explicit path, or from `lospanel.toml` in the
//! working directory when present. Falls back to defaults otherwise.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use lospanel_display::LayoutError;
use lospanel_protocol::GeometryError;

use super::HostConfig;

/// File picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "lospanel.toml";

/// Configuration errors, all detected before any port is opened
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Read { path: PathBuf, source: io::Error },
    /// Config file is not valid TOML for `HostConfig`
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// No serial port given on the command line or in the file
    MissingPort,
    /// Baud rate of zero
    InvalidBaud,
    /// Zero width or height
    Geometry(GeometryError),
    /// Display cannot fit the clock layout
    Layout(LayoutError),
    /// Zone name not in the time zone database
    UnknownTimezone(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "cannot read config file {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config file {}: {}", path.display(), source)
            }
            ConfigError::MissingPort => {
                write!(f, "no serial port given (use --port or [serial] port)")
            }
            ConfigError::InvalidBaud => write!(f, "baud rate must be positive"),
            ConfigError::Geometry(GeometryError::ZeroWidth) => {
                write!(f, "display width must be positive")
            }
            ConfigError::Geometry(GeometryError::ZeroHeight) => {
                write!(f, "display height must be positive")
            }
            ConfigError::Layout(e) => write!(f, "{}", e),
            ConfigError::UnknownTimezone(name) => write!(f, "unknown timezone '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Load configuration
///
/// An explicit path must exist. Without one, `lospanel.toml` in the working
/// directory is used if present.
pub fn load(path: Option<&Path>) -> Result<HostConfig, ConfigError> {
    match path {
        Some(path) => load_file(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                load_file(fallback)
            } else {
                debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(HostConfig::default())
            }
        }
    }
}

/// Read and parse one config file
pub fn load_file(path: &Path) -> Result<HostConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = HostConfig::from_toml(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!("loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lospanel-{}-{}.toml", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_explicit_file() {
        let path = temp_file(
            "explicit",
            "[serial]\nport = \"COM6\"\nbaud = 115200\n[display]\nwidth = 16\nheight = 2\n",
        );
        let config = load(Some(path.as_path())).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.serial.port.as_deref(), Some("COM6"));
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!((config.display.width, config.display.height), (16, 2));
    }

    #[test]
    fn test_missing_explicit_file() {
        let path = std::env::temp_dir().join("lospanel-does-not-exist.toml");
        let err = load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("lospanel-does-not-exist.toml"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let path = temp_file("broken", "[serial\nport = 1\n");
        let err = load(Some(path.as_path())).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_shipped_example_parses() {
        let text = include_str!("../../lospanel.toml");
        let config = HostConfig::from_toml(text).unwrap();
        assert_eq!(config.serial.baud, 57_600);
        assert_eq!(config.smoke.ack_marker, "raw: host active");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::Geometry(GeometryError::ZeroHeight).to_string(),
            "display height must be positive"
        );
        assert_eq!(
            ConfigError::UnknownTimezone("Nowhere/City".into()).to_string(),
            "unknown timezone 'Nowhere/City'"
        );
    }
}
