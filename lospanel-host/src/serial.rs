//! Serial port transport
//!
//! Wraps a `serialport` handle behind the `UartTx`/`UartRx` traits so the
//! staging and capture code never sees the concrete port.

use std::fmt;
use std::io::{self, Read, Write};

use log::debug;
use lospanel_hal::{DataBits, Parity, SerialConfig, StopBits, UartRx, UartTx};
use serialport::{ClearBuffer, SerialPort};

/// Transport failures
#[derive(Debug)]
pub enum LinkError {
    /// The port could not be opened
    Open {
        port: String,
        source: serialport::Error,
    },
    /// A second handle for the reader could not be created
    Clone(serialport::Error),
    /// Read, write or flush failed
    Io(io::Error),
    /// The capture reader thread could not be started
    Reader(io::Error),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Open { port, source } => write!(f, "failed to open {}: {}", port, source),
            LinkError::Clone(e) => write!(f, "failed to clone serial handle: {}", e),
            LinkError::Io(e) => write!(f, "serial I/O error: {}", e),
            LinkError::Reader(e) => write!(f, "failed to start log reader: {}", e),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Open { source, .. } => Some(source),
            LinkError::Clone(e) => Some(e),
            LinkError::Io(e) | LinkError::Reader(e) => Some(e),
        }
    }
}

impl From<io::Error> for LinkError {
    fn from(e: io::Error) -> Self {
        LinkError::Io(e)
    }
}

/// An open serial port
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLink {
    /// Open `name` with the given line settings
    pub fn open(name: &str, config: &SerialConfig) -> Result<Self, LinkError> {
        debug!(
            "opening {} at {} baud, read timeout {:?}",
            name, config.baudrate, config.read_timeout
        );
        let port = serialport::new(name, config.baudrate)
            .timeout(config.read_timeout)
            .data_bits(match config.data_bits {
                DataBits::Seven => serialport::DataBits::Seven,
                DataBits::Eight => serialport::DataBits::Eight,
            })
            .parity(match config.parity {
                Parity::None => serialport::Parity::None,
                Parity::Even => serialport::Parity::Even,
                Parity::Odd => serialport::Parity::Odd,
            })
            .stop_bits(match config.stop_bits {
                StopBits::One => serialport::StopBits::One,
                StopBits::Two => serialport::StopBits::Two,
            })
            .open()
            .map_err(|source| LinkError::Open {
                port: name.to_string(),
                source,
            })?;

        Ok(Self {
            port,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Independent handle on the same port, for a reader thread
    pub fn try_clone(&self) -> Result<Self, LinkError> {
        let port = self.port.try_clone().map_err(LinkError::Clone)?;
        Ok(Self {
            port,
            name: self.name.clone(),
        })
    }

    /// Drop anything the OS buffered before we started listening
    pub fn clear_input(&mut self) -> Result<(), LinkError> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| LinkError::Io(e.into()))
    }
}

impl UartTx for SerialLink {
    type Error = LinkError;

    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        self.port.flush()?;
        Ok(())
    }
}

impl UartRx for SerialLink {
    type Error = LinkError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
