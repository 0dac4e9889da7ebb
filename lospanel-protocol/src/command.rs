//! Command encoding for the los-panel protocol
//!
//! Byte layout per command:
//! - `Clear`            → `FE 01`
//! - `Home`             → `FE 02`
//! - `SetDdramAddress`  → `FE 80|addr` (addr masked to 7 bits)
//! - `SetCgramAddress`  → `FE 40|addr` (addr masked to 6 bits)
//! - `SetBacklight`     → `FD level`
//! - `SetMeta`          → `FC option payload...`
//! - `Data`             → raw bytes, unchanged

use heapless::Vec;

/// Instruction escape: the next byte is an HD44780 instruction
pub const ESC: u8 = 0xFE;

/// Backlight prefix: the next byte is the brightness level
pub const BACKLIGHT_PREFIX: u8 = 0xFD;

/// Meta prefix: the next byte is a firmware option id
pub const META_PREFIX: u8 = 0xFC;

// HD44780 instructions carried after ESC
pub const INSTR_CLEAR: u8 = 0x01;
pub const INSTR_HOME: u8 = 0x02;
pub const INSTR_SET_CGRAM: u8 = 0x40;
pub const INSTR_SET_DDRAM: u8 = 0x80;

/// DDRAM address register width (7 bits)
pub const DDRAM_ADDR_MASK: u8 = 0x7F;

/// CGRAM address register width (6 bits: 8 slots x 8 rows)
pub const CGRAM_ADDR_MASK: u8 = 0x3F;

// Meta option ids
pub const META_STREAMING_MODE: u8 = 0x10;

/// Longest fixed prefix of any command (prefix byte + operand/option id)
pub const MAX_HEADER_SIZE: usize = 2;

/// Errors that can occur while encoding into a caller-provided buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Buffer too small for the encoded command
    BufferTooSmall,
}

/// Firmware handling of incoming command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamingMode {
    /// Apply bytes as they arrive
    Immediate,
    /// Buffer bytes and apply them once the display is idle
    Safe,
}

// Wire format values
const STREAMING_MODE_IMMEDIATE: u8 = 0;
const STREAMING_MODE_SAFE: u8 = 1;

impl StreamingMode {
    /// Parse a mode from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            STREAMING_MODE_IMMEDIATE => Some(StreamingMode::Immediate),
            STREAMING_MODE_SAFE => Some(StreamingMode::Safe),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            StreamingMode::Immediate => STREAMING_MODE_IMMEDIATE,
            StreamingMode::Safe => STREAMING_MODE_SAFE,
        }
    }
}

/// A firmware option addressed through the `FC` meta prefix
///
/// Each option is an id byte followed by option-specific payload bytes.
/// `Custom` carries ids this crate has no typed variant for, so new
/// firmware options can be sent without changing existing encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MetaOption<'a> {
    /// Select immediate or safe streaming
    StreamingMode(StreamingMode),
    /// Any other option id with its raw payload
    Custom { id: u8, payload: &'a [u8] },
}

impl<'a> MetaOption<'a> {
    /// Option id byte following the meta prefix
    pub fn id(&self) -> u8 {
        match self {
            MetaOption::StreamingMode(_) => META_STREAMING_MODE,
            MetaOption::Custom { id, .. } => *id,
        }
    }

    /// Option payload following the id byte
    pub fn payload(&self) -> &'a [u8] {
        match self {
            MetaOption::StreamingMode(StreamingMode::Immediate) => &[STREAMING_MODE_IMMEDIATE],
            MetaOption::StreamingMode(StreamingMode::Safe) => &[STREAMING_MODE_SAFE],
            MetaOption::Custom { payload, .. } => *payload,
        }
    }
}

/// A logical display operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Clear the display and return home (slow on HD44780)
    Clear,
    /// Return the cursor to address 0
    Home,
    /// Select a DDRAM address; subsequent data bytes are characters
    SetDdramAddress(u8),
    /// Select a CGRAM address; subsequent data bytes are glyph rows
    SetCgramAddress(u8),
    /// Set backlight/brightness level
    SetBacklight(u8),
    /// Set a firmware meta option
    SetMeta(MetaOption<'a>),
    /// Raw bytes written at the current address
    Data(&'a [u8]),
}

impl<'a> Command<'a> {
    /// Select the CGRAM address of the first row of a glyph slot (0..7)
    pub fn select_glyph_slot(slot: u8) -> Command<'static> {
        Command::SetCgramAddress((slot & 0x07) << 3)
    }

    /// Fixed prefix bytes of this command
    pub fn header(&self) -> Vec<u8, MAX_HEADER_SIZE> {
        let mut header = Vec::new();
        let bytes = match self {
            Command::Clear => [ESC, INSTR_CLEAR],
            Command::Home => [ESC, INSTR_HOME],
            Command::SetDdramAddress(addr) => [ESC, INSTR_SET_DDRAM | (addr & DDRAM_ADDR_MASK)],
            Command::SetCgramAddress(addr) => [ESC, INSTR_SET_CGRAM | (addr & CGRAM_ADDR_MASK)],
            Command::SetBacklight(level) => [BACKLIGHT_PREFIX, *level],
            Command::SetMeta(option) => [META_PREFIX, option.id()],
            Command::Data(_) => return header,
        };
        // Capacity equals the array length, this cannot fail
        let _ = header.extend_from_slice(&bytes);
        header
    }

    /// Variable-length bytes following the header
    pub fn payload(&self) -> &'a [u8] {
        match self {
            Command::SetMeta(option) => option.payload(),
            Command::Data(bytes) => *bytes,
            _ => &[],
        }
    }

    /// Number of bytes this command encodes to
    pub fn encoded_len(&self) -> usize {
        self.header().len() + self.payload().len()
    }

    /// Encode this command into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let header = self.header();
        let payload = self.payload();
        let len = header.len() + payload.len();
        if buffer.len() < len {
            return Err(EncodeError::BufferTooSmall);
        }

        buffer[..header.len()].copy_from_slice(&header);
        buffer[header.len()..len].copy_from_slice(payload);
        Ok(len)
    }

    /// Append the encoded command to a growable buffer
    #[cfg(any(feature = "std", test))]
    pub fn encode_into(&self, out: &mut std::vec::Vec<u8>) {
        out.extend_from_slice(&self.header());
        out.extend_from_slice(self.payload());
    }

    /// Encode this command into a fresh Vec
    #[cfg(any(feature = "std", test))]
    pub fn to_vec(&self) -> std::vec::Vec<u8> {
        let mut out = std::vec::Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }
}

/// Encode a command sequence back to back
#[cfg(any(feature = "std", test))]
pub fn encode_all(commands: &[Command<'_>]) -> std::vec::Vec<u8> {
    let mut out = std::vec::Vec::new();
    for command in commands {
        command.encode_into(&mut out);
    }
    out
}

/// Saturate an arbitrary brightness request into the 0..=255 wire range
pub fn clamp_level(level: i64) -> u8 {
    level.clamp(0, u8::MAX as i64) as u8
}
