//! Stream decoding for the los-panel protocol
//!
//! The inverse of [`crate::command`]: a byte-fed state machine that turns a
//! los-panel stream back into tokens. Hosts use it to check generated
//! payloads; it does not model what the display does with them.

use crate::command::{
    StreamingMode, BACKLIGHT_PREFIX, CGRAM_ADDR_MASK, DDRAM_ADDR_MASK, ESC, INSTR_CLEAR,
    INSTR_HOME, INSTR_SET_CGRAM, INSTR_SET_DDRAM, META_PREFIX, META_STREAMING_MODE,
};

/// A decoded protocol element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Token {
    Clear,
    Home,
    SetDdramAddress(u8),
    SetCgramAddress(u8),
    /// Any other HD44780 instruction (entry mode, display control, ...)
    Instruction(u8),
    SetBacklight(u8),
    StreamingMode(StreamingMode),
    /// One data byte
    Data(u8),
}

/// Errors that can occur while decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Meta option id this decoder has no payload length for
    UnknownMetaOption(u8),
    /// Known meta option with an out-of-range value
    InvalidMetaValue { id: u8, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Between commands
    Idle,
    /// Got ESC, waiting for the instruction byte
    WaitingForInstruction,
    /// Got backlight prefix, waiting for the level
    WaitingForLevel,
    /// Got meta prefix, waiting for the option id
    WaitingForOption,
    /// Got streaming-mode option id, waiting for the mode byte
    WaitingForStreamingMode,
}

/// State machine for decoding a los-panel byte stream
#[derive(Debug, Clone)]
pub struct CommandParser {
    state: ParseState,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandParser {
    /// Create a new parser
    pub const fn new() -> Self {
        Self {
            state: ParseState::Idle,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::Idle;
    }

    /// Whether the parser is between commands
    ///
    /// A stream that leaves the parser mid-command would make the firmware
    /// swallow the first byte of whatever is sent next.
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::Idle
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(token))` when a token is complete, `Ok(None)` when
    /// more bytes are needed, or `Err` on a malformed meta command.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Token>, ParseError> {
        match self.state {
            ParseState::Idle => match byte {
                ESC => {
                    self.state = ParseState::WaitingForInstruction;
                    Ok(None)
                }
                BACKLIGHT_PREFIX => {
                    self.state = ParseState::WaitingForLevel;
                    Ok(None)
                }
                META_PREFIX => {
                    self.state = ParseState::WaitingForOption;
                    Ok(None)
                }
                _ => Ok(Some(Token::Data(byte))),
            },
            ParseState::WaitingForInstruction => {
                self.reset();
                Ok(Some(decode_instruction(byte)))
            }
            ParseState::WaitingForLevel => {
                self.reset();
                Ok(Some(Token::SetBacklight(byte)))
            }
            ParseState::WaitingForOption => match byte {
                META_STREAMING_MODE => {
                    self.state = ParseState::WaitingForStreamingMode;
                    Ok(None)
                }
                id => {
                    self.reset();
                    Err(ParseError::UnknownMetaOption(id))
                }
            },
            ParseState::WaitingForStreamingMode => {
                self.reset();
                StreamingMode::from_byte(byte)
                    .map(|mode| Some(Token::StreamingMode(mode)))
                    .ok_or(ParseError::InvalidMetaValue {
                        id: META_STREAMING_MODE,
                        value: byte,
                    })
            }
        }
    }

    /// Decode a complete byte stream
    #[cfg(any(feature = "std", test))]
    pub fn decode_all(bytes: &[u8]) -> Result<std::vec::Vec<Token>, ParseError> {
        let mut parser = Self::new();
        let mut tokens = std::vec::Vec::new();
        for &byte in bytes {
            if let Some(token) = parser.feed(byte)? {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }
}

/// Classify an instruction byte the way the firmware does
fn decode_instruction(value: u8) -> Token {
    if value == INSTR_CLEAR {
        Token::Clear
    } else if value == INSTR_HOME {
        Token::Home
    } else if value & INSTR_SET_DDRAM != 0 {
        Token::SetDdramAddress(value & DDRAM_ADDR_MASK)
    } else if value & INSTR_SET_CGRAM != 0 {
        Token::SetCgramAddress(value & CGRAM_ADDR_MASK)
    } else {
        Token::Instruction(value)
    }
}
