//! los-panel Display Protocol
//!
//! This crate defines the byte protocol spoken by ArduLCDpp-style serial
//! character displays. It is the "los-panel" dialect of the LCDproc
//! `hd44780-serial` driver with two extensions: a backlight prefix and a
//! meta-option namespace for firmware settings.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌──────────┬──────────────────────────────────────────────┐
//! │ FE II    │ HD44780 instruction II (clear, home, DDRAM/  │
//! │          │ CGRAM address set, ...)                      │
//! │ FD LL    │ backlight / brightness level LL              │
//! │ FC OO .. │ meta option OO followed by its payload       │
//! │ other    │ character data (DDRAM) or glyph rows (CGRAM) │
//! └──────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Encoding is total: addresses are masked to the controller register width
//! rather than rejected, so payload generators stay deterministic.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(unsafe_code)]

pub mod address;
pub mod command;
pub mod parser;

pub use address::{address_for, DisplayGeometry, GeometryError};
pub use command::{
    clamp_level, Command, EncodeError, MetaOption, StreamingMode, BACKLIGHT_PREFIX, ESC,
    META_PREFIX,
};
pub use parser::{CommandParser, ParseError, Token};
