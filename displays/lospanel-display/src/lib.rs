//! Glyph composition and frame rendering for los-panel displays
//!
//! This crate provides:
//! - The CGRAM glyph table and big-digit templates (`glyphs`)
//! - Fixed-width text fitting for character rows (`text`)
//! - `ClockFace`, a differential renderer that turns clock fields into
//!   the minimal set of DDRAM writes (`clock`)
//!
//! # Architecture
//!
//! Nothing here touches a transport. Renderers produce [`RegionWrite`]s;
//! each one becomes a `SetDdramAddress` command followed by `Data`, and the
//! host decides when and how to send them.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod glyphs;
pub mod text;

// Re-export key types
pub use clock::{colon_visible, ClockFace, ClockFields, Frame, LayoutError, Region, RegionWrite};
pub use glyphs::{compose, to_cell_byte, BigDigit, Cell, GlyphBitmap, BIG_DIGIT_GLYPHS};
pub use text::MAX_COLS;
