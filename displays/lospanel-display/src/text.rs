//! Fixed-width text fitting for character rows

use heapless::Vec;

/// Widest row any supported controller exposes
pub const MAX_COLS: usize = 40;

/// Character code written for anything the ROM font cannot show
pub const REPLACEMENT: u8 = b'?';

/// One row of character codes
pub type RowText = Vec<u8, MAX_COLS>;

/// Map a character to the ROM code that renders it
///
/// ASCII passes through; everything else becomes `?`.
pub fn to_rom_byte(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        REPLACEMENT
    }
}

/// Left-align `text` in a `width`-column row, truncating or padding with spaces
pub fn fit_left(text: &str, width: usize) -> RowText {
    let width = width.min(MAX_COLS);
    let mut row = RowText::new();
    for c in text.chars().take(width) {
        // Bounded by width <= MAX_COLS
        let _ = row.push(to_rom_byte(c));
    }
    while row.len() < width {
        let _ = row.push(b' ');
    }
    row
}

/// Right-align `text` in a `width`-column row
///
/// Text longer than the row keeps its rightmost characters.
pub fn fit_right(text: &str, width: usize) -> RowText {
    let width = width.min(MAX_COLS);
    let count = text.chars().count();
    let skip = count.saturating_sub(width);
    let mut row = RowText::new();
    for _ in 0..width.saturating_sub(count) {
        let _ = row.push(b' ');
    }
    for c in text.chars().skip(skip) {
        let _ = row.push(to_rom_byte(c));
    }
    row
}
