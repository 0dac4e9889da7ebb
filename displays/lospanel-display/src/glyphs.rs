//! CGRAM glyph table and big-digit templates
//!
//! A big digit is three cells wide and two rows tall. Its cells are either
//! one of the eight programmable CGRAM slots, a blank, or the ROM's solid
//! block (0xFF). The slots hold rounded-corner and partial-line pieces:
//!
//! | Slot | Piece                      |
//! |------|----------------------------|
//! | 0    | small top line             |
//! | 1    | small bottom line          |
//! | 2    | small lines top and bottom |
//! | 3    | thin bottom line           |
//! | 4    | left bottom chamfer, full  |
//! | 5    | right top chamfer, full    |
//! | 6    | right bottom chamfer, full |
//! | 7    | left top chamfer, full     |

/// Number of programmable CGRAM slots
pub const GLYPH_SLOTS: usize = 8;

/// Pixel rows per glyph
pub const GLYPH_HEIGHT: usize = 8;

/// Only the low five bits of a glyph row are pixels
pub const GLYPH_ROW_MASK: u8 = 0x1F;

/// One glyph: eight rows of five pixels
pub type GlyphBitmap = [u8; GLYPH_HEIGHT];

/// Slot used for the colon's upper dot
pub const SLOT_TOP_LINE: u8 = 0;

/// Slot used for the colon's lower dot
pub const SLOT_BOTTOM_LINE: u8 = 1;

/// Glyphs uploaded for the big-digit font
pub const BIG_DIGIT_GLYPHS: [GlyphBitmap; GLYPH_SLOTS] = [
    [31, 31, 31, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 31, 31, 31],
    [31, 0, 0, 0, 0, 0, 0, 31],
    [0, 0, 0, 0, 0, 0, 0, 31],
    [31, 31, 31, 31, 31, 31, 15, 7],
    [28, 30, 31, 31, 31, 31, 31, 31],
    [31, 31, 31, 31, 31, 31, 30, 28],
    [7, 15, 31, 31, 31, 31, 31, 31],
];

/// Glyphs for the CGRAM parity probe: each slot is visually distinct
pub const DIAGNOSTIC_GLYPHS: [GlyphBitmap; GLYPH_SLOTS] = [
    // diagonal down-right
    [0b10000, 0b01000, 0b00100, 0b00010, 0b00001, 0b00000, 0b00000, 0b00000],
    // diagonal down-left
    [0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000, 0b00000, 0b00000],
    // checker
    [0b10101, 0b01010, 0b10101, 0b01010, 0b10101, 0b01010, 0b10101, 0b01010],
    // hollow box
    [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    // filled box
    [0b11111, 0b11111, 0b11111, 0b11111, 0b11111, 0b11111, 0b11111, 0b11111],
    // left bar
    [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000],
    // right bar
    [0b00001, 0b00001, 0b00001, 0b00001, 0b00001, 0b00001, 0b00001, 0b00001],
    // X
    [0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b00000, 0b00000, 0b00000],
];

/// Template code for a blank cell
pub const CODE_BLANK: u8 = 254;

/// Template code for the ROM solid block
pub const CODE_FULL_BLOCK: u8 = 255;

/// Big-digit templates, row-major: cells 0..3 top row, 3..6 bottom row
pub const BIG_DIGIT_CELLS: [[u8; 6]; 10] = [
    [7, 0, 5, 4, 1, 6],
    [0, 5, 254, 1, 255, 1],
    [0, 2, 5, 7, 3, 1],
    [0, 2, 5, 1, 3, 6],
    [7, 3, 255, 254, 254, 255],
    [7, 2, 0, 1, 3, 6],
    [7, 2, 0, 4, 3, 6],
    [0, 0, 5, 254, 7, 254],
    [7, 2, 5, 4, 3, 6],
    [7, 2, 5, 1, 3, 6],
];

/// Character code the ROM renders as a space
pub const SPACE: u8 = 0x20;

/// Character code most HD44780 ROMs render as a solid block
pub const FULL_BLOCK: u8 = 0xFF;

/// One character cell of a big glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cell {
    /// A programmed CGRAM slot (0..7)
    Slot(u8),
    /// Nothing drawn
    Blank,
    /// ROM solid block
    FullBlock,
}

impl Cell {
    /// Interpret a template code
    ///
    /// Unknown codes become `Blank` rather than an arbitrary ROM character.
    pub fn from_code(code: u8) -> Self {
        match code {
            0..=7 => Cell::Slot(code),
            CODE_FULL_BLOCK => Cell::FullBlock,
            _ => Cell::Blank,
        }
    }

    /// DDRAM character code that renders this cell
    pub fn to_byte(self) -> u8 {
        match self {
            Cell::Slot(slot) if (slot as usize) < GLYPH_SLOTS => slot,
            Cell::Slot(_) | Cell::Blank => SPACE,
            Cell::FullBlock => FULL_BLOCK,
        }
    }
}

/// DDRAM character code for a template code
pub fn to_cell_byte(code: u8) -> u8 {
    Cell::from_code(code).to_byte()
}

/// A composed two-row, three-column digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BigDigit {
    pub top: [Cell; 3],
    pub bottom: [Cell; 3],
}

impl BigDigit {
    /// Character codes of the top row
    pub fn top_bytes(&self) -> [u8; 3] {
        self.top.map(Cell::to_byte)
    }

    /// Character codes of the bottom row
    pub fn bottom_bytes(&self) -> [u8; 3] {
        self.bottom.map(Cell::to_byte)
    }
}

/// Compose the big glyph for `digit` (0..9)
pub fn compose(digit: u8) -> Option<BigDigit> {
    let cells = BIG_DIGIT_CELLS.get(digit as usize)?;
    Some(BigDigit {
        top: [
            Cell::from_code(cells[0]),
            Cell::from_code(cells[1]),
            Cell::from_code(cells[2]),
        ],
        bottom: [
            Cell::from_code(cells[3]),
            Cell::from_code(cells[4]),
            Cell::from_code(cells[5]),
        ],
    })
}

/// Colon cells (top, bottom)
///
/// Reuses the top-line and bottom-line slots so the colon costs no extra
/// CGRAM. Both rows are blank in the off phase.
pub fn colon(visible: bool) -> (Cell, Cell) {
    if visible {
        (Cell::Slot(SLOT_TOP_LINE), Cell::Slot(SLOT_BOTTOM_LINE))
    } else {
        (Cell::Blank, Cell::Blank)
    }
}

/// Glyph rows as sent to CGRAM, masked to five pixels
pub fn glyph_payload(bitmap: &GlyphBitmap) -> GlyphBitmap {
    bitmap.map(|row| row & GLYPH_ROW_MASK)
}
