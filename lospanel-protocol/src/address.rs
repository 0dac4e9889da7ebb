//! DDRAM addressing for HD44780-class controllers
//!
//! Maps a logical (row, column) to the controller's DDRAM address. The
//! four-line modules interleave rows in DDRAM, and the interleave depends on
//! the line length, so the map is keyed on the display geometry.

use crate::command::DDRAM_ADDR_MASK;

/// Row base addresses of 20x4 modules
const ROW_BASES_20X4: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Row base addresses of 16x4 modules and most other 4-line compatibles
const ROW_BASES_16X4: [u8; 4] = [0x00, 0x40, 0x10, 0x50];

/// Row base addresses of 2-line modules
const ROW_BASES_2: [u8; 2] = [0x00, 0x40];

/// Errors from constructing a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// Width must be at least one column
    ZeroWidth,
    /// Height must be at least one row
    ZeroHeight,
}

/// Display size in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayGeometry {
    width: u8,
    height: u8,
}

impl DisplayGeometry {
    /// 20 columns x 4 rows, the reference panel
    pub const LCD_20X4: DisplayGeometry = DisplayGeometry {
        width: 20,
        height: 4,
    };

    /// Create a geometry, rejecting empty dimensions
    pub fn new(width: u8, height: u8) -> Result<Self, GeometryError> {
        if width == 0 {
            return Err(GeometryError::ZeroWidth);
        }
        if height == 0 {
            return Err(GeometryError::ZeroHeight);
        }
        Ok(Self { width, height })
    }

    /// Number of columns
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Number of rows
    pub const fn height(&self) -> u8 {
        self.height
    }

    /// Whether (row, col) is a visible cell
    pub fn contains(&self, row: u8, col: u8) -> bool {
        row < self.height && col < self.width
    }

    /// Whether this geometry uses a known controller address map
    ///
    /// Heights other than 1, 2 and 4 fall back to a row-major linear map
    /// that has not been checked against real controllers.
    pub fn is_standard_map(&self) -> bool {
        matches!(self.height, 1 | 2 | 4)
    }

    /// DDRAM base address of a row, before masking
    pub fn row_base(&self, row: u8) -> u16 {
        let bases: &[u8] = match self.height {
            4 if self.width == 20 => &ROW_BASES_20X4,
            4 => &ROW_BASES_16X4,
            2 => &ROW_BASES_2,
            _ => &[],
        };
        match bases.get(row as usize) {
            Some(base) => *base as u16,
            // Linear row-major fallback
            None => row as u16 * self.width as u16,
        }
    }

    /// DDRAM address of (row, col)
    ///
    /// Total: the result wraps to the 7-bit address register. Callers that
    /// need a physically meaningful address must check [`Self::contains`].
    pub fn address_for(&self, row: u8, col: u8) -> u8 {
        ((self.row_base(row) + col as u16) & DDRAM_ADDR_MASK as u16) as u8
    }
}

/// DDRAM address of (row, col) for `geometry`
pub fn address_for(row: u8, col: u8, geometry: &DisplayGeometry) -> u8 {
    geometry.address_for(row, col)
}
