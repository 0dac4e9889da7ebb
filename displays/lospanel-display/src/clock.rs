//! Differential big-digit clock renderer
//!
//! Layout on a 20x4 panel:
//!
//! ```text
//! row 0  January 8th           date, left-aligned, padded to width
//! row 1  .ddd ddd : ddd ddd.   big digit tops, centred
//! row 2  .ddd ddd : ddd ddd.   big digit bottoms
//! row 3                  2026   year, rightmost four columns
//! ```
//!
//! `ClockFace` remembers what it last produced and only emits writes for
//! regions whose content changed.

use core::fmt::Write as _;

use heapless::{String, Vec};
use lospanel_protocol::{Command, DisplayGeometry};

use crate::glyphs::{colon, compose, Cell};
use crate::text::{fit_left, fit_right, RowText, MAX_COLS};

/// Columns used by four big digits, the colon and the single-column gaps
pub const TIME_BLOCK_WIDTH: usize = 4 * 3 + 1 + 4;

/// Columns used by the year
pub const YEAR_WIDTH: usize = 4;

/// Rows needed for date, two glyph rows and the year
pub const MIN_CLOCK_HEIGHT: u8 = 4;

/// Row holding the date text
pub const DATE_ROW: u8 = 0;

/// Row holding the top half of the big digits
pub const TIME_TOP_ROW: u8 = 1;

/// Writes a single frame can contain (date, year, two glyph rows)
pub const MAX_REGION_WRITES: usize = 4;

/// Geometry the clock layout cannot fit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// Fewer rows than date + glyph rows + year
    TooShort { height: u8, min: u8 },
    /// Narrower than the big-digit block
    TooNarrow { width: u8, min: u8 },
    /// Wider than any row buffer
    TooWide { width: u8, max: u8 },
}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LayoutError::TooShort { height, min } => {
                write!(f, "clock needs at least {} rows, display has {}", min, height)
            }
            LayoutError::TooNarrow { width, min } => {
                write!(f, "clock needs at least {} columns, display has {}", min, width)
            }
            LayoutError::TooWide { width, max } => {
                write!(f, "display width {} exceeds the {} column maximum", width, max)
            }
        }
    }
}

/// Colon phase for a second-of-minute: on for even seconds
pub fn colon_visible(second: u32) -> bool {
    second % 2 == 0
}

/// Logical content of one clock tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockFields<'a> {
    /// Date text for row 0
    pub date: &'a str,
    pub year: i32,
    pub hour: u8,
    pub minute: u8,
    pub colon_visible: bool,
}

impl ClockFields<'_> {
    /// The four time digits, HHMM
    ///
    /// Each field contributes its last two decimal digits.
    pub fn digits(&self) -> [u8; 4] {
        [
            (self.hour / 10) % 10,
            self.hour % 10,
            (self.minute / 10) % 10,
            self.minute % 10,
        ]
    }
}

/// Screen area a write belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    Date,
    Year,
    TimeTop,
    TimeBottom,
}

/// A contiguous run of characters at one DDRAM position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionWrite {
    pub region: Region,
    pub row: u8,
    pub col: u8,
    /// DDRAM address of (row, col)
    pub address: u8,
    pub data: RowText,
}

impl RegionWrite {
    /// Address-set followed by the character data
    pub fn commands(&self) -> [Command<'_>; 2] {
        [Command::SetDdramAddress(self.address), Command::Data(&self.data)]
    }

    /// Bytes on the wire for this write
    pub fn encoded_len(&self) -> usize {
        self.commands().iter().map(Command::encoded_len).sum()
    }
}

/// Writes produced by one render pass, in send order
pub type Frame = Vec<RegionWrite, MAX_REGION_WRITES>;

/// Last values written, `None` until first written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RenderState {
    date: Option<RowText>,
    year: Option<RowText>,
    digits: Option<[u8; 4]>,
    colon: Option<bool>,
}

/// Big-digit clock bound to one display geometry
#[derive(Debug, Clone)]
pub struct ClockFace {
    geometry: DisplayGeometry,
    time_col: u8,
    year_row: u8,
    year_col: u8,
    state: RenderState,
}

impl ClockFace {
    /// Lay out the clock for `geometry`
    pub fn new(geometry: DisplayGeometry) -> Result<Self, LayoutError> {
        let width = geometry.width();
        let height = geometry.height();

        if height < MIN_CLOCK_HEIGHT {
            return Err(LayoutError::TooShort {
                height,
                min: MIN_CLOCK_HEIGHT,
            });
        }
        if (width as usize) < TIME_BLOCK_WIDTH {
            return Err(LayoutError::TooNarrow {
                width,
                min: TIME_BLOCK_WIDTH as u8,
            });
        }
        if width as usize > MAX_COLS {
            return Err(LayoutError::TooWide {
                width,
                max: MAX_COLS as u8,
            });
        }

        Ok(Self {
            geometry,
            time_col: ((width as usize - TIME_BLOCK_WIDTH) / 2) as u8,
            year_row: height - 1,
            year_col: width - YEAR_WIDTH as u8,
            state: RenderState::default(),
        })
    }

    /// Column where the big-digit block starts
    pub fn time_col(&self) -> u8 {
        self.time_col
    }

    /// Forget everything written so the next render repaints all regions
    ///
    /// Needed after anything that clears the panel behind the renderer's back.
    pub fn invalidate(&mut self) {
        self.state = RenderState::default();
    }

    /// Produce the writes needed to bring the panel to `fields`
    pub fn render(&mut self, fields: &ClockFields<'_>) -> Frame {
        let mut frame = Frame::new();

        let date = fit_left(fields.date, self.geometry.width() as usize);
        if self.state.date.as_ref() != Some(&date) {
            self.push(&mut frame, Region::Date, DATE_ROW, 0, date.clone());
            self.state.date = Some(date);
        }

        let year = year_text(fields.year);
        if self.state.year.as_ref() != Some(&year) {
            self.push(&mut frame, Region::Year, self.year_row, self.year_col, year.clone());
            self.state.year = Some(year);
        }

        let digits = fields.digits();
        if self.state.digits != Some(digits) || self.state.colon != Some(fields.colon_visible) {
            let (top, bottom) = time_rows(digits, fields.colon_visible);
            self.push(&mut frame, Region::TimeTop, TIME_TOP_ROW, self.time_col, top);
            self.push(
                &mut frame,
                Region::TimeBottom,
                TIME_TOP_ROW + 1,
                self.time_col,
                bottom,
            );
            self.state.digits = Some(digits);
            self.state.colon = Some(fields.colon_visible);
        }

        frame
    }

    fn push(&self, frame: &mut Frame, region: Region, row: u8, col: u8, data: RowText) {
        let write = RegionWrite {
            region,
            row,
            col,
            address: self.geometry.address_for(row, col),
            data,
        };
        // At most one write per region per frame
        let _ = frame.push(write);
    }
}

fn year_text(year: i32) -> RowText {
    let mut text: String<12> = String::new();
    let _ = write!(text, "{:04}", year);
    fit_right(&text, YEAR_WIDTH)
}

/// Glyph top and bottom rows for HHMM with the colon in the given phase
fn time_rows(digits: [u8; 4], colon_on: bool) -> (RowText, RowText) {
    let mut top = RowText::new();
    let mut bottom = RowText::new();
    let (colon_top, colon_bottom) = colon(colon_on);

    for (i, &digit) in digits.iter().enumerate() {
        if i == 2 {
            let _ = top.push(colon_top.to_byte());
            let _ = bottom.push(colon_bottom.to_byte());
            let _ = top.push(b' ');
            let _ = bottom.push(b' ');
        }
        let (upper, lower) = match compose(digit) {
            Some(glyph) => (glyph.top_bytes(), glyph.bottom_bytes()),
            None => ([Cell::Blank.to_byte(); 3], [Cell::Blank.to_byte(); 3]),
        };
        let _ = top.extend_from_slice(&upper);
        let _ = bottom.extend_from_slice(&lower);
        if i != 3 {
            let _ = top.push(b' ');
            let _ = bottom.push(b' ');
        }
    }

    (top, bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lospanel_protocol::command::encode_all;
    use lospanel_protocol::{CommandParser, Token};

    fn fields(date: &str, hour: u8, minute: u8, colon_visible: bool) -> ClockFields<'_> {
        ClockFields {
            date,
            year: 2026,
            hour,
            minute,
            colon_visible,
        }
    }

    fn face() -> ClockFace {
        ClockFace::new(DisplayGeometry::LCD_20X4).unwrap()
    }

    fn find(frame: &Frame, region: Region) -> Option<&RegionWrite> {
        frame.iter().find(|w| w.region == region)
    }

    #[test]
    fn test_first_render_writes_everything() {
        let mut face = face();
        let frame = face.render(&fields("January 8th", 14, 7, true));
        let regions: std::vec::Vec<_> = frame.iter().map(|w| w.region).collect();
        assert_eq!(
            regions,
            [Region::Date, Region::Year, Region::TimeTop, Region::TimeBottom]
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut face = face();
        let tick = fields("January 8th", 14, 7, true);
        assert!(!face.render(&tick).is_empty());
        assert!(face.render(&tick).is_empty());
    }

    #[test]
    fn test_time_rows_for_1407() {
        let mut face = face();
        let frame = face.render(&fields("January 8th", 14, 7, true));

        let top = find(&frame, Region::TimeTop).unwrap();
        assert_eq!(top.data.len(), TIME_BLOCK_WIDTH);
        assert_eq!(top.data.len(), 17);
        assert_eq!((top.row, top.col), (1, 1));
        assert_eq!(top.address, 0x41);
        assert_eq!(
            &top.data[..],
            [0, 5, b' ', b' ', 7, 3, 0xFF, b' ', 0, b' ', 7, 0, 5, b' ', 0, 0, 5]
        );

        let bottom = find(&frame, Region::TimeBottom).unwrap();
        assert_eq!((bottom.row, bottom.col), (2, 1));
        assert_eq!(bottom.address, 0x15);
        assert_eq!(
            &bottom.data[..],
            [1, 0xFF, 1, b' ', b' ', b' ', 0xFF, b' ', 1, b' ', 4, 1, 6, b' ', b' ', 7, b' ']
        );
    }

    #[test]
    fn test_date_write_padded_to_width() {
        let mut face = face();
        let frame = face.render(&fields("January 8th", 14, 7, true));
        let date = find(&frame, Region::Date).unwrap();
        assert_eq!(date.address, 0x00);
        assert_eq!(date.data.len(), 20);
        assert_eq!(&date.data[..], b"January 8th         ");
    }

    #[test]
    fn test_year_right_aligned_on_last_row() {
        let mut face = face();
        let frame = face.render(&fields("January 8th", 14, 7, true));
        let year = find(&frame, Region::Year).unwrap();
        assert_eq!((year.row, year.col), (3, 16));
        assert_eq!(year.address, 0x54 + 16);
        assert_eq!(&year.data[..], b"2026");
    }

    #[test]
    fn test_colon_toggle_rewrites_only_time() {
        let mut face = face();
        face.render(&fields("January 8th", 14, 7, true));
        let frame = face.render(&fields("January 8th", 14, 7, false));
        assert_eq!(frame.len(), 2);
        let top = find(&frame, Region::TimeTop).unwrap();
        assert_eq!(top.data[8], b' ');
        let bottom = find(&frame, Region::TimeBottom).unwrap();
        assert_eq!(bottom.data[8], b' ');
    }

    #[test]
    fn test_date_change_rewrites_only_date() {
        let mut face = face();
        face.render(&fields("January 8th", 23, 59, true));
        let frame = face.render(&fields("January 9th", 23, 59, true));
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].region, Region::Date);
    }

    #[test]
    fn test_invalidate_repaints() {
        let mut face = face();
        let tick = fields("January 8th", 14, 7, true);
        face.render(&tick);
        face.invalidate();
        assert_eq!(face.render(&tick).len(), MAX_REGION_WRITES);
    }

    #[test]
    fn test_colon_alternates_over_ten_seconds() {
        let mut face = face();
        face.render(&fields("January 8th", 14, 7, true));
        for second in 0..10u32 {
            let visible = colon_visible(second);
            assert_eq!(visible, second % 2 == 0);
            let frame = face.render(&fields("January 8th", 14, 7, visible));
            if second == 0 {
                // Same phase as the primed state
                assert!(frame.is_empty());
            } else {
                assert_eq!(frame.len(), 2);
            }
        }
    }

    #[test]
    fn test_centering_on_wide_display() {
        let face = ClockFace::new(DisplayGeometry::new(40, 4).unwrap()).unwrap();
        assert_eq!(face.time_col(), 11);
        let face = ClockFace::new(DisplayGeometry::new(17, 4).unwrap()).unwrap();
        assert_eq!(face.time_col(), 0);
    }

    #[test]
    fn test_rejects_unusable_geometry() {
        assert_eq!(
            ClockFace::new(DisplayGeometry::new(20, 2).unwrap()).unwrap_err(),
            LayoutError::TooShort { height: 2, min: 4 }
        );
        assert_eq!(
            ClockFace::new(DisplayGeometry::new(16, 4).unwrap()).unwrap_err(),
            LayoutError::TooNarrow { width: 16, min: 17 }
        );
        assert_eq!(
            ClockFace::new(DisplayGeometry::new(41, 4).unwrap()).unwrap_err(),
            LayoutError::TooWide { width: 41, max: 40 }
        );
    }

    #[test]
    fn test_writes_decode_to_address_then_data() {
        let mut face = face();
        let frame = face.render(&fields("Jan", 9, 5, true));
        let mut bytes = std::vec::Vec::new();
        for write in &frame {
            bytes.extend(encode_all(&write.commands()));
        }

        let tokens = CommandParser::decode_all(&bytes).unwrap();
        let addresses: std::vec::Vec<u8> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::SetDdramAddress(a) => Some(*a),
                _ => None,
            })
            .collect();
        assert_eq!(addresses, [0x00, 0x54 + 16, 0x41, 0x15]);

        let data_bytes = tokens.iter().filter(|t| matches!(t, Token::Data(_))).count();
        assert_eq!(data_bytes, 20 + 4 + 17 + 17);
        let encoded: usize = frame.iter().map(RegionWrite::encoded_len).sum();
        assert_eq!(encoded, bytes.len());
    }
}
