//! Deterministic smoke-test payloads
//!
//! These are regression fixtures: the same inputs always produce the same
//! bytes, so captures from different firmware builds can be compared.

use lospanel_display::glyphs::{glyph_payload, DIAGNOSTIC_GLYPHS, GLYPH_SLOTS};
use lospanel_protocol::command::encode_all;
use lospanel_protocol::{Command, DisplayGeometry};

/// Fill byte used when none is given
pub const DEFAULT_FILL: u8 = 0x5A;

/// Data bytes in the fill burst (a full 20x4 screen)
pub const FILL_LEN: usize = 80;

/// Total size of the stress burst
pub const STRESS_BUDGET: usize = 1024;

/// Printable bytes written after each stress address-set
pub const STRESS_RUN_LEN: usize = 16;

/// Brightness change per stress chunk
pub const STRESS_BRIGHTNESS_STEP: u8 = 17;

/// DDRAM address change per stress chunk
pub const STRESS_ADDRESS_STEP: u8 = 20;

/// Backlight + address-set bytes opening each stress chunk
const STRESS_CHUNK_HEADER: usize = 4;

/// Byte used to pad a stress burst whose last chunk cannot fit
const STRESS_PAD: u8 = b'0';

const PRINTABLE_FIRST: u8 = 0x20;
const PRINTABLE_COUNT: usize = 95;

fn clear_home() -> Vec<u8> {
    encode_all(&[Command::Clear, Command::Home])
}

/// Clear, home, then 80 copies of `fill`
pub fn build_fill_burst(fill: u8) -> Vec<u8> {
    let mut out = clear_home();
    out.resize(out.len() + FILL_LEN, fill);
    out
}

/// Clear, home, then backlight/address/text chunks up to exactly 1024 bytes
pub fn build_stress_burst(fill: u8) -> Vec<u8> {
    build_stress_burst_with_budget(fill, STRESS_BUDGET)
}

/// Stress burst of exactly `budget` bytes
///
/// Each chunk is `FD <brightness> FE <0x80|address>` followed by up to
/// sixteen printable bytes. Brightness starts at `fill` and steps by 17,
/// the address starts at 0 and steps by 20 modulo 128, the text seed starts
/// at `fill` and steps by 16. A tail too short for a chunk header and one
/// data byte is padded with ASCII `0`; otherwise the last run is truncated.
pub fn build_stress_burst_with_budget(fill: u8, budget: usize) -> Vec<u8> {
    let mut out = clear_home();
    out.truncate(budget);

    let mut brightness = fill;
    let mut address: u8 = 0;
    let mut seed = fill;

    while out.len() < budget {
        let remaining = budget - out.len();
        if remaining <= STRESS_CHUNK_HEADER {
            out.resize(budget, STRESS_PAD);
            break;
        }

        out.extend(encode_all(&[
            Command::SetBacklight(brightness),
            Command::SetDdramAddress(address),
        ]));

        let run = (remaining - STRESS_CHUNK_HEADER).min(STRESS_RUN_LEN);
        out.extend((0..run).map(|i| printable(seed, i)));

        brightness = brightness.wrapping_add(STRESS_BRIGHTNESS_STEP);
        address = (address + STRESS_ADDRESS_STEP) % 128;
        seed = seed.wrapping_add(STRESS_RUN_LEN as u8);
    }

    out
}

fn printable(seed: u8, offset: usize) -> u8 {
    PRINTABLE_FIRST + ((seed as usize + offset) % PRINTABLE_COUNT) as u8
}

/// Glyph parity probe, split at the points where it may be paced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSequence {
    /// One entry per CGRAM slot: address-set plus eight rows
    pub slots: Vec<Vec<u8>>,
    pub clear_home: Vec<u8>,
    /// Codes 0..7 at the start of row 0
    pub row0: Vec<u8>,
    /// Codes 0..7 at the start of row 1
    pub row1: Vec<u8>,
}

impl ProbeSequence {
    /// The whole probe as a single write
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for slot in &self.slots {
            out.extend_from_slice(slot);
        }
        out.extend_from_slice(&self.clear_home);
        out.extend_from_slice(&self.row0);
        out.extend_from_slice(&self.row1);
        out
    }

    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum::<usize>()
            + self.clear_home.len()
            + self.row0.len()
            + self.row1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Upload the diagnostic glyphs and show codes 0..7 on the first two rows
pub fn build_probe_sequence(geometry: &DisplayGeometry) -> ProbeSequence {
    let slots = DIAGNOSTIC_GLYPHS
        .iter()
        .enumerate()
        .map(|(slot, glyph)| {
            let rows = glyph_payload(glyph);
            encode_all(&[Command::select_glyph_slot(slot as u8), Command::Data(&rows)])
        })
        .collect();

    let codes: [u8; GLYPH_SLOTS] = core::array::from_fn(|i| i as u8);
    let row = |r: u8| {
        encode_all(&[
            Command::SetDdramAddress(geometry.address_for(r, 0)),
            Command::Data(&codes),
        ])
    };

    ProbeSequence {
        slots,
        clear_home: clear_home(),
        row0: row(0),
        row1: row(1),
    }
}

/// Hex dump, sixteen bytes per line with an offset column
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, line) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("{:04X}:", i * 16));
        for b in line {
            out.push_str(&format!(" {:02X}", b));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lospanel_protocol::{CommandParser, Token};
    use proptest::prelude::*;

    #[test]
    fn test_fill_burst_layout() {
        let burst = build_fill_burst(0x5A);
        assert_eq!(burst.len(), 84);
        assert_eq!(&burst[..4], [0xFE, 0x01, 0xFE, 0x02]);
        assert!(burst[4..].iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_stress_burst_exact_budget_and_header() {
        let burst = build_stress_burst(0x5A);
        assert_eq!(burst.len(), 1024);
        assert_eq!(&burst[..4], [0xFE, 0x01, 0xFE, 0x02]);
        assert_eq!(burst, build_stress_burst(0x5A));
    }

    #[test]
    fn test_stress_first_chunks() {
        let burst = build_stress_burst(0x5A);
        // First chunk: brightness = fill, address 0
        assert_eq!(&burst[4..8], [0xFD, 0x5A, 0xFE, 0x80]);
        // Seed 0x5A = 90: 0x20 + 90 = 0x7A, then wraps into the printable range
        assert_eq!(&burst[8..13], [0x7A, 0x7B, 0x7C, 0x7D, 0x7E]);
        assert_eq!(burst[13], 0x20);
        // Second chunk
        assert_eq!(&burst[24..28], [0xFD, 0x5A + 17, 0xFE, 0x80 | 20]);
    }

    #[test]
    fn test_stress_burst_decodes_cleanly() {
        let burst = build_stress_burst(0x00);
        let tokens = CommandParser::decode_all(&burst).unwrap();
        assert_eq!(tokens[0], Token::Clear);
        assert_eq!(tokens[1], Token::Home);

        let addresses: Vec<u8> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::SetDdramAddress(a) => Some(*a),
                _ => None,
            })
            .collect();
        assert_eq!(addresses.len(), (1024 - 4) / 20);
        assert_eq!(&addresses[..8], [0, 20, 40, 60, 80, 100, 120, 12]);

        let backlights = tokens
            .iter()
            .filter(|t| matches!(t, Token::SetBacklight(_)))
            .count();
        assert_eq!(backlights, addresses.len());
    }

    #[test]
    fn test_stress_tail_padding() {
        // Header, one full chunk, then three bytes: too short for a chunk
        let burst = build_stress_burst_with_budget(0x41, 4 + 20 + 3);
        assert_eq!(burst.len(), 27);
        assert_eq!(&burst[24..], b"000");
    }

    #[test]
    fn test_stress_tail_truncation() {
        // Header, one full chunk, then a header and two data bytes
        let burst = build_stress_burst_with_budget(0x41, 4 + 20 + 6);
        assert_eq!(burst.len(), 30);
        assert_eq!(&burst[24..28], [0xFD, 0x41 + 17, 0xFE, 0x80 | 20]);
        assert!(burst[28..].iter().all(|b| (0x20..=0x7E).contains(b)));
    }

    #[test]
    fn test_stress_tiny_budget() {
        assert_eq!(build_stress_burst_with_budget(0, 2), [0xFE, 0x01]);
        assert!(build_stress_burst_with_budget(0, 0).is_empty());
    }

    #[test]
    fn test_probe_sequence_layout() {
        let probe = build_probe_sequence(&DisplayGeometry::LCD_20X4);
        assert_eq!(probe.slots.len(), 8);
        assert!(probe.slots.iter().all(|s| s.len() == 10));
        assert_eq!(probe.slots[3][..2], [0xFE, 0x40 | 24]);
        assert_eq!(probe.clear_home, [0xFE, 0x01, 0xFE, 0x02]);
        assert_eq!(probe.row0, [0xFE, 0x80, 0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(probe.row1, [0xFE, 0xC0, 0, 1, 2, 3, 4, 5, 6, 7]);

        let bytes = probe.to_bytes();
        assert_eq!(bytes.len(), 80 + 4 + 10 + 10);
        assert_eq!(bytes.len(), probe.len());
    }

    #[test]
    fn test_hex_dump() {
        let dump = hex_dump(&[0xFE, 0x01, 0xFE, 0x02]);
        assert_eq!(dump, "0000: FE 01 FE 02\n");
        let long = hex_dump(&[0u8; 17]);
        assert!(long.ends_with("0010: 00\n"));
    }

    proptest! {
        #[test]
        fn prop_stress_length_is_budget(fill in any::<u8>(), budget in 0usize..2048) {
            prop_assert_eq!(build_stress_burst_with_budget(fill, budget).len(), budget);
        }

        #[test]
        fn prop_stress_text_is_printable(fill in any::<u8>()) {
            let tokens = CommandParser::decode_all(&build_stress_burst(fill)).unwrap();
            for token in tokens {
                if let Token::Data(b) = token {
                    prop_assert!((0x20..=0x7E).contains(&b));
                }
            }
        }
    }
}
