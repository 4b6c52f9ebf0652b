// Numeric-mode QR encoder, fixed to version 1, level L, mask pattern 0.
//
// Up to 41 digits fit. The pipeline is: bit stream, 19 data codewords,
// 7 Reed-Solomon codewords, module placement, mask, format information.

pub mod galois;
pub mod matrix;

pub use matrix::{QrMatrix, SIZE};

use super::svg::{Rect, VectorSurface};
use super::EncodeError;

pub const DATA_CODEWORDS: usize = 19;
pub const EC_CODEWORDS: usize = 7;
pub const MAX_NUMERIC_LENGTH: usize = 41;

const MODE_NUMERIC: u32 = 0b0001;
const CHAR_COUNT_BITS: usize = 10;
const PAD_BYTES: [u8; 2] = [0xec, 0x11];

#[derive(Debug, Clone, PartialEq)]
pub struct QrOptions {
    /// Edge of one module in surface units.
    pub module_size: f64,
    /// Quiet zone on each side, in modules.
    pub quiet: u32,
    pub dark_color: String,
    pub light_color: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            module_size: 7.0,
            quiet: 4,
            dark_color: "#000".to_string(),
            light_color: "#fff".to_string(),
        }
    }
}

#[derive(Default)]
struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    fn append(&mut self, value: u32, len: usize) {
        for i in (0..len).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
            .collect()
    }
}

/// Packs the digits into the 19 data codewords of a version 1-L symbol.
pub fn encode_numeric(text: &str) -> Result<Vec<u8>, EncodeError> {
    if text.is_empty() {
        return Err(EncodeError::EmptyPayload);
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EncodeError::NotNumeric);
    }
    if text.len() > MAX_NUMERIC_LENGTH {
        return Err(EncodeError::TooLong {
            len: text.len(),
            max: MAX_NUMERIC_LENGTH,
        });
    }

    let mut buf = BitBuffer::default();
    buf.append(MODE_NUMERIC, 4);
    buf.append(text.len() as u32, CHAR_COUNT_BITS);

    for chunk in text.as_bytes().chunks(3) {
        let value = chunk
            .iter()
            .fold(0u32, |acc, &d| acc * 10 + (d - b'0') as u32);
        let width = match chunk.len() {
            3 => 10,
            2 => 7,
            _ => 4,
        };
        buf.append(value, width);
    }

    let capacity = DATA_CODEWORDS * 8;
    if buf.len() > capacity {
        return Err(EncodeError::CapacityExceeded {
            bits: buf.len(),
            capacity,
        });
    }

    let terminator = (capacity - buf.len()).min(4);
    buf.append(0, terminator);
    let pad = (8 - buf.len() % 8) % 8;
    buf.append(0, pad);

    let mut data = buf.into_bytes();
    let mut pads = PAD_BYTES.iter().cycle();
    while data.len() < DATA_CODEWORDS {
        if let Some(&byte) = pads.next() {
            data.push(byte);
        }
    }
    Ok(data)
}

/// Data codewords followed by their error-correction codewords.
pub fn codewords(text: &str) -> Result<Vec<u8>, EncodeError> {
    let mut data = encode_numeric(text)?;
    let ec = galois::error_correction(&data, EC_CODEWORDS);
    data.extend_from_slice(&ec);
    Ok(data)
}

pub fn encode(text: &str) -> Result<QrMatrix, EncodeError> {
    let all = codewords(text)?;
    let mut matrix = QrMatrix::with_function_patterns();
    matrix.place_codewords(&all);
    matrix.apply_mask();
    matrix.draw_format_bits();
    Ok(matrix)
}

pub fn draw(surface: &mut impl VectorSurface, matrix: &QrMatrix, options: &QrOptions) {
    let unit = options.module_size;
    let quiet = options.quiet as usize;
    let pixel_size = (matrix.size() + quiet * 2) as f64 * unit;

    surface.set_size(pixel_size, pixel_size);
    surface.clear();
    surface.push_rect(Rect {
        x: 0.0,
        y: 0.0,
        width: pixel_size,
        height: pixel_size,
        fill: options.light_color.clone(),
    });

    for y in 0..matrix.size() {
        for x in 0..matrix.size() {
            if !matrix.is_dark(x, y) {
                continue;
            }
            surface.push_rect(Rect {
                x: (x + quiet) as f64 * unit,
                y: (y + quiet) as f64 * unit,
                width: unit,
                height: unit,
                fill: options.dark_color.clone(),
            });
        }
    }
}

/// Encodes `text` and draws it onto `surface`. On failure the surface is
/// left untouched and `false` is returned.
pub fn render(surface: &mut impl VectorSurface, text: &str, options: &QrOptions) -> bool {
    match encode(text) {
        Ok(matrix) => {
            draw(surface, &matrix, options);
            true
        }
        Err(e) => {
            tracing::debug!("QR rejected {:?}: {}", text, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::svg::SvgDocument;

    /// Walks the placement order again and reads the unmasked codewords back.
    fn read_codewords(m: &QrMatrix) -> Vec<u8> {
        let mut bits = Vec::new();
        let mut right = SIZE as i32 - 1;
        let mut upward = true;
        while right > 0 {
            if right == 6 {
                right -= 1;
            }
            for i in 0..SIZE {
                let y = if upward { SIZE - 1 - i } else { i };
                for col in 0..2 {
                    let x = (right - col) as usize;
                    if m.is_function(x, y) {
                        continue;
                    }
                    bits.push(m.is_dark(x, y) ^ ((x + y) % 2 == 0));
                }
            }
            upward = !upward;
            right -= 2;
        }
        bits.chunks(8)
            .map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
            .collect()
    }

    fn assert_finder(m: &QrMatrix, left: usize, top: usize) {
        for d in 0..7 {
            assert!(m.is_dark(left + d, top));
            assert!(m.is_dark(left + d, top + 6));
            assert!(m.is_dark(left, top + d));
            assert!(m.is_dark(left + 6, top + d));
        }
        for dy in 2..=4 {
            for dx in 2..=4 {
                assert!(m.is_dark(left + dx, top + dy));
            }
        }
        for d in 1..6 {
            assert!(!m.is_dark(left + d, top + 1));
            assert!(!m.is_dark(left + 1, top + d));
        }
    }

    #[test]
    fn test_numeric_packing_matches_reference() {
        // "01234567": 0001 0000001000 0000001100 0101011001 1000011
        let data = encode_numeric("01234567").unwrap();
        assert_eq!(&data[..6], &[0x10, 0x20, 0x0c, 0x56, 0x61, 0x80]);
        assert_eq!(&data[6..10], &[0xec, 0x11, 0xec, 0x11]);
        assert_eq!(data.len(), DATA_CODEWORDS);
    }

    #[test]
    fn test_longest_payload_fits() {
        let digits = "9".repeat(MAX_NUMERIC_LENGTH);
        let data = encode_numeric(&digits).unwrap();
        assert_eq!(data.len(), DATA_CODEWORDS);
    }

    #[test]
    fn test_rejects_bad_payloads() {
        assert_eq!(
            encode_numeric(&"1".repeat(42)),
            Err(EncodeError::TooLong { len: 42, max: 41 })
        );
        assert_eq!(encode_numeric("12a4"), Err(EncodeError::NotNumeric));
        assert_eq!(encode_numeric(" 1234"), Err(EncodeError::NotNumeric));
        assert_eq!(encode_numeric(""), Err(EncodeError::EmptyPayload));
    }

    #[test]
    fn test_codewords_are_deterministic() {
        let a = codewords("77889900").unwrap();
        let b = codewords("77889900").unwrap();
        assert_eq!(a.len(), DATA_CODEWORDS + EC_CODEWORDS);
        assert_eq!(a, b);
    }

    #[test]
    fn test_matrix_has_finders_and_dark_module() {
        for len in [1usize, 8, 12, 40, 41] {
            let digits: String = (0..len).map(|i| char::from(b'0' + (i % 10) as u8)).collect();
            let m = encode(&digits).unwrap();
            assert_finder(&m, 0, 0);
            assert_finder(&m, SIZE - 7, 0);
            assert_finder(&m, 0, SIZE - 7);
            for i in 0..8 {
                assert!(!m.is_dark(7, i));
                assert!(!m.is_dark(i, 7));
                assert!(!m.is_dark(SIZE - 8, i));
                assert!(!m.is_dark(i, SIZE - 8));
            }
            assert!(m.is_dark(8, SIZE - 8));
        }
    }

    #[test]
    fn test_placed_data_reads_back() {
        let expected = codewords("123456789").unwrap();
        let m = encode("123456789").unwrap();
        assert_eq!(read_codewords(&m), expected);
    }

    #[test]
    fn test_format_strips_match() {
        let m = encode("123456").unwrap();
        let bits = matrix::format_bits(0);
        for i in 0..8u32 {
            assert_eq!(m.is_dark(SIZE - 1 - i as usize, 8), (bits >> i) & 1 == 1);
        }
        for i in 0..=5u32 {
            assert_eq!(m.is_dark(8, i as usize), (bits >> i) & 1 == 1);
        }
    }

    #[test]
    fn test_render_geometry() {
        let mut doc = SvgDocument::new();
        let options = QrOptions {
            module_size: 5.0,
            quiet: 4,
            ..QrOptions::default()
        };
        assert!(render(&mut doc, "77889900", &options));
        assert_eq!(doc.width(), (21.0 + 8.0) * 5.0);
        assert_eq!(doc.height(), doc.width());

        // Top-left finder corner sits right after the quiet zone.
        assert_eq!(doc.shapes()[1].x, 20.0);
        assert_eq!(doc.shapes()[1].y, 20.0);

        let untouched = doc.clone();
        assert!(!render(&mut doc, &"1".repeat(42), &options));
        assert_eq!(doc, untouched);
    }
}
