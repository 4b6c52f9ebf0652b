// Code 128, character set B.
//
// A symbol is Start B, one symbol character per payload character, the
// modulo-103 checksum character and the Stop pattern. Every character
// except Stop is 11 modules wide, so the printed width depends only on the
// payload length.

use super::svg::{Rect, VectorSurface};
use super::EncodeError;

pub const START_B: u8 = 104;
pub const STOP: u8 = 106;
pub const SYMBOL_MODULES: usize = 11;
pub const START_MODULES: usize = 11;
pub const STOP_MODULES: usize = 13;

/// Bar/space widths for symbol values 0..=105, bar first.
const PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3], [1, 2, 1, 3, 2, 2],
    [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2], [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3],
    [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2], [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1],
    [1, 1, 3, 2, 2, 2], [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1], [3, 1, 1, 2, 2, 2],
    [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2], [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1], [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3],
    [1, 3, 1, 3, 2, 1], [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1], [1, 3, 2, 1, 3, 1],
    [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1], [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1],
    [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3], [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3],
    [3, 1, 1, 3, 2, 1], [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4], [1, 1, 1, 4, 2, 2],
    [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2], [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4],
    [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4], [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1],
    [2, 4, 1, 2, 1, 1], [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2], [1, 2, 4, 1, 1, 2],
    [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2], [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1], [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1],
    [1, 1, 4, 1, 1, 3], [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2], [2, 1, 1, 2, 1, 4],
    [2, 1, 1, 2, 3, 2],
];

const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

#[derive(Debug, Clone, PartialEq)]
pub struct Code128Options {
    /// Width of one module in surface units.
    pub module_width: f64,
    pub height: f64,
    /// Quiet zone on each side, in modules.
    pub quiet: u32,
    pub dark_color: String,
    pub light_color: String,
}

impl Default for Code128Options {
    fn default() -> Self {
        Self {
            module_width: 3.0,
            height: 84.0,
            quiet: 16,
            dark_color: "#000".to_string(),
            light_color: "#fff".to_string(),
        }
    }
}

/// Encoded symbol: Start B, data values, checksum, Stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code128Symbol {
    values: Vec<u8>,
}

impl Code128Symbol {
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn checksum(&self) -> u8 {
        self.values[self.values.len() - 2]
    }

    /// Alternating bar/space widths across the whole symbol, bar first.
    pub fn widths(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.values.len() * 6 + 1);
        for &value in &self.values {
            if value == STOP {
                out.extend_from_slice(&STOP_PATTERN);
            } else {
                out.extend_from_slice(&PATTERNS[value as usize]);
            }
        }
        out
    }

    /// Modules between the quiet zones.
    pub fn symbol_modules(&self) -> usize {
        START_MODULES + SYMBOL_MODULES * (self.values.len() - 2) + STOP_MODULES
    }

    pub fn total_modules(&self, quiet: u32) -> usize {
        self.symbol_modules() + 2 * quiet as usize
    }
}

pub fn symbol_value(ch: char) -> Option<u8> {
    match ch as u32 {
        code @ 32..=127 => Some((code - 32) as u8),
        _ => None,
    }
}

pub fn checksum(data: &[u8]) -> u8 {
    let weighted: u32 = data
        .iter()
        .enumerate()
        .map(|(i, &v)| v as u32 * (i as u32 + 1))
        .sum();
    ((START_B as u32 + weighted) % 103) as u8
}

pub fn encode(payload: &str) -> Result<Code128Symbol, EncodeError> {
    if payload.is_empty() {
        return Err(EncodeError::EmptyPayload);
    }

    let data = payload
        .chars()
        .enumerate()
        .map(|(position, ch)| {
            symbol_value(ch).ok_or(EncodeError::UnsupportedCharacter { ch, position })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let mut values = Vec::with_capacity(data.len() + 3);
    values.push(START_B);
    values.extend_from_slice(&data);
    values.push(checksum(&data));
    values.push(STOP);

    Ok(Code128Symbol { values })
}

pub fn draw(surface: &mut impl VectorSurface, symbol: &Code128Symbol, options: &Code128Options) {
    let unit = options.module_width;
    let width = symbol.total_modules(options.quiet) as f64 * unit;

    surface.set_size(width, options.height);
    surface.clear();
    surface.push_rect(Rect {
        x: 0.0,
        y: 0.0,
        width,
        height: options.height,
        fill: options.light_color.clone(),
    });

    let mut cursor = options.quiet as usize;
    for (i, &w) in symbol.widths().iter().enumerate() {
        if i % 2 == 0 {
            surface.push_rect(Rect {
                x: cursor as f64 * unit,
                y: 0.0,
                width: w as f64 * unit,
                height: options.height,
                fill: options.dark_color.clone(),
            });
        }
        cursor += w as usize;
    }
}

/// Encodes `payload` and draws it onto `surface`. On failure the surface is
/// left untouched and `false` is returned.
pub fn render(surface: &mut impl VectorSurface, payload: &str, options: &Code128Options) -> bool {
    match encode(payload) {
        Ok(symbol) => {
            draw(surface, &symbol, options);
            true
        }
        Err(e) => {
            tracing::debug!("Code 128 rejected {:?}: {}", payload, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::svg::SvgDocument;

    #[test]
    fn test_every_pattern_is_eleven_modules() {
        for (value, pattern) in PATTERNS.iter().enumerate() {
            let sum: u8 = pattern.iter().sum();
            assert_eq!(sum, 11, "pattern {} has width {}", value, sum);
        }
        assert_eq!(STOP_PATTERN.iter().sum::<u8>(), 13);
    }

    #[test]
    fn test_checksum_weights_positions() {
        // 104 + 48*1 + 42*2 + 42*3 + 17*4 + 18*5 + 19*6 + 35*7 = 879, 879 % 103 = 55
        let symbol = encode("PJJ123C").unwrap();
        assert_eq!(symbol.checksum(), 55);
        assert_eq!(symbol.values()[0], START_B);
        assert_eq!(*symbol.values().last().unwrap(), STOP);
    }

    #[test]
    fn test_width_depends_only_on_length() {
        for payload in ["123456789", "987654321", "000000000"] {
            let symbol = encode(payload).unwrap();
            let n = payload.len();
            assert_eq!(
                symbol.total_modules(10),
                11 * (n + 1) + START_MODULES + STOP_MODULES + 2 * 10
            );
        }
    }

    #[test]
    fn test_widths_sum_matches_symbol_modules() {
        let symbol = encode("AB-12 cd").unwrap();
        let sum: usize = symbol.widths().iter().map(|&w| w as usize).sum();
        assert_eq!(sum, symbol.symbol_modules());
    }

    #[test]
    fn test_rejects_control_and_non_ascii() {
        assert_eq!(
            encode("12\t34"),
            Err(EncodeError::UnsupportedCharacter { ch: '\t', position: 2 })
        );
        assert!(matches!(
            encode("12Ж"),
            Err(EncodeError::UnsupportedCharacter { ch: 'Ж', .. })
        ));
        assert_eq!(encode(""), Err(EncodeError::EmptyPayload));
    }

    #[test]
    fn test_render_scales_by_module_width() {
        let options = Code128Options {
            module_width: 2.0,
            height: 50.0,
            quiet: 4,
            ..Code128Options::default()
        };
        let mut doc = SvgDocument::new();
        assert!(render(&mut doc, "123456", &options));

        let modules = 11 * 7 + START_MODULES + STOP_MODULES + 8;
        assert_eq!(doc.width(), modules as f64 * 2.0);
        assert_eq!(doc.height(), 50.0);

        // background + 3 bars per character + 4 bars in Stop
        assert_eq!(doc.shapes().len(), 1 + 3 * 8 + 4);
        assert_eq!(doc.shapes()[1].x, 8.0);
    }

    #[test]
    fn test_failed_render_leaves_surface_untouched() {
        let mut doc = SvgDocument::new();
        assert!(render(&mut doc, "123456", &Code128Options::default()));
        let before = doc.clone();

        assert!(!render(&mut doc, "12\u{7}", &Code128Options::default()));
        assert_eq!(doc, before);
    }
}
