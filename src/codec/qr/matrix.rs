// Version 1 module grid. Function modules (finders, separators, timing,
// format strips, dark module) are flagged when drawn and never rewritten by
// data placement or masking.

pub const SIZE: usize = 21;

/// Error-correction level L.
const ECL_BITS: u32 = 0b01;
const FORMAT_GENERATOR: u32 = 0x537;
const FORMAT_MASK: u32 = 0x5412;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    modules: [[bool; SIZE]; SIZE],
    function: [[bool; SIZE]; SIZE],
}

impl QrMatrix {
    /// Lays out every function pattern and reserves the format strips.
    pub fn with_function_patterns() -> Self {
        let mut m = Self {
            modules: [[false; SIZE]; SIZE],
            function: [[false; SIZE]; SIZE],
        };
        m.draw_finder(0, 0);
        m.draw_finder(SIZE as i32 - 7, 0);
        m.draw_finder(0, SIZE as i32 - 7);
        m.draw_timing();
        m.reserve_format();
        m.set_function(8, SIZE - 8, true);
        m
    }

    pub fn size(&self) -> usize {
        SIZE
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y][x]
    }

    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.function[y][x]
    }

    fn set_function(&mut self, x: usize, y: usize, dark: bool) {
        self.modules[y][x] = dark;
        self.function[y][x] = true;
    }

    fn draw_finder(&mut self, x: i32, y: i32) {
        for dy in -1..=7 {
            for dx in -1..=7 {
                let (xx, yy) = (x + dx, y + dy);
                if xx < 0 || yy < 0 || xx >= SIZE as i32 || yy >= SIZE as i32 {
                    continue;
                }
                let separator = dx == -1 || dx == 7 || dy == -1 || dy == 7;
                let outer = dx == 0 || dx == 6 || dy == 0 || dy == 6;
                let core = (2..=4).contains(&dx) && (2..=4).contains(&dy);
                self.set_function(xx as usize, yy as usize, !separator && (outer || core));
            }
        }
    }

    fn draw_timing(&mut self) {
        for i in 8..SIZE - 8 {
            let dark = i % 2 == 0;
            self.set_function(i, 6, dark);
            self.set_function(6, i, dark);
        }
    }

    fn reserve_format(&mut self) {
        for i in 0..=8 {
            if i != 6 {
                self.set_function(8, i, false);
                self.set_function(i, 8, false);
            }
        }
        for i in 0..8 {
            self.set_function(SIZE - 1 - i, 8, false);
        }
        for i in 0..7 {
            self.set_function(8, SIZE - 1 - i, false);
        }
    }

    /// Zig-zag placement in two-column strips from the bottom-right corner,
    /// most significant bit first. Cells past the last codeword stay light.
    pub fn place_codewords(&mut self, codewords: &[u8]) {
        let mut bit_index = 0usize;
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
                    if self.function[y][x] {
                        continue;
                    }
                    let dark = codewords
                        .get(bit_index / 8)
                        .map(|byte| (byte >> (7 - bit_index % 8)) & 1 == 1)
                        .unwrap_or(false);
                    self.modules[y][x] = dark;
                    bit_index += 1;
                }
            }
            upward = !upward;
            right -= 2;
        }
    }

    /// Mask pattern 0: invert data modules where (x + y) is even.
    pub fn apply_mask(&mut self) {
        for y in 0..SIZE {
            for x in 0..SIZE {
                if !self.function[y][x] && (x + y) % 2 == 0 {
                    self.modules[y][x] = !self.modules[y][x];
                }
            }
        }
    }

    pub fn draw_format_bits(&mut self) {
        let bits = format_bits(0);
        let bit = |i: u32| (bits >> i) & 1 == 1;

        // Copy around the top-left finder.
        for i in 0..=5 {
            self.set_function(8, i as usize, bit(i));
        }
        self.set_function(8, 7, bit(6));
        self.set_function(8, 8, bit(7));
        self.set_function(7, 8, bit(8));
        for i in 9..15 {
            self.set_function((14 - i) as usize, 8, bit(i));
        }

        // Split copy along the top-right and bottom-left finders.
        for i in 0..8 {
            self.set_function(SIZE - 1 - i as usize, 8, bit(i));
        }
        for i in 8..15 {
            self.set_function(8, SIZE - 15 + i as usize, bit(i));
        }

        self.set_function(8, SIZE - 8, true);
    }
}

/// 15-bit format word for level L and the given mask: 5 data bits, 10 BCH
/// bits, XORed with the fixed mask.
pub fn format_bits(mask: u32) -> u32 {
    let data = (ECL_BITS << 3) | mask;
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ (((rem >> 9) & 1) * FORMAT_GENERATOR);
    }
    ((data << 10) | rem) ^ FORMAT_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bits_for_level_l_mask_0() {
        assert_eq!(format_bits(0), 0b111011111000100);
    }

    #[test]
    fn test_function_patterns_leave_208_data_modules() {
        let m = QrMatrix::with_function_patterns();
        let mut free = 0;
        for y in 0..SIZE {
            for x in 0..SIZE {
                if !m.is_function(x, y) {
                    free += 1;
                }
            }
        }
        // 26 codewords of 8 bits fill version 1 exactly.
        assert_eq!(free, 26 * 8);
    }

    #[test]
    fn test_timing_alternates() {
        let m = QrMatrix::with_function_patterns();
        for i in 8..SIZE - 8 {
            assert_eq!(m.is_dark(i, 6), i % 2 == 0);
            assert_eq!(m.is_dark(6, i), i % 2 == 0);
        }
    }

    #[test]
    fn test_mask_and_placement_skip_function_modules() {
        let mut m = QrMatrix::with_function_patterns();
        let before = m.clone();
        m.place_codewords(&[0xff; 26]);
        m.apply_mask();
        for y in 0..SIZE {
            for x in 0..SIZE {
                if before.is_function(x, y) {
                    assert_eq!(m.is_dark(x, y), before.is_dark(x, y), "({}, {})", x, y);
                }
            }
        }
    }
}
