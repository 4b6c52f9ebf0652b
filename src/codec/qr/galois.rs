// GF(256) arithmetic over the QR primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
// and the Reed-Solomon remainder used for error-correction codewords.

const PRIMITIVE: u16 = 0x11d;

pub struct GaloisField {
    exp: [u8; 512],
    log: [u8; 256],
}

impl GaloisField {
    const fn build() -> Self {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        let mut i = 0;
        while i < 255 {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= PRIMITIVE;
            }
            i += 1;
        }
        // Doubled so that log(a) + log(b) never needs a modulo.
        while i < 512 {
            exp[i] = exp[i - 255];
            i += 1;
        }
        Self { exp, log }
    }

    pub fn exp(&self, power: usize) -> u8 {
        self.exp[power % 255]
    }

    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }
}

/// Read-only after compile-time construction; shared freely between threads.
pub static GF: GaloisField = GaloisField::build();

/// Coefficients, highest degree first, of (x - a^0)(x - a^1)...(x - a^(degree-1)).
pub fn generator_poly(degree: usize) -> Vec<u8> {
    let mut poly = vec![1u8];
    for i in 0..degree {
        let factor = [1u8, GF.exp(i)];
        let mut out = vec![0u8; poly.len() + 1];
        for (j, &a) in poly.iter().enumerate() {
            for (k, &b) in factor.iter().enumerate() {
                out[j + k] ^= GF.mul(a, b);
            }
        }
        poly = out;
    }
    poly
}

/// Remainder of data(x) * x^ec_len divided by the generator polynomial.
pub fn error_correction(data: &[u8], ec_len: usize) -> Vec<u8> {
    let generator = generator_poly(ec_len);
    let mut work = data.to_vec();
    work.resize(data.len() + ec_len, 0);

    for i in 0..data.len() {
        let coef = work[i];
        if coef == 0 {
            continue;
        }
        for (j, &g) in generator.iter().enumerate() {
            work[i + j] ^= GF.mul(g, coef);
        }
    }

    work.split_off(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(codeword: &[u8], x: u8) -> u8 {
        codeword.iter().fold(0u8, |acc, &c| GF.mul(acc, x) ^ c)
    }

    #[test]
    fn test_exp_log_are_inverse() {
        for a in 1..=255u8 {
            assert_eq!(GF.exp(GF.log[a as usize] as usize), a);
        }
        assert_eq!(GF.exp(8), 0x1d);
    }

    #[test]
    fn test_generator_for_seven_ec_codewords() {
        // Exponents of the degree-7 generator: 0, 87, 229, 146, 149, 238, 102, 21
        let expected: Vec<u8> = [0usize, 87, 229, 146, 149, 238, 102, 21]
            .iter()
            .map(|&e| GF.exp(e))
            .collect();
        assert_eq!(generator_poly(7), expected);
    }

    #[test]
    fn test_codeword_has_zero_syndromes() {
        let data: Vec<u8> = (0..19u8).map(|i| i.wrapping_mul(37).wrapping_add(11)).collect();
        let ec = error_correction(&data, 7);
        assert_eq!(ec.len(), 7);

        let mut codeword = data.clone();
        codeword.extend_from_slice(&ec);
        for i in 0..7 {
            assert_eq!(eval(&codeword, GF.exp(i)), 0, "syndrome {} not zero", i);
        }
    }
}
