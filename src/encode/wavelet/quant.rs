// src/encode/wavelet/quant.rs

use crate::utils::error::{CodecError, Result};
use log::warn;

/// Largest base shift the rate controller may hand out.
pub const MAX_BASE_SHIFT: u8 = 8;

/// Frequency class of a coefficient inside a transformed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubbandClass {
    /// LL of the deepest level.
    Lowest,
    /// Level-2 detail bands, or the LL quadrant of a single-level block.
    Mid,
    /// Level-1 detail bands.
    High,
}

impl SubbandClass {
    pub const fn offset(self) -> u8 {
        match self {
            SubbandClass::Lowest => 0,
            SubbandClass::Mid => 2,
            SubbandClass::High => 5,
        }
    }

    /// Class of position `(x, y)` in a block of width `size`.
    pub fn at(x: usize, y: usize, size: usize) -> Self {
        let half = size / 2;
        let quarter = if size >= 16 { size / 4 } else { 0 };
        if x < quarter && y < quarter {
            SubbandClass::Lowest
        } else if x < half && y < half {
            SubbandClass::Mid
        } else {
            SubbandClass::High
        }
    }
}

/// Detail bands produced by one whole-plane level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailBand {
    Hl,
    Lh,
    Hh,
}

impl DetailBand {
    pub const ALL: [DetailBand; 3] = [DetailBand::Hl, DetailBand::Lh, DetailBand::Hh];

    pub const fn offset(self) -> u8 {
        match self {
            DetailBand::Hl | DetailBand::Lh => 1,
            DetailBand::Hh => 2,
        }
    }
}

/// Round-to-nearest right shift, ties away from zero.
#[inline]
pub fn quantize_value(v: i16, shift: u8) -> i16 {
    if shift == 0 {
        return v;
    }
    let off = 1i32 << (shift - 1);
    let v = v as i32;
    let q = if v >= 0 {
        (v + off) >> shift
    } else {
        -((-v + off) >> shift)
    };
    q as i16
}

/// Exact left shift, saturated to the sample range.
#[inline]
pub fn dequantize_value(q: i16, shift: u8) -> i16 {
    ((q as i32) << shift).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Bit-shift quantizer driven by the rate controller's base shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftQuantizer {
    base: u8,
}

impl ShiftQuantizer {
    pub fn new(base_shift: i32) -> Result<Self> {
        if base_shift < 0 {
            return Err(CodecError::config(format!(
                "quantization shift must be non-negative, got {}",
                base_shift
            )));
        }
        if base_shift > MAX_BASE_SHIFT as i32 {
            warn!(
                "quantization shift {} clamped to {}",
                base_shift, MAX_BASE_SHIFT
            );
        }
        Ok(Self {
            base: base_shift.min(MAX_BASE_SHIFT as i32) as u8,
        })
    }

    #[inline]
    pub fn base(&self) -> u8 {
        self.base
    }

    #[inline]
    pub fn shift_for(&self, class: SubbandClass) -> u8 {
        self.base + class.offset()
    }

    #[inline]
    pub fn band_shift(&self, band: DetailBand) -> u8 {
        self.base + band.offset()
    }

    pub fn quantize_block(&self, data: &mut [i16], size: usize) {
        for (i, v) in data.iter_mut().enumerate() {
            let shift = self.shift_for(SubbandClass::at(i % size, i / size, size));
            *v = quantize_value(*v, shift);
        }
    }

    pub fn dequantize_block(&self, data: &mut [i16], size: usize) {
        for (i, v) in data.iter_mut().enumerate() {
            let shift = self.shift_for(SubbandClass::at(i % size, i / size, size));
            *v = dequantize_value(*v, shift);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn rounding_is_to_nearest_away_from_zero() {
        assert_eq!(quantize_value(2, 2), 1);
        assert_eq!(quantize_value(1, 2), 0);
        assert_eq!(quantize_value(-2, 2), -1);
        assert_eq!(quantize_value(-1, 2), 0);
        assert_eq!(quantize_value(72, 2), 18);
        assert_eq!(quantize_value(-5, 0), -5);
    }

    #[test]
    fn dequantize_saturates() {
        assert_eq!(dequantize_value(4, 13), i16::MAX);
        assert_eq!(dequantize_value(-4, 13), i16::MIN);
        assert_eq!(dequantize_value(18, 2), 72);
    }

    #[test]
    fn sign_and_error_bound() {
        let mut rng = StdRng::seed_from_u64(3);
        for shift in 1..=(MAX_BASE_SHIFT + 5) {
            let step_half = 1i32 << (shift - 1);
            for _ in 0..2000 {
                let v: i16 = rng.r#gen();
                let back = dequantize_value(quantize_value(v, shift), shift);
                assert!((back as i32) * (v as i32) >= 0, "sign flip {} -> {}", v, back);
                assert!(
                    (back as i32 - v as i32).abs() <= step_half,
                    "v={} shift={} back={}",
                    v,
                    shift,
                    back
                );
            }
        }
    }

    #[test]
    fn subband_classes() {
        assert_eq!(SubbandClass::at(0, 0, 32), SubbandClass::Lowest);
        assert_eq!(SubbandClass::at(7, 7, 32), SubbandClass::Lowest);
        assert_eq!(SubbandClass::at(8, 0, 32), SubbandClass::Mid);
        assert_eq!(SubbandClass::at(15, 15, 32), SubbandClass::Mid);
        assert_eq!(SubbandClass::at(16, 0, 32), SubbandClass::High);
        // no second level at size 8
        assert_eq!(SubbandClass::at(0, 0, 8), SubbandClass::Mid);
        assert_eq!(SubbandClass::at(4, 3, 8), SubbandClass::High);
    }

    #[test]
    fn negative_shift_is_rejected_and_large_is_clamped() {
        assert!(matches!(
            ShiftQuantizer::new(-1),
            Err(CodecError::InvalidConfig(_))
        ));
        assert_eq!(ShiftQuantizer::new(40).unwrap().base(), MAX_BASE_SHIFT);
        assert_eq!(ShiftQuantizer::new(3).unwrap().shift_for(SubbandClass::High), 8);
    }

    #[test]
    fn block_quantization_uses_class_shifts() {
        let q = ShiftQuantizer::new(1).unwrap();
        let mut data = vec![64i16; 16 * 16];
        q.quantize_block(&mut data, 16);
        assert_eq!(data[0], 32); // shift 1
        assert_eq!(data[5], 8); // shift 3
        assert_eq!(data[15 * 16 + 15], 1); // shift 6
        q.dequantize_block(&mut data, 16);
        assert_eq!(data[0], 64);
        assert_eq!(data[5], 64);
        assert_eq!(data[15 * 16 + 15], 64);
    }
}
