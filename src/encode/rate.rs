//! Greedy virtual-buffer rate control.
//!
//! After each block the controller compares the bits actually spent with the
//! share of the budget that the processed pixels are entitled to. When spending
//! runs ahead by more than a tenth of the budget the quantization strength
//! goes up one step; when it lags by as much, it goes down one step. Each step
//! also credits half a threshold back to the buffer so the strength does not
//! oscillate on consecutive blocks.

use log::trace;

/// Bounds and starting point of the quantization strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrengthRange {
    pub min: u8,
    pub max: u8,
    pub initial: u8,
}

impl StrengthRange {
    /// Base shift for the wavelet quantizer.
    pub const SHIFT: StrengthRange = StrengthRange {
        min: 0,
        max: 8,
        initial: 2,
    };

    /// Divisor multiplier for the table quantizer.
    pub const SCALE: StrengthRange = StrengthRange {
        min: 1,
        max: 16,
        initial: 1,
    };
}

#[derive(Debug, Clone)]
pub struct RateController {
    target_bits: i64,
    total_pixels: i64,
    bits: i64,
    pixels: i64,
    strength: u8,
    range: StrengthRange,
}

impl RateController {
    pub fn new(target_bits: u64, total_pixels: u64, range: StrengthRange) -> Self {
        Self {
            target_bits: target_bits.min(i64::MAX as u64) as i64,
            total_pixels: total_pixels.max(1).min(i64::MAX as u64) as i64,
            bits: 0,
            pixels: 0,
            strength: range.initial.clamp(range.min, range.max),
            range,
        }
    }

    #[inline]
    pub fn strength(&self) -> u8 {
        self.strength
    }

    /// Bits charged to the buffer so far, including the anti-oscillation credits.
    #[inline]
    pub fn buffered_bits(&self) -> i64 {
        self.bits
    }

    #[inline]
    pub fn processed_pixels(&self) -> i64 {
        self.pixels
    }

    /// Records one coded block and returns the strength for the next one.
    pub fn update(&mut self, added_bits: u64, added_pixels: u64) -> u8 {
        self.bits += added_bits as i64;
        self.pixels += added_pixels as i64;

        let expected = (self.target_bits as i128 * self.pixels as i128 / self.total_pixels as i128) as i64;
        let diff = self.bits - expected;
        let threshold = self.target_bits / 10;

        if diff > threshold && self.strength < self.range.max {
            self.strength += 1;
            self.bits -= threshold / 2;
        } else if diff < -threshold && self.strength > self.range.min {
            self.strength -= 1;
            self.bits += threshold / 2;
        }
        trace!(
            "rate: bits={} expected={} diff={} strength={}",
            self.bits, expected, diff, self.strength
        );
        self.strength
    }
}
