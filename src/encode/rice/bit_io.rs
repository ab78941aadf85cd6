// src/encode/rice/bit_io.rs

//! MSB-first bit packing over byte buffers.
//!
//! The writer only ever produces whole bytes: `finish` pads the last partial
//! byte with zero bits. The reader is the exact inverse and reports
//! [`CodecError::EndOfStream`] instead of inventing bits past the end.

use crate::utils::error::{CodecError, Result};
use bitvec::prelude::*;
use std::io::Write;

/// Accumulates bits in stream order.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Writes the low `n` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32, "write_bits supports at most 32 bits");
        for i in (0..n).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    /// Number of bits written so far, padding excluded.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Pads to a byte boundary with zero bits and returns the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        while self.bits.len() % 8 != 0 {
            self.bits.push(false);
        }
        self.bits.into_vec()
    }

    /// Flushes the padded bytes into `out`, returning the byte count.
    pub fn write_to<W: Write>(self, out: &mut W) -> Result<usize> {
        let bytes = self.finish();
        out.write_all(&bytes)?;
        Ok(bytes.len())
    }
}

/// Reads bits back in the order a [`BitWriter`] produced them.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bits: bytes.view_bits::<Msb0>(),
            pos: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        match self.bits.get(self.pos) {
            Some(bit) => {
                let value = *bit;
                self.pos += 1;
                Ok(value)
            }
            None => Err(CodecError::EndOfStream { position: self.pos }),
        }
    }

    /// Reads `n` bits (at most 32) as an unsigned value, MSB first.
    ///
    /// Nothing is consumed when fewer than `n` bits remain.
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n <= 32, "read_bits supports at most 32 bits");
        if self.remaining() < n as usize {
            return Err(CodecError::EndOfStream {
                position: self.bits.len(),
            });
        }
        let mut value = 0u32;
        for bit in self.bits[self.pos..self.pos + n as usize].iter().by_vals() {
            value = (value << 1) | bit as u32;
        }
        self.pos += n as usize;
        Ok(value)
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// True when what is left can only be the zero padding of a final byte.
    pub fn has_only_padding(&self) -> bool {
        self.remaining() < 8 && self.bits[self.pos..].not_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_packed_msb_first() {
        let mut w = BitWriter::new();
        w.write_bit(true);
        w.write_bits(0b011, 3);
        w.write_bits(0b1, 1);
        assert_eq!(w.bit_len(), 5);
        assert_eq!(w.finish(), vec![0b1011_1000]);
    }

    #[test]
    fn whole_bytes_are_not_padded() {
        let mut w = BitWriter::new();
        w.write_bits(0xA5C3, 16);
        assert_eq!(w.finish(), vec![0xA5, 0xC3]);
    }

    #[test]
    fn reader_inverts_writer() {
        let mut w = BitWriter::new();
        w.write_bits(0x1F, 5);
        w.write_bits(0, 3);
        w.write_bits(0xDEAD_BEEF, 32);
        w.write_bit(true);
        let bytes = w.finish();

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_bits(5).unwrap(), 0x1F);
        assert_eq!(r.read_bits(3).unwrap(), 0);
        assert_eq!(r.read_bits(32).unwrap(), 0xDEAD_BEEF);
        assert!(r.read_bit().unwrap());
        assert!(r.has_only_padding());
    }

    #[test]
    fn reading_past_the_end_fails() {
        let bytes = [0xFFu8];
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_bits(6).unwrap(), 0b111111);
        let err = r.read_bits(3).unwrap_err();
        assert!(err.is_exhaustion());
        // A failed read leaves the cursor where it was.
        assert_eq!(r.position(), 6);
        assert_eq!(r.read_bits(2).unwrap(), 0b11);
        assert!(matches!(r.read_bit(), Err(CodecError::EndOfStream { position: 8 })));
    }

    #[test]
    fn padding_detection() {
        let bytes = [0b1010_0000u8];
        let mut r = BitReader::new(&bytes);
        assert!(!r.has_only_padding());
        r.read_bits(3).unwrap();
        assert!(r.has_only_padding());

        let empty: [u8; 0] = [];
        assert!(BitReader::new(&empty).has_only_padding());
    }

    #[test]
    fn write_to_reports_byte_count() {
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        let mut out = Vec::new();
        assert_eq!(w.write_to(&mut out).unwrap(), 1);
        assert_eq!(out, vec![0b1010_0000]);
    }
}
