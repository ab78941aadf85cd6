//! Golomb-Rice codewords and zero-run folding.

use super::bit_io::{BitReader, BitWriter};
use crate::utils::error::{CodecError, Result};

/// Largest Rice parameter a 16-bit field can use.
pub const MAX_RICE_K: u8 = 16;

/// Longest zero run folded into one (zero, count) codeword pair.
pub const MAX_ZERO_RUN: u16 = 4096;

/// Maps a signed sample onto an unsigned code so small magnitudes stay small:
/// 0, -1, 1, -2, 2 ... become 0, 1, 2, 3, 4 ...
#[inline]
pub fn zigzag_encode(v: i16) -> u16 {
    ((v << 1) ^ (v >> 15)) as u16
}

#[inline]
pub fn zigzag_decode(u: u16) -> i16 {
    ((u >> 1) as i16) ^ -((u & 1) as i16)
}

fn check_k(k: u8) -> Result<()> {
    if k > MAX_RICE_K {
        return Err(CodecError::config(format!(
            "rice parameter {} exceeds {}",
            k, MAX_RICE_K
        )));
    }
    Ok(())
}

/// Writes `value` as `value >> k` ones, a terminating zero, then the low `k` bits.
pub fn write(w: &mut BitWriter, value: u16, k: u8) -> Result<()> {
    check_k(k)?;
    let v = value as u32;
    for _ in 0..(v >> k) {
        w.write_bit(true);
    }
    w.write_bit(false);
    if k > 0 {
        w.write_bits(v & ((1u32 << k) - 1), k);
    }
    Ok(())
}

/// Reads one codeword written by [`write`] with the same `k`.
pub fn read(r: &mut BitReader<'_>, k: u8) -> Result<u16> {
    check_k(k)?;
    let max_quotient = u16::MAX as u32 >> k;
    let mut quotient = 0u32;
    while r.read_bit()? {
        quotient += 1;
        if quotient > max_quotient {
            return Err(CodecError::corrupt(format!(
                "rice quotient overflows 16 bits at bit {}",
                r.position()
            )));
        }
    }
    let remainder = if k > 0 { r.read_bits(k)? } else { 0 };
    let value = (quotient << k) | remainder;
    u16::try_from(value)
        .map_err(|_| CodecError::corrupt(format!("rice value {} overflows 16 bits", value)))
}

/// Rice writer that folds runs of zeros into a zero codeword plus a run count.
#[derive(Debug, Clone)]
pub struct ZeroRunEncoder {
    value_k: u8,
    run_k: u8,
    pending: u16,
}

impl ZeroRunEncoder {
    pub fn new(value_k: u8, run_k: u8) -> Self {
        Self {
            value_k,
            run_k,
            pending: 0,
        }
    }

    pub fn push(&mut self, w: &mut BitWriter, value: u16) -> Result<()> {
        if value == 0 {
            self.pending += 1;
            if self.pending == MAX_ZERO_RUN {
                self.flush_run(w)?;
            }
            return Ok(());
        }
        self.flush_run(w)?;
        write(w, value, self.value_k)
    }

    /// Emits the zero run still being counted. Must be called once the
    /// sequence is complete.
    pub fn finish(&mut self, w: &mut BitWriter) -> Result<()> {
        self.flush_run(w)
    }

    fn flush_run(&mut self, w: &mut BitWriter) -> Result<()> {
        if self.pending == 0 {
            return Ok(());
        }
        write(w, 0, self.value_k)?;
        write(w, self.pending, self.run_k)?;
        self.pending = 0;
        Ok(())
    }
}

/// Reader for streams produced by [`ZeroRunEncoder`].
#[derive(Debug, Clone)]
pub struct ZeroRunDecoder {
    value_k: u8,
    run_k: u8,
    pending: u16,
}

impl ZeroRunDecoder {
    pub fn new(value_k: u8, run_k: u8) -> Self {
        Self {
            value_k,
            run_k,
            pending: 0,
        }
    }

    pub fn next(&mut self, r: &mut BitReader<'_>) -> Result<u16> {
        if self.pending > 0 {
            self.pending -= 1;
            return Ok(0);
        }
        let value = read(r, self.value_k)?;
        if value == 0 {
            let run = read(r, self.run_k)?;
            if run == 0 || run > MAX_ZERO_RUN {
                return Err(CodecError::corrupt(format!("invalid zero run {}", run)));
            }
            self.pending = run - 1;
        }
        Ok(value)
    }

    /// Fails if a decoded zero run reaches past the values actually consumed.
    pub fn finish(self) -> Result<()> {
        if self.pending > 0 {
            return Err(CodecError::corrupt(format!(
                "zero run overshoots the sequence by {}",
                self.pending
            )));
        }
        Ok(())
    }
}

/// Codes a whole sequence with zero-run folding.
pub fn encode_zero_runs(w: &mut BitWriter, values: &[u16], value_k: u8, run_k: u8) -> Result<()> {
    let mut enc = ZeroRunEncoder::new(value_k, run_k);
    for &v in values {
        enc.push(w, v)?;
    }
    enc.finish(w)
}

/// Decodes exactly `count` values written by [`encode_zero_runs`].
pub fn decode_zero_runs(
    r: &mut BitReader<'_>,
    count: usize,
    value_k: u8,
    run_k: u8,
) -> Result<Vec<u16>> {
    let mut dec = ZeroRunDecoder::new(value_k, run_k);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(dec.next(r)?);
    }
    dec.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn rice_k0_is_unary() {
        let mut w = BitWriter::new();
        write(&mut w, 3, 0).unwrap();
        write(&mut w, 1, 0).unwrap();
        assert_eq!(w.finish(), vec![0xE8]);
    }

    #[test]
    fn rice_round_trip_boundaries() {
        for k in 0..=MAX_RICE_K {
            // Large values at k=0 would be 65536 bits of unary, so skip the
            // top of the range where the quotient gets silly.
            let mut values = vec![0u16, 1, (1u32 << k).min(u16::MAX as u32) as u16];
            if k >= 8 {
                values.push(u16::MAX);
            }
            let mut w = BitWriter::new();
            for &v in &values {
                write(&mut w, v, k).unwrap();
            }
            let bytes = w.finish();
            let mut r = BitReader::new(&bytes);
            for &v in &values {
                assert_eq!(read(&mut r, k).unwrap(), v, "k={}", k);
            }
        }
    }

    #[test]
    fn rice_max_value_at_k0() {
        let mut w = BitWriter::new();
        write(&mut w, u16::MAX, 0).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert_eq!(read(&mut r, 0).unwrap(), u16::MAX);
    }

    #[test]
    fn rice_random_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for k in [1u8, 3, 5, 9, 15] {
            let values: Vec<u16> = (0..500).map(|_| rng.gen_range(0..2048)).collect();
            let mut w = BitWriter::new();
            for &v in &values {
                write(&mut w, v, k).unwrap();
            }
            let bytes = w.finish();
            let mut r = BitReader::new(&bytes);
            for &v in &values {
                assert_eq!(read(&mut r, k).unwrap(), v);
            }
        }
    }

    #[test]
    fn overlong_quotient_is_corrupt() {
        let bytes = [0xFFu8; 8];
        let mut r = BitReader::new(&bytes);
        assert!(matches!(read(&mut r, 10), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn truncated_codeword_is_exhaustion() {
        let bytes = [0b1100_0000u8];
        let mut r = BitReader::new(&bytes);
        assert_eq!(read(&mut r, 2).unwrap(), 8);
        // remaining 3 zero bits: terminator then a 3-bit remainder that is cut short
        assert!(read(&mut r, 3).unwrap_err().is_exhaustion());
    }

    #[test]
    fn oversized_parameter_is_a_config_error() {
        let mut w = BitWriter::new();
        assert!(matches!(write(&mut w, 1, MAX_RICE_K + 1), Err(CodecError::InvalidConfig(_))));
        assert_eq!(w.bit_len(), 0);
        let mut r = BitReader::new(&[0u8; 4]);
        assert!(matches!(read(&mut r, 20), Err(CodecError::InvalidConfig(_))));
        assert!(matches!(
            encode_zero_runs(&mut w, &[0, 0, 3], 1, 17),
            Err(CodecError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zigzag_mapping() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i16::MAX), u16::MAX - 1);
        assert_eq!(zigzag_encode(i16::MIN), u16::MAX);
        for v in [i16::MIN, -300, -1, 0, 1, 77, i16::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }

    #[test]
    fn zero_runs_collapse() {
        let mut values = vec![5u16, 0, 0, 0, 7];
        values.extend(std::iter::repeat(0).take(1000));
        let mut w = BitWriter::new();
        encode_zero_runs(&mut w, &values, 1, 5).unwrap();
        // 1000 zeros cost one zero codeword and one count
        assert!(w.bit_len() < 80, "used {} bits", w.bit_len());
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode_zero_runs(&mut r, values.len(), 1, 5).unwrap(), values);
    }

    #[test]
    fn zero_runs_longer_than_the_cap() {
        let values = vec![0u16; MAX_ZERO_RUN as usize * 2 + 3];
        let mut w = BitWriter::new();
        encode_zero_runs(&mut w, &values, 2, 6).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode_zero_runs(&mut r, values.len(), 2, 6).unwrap(), values);
    }

    #[test]
    fn zero_run_overshoot_is_corrupt() {
        let mut w = BitWriter::new();
        encode_zero_runs(&mut w, &[0, 0, 0, 0], 1, 3).unwrap();
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes);
        assert!(matches!(
            decode_zero_runs(&mut r, 2, 1, 3),
            Err(CodecError::Corrupt(_))
        ));
    }
}
