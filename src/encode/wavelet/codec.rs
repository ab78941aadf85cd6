//! Block codec for the lifting transform.
//!
//! Payload after the header byte:
//! 1. the deepest LL band in raster order, as (length, value) runs;
//! 2. every detail band from coarse to fine, as zero-run Rice codes.
//!
//! Both streams share one bit writer and carry zigzag-mapped coefficients.

use super::lifting::{block_levels, forward_block, inverse_block};
use super::quant::ShiftQuantizer;
use crate::encode::block::BlockCodec;
use crate::encode::constants::{DETAIL_RUN_K, DETAIL_VALUE_K, LL_RUNS};
use crate::encode::dictionary::DcDictionary;
use crate::encode::rate::StrengthRange;
use crate::encode::rice::bit_io::{BitReader, BitWriter};
use crate::encode::rice::golomb::{decode_zero_runs, encode_zero_runs, zigzag_decode, zigzag_encode};
use crate::encode::scan::{PlaneShape, ScanTables, lowest_band_len};
use crate::image::frame::Channel;
use crate::utils::error::{CodecError, Result};

#[derive(Debug, Clone)]
pub struct LiftingCodec {
    tables: ScanTables,
}

impl LiftingCodec {
    pub fn new() -> Self {
        Self {
            tables: ScanTables::subbands(block_levels),
        }
    }
}

impl Default for LiftingCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockCodec for LiftingCodec {
    fn shape(&self) -> PlaneShape {
        PlaneShape::Square
    }

    fn strength_range(&self) -> StrengthRange {
        StrengthRange::SHIFT
    }

    fn encode(
        &self,
        residual: &[i16],
        size: usize,
        _channel: Channel,
        strength: u8,
        _symbols: Option<&mut DcDictionary>,
    ) -> Result<Vec<u8>> {
        let order = self.tables.order(size, PlaneShape::Square)?;
        if residual.len() != size * size {
            return Err(CodecError::InvalidArg(format!(
                "residual holds {} samples, block needs {}",
                residual.len(),
                size * size
            )));
        }
        let quantizer = ShiftQuantizer::new(strength as i32)?;

        let mut coeffs = residual.to_vec();
        forward_block(&mut coeffs, size);
        quantizer.quantize_block(&mut coeffs, size);

        let scanned: Vec<u16> = order.iter().map(|&i| zigzag_encode(coeffs[i])).collect();
        let ll = lowest_band_len(size, block_levels(size));

        let mut w = BitWriter::new();
        LL_RUNS.encode(&mut w, &scanned[..ll])?;
        encode_zero_runs(&mut w, &scanned[ll..], DETAIL_VALUE_K, DETAIL_RUN_K)?;

        let mut out = Vec::with_capacity(1 + w.bit_len().div_ceil(8));
        out.push(PlaneShape::Square.pack_header(quantizer.base()));
        out.extend(w.finish());
        Ok(out)
    }

    fn decode(
        &self,
        payload: &[u8],
        size: usize,
        _channel: Channel,
        _symbols: Option<&DcDictionary>,
    ) -> Result<Vec<i16>> {
        let order = self.tables.order(size, PlaneShape::Square)?;
        let (strength, body) = self.read_header(payload)?;
        let quantizer = ShiftQuantizer::new(strength as i32)?;
        let ll = lowest_band_len(size, block_levels(size));

        let mut r = BitReader::new(body);
        let mut scanned = LL_RUNS.decode_exact(&mut r, ll)?;
        scanned.extend(decode_zero_runs(&mut r, size * size - ll, DETAIL_VALUE_K, DETAIL_RUN_K)?);

        let mut coeffs = vec![0i16; size * size];
        for (&code, &i) in scanned.iter().zip(order) {
            coeffs[i] = zigzag_decode(code);
        }
        quantizer.dequantize_block(&mut coeffs, size);
        inverse_block(&mut coeffs, size);
        Ok(coeffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn flat_block_is_tiny_and_exact() {
        let codec = LiftingCodec::new();
        let residual = vec![72i16; 32 * 32];
        let payload = codec.encode(&residual, 32, Channel::Luma, 2, None).unwrap();
        // header + one LL run + one folded zero run
        assert!(payload.len() <= 10, "{} bytes", payload.len());
        let back = codec.decode(&payload, 32, Channel::Luma, None).unwrap();
        assert_eq!(back, residual);
    }

    #[test]
    fn zero_strength_keeps_ramps_close() {
        // At base shift 0 an 8-block still rounds LL by 2 bits and the
        // details by 5, but a smooth ramp comes back within a few levels.
        let codec = LiftingCodec::new();
        let residual: Vec<i16> = (0..64).map(|i| (i % 8) as i16 * 2).collect();
        let payload = codec.encode(&residual, 8, Channel::Cb, 0, None).unwrap();
        let back = codec.decode(&payload, 8, Channel::Cb, None).unwrap();
        let max_err = residual
            .iter()
            .zip(&back)
            .map(|(a, b)| (a - b).abs())
            .max()
            .unwrap();
        assert!(max_err <= 4, "max error {}", max_err);
    }

    #[test]
    fn error_grows_with_strength() {
        let codec = LiftingCodec::new();
        let mut rng = StdRng::seed_from_u64(17);
        let residual: Vec<i16> = (0..256).map(|_| rng.gen_range(-60..60)).collect();
        let sse = |strength: u8| -> i64 {
            let payload = codec.encode(&residual, 16, Channel::Luma, strength, None).unwrap();
            let back = codec.decode(&payload, 16, Channel::Luma, None).unwrap();
            residual
                .iter()
                .zip(&back)
                .map(|(a, b)| ((a - b) as i64).pow(2))
                .sum()
        };
        let size = |strength: u8| codec.encode(&residual, 16, Channel::Luma, strength, None).unwrap().len();
        assert!(size(0) > size(6));
        assert!(sse(0) <= sse(6));
    }

    #[test]
    fn truncated_payload_is_exhaustion() {
        let codec = LiftingCodec::new();
        let mut rng = StdRng::seed_from_u64(5);
        let residual: Vec<i16> = (0..64).map(|_| rng.gen_range(-100..100)).collect();
        let payload = codec.encode(&residual, 8, Channel::Luma, 0, None).unwrap();
        let err = codec.decode(&payload[..payload.len() / 2], 8, Channel::Luma, None).unwrap_err();
        assert!(err.is_exhaustion(), "{:?}", err);
    }

    #[test]
    fn unsupported_size_is_rejected() {
        let codec = LiftingCodec::new();
        assert!(matches!(
            codec.encode(&[0; 144], 12, Channel::Luma, 1, None),
            Err(CodecError::InvalidConfig(_))
        ));
    }
}
