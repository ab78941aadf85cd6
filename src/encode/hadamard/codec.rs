// src/encode/hadamard/codec.rs

//! Block codec for the fixed-block Walsh–Hadamard transform.
//!
//! Every row is transformed, the first coefficient of each row (the row DC)
//! is pulled out into a column that is transformed again, and what is left of
//! the rows forms a truncated `size × (size - 1)` AC plane.
//!
//! Payload after the header byte: one mode bit, the quantized DC column, then
//! the AC plane in zigzag order as zero-run Rice codes. With the mode bit
//! clear the DC column is written as (length, value) runs. With it set the
//! column is cut into pairs and each pair is a 16-bit index into the caller's
//! [`DcDictionary`]. The encoder falls back to runs when no dictionary is
//! given or the dictionary could run out of indices inside the block.

use super::tables::{TableSet, ac_dequantize, ac_quantize, dc_dequantize, dc_quantize};
use super::wht::{fwht, inverse_fwht};
use crate::encode::block::BlockCodec;
use crate::encode::constants::{DC_RUNS, DETAIL_RUN_K, DETAIL_VALUE_K};
use crate::encode::dictionary::{DcDictionary, decode_symbols, encode_symbols};
use crate::encode::rate::StrengthRange;
use crate::encode::rice::bit_io::{BitReader, BitWriter};
use crate::encode::rice::golomb::{decode_zero_runs, encode_zero_runs, zigzag_decode, zigzag_encode};
use crate::encode::scan::{PlaneShape, ScanTables};
use crate::image::frame::Channel;
use crate::utils::error::{CodecError, Result};

#[derive(Debug, Clone)]
pub struct HadamardCodec {
    tables: ScanTables,
}

impl HadamardCodec {
    pub fn new() -> Self {
        Self {
            tables: ScanTables::zigzag(),
        }
    }
}

impl Default for HadamardCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn saturate_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn write_dc(w: &mut BitWriter, dc: &[i16], symbols: Option<&mut DcDictionary>) -> Result<()> {
    let pairs = dc.len() / 2;
    match symbols {
        Some(dict) if dict.has_capacity(pairs) => {
            w.write_bit(true);
            let keys: Vec<[i16; 2]> = dc.chunks_exact(2).map(|p| [p[0], p[1]]).collect();
            for index in encode_symbols(dict, &keys)? {
                w.write_bits(index as u32, 16);
            }
        }
        _ => {
            w.write_bit(false);
            let codes: Vec<u16> = dc.iter().map(|&v| zigzag_encode(v)).collect();
            DC_RUNS.encode(w, &codes)?;
        }
    }
    Ok(())
}

fn read_dc(r: &mut BitReader<'_>, size: usize, symbols: Option<&DcDictionary>) -> Result<Vec<i32>> {
    if !r.read_bit()? {
        return Ok(DC_RUNS
            .decode_exact(r, size)?
            .into_iter()
            .map(|code| zigzag_decode(code) as i32)
            .collect());
    }
    let dict = symbols.ok_or_else(|| CodecError::corrupt("dictionary-coded block but no dictionary was given"))?;
    let indices = (0..size / 2)
        .map(|_| r.read_bits(16).map(|v| v as u16))
        .collect::<Result<Vec<u16>>>()?;
    Ok(decode_symbols(dict, &indices)?
        .into_iter()
        .flatten()
        .map(i32::from)
        .collect())
}

impl BlockCodec for HadamardCodec {
    fn shape(&self) -> PlaneShape {
        PlaneShape::Truncated
    }

    fn strength_range(&self) -> StrengthRange {
        StrengthRange::SCALE
    }

    fn uses_dictionary(&self) -> bool {
        true
    }

    fn encode(
        &self,
        residual: &[i16],
        size: usize,
        channel: Channel,
        strength: u8,
        symbols: Option<&mut DcDictionary>,
    ) -> Result<Vec<u8>> {
        let quant = TableSet::for_size(size)?;
        let order = self.tables.order(size, PlaneShape::Truncated)?;
        if residual.len() != size * size {
            return Err(CodecError::InvalidArg(format!(
                "residual holds {} samples, block needs {}",
                residual.len(),
                size * size
            )));
        }
        let scale = strength.clamp(StrengthRange::SCALE.min, StrengthRange::SCALE.max);

        let mut rows: Vec<i32> = residual.iter().map(|&v| v as i32).collect();
        for row in rows.chunks_exact_mut(size) {
            fwht(row);
        }

        let mut dc: Vec<i32> = rows.chunks_exact(size).map(|row| row[0]).collect();
        fwht(&mut dc);
        dc_quantize(&mut dc, quant.dc);
        let dc: Vec<i16> = dc.into_iter().map(saturate_i16).collect();

        let ac_table = quant.ac(channel);
        let ac: Vec<i8> = rows
            .chunks_exact(size)
            .flat_map(|row| ac_quantize(&row[1..], ac_table, scale))
            .collect();
        let ac_codes: Vec<u16> = order.iter().map(|&i| zigzag_encode(ac[i] as i16)).collect();

        let mut w = BitWriter::new();
        write_dc(&mut w, &dc, symbols)?;
        encode_zero_runs(&mut w, &ac_codes, DETAIL_VALUE_K, DETAIL_RUN_K)?;

        let mut out = Vec::with_capacity(1 + w.bit_len().div_ceil(8));
        out.push(PlaneShape::Truncated.pack_header(scale));
        out.extend(w.finish());
        Ok(out)
    }

    fn decode(
        &self,
        payload: &[u8],
        size: usize,
        channel: Channel,
        symbols: Option<&DcDictionary>,
    ) -> Result<Vec<i16>> {
        let quant = TableSet::for_size(size)?;
        let order = self.tables.order(size, PlaneShape::Truncated)?;
        let (scale, body) = self.read_header(payload)?;
        let (rows_n, cols) = PlaneShape::Truncated.dims(size);

        let mut r = BitReader::new(body);
        let mut dc = read_dc(&mut r, size, symbols)?;
        let ac_codes = decode_zero_runs(&mut r, rows_n * cols, DETAIL_VALUE_K, DETAIL_RUN_K)?;

        dc_dequantize(&mut dc, quant.dc);
        inverse_fwht(&mut dc);

        let mut ac = vec![0i8; rows_n * cols];
        for (&code, &i) in ac_codes.iter().zip(order) {
            let v = zigzag_decode(code);
            ac[i] = i8::try_from(v)
                .map_err(|_| CodecError::corrupt(format!("AC coefficient {} exceeds 8 bits", v)))?;
        }

        let ac_table = quant.ac(channel);
        let mut out = Vec::with_capacity(size * size);
        let mut row = vec![0i32; size];
        for (y, coeffs) in ac.chunks_exact(cols).enumerate() {
            row[0] = dc[y];
            row[1..].copy_from_slice(&ac_dequantize(coeffs, ac_table, scale));
            inverse_fwht(&mut row);
            out.extend(row.iter().map(|&v| saturate_i16(v)));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn flat_block_survives() {
        let codec = HadamardCodec::new();
        let residual = vec![72i16; 64];
        let payload = codec.encode(&residual, 8, Channel::Luma, 1, None).unwrap();
        assert_eq!(payload[0] & 0x80, 0x80);
        assert!(payload.len() <= 8, "{} bytes", payload.len());
        assert_eq!(codec.decode(&payload, 8, Channel::Luma, None).unwrap(), residual);
    }

    #[test]
    fn random_blocks_stay_close() {
        let codec = HadamardCodec::new();
        let mut rng = StdRng::seed_from_u64(1234);
        for size in [8usize, 16, 32] {
            let residual: Vec<i16> = (0..size * size).map(|_| rng.gen_range(-40..40)).collect();
            let payload = codec.encode(&residual, size, Channel::Cb, 1, None).unwrap();
            let back = codec.decode(&payload, size, Channel::Cb, None).unwrap();
            assert_eq!(back.len(), residual.len());
            let mean_abs: i64 = residual
                .iter()
                .zip(&back)
                .map(|(a, b)| ((a - b) as i64).abs())
                .sum::<i64>()
                / residual.len() as i64;
            // Coarse chroma tables, but the error stays within the input range.
            assert!(mean_abs < 40, "size {} mean error {}", size, mean_abs);
        }
    }

    #[test]
    fn scale_is_clamped_into_range() {
        let codec = HadamardCodec::new();
        let payload = codec.encode(&[0; 64], 8, Channel::Luma, 0, None).unwrap();
        assert_eq!(payload[0] & 0x7F, 1);
        let payload = codec.encode(&[0; 64], 8, Channel::Luma, 99, None).unwrap();
        assert_eq!(payload[0] & 0x7F, 16);
    }

    #[test]
    fn dictionary_codes_repeated_dc_pairs() {
        let codec = HadamardCodec::new();
        let mut dict = DcDictionary::new();
        let residual = vec![-20i16; 256];
        let first = codec.encode(&residual, 16, Channel::Luma, 2, Some(&mut dict)).unwrap();
        assert_eq!(first[1] & 0x80, 0x80, "mode bit selects the dictionary");
        let learned = dict.len();
        assert!(learned >= 1);

        // the same column reuses the indices already handed out
        let second = codec.encode(&residual, 16, Channel::Luma, 2, Some(&mut dict)).unwrap();
        assert_eq!(first, second);
        assert_eq!(dict.len(), learned);

        let back = codec.decode(&first, 16, Channel::Luma, Some(&dict)).unwrap();
        let plain = codec.encode(&residual, 16, Channel::Luma, 2, None).unwrap();
        assert_eq!(plain[1] & 0x80, 0);
        assert_eq!(back, codec.decode(&plain, 16, Channel::Luma, None).unwrap());
    }

    #[test]
    fn dictionary_block_needs_the_dictionary() {
        let codec = HadamardCodec::new();
        let mut dict = DcDictionary::new();
        let payload = codec.encode(&[9; 64], 8, Channel::Cb, 1, Some(&mut dict)).unwrap();
        assert!(matches!(
            codec.decode(&payload, 8, Channel::Cb, None),
            Err(CodecError::Corrupt(_))
        ));
        assert!(matches!(
            codec.decode(&payload, 8, Channel::Cb, Some(&DcDictionary::new())),
            Err(CodecError::Corrupt(_))
        ));
    }

    #[test]
    fn full_dictionary_falls_back_to_runs() {
        let codec = HadamardCodec::new();
        let mut dict = DcDictionary::new();
        for i in 0..DcDictionary::CAPACITY - 2 {
            dict.add([i as i16, 1000]).unwrap();
        }
        let payload = codec.encode(&[5; 64], 8, Channel::Luma, 1, Some(&mut dict)).unwrap();
        assert_eq!(payload[1] & 0x80, 0);
        assert_eq!(dict.len(), DcDictionary::CAPACITY - 2);
    }

    #[test]
    fn unsupported_size_is_a_config_error() {
        let codec = HadamardCodec::new();
        assert!(matches!(
            codec.encode(&[0; 16], 4, Channel::Luma, 1, None),
            Err(CodecError::InvalidConfig(_))
        ));
    }
}
