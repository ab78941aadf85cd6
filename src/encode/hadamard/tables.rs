// src/encode/hadamard/tables.rs

//! Divisor tables for the fixed-block transform.
//!
//! DC tables have one divisor per entry of the row-DC column (`size` entries).
//! AC tables have one divisor per column of the truncated plane (`size - 1`).

use crate::image::frame::Channel;
use crate::utils::error::{CodecError, Result};

const DC_8: [i16; 8] = [16, 16, 16, 16, 16, 16, 64, 64];
const DC_16: [i16; 16] = [
    16, 16, 16, 16, 16, 16, 16, 16, 32, 32, 32, 32, 64, 64, 64, 64,
];
const DC_32: [i16; 32] = [
    16, 16, 16, 16, 16, 16, 16, 16, 24, 24, 24, 24, 24, 24, 24, 24, //
    32, 32, 32, 32, 32, 32, 32, 32, 64, 64, 64, 64, 64, 64, 64, 64,
];

const LUMA_8: [i16; 7] = [16, 16, 16, 16, 24, 24, 32];
const LUMA_16: [i16; 15] = [16, 16, 16, 16, 24, 24, 24, 32, 32, 32, 48, 48, 64, 80, 96];
const LUMA_32: [i16; 31] = [
    16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 24, 24, 24, 24, 24, 24, //
    24, 24, 32, 32, 32, 32, 32, 32, 48, 48, 48, 64, 64, 80, 96,
];

const CHROMA_8: [i16; 7] = [64, 64, 64, 64, 100, 128, 192];
const CHROMA_16: [i16; 15] = [
    64, 64, 80, 90, 100, 112, 128, 160, 176, 192, 208, 208, 220, 220, 240,
];
const CHROMA_32: [i16; 31] = [
    64, 64, 64, 64, 64, 64, 64, 90, 90, 90, 90, 90, 100, 100, 110, 110, //
    128, 128, 144, 160, 176, 192, 208, 208, 220, 220, 240, 240, 240, 240, 240,
];

/// The three tables used for one block size.
#[derive(Debug, Clone, Copy)]
pub struct TableSet {
    pub dc: &'static [i16],
    pub luma: &'static [i16],
    pub chroma: &'static [i16],
}

impl TableSet {
    pub fn for_size(size: usize) -> Result<Self> {
        match size {
            8 => Ok(Self {
                dc: &DC_8,
                luma: &LUMA_8,
                chroma: &CHROMA_8,
            }),
            16 => Ok(Self {
                dc: &DC_16,
                luma: &LUMA_16,
                chroma: &CHROMA_16,
            }),
            32 => Ok(Self {
                dc: &DC_32,
                luma: &LUMA_32,
                chroma: &CHROMA_32,
            }),
            _ => Err(CodecError::config(format!(
                "no quantization tables for block size {}",
                size
            ))),
        }
    }

    #[inline]
    pub fn ac(&self, channel: Channel) -> &'static [i16] {
        if channel.is_chroma() { self.chroma } else { self.luma }
    }
}

pub fn dc_quantize(data: &mut [i32], table: &[i16]) {
    for (v, &q) in data.iter_mut().zip(table) {
        *v /= q as i32;
    }
}

pub fn dc_dequantize(data: &mut [i32], table: &[i16]) {
    for (v, &q) in data.iter_mut().zip(table) {
        *v *= q as i32;
    }
}

/// `v / (q * scale)`, saturated to the 8-bit signed range.
pub fn ac_quantize(data: &[i32], table: &[i16], scale: u8) -> Vec<i8> {
    let scale = scale.max(1) as i32;
    data.iter()
        .zip(table)
        .map(|(&v, &q)| (v / (q as i32 * scale)).clamp(i8::MIN as i32, i8::MAX as i32) as i8)
        .collect()
}

pub fn ac_dequantize(data: &[i8], table: &[i16], scale: u8) -> Vec<i32> {
    let scale = scale.max(1) as i32;
    data.iter()
        .zip(table)
        .map(|(&v, &q)| v as i32 * q as i32 * scale)
        .collect()
}
