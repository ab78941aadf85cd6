// src/encode/constants.rs

//! Rice parameters for every coded field. Encoder and decoder must agree on
//! all of them; none is transmitted.

use crate::encode::rice::runlength::RunLengthCoder;

/// Deepest LL band of a wavelet block, as (length, value) runs.
pub const LL_RUNS: RunLengthCoder = RunLengthCoder::new(3, 4);

/// Row-DC column of a Hadamard block, as (length, value) runs.
pub const DC_RUNS: RunLengthCoder = RunLengthCoder::new(2, 6);

/// Detail and AC coefficients: mostly zero, small otherwise.
pub const DETAIL_VALUE_K: u8 = 1;
/// Zero-run counts in detail streams.
pub const DETAIL_RUN_K: u8 = 5;

/// Macroblock partition tags, run-length coded per channel.
pub const TAG_RUNS: RunLengthCoder = RunLengthCoder::new(2, 3);

/// Tile side used for the detail bands of enhancement layers.
pub const ENHANCEMENT_TILE: usize = 16;
