// src/container/tags.rs

//! Per-channel macroblock partition tag streams.

use crate::encode::constants::TAG_RUNS;
use crate::encode::rice::bit_io::{BitReader, BitWriter};
use crate::utils::error::{CodecError, Result};

/// Run-length codes a tag sequence. An empty sequence gives an empty stream.
pub fn encode_tags(tags: &[u8]) -> Result<Vec<u8>> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }
    let values: Vec<u16> = tags.iter().map(|&t| t as u16).collect();
    let mut w = BitWriter::new();
    TAG_RUNS.encode(&mut w, &values)?;
    Ok(w.finish())
}

/// Expands a tag stream until it ends.
pub fn decode_tags(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    TAG_RUNS
        .decode_until_end(&mut BitReader::new(bytes))?
        .into_iter()
        .map(|v| u8::try_from(v).map_err(|_| CodecError::corrupt(format!("partition tag {} out of range", v))))
        .collect()
}
