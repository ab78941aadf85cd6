// src/container/layered.rs

//! Framing for multi-resolution streams: each layer is a complete
//! single-layer container behind a big-endian `u32` length. The base layer
//! comes first and the finest enhancement last.

use crate::utils::error::{CodecError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read};

pub fn frame_layers(layers: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(layers.iter().map(|l| l.len() + 4).sum());
    for layer in layers {
        let len = u32::try_from(layer.len())
            .map_err(|_| CodecError::config(format!("layer of {} bytes is too large", layer.len())))?;
        out.write_u32::<BigEndian>(len)?;
        out.extend_from_slice(layer);
    }
    Ok(out)
}

/// Splits a framed stream into its sub-containers, base first.
pub fn split_layers(bytes: &[u8]) -> Result<Vec<&[u8]>> {
    let mut cursor = Cursor::new(bytes);
    let mut layers = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        let len = cursor.read_u32::<BigEndian>()? as usize;
        let start = cursor.position() as usize;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("layer of {} bytes runs past the end of the stream", len),
                )
            })?;
        layers.push(&bytes[start..end]);
        cursor.set_position(end as u64);
    }
    if layers.is_empty() {
        return Err(CodecError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "layered stream holds no layers",
        )));
    }
    Ok(layers)
}

/// Reads one framed layer from a reader.
pub fn read_layer<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    let len = input.read_u32::<BigEndian>()? as usize;
    let mut layer = vec![0u8; len];
    input.read_exact(&mut layer)?;
    Ok(layer)
}
