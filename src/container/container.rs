// src/container/container.rs

//! The single-layer stream layout.
//!
//! ```text
//! u16 width, u16 height
//! 3 × { u32 channel_total; { u16 len; byte[len] } ... }   Y, Cb, Cr
//! 3 × { u32 tags_len; byte[tags_len] }                    Y, Cb, Cr
//! ```
//!
//! Everything is big-endian. `channel_total` counts block payload bytes only,
//! not their length prefixes.

use super::tags::{decode_tags, encode_tags};
use crate::utils::error::{CodecError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Container {
    pub width: usize,
    pub height: usize,
    /// Block payloads per channel, in scan order.
    pub blocks: [Vec<Vec<u8>>; 3],
    /// Partition tag per macroblock, per channel. Empty for enhancement layers.
    pub tags: [Vec<u8>; 3],
}

impl Container {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let width = u16::try_from(self.width)
            .map_err(|_| CodecError::config(format!("width {} does not fit 16 bits", self.width)))?;
        let height = u16::try_from(self.height)
            .map_err(|_| CodecError::config(format!("height {} does not fit 16 bits", self.height)))?;
        out.write_u16::<BigEndian>(width)?;
        out.write_u16::<BigEndian>(height)?;

        for blocks in &self.blocks {
            let total: usize = blocks.iter().map(Vec::len).sum();
            let total = u32::try_from(total)
                .map_err(|_| CodecError::config(format!("channel payload of {} bytes is too large", total)))?;
            out.write_u32::<BigEndian>(total)?;
            for payload in blocks {
                let len = u16::try_from(payload.len()).map_err(|_| {
                    CodecError::config(format!("block payload of {} bytes exceeds 65535", payload.len()))
                })?;
                out.write_u16::<BigEndian>(len)?;
                out.write_all(payload)?;
            }
        }

        for tags in &self.tags {
            let coded = encode_tags(tags)?;
            out.write_u32::<BigEndian>(coded.len() as u32)?;
            out.write_all(&coded)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        let width = input.read_u16::<BigEndian>()? as usize;
        let height = input.read_u16::<BigEndian>()? as usize;
        let mut container = Container::new(width, height);

        for blocks in container.blocks.iter_mut() {
            let total = input.read_u32::<BigEndian>()? as usize;
            let mut consumed = 0usize;
            while consumed < total {
                let len = input.read_u16::<BigEndian>()? as usize;
                if len == 0 {
                    return Err(CodecError::corrupt("zero-length block payload"));
                }
                if consumed + len > total {
                    return Err(CodecError::corrupt(format!(
                        "block of {} bytes overruns channel total {}",
                        len, total
                    )));
                }
                let mut payload = vec![0u8; len];
                input.read_exact(&mut payload)?;
                blocks.push(payload);
                consumed += len;
            }
        }

        for tags in container.tags.iter_mut() {
            let len = input.read_u32::<BigEndian>()? as u64;
            let mut coded = Vec::new();
            input.by_ref().take(len).read_to_end(&mut coded)?;
            if (coded.len() as u64) < len {
                return Err(CodecError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("tag stream needs {} bytes, {} left", len, coded.len()),
                )));
            }
            *tags = decode_tags(&coded)?;
        }
        Ok(container)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut Cursor::new(bytes))
    }
}
