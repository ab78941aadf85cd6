// src/encode/rice/runlength.rs

//! Run-length-of-values coding on top of Rice codewords.
//!
//! A sequence is cut into runs of equal values. Each run is written as a
//! (length, value) pair, the two fields using their own Rice parameters.

use super::bit_io::{BitReader, BitWriter};
use super::golomb;
use crate::utils::error::{CodecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLengthCoder {
    pub len_k: u8,
    pub value_k: u8,
    /// A run is cut when it reaches this length.
    pub max_len: u16,
}

impl RunLengthCoder {
    pub const fn new(len_k: u8, value_k: u8) -> Self {
        Self {
            len_k,
            value_k,
            max_len: u16::MAX,
        }
    }

    pub const fn with_max_len(mut self, max_len: u16) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn encode(&self, w: &mut BitWriter, values: &[u16]) -> Result<()> {
        let Some((&first, rest)) = values.split_first() else {
            return Err(CodecError::InvalidArg(
                "run-length coding needs at least one value".to_string(),
            ));
        };
        if self.max_len == 0 {
            return Err(CodecError::config("run-length max_len must be positive"));
        }
        let mut current = first;
        let mut run: u16 = 1;
        for &v in rest {
            if v != current || run == self.max_len {
                self.write_pair(w, run, current)?;
                current = v;
                run = 1;
            } else {
                run += 1;
            }
        }
        self.write_pair(w, run, current)?;
        Ok(())
    }

    /// Decodes exactly `count` values.
    pub fn decode_exact(&self, r: &mut BitReader<'_>, count: usize) -> Result<Vec<u16>> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            let (run, value) = self.read_pair(r)?;
            if out.len() + run as usize > count {
                return Err(CodecError::corrupt(format!(
                    "run of {} overshoots {} expected values",
                    run, count
                )));
            }
            out.extend(std::iter::repeat(value).take(run as usize));
        }
        Ok(out)
    }

    /// Decodes pairs until the stream ends.
    ///
    /// Running out of bits between two pairs is the normal way an open-ended
    /// stream terminates, and so is a tail of zero padding: a length of at
    /// least one always contains a set bit. Running out inside a pair is
    /// still an error.
    pub fn decode_until_end(&self, r: &mut BitReader<'_>) -> Result<Vec<u16>> {
        let mut out = Vec::new();
        while !r.has_only_padding() {
            let (run, value) = self.read_pair(r)?;
            out.extend(std::iter::repeat(value).take(run as usize));
        }
        Ok(out)
    }

    fn write_pair(&self, w: &mut BitWriter, run: u16, value: u16) -> Result<()> {
        golomb::write(w, run, self.len_k)?;
        golomb::write(w, value, self.value_k)
    }

    fn read_pair(&self, r: &mut BitReader<'_>) -> Result<(u16, u16)> {
        let run = golomb::read(r, self.len_k)?;
        if run == 0 || run > self.max_len {
            return Err(CodecError::corrupt(format!("invalid run length {}", run)));
        }
        let value = golomb::read(r, self.value_k)?;
        Ok((run, value))
    }
}
