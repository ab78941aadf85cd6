// src/encode/block.rs

//! The per-block coding strategy and the variant that selects it.
//!
//! Every block payload starts with one header byte: the plane shape flag in
//! bit 7 and the quantization strength in bits 0..6. The rest is a single bit
//! stream whose layout belongs to the transform.
//!
//! Codecs with a dictionary stage take the caller's [`DcDictionary`]; the
//! others ignore it.

use crate::encode::dictionary::DcDictionary;
use crate::encode::hadamard::codec::HadamardCodec;
use crate::encode::rate::StrengthRange;
use crate::encode::scan::PlaneShape;
use crate::encode::wavelet::codec::LiftingCodec;
use crate::image::frame::Channel;
use crate::utils::error::{CodecError, Result};

/// Transform, quantization and entropy layout for one square block.
pub trait BlockCodec: Send + Sync {
    /// Plane shape this codec writes into its headers.
    fn shape(&self) -> PlaneShape;

    /// Range the rate controller steers within.
    fn strength_range(&self) -> StrengthRange;

    /// Codes a `size × size` residual at the given strength.
    fn encode(
        &self,
        residual: &[i16],
        size: usize,
        channel: Channel,
        strength: u8,
        symbols: Option<&mut DcDictionary>,
    ) -> Result<Vec<u8>>;

    /// Reconstructs the residual from a payload made by [`BlockCodec::encode`].
    fn decode(
        &self,
        payload: &[u8],
        size: usize,
        channel: Channel,
        symbols: Option<&DcDictionary>,
    ) -> Result<Vec<i16>>;

    /// Whether [`BlockCodec::encode`] can code against a dictionary.
    fn uses_dictionary(&self) -> bool {
        false
    }

    /// Splits off and validates the header byte.
    fn read_header<'a>(&self, payload: &'a [u8]) -> Result<(u8, &'a [u8])> {
        let Some((&header, body)) = payload.split_first() else {
            return Err(CodecError::corrupt("empty block payload"));
        };
        let (shape, strength) = PlaneShape::unpack_header(header);
        if shape != self.shape() {
            return Err(CodecError::corrupt(format!(
                "block header signals a {:?} plane, expected {:?}",
                shape,
                self.shape()
            )));
        }
        let range = self.strength_range();
        if strength < range.min || strength > range.max {
            return Err(CodecError::corrupt(format!(
                "block strength {} outside {}..={}",
                strength, range.min, range.max
            )));
        }
        Ok((strength, body))
    }
}

/// Quantization family implied by a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantMode {
    /// Per-coefficient divisor tables with an 8-bit saturating range.
    Table,
    /// Per-subband bit shifts.
    SubbandShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformKind {
    /// Reversible LeGall 5/3 lifting, one or two levels per block.
    #[default]
    Lifting,
    /// Fixed-block Walsh–Hadamard with a separate row-DC stream.
    Hadamard,
}

impl TransformKind {
    pub fn quant_mode(self) -> QuantMode {
        match self {
            TransformKind::Lifting => QuantMode::SubbandShift,
            TransformKind::Hadamard => QuantMode::Table,
        }
    }

    pub fn block_codec(self) -> Box<dyn BlockCodec> {
        match self {
            TransformKind::Lifting => Box::new(LiftingCodec::new()),
            TransformKind::Hadamard => Box::new(HadamardCodec::new()),
        }
    }
}

/// Which pipeline a stream was made with. The decoder must be given the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecVariant {
    pub transform: TransformKind,
    /// Resolution layers, 1 for a plain single-layer container.
    pub layers: u8,
}

impl CodecVariant {
    pub const MAX_LAYERS: u8 = 3;

    pub const fn single(transform: TransformKind) -> Self {
        Self {
            transform,
            layers: 1,
        }
    }

    pub const fn layered(transform: TransformKind, layers: u8) -> Self {
        Self { transform, layers }
    }

    pub fn quant_mode(&self) -> QuantMode {
        self.transform.quant_mode()
    }

    pub fn validate(&self) -> Result<()> {
        if self.layers == 0 || self.layers > Self::MAX_LAYERS {
            return Err(CodecError::config(format!(
                "layer count must be 1..={}, got {}",
                Self::MAX_LAYERS,
                self.layers
            )));
        }
        Ok(())
    }
}

impl Default for CodecVariant {
    fn default() -> Self {
        Self::single(TransformKind::Lifting)
    }
}
