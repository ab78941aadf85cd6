// src/encode/encoder.rs

//! Single-layer encoding pipeline and the encoder entry point.
//!
//! Each channel is walked macroblock by macroblock in raster order. For every
//! macroblock a partition is chosen from the original samples, and each of its
//! sub-blocks is predicted, transformed, quantized at the controller's current
//! strength and entropy coded. The payload is then decoded again and committed
//! to the predictor so the next block predicts from what the decoder will see.

use crate::container::container::Container;
use crate::encode::block::{BlockCodec, CodecVariant};
use crate::encode::dictionary::DcDictionary;
use crate::encode::layered;
use crate::encode::partition::Partition;
use crate::encode::predict::{Predictor, residual_block};
use crate::encode::rate::RateController;
use crate::image::frame::{Channel, Frame};
use crate::image::plane::Plane;
use crate::utils::error::{CodecError, Result};
use log::{debug, info};

#[cfg(feature = "debug-logging")]
use log::trace;

/// How the bit budget is shared between channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateMode {
    /// One controller threads luma, then Cb, then Cr.
    #[default]
    Shared,
    /// One controller per channel with the budget split 4:1:1. Channels are
    /// independent and run in parallel with the `rayon` feature, except when
    /// they share a dictionary.
    PerChannel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub variant: CodecVariant,
    /// Total budget for the whole stream, in bits.
    pub target_bits: u64,
    pub rate_mode: RateMode,
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            variant: CodecVariant::default(),
            target_bits: 256 * 1024,
            rate_mode: RateMode::Shared,
        }
    }
}

impl EncoderParams {
    pub fn validate(&self) -> Result<()> {
        self.variant.validate()?;
        if self.target_bits == 0 {
            return Err(CodecError::config("target bit budget must be positive"));
        }
        Ok(())
    }
}

/// Payloads and partition tags of one coded channel.
#[derive(Debug, Default)]
pub(crate) struct ChannelStream {
    pub blocks: Vec<Vec<u8>>,
    pub tags: Vec<u8>,
}

/// Share of `target_bits` a channel gets under [`RateMode::PerChannel`].
fn channel_budget(target_bits: u64, channel: Channel) -> u64 {
    let weight: u128 = if channel == Channel::Luma { 4 } else { 1 };
    ((target_bits as u128 * weight / 6) as u64).max(1)
}

/// Side length of a plane rounded up to whole macroblocks.
#[inline]
pub(crate) fn padded(len: usize, mb: usize) -> usize {
    len.div_ceil(mb) * mb
}

/// Pixels the controller will have seen once every macroblock of `plane` is coded.
fn padded_area(plane: &Plane<u8>, channel: Channel) -> u64 {
    let mb = channel.macroblock_size();
    (padded(plane.width(), mb) * padded(plane.height(), mb)) as u64
}

pub struct Encoder {
    params: EncoderParams,
    codec: Box<dyn BlockCodec>,
}

impl Encoder {
    pub fn new(params: EncoderParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            codec: params.variant.transform.block_codec(),
            params,
        })
    }

    pub fn params(&self) -> &EncoderParams {
        &self.params
    }

    /// Encodes a frame into a complete stream for the configured variant.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        self.encode_frame(frame, None)
    }

    /// Encodes a frame, coding Hadamard DC pairs against `dictionary`.
    ///
    /// The dictionary keeps every pair it learns; the decoder needs the same
    /// table (or a copy written with [`DcDictionary::write_to`]) afterwards.
    pub fn encode_with_dictionary(&self, frame: &Frame, dictionary: &mut DcDictionary) -> Result<Vec<u8>> {
        if !self.codec.uses_dictionary() {
            return Err(CodecError::config(format!(
                "{:?} blocks have no dictionary stage",
                self.params.variant.transform
            )));
        }
        let before = dictionary.len();
        let bytes = self.encode_frame(frame, Some(&mut *dictionary))?;
        debug!(
            "dictionary grew from {} to {} DC pairs",
            before,
            dictionary.len()
        );
        Ok(bytes)
    }

    fn encode_frame(&self, frame: &Frame, symbols: Option<&mut DcDictionary>) -> Result<Vec<u8>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(CodecError::InvalidArg(format!(
                "cannot encode an empty {}x{} frame",
                frame.width(),
                frame.height()
            )));
        }
        if self.params.variant.layers > 1 {
            return layered::encode_layers(self, frame, symbols);
        }
        let bytes = self
            .encode_container(frame, self.params.target_bits, symbols)?
            .to_bytes()?;
        info!(
            "encoded {}x{} frame: {} bytes of {} budgeted",
            frame.width(),
            frame.height(),
            bytes.len(),
            self.params.target_bits / 8
        );
        Ok(bytes)
    }

    /// Runs the single-layer pipeline with an explicit budget.
    pub(crate) fn encode_container(
        &self,
        frame: &Frame,
        target_bits: u64,
        mut symbols: Option<&mut DcDictionary>,
    ) -> Result<Container> {
        let range = self.codec.strength_range();
        let streams: [ChannelStream; 3] = match self.params.rate_mode {
            RateMode::Shared => {
                let total: u64 = Channel::ALL
                    .iter()
                    .map(|&c| padded_area(frame.plane(c), c))
                    .sum();
                let mut rc = RateController::new(target_bits, total, range);
                let mut run = |c: Channel| self.encode_channel(frame.plane(c), c, &mut rc, symbols.as_deref_mut());
                [run(Channel::Luma)?, run(Channel::Cb)?, run(Channel::Cr)?]
            }
            RateMode::PerChannel => {
                let run = |c: Channel, symbols: Option<&mut DcDictionary>| -> Result<ChannelStream> {
                    let plane = frame.plane(c);
                    let mut rc = RateController::new(channel_budget(target_bits, c), padded_area(plane, c), range);
                    self.encode_channel(plane, c, &mut rc, symbols)
                };
                if let Some(dict) = symbols {
                    // indices are handed out in channel order
                    [
                        run(Channel::Luma, Some(&mut *dict))?,
                        run(Channel::Cb, Some(&mut *dict))?,
                        run(Channel::Cr, Some(dict))?,
                    ]
                } else {
                    #[cfg(feature = "rayon")]
                    let (y, (cb, cr)) = rayon::join(
                        || run(Channel::Luma, None),
                        || rayon::join(|| run(Channel::Cb, None), || run(Channel::Cr, None)),
                    );
                    #[cfg(not(feature = "rayon"))]
                    let (y, (cb, cr)) = (
                        run(Channel::Luma, None),
                        (run(Channel::Cb, None), run(Channel::Cr, None)),
                    );
                    [y?, cb?, cr?]
                }
            }
        };

        let mut container = Container::new(frame.width(), frame.height());
        for (i, stream) in streams.into_iter().enumerate() {
            container.blocks[i] = stream.blocks;
            container.tags[i] = stream.tags;
        }
        Ok(container)
    }

    fn encode_channel(
        &self,
        plane: &Plane<u8>,
        channel: Channel,
        rc: &mut RateController,
        mut symbols: Option<&mut DcDictionary>,
    ) -> Result<ChannelStream> {
        let mb = channel.macroblock_size();
        let (w, h) = (plane.width(), plane.height());
        let mut predictor = Predictor::new(w, h);
        let mut stream = ChannelStream::default();
        let mut histogram = [0usize; 7];
        let mut bytes = 0usize;

        for my in (0..h).step_by(mb) {
            for mx in (0..w).step_by(mb) {
                let partition = Partition::decide(plane, mx, my, channel);
                histogram[partition.tag() as usize] += 1;
                stream.tags.push(partition.tag());

                for sub in partition.blocks() {
                    let (x, y, size) = (mx + sub.dx, my + sub.dy, sub.size);
                    let prediction = predictor.predict_dc(x, y, size);
                    let residual = residual_block(plane, x, y, size, prediction);
                    let strength = rc.strength();
                    let payload = self
                        .codec
                        .encode(&residual, size, channel, strength, symbols.as_deref_mut())?;

                    let decoded = self.codec.decode(&payload, size, channel, symbols.as_deref())?;
                    predictor.commit(x, y, size, &decoded, prediction);
                    rc.update(payload.len() as u64 * 8, (size * size) as u64);

                    #[cfg(feature = "debug-logging")]
                    trace!(
                        "{:?} block at ({}, {}) size {} strength {}: {} bytes",
                        channel,
                        x,
                        y,
                        size,
                        strength,
                        payload.len()
                    );
                    bytes += payload.len();
                    stream.blocks.push(payload);
                }
            }
        }

        debug!(
            "{:?}: {} blocks, {} bytes, partitions {:?}, final strength {}",
            channel,
            stream.blocks.len(),
            bytes,
            &histogram[1..],
            rc.strength()
        );
        Ok(stream)
    }
}

/// Encodes `frame` with the given parameters.
pub fn encode(frame: &Frame, params: EncoderParams) -> Result<Vec<u8>> {
    Encoder::new(params)?.encode(frame)
}
