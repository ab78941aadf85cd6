//! Single-layer decoding pipeline and the decoder entry point.

use crate::container::container::Container;
use crate::encode::block::{BlockCodec, CodecVariant};
use crate::encode::dictionary::DcDictionary;
use crate::encode::layered;
use crate::encode::partition::Partition;
use crate::encode::predict::{Predictor, deblock};
use crate::image::frame::{Channel, Frame, chroma_dims};
use crate::image::plane::Plane;
use crate::utils::error::{CodecError, Result};
use log::{debug, info};

#[cfg(feature = "debug-logging")]
use log::trace;

/// Block grid the optional post-filter smooths.
pub const DEBLOCK_GRID: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderParams {
    /// Must match the variant the stream was encoded with.
    pub variant: CodecVariant,
    /// Smooth block edges of the output.
    pub deblock: bool,
}

pub struct Decoder {
    params: DecoderParams,
    codec: Box<dyn BlockCodec>,
}

impl Decoder {
    pub fn new(params: DecoderParams) -> Self {
        Self {
            codec: params.variant.transform.block_codec(),
            params,
        }
    }

    pub fn params(&self) -> &DecoderParams {
        &self.params
    }

    /// Decodes a complete stream at full resolution.
    pub fn decode(&self, bytes: &[u8]) -> Result<Frame> {
        self.decode_frame(bytes, None)
    }

    /// Decodes a stream made by [`Encoder::encode_with_dictionary`], looking
    /// DC pairs up in `dictionary`.
    ///
    /// [`Encoder::encode_with_dictionary`]: crate::Encoder::encode_with_dictionary
    pub fn decode_with_dictionary(&self, bytes: &[u8], dictionary: &DcDictionary) -> Result<Frame> {
        self.decode_frame(bytes, Some(dictionary))
    }

    fn decode_frame(&self, bytes: &[u8], symbols: Option<&DcDictionary>) -> Result<Frame> {
        self.params.variant.validate()?;
        if self.params.variant.layers > 1 {
            return layered::decode_prefix(bytes, &self.params, self.params.variant.layers, symbols);
        }
        let container = Container::from_bytes(bytes)?;
        let frame = self.decode_container(&container, symbols)?;
        info!(
            "decoded {}x{} frame from {} bytes",
            frame.width(),
            frame.height(),
            bytes.len()
        );
        Ok(frame)
    }

    /// Reconstructs the frame held by a single-layer container, applying the
    /// post-filter when enabled.
    pub(crate) fn decode_container(&self, container: &Container, symbols: Option<&DcDictionary>) -> Result<Frame> {
        let (w, h) = (container.width, container.height);
        if w == 0 || h == 0 {
            return Err(CodecError::corrupt(format!("stream declares an empty {}x{} frame", w, h)));
        }
        let (cw, ch) = chroma_dims(w, h);
        let mut planes = Vec::with_capacity(3);
        for channel in Channel::ALL {
            let (pw, ph) = if channel.is_chroma() { (cw, ch) } else { (w, h) };
            let i = channel.index();
            let mut plane =
                self.decode_channel(&container.blocks[i], &container.tags[i], pw, ph, channel, symbols)?;
            if self.params.deblock {
                deblock(&mut plane, DEBLOCK_GRID);
            }
            planes.push(plane);
        }
        let [y, cb, cr]: [Plane<u8>; 3] = planes
            .try_into()
            .map_err(|_| CodecError::corrupt("channel count mismatch"))?;
        Frame::from_planes(y, cb, cr)
    }

    fn decode_channel(
        &self,
        blocks: &[Vec<u8>],
        tags: &[u8],
        width: usize,
        height: usize,
        channel: Channel,
        symbols: Option<&DcDictionary>,
    ) -> Result<Plane<u8>> {
        let mb = channel.macroblock_size();
        let expected = width.div_ceil(mb) * height.div_ceil(mb);
        if tags.len() != expected {
            return Err(CodecError::corrupt(format!(
                "{:?} carries {} partition tags for {} macroblocks",
                channel,
                tags.len(),
                expected
            )));
        }

        let mut predictor = Predictor::new(width, height);
        let mut payloads = blocks.iter();
        let mut tags = tags.iter();
        for my in (0..height).step_by(mb) {
            for mx in (0..width).step_by(mb) {
                let tag = tags.next().copied().unwrap_or_default();
                let partition = Partition::from_tag(tag, channel)?;
                for sub in partition.blocks() {
                    let (x, y, size) = (mx + sub.dx, my + sub.dy, sub.size);
                    let payload = payloads.next().ok_or_else(|| {
                        CodecError::corrupt(format!("{:?} ran out of blocks at ({}, {})", channel, x, y))
                    })?;
                    let prediction = predictor.predict_dc(x, y, size);
                    let residual = self.codec.decode(payload, size, channel, symbols)?;
                    predictor.commit(x, y, size, &residual, prediction);

                    #[cfg(feature = "debug-logging")]
                    trace!(
                        "{:?} block at ({}, {}) size {}: {} bytes",
                        channel,
                        x,
                        y,
                        size,
                        payload.len()
                    );
                }
            }
        }
        let extra = payloads.count();
        if extra > 0 {
            return Err(CodecError::corrupt(format!(
                "{:?} has {} blocks beyond its partitions",
                channel, extra
            )));
        }
        debug!("{:?}: {} blocks decoded", channel, blocks.len());
        Ok(predictor.into_plane())
    }
}

/// Decodes a stream made with `params.variant`.
pub fn decode(bytes: &[u8], params: DecoderParams) -> Result<Frame> {
    Decoder::new(params).decode(bytes)
}
