//! Multi-resolution coding.
//!
//! Each enhancement layer takes one whole-plane lifting level of the current
//! image. Its three detail bands are cut into tiles, shift-quantized under a
//! per-layer rate controller and zero-run coded; the LL quadrant, clamped to
//! pixels, becomes the next coarser image. The coarsest image is coded by the
//! single-layer pipeline and forms the base.
//!
//! On the wire the base comes first and the finest enhancement last, so a
//! decoder can stop after any prefix and get a smaller preview.

use crate::container::container::Container;
use crate::container::layered::{frame_layers, split_layers};
use crate::encode::constants::{DETAIL_RUN_K, DETAIL_VALUE_K, ENHANCEMENT_TILE};
use crate::encode::decoder::{Decoder, DecoderParams};
use crate::encode::dictionary::DcDictionary;
use crate::encode::encoder::Encoder;
use crate::encode::rate::{RateController, StrengthRange};
use crate::encode::rice::bit_io::{BitReader, BitWriter};
use crate::encode::rice::golomb::{decode_zero_runs, encode_zero_runs, zigzag_decode, zigzag_encode};
use crate::encode::scan::PlaneShape;
use crate::encode::wavelet::lifting::{forward_plane, inverse_plane};
use crate::encode::wavelet::quant::{DetailBand, MAX_BASE_SHIFT, ShiftQuantizer, dequantize_value, quantize_value};
use crate::image::frame::{Channel, Frame, chroma_dims};
use crate::image::plane::{Plane, clamp_u8};
use crate::utils::error::{CodecError, Result};
use log::{debug, info};

/// Relative share of the budget per layer, finest first.
const LAYER_WEIGHTS: [u64; 3] = [4, 2, 1];

/// Budget of each layer, finest first. The last entry belongs to the base.
fn layer_budgets(target_bits: u64, layers: usize) -> Vec<u64> {
    let weights = &LAYER_WEIGHTS[..layers];
    let sum: u64 = weights.iter().sum();
    weights
        .iter()
        .map(|&w| (target_bits as u128 * w as u128 / sum as u128).max(1) as u64)
        .collect()
}

/// Checks that `layers - 1` halvings of the frame stay whole, chroma included.
pub fn check_dims(width: usize, height: usize, layers: u8) -> Result<()> {
    let unit = 1usize << layers;
    if width % unit != 0 || height % unit != 0 {
        return Err(CodecError::config(format!(
            "{} layers need dimensions divisible by {}, got {}x{}",
            layers, unit, width, height
        )));
    }
    Ok(())
}

/// Position of a detail band inside a plane of `width × height` after one level.
fn band_origin(band: DetailBand, width: usize, height: usize) -> (usize, usize) {
    match band {
        DetailBand::Hl => (width / 2, 0),
        DetailBand::Lh => (0, height / 2),
        DetailBand::Hh => (width / 2, height / 2),
    }
}

/// Tiles covering a `bw × bh` band in raster order, as `(x, y, w, h)` relative to the band.
fn band_tiles(bw: usize, bh: usize) -> impl Iterator<Item = (usize, usize, usize, usize)> {
    (0..bh).step_by(ENHANCEMENT_TILE).flat_map(move |ty| {
        (0..bw).step_by(ENHANCEMENT_TILE).map(move |tx| {
            (
                tx,
                ty,
                ENHANCEMENT_TILE.min(bw - tx),
                ENHANCEMENT_TILE.min(bh - ty),
            )
        })
    })
}

fn encode_tile(coeffs: &[i16], shift: u8, base: u8) -> Result<Vec<u8>> {
    let codes: Vec<u16> = coeffs
        .iter()
        .map(|&v| zigzag_encode(quantize_value(v, shift)))
        .collect();
    let mut w = BitWriter::new();
    encode_zero_runs(&mut w, &codes, DETAIL_VALUE_K, DETAIL_RUN_K)?;
    let mut out = Vec::with_capacity(1 + w.bit_len().div_ceil(8));
    out.push(PlaneShape::Square.pack_header(base));
    out.extend(w.finish());
    Ok(out)
}

fn decode_tile(payload: &[u8], band: DetailBand, count: usize) -> Result<Vec<i16>> {
    let Some((&header, body)) = payload.split_first() else {
        return Err(CodecError::corrupt("empty enhancement tile"));
    };
    let (shape, base) = PlaneShape::unpack_header(header);
    if shape != PlaneShape::Square || base > MAX_BASE_SHIFT {
        return Err(CodecError::corrupt(format!("bad enhancement tile header {:#04x}", header)));
    }
    let shift = ShiftQuantizer::new(base as i32)?.band_shift(band);
    let codes = decode_zero_runs(&mut BitReader::new(body), count, DETAIL_VALUE_K, DETAIL_RUN_K)?;
    Ok(codes
        .into_iter()
        .map(|c| dequantize_value(zigzag_decode(c), shift))
        .collect())
}

/// Runs one lifting level over every channel and codes the detail bands.
/// Returns the enhancement container and the LL image for the next layer.
fn encode_enhancement(frame: &Frame, target_bits: u64) -> Result<(Container, Frame)> {
    let (w, h) = (frame.width(), frame.height());
    let detail_pixels: u64 = Channel::ALL
        .iter()
        .map(|&c| {
            let p = frame.plane(c);
            (p.width() * p.height()) as u64 * 3 / 4
        })
        .sum();
    let mut rc = RateController::new(target_bits, detail_pixels, StrengthRange::SHIFT);
    let mut container = Container::new(w, h);
    let mut lows = Vec::with_capacity(3);

    for channel in Channel::ALL {
        let plane = frame.plane(channel);
        let (pw, ph) = (plane.width(), plane.height());
        let mut data: Vec<i16> = plane.data().iter().map(|&v| v as i16).collect();
        forward_plane(&mut data, pw, ph)?;
        let coeffs = Plane::from_vec(pw, ph, data)?;
        let (bw, bh) = (pw / 2, ph / 2);

        let blocks = &mut container.blocks[channel.index()];
        let mut bytes = 0usize;
        for band in DetailBand::ALL {
            let (ox, oy) = band_origin(band, pw, ph);
            for (tx, ty, tw, th) in band_tiles(bw, bh) {
                let tile = coeffs.crop(ox + tx, oy + ty, tw, th);
                let quantizer = ShiftQuantizer::new(rc.strength() as i32)?;
                let payload = encode_tile(tile.data(), quantizer.band_shift(band), quantizer.base())?;
                rc.update(payload.len() as u64 * 8, (tw * th) as u64);
                bytes += payload.len();
                blocks.push(payload);
            }
        }
        debug!(
            "{:?} enhancement {}x{}: {} tiles, {} bytes, final strength {}",
            channel,
            pw,
            ph,
            blocks.len(),
            bytes,
            rc.strength()
        );
        lows.push(coeffs.crop(0, 0, bw, bh).map(|v| clamp_u8(v as i32)));
    }

    let [y, cb, cr]: [Plane<u8>; 3] = lows
        .try_into()
        .map_err(|_| CodecError::corrupt("channel count mismatch"))?;
    Ok((container, Frame::from_planes(y, cb, cr)?))
}

/// Rebuilds one resolution step from the coarser reconstruction and a
/// decoded enhancement container.
fn decode_enhancement(coarse: &Frame, container: &Container) -> Result<Frame> {
    let (w, h) = (container.width, container.height);
    if w != coarse.width() * 2 || h != coarse.height() * 2 {
        return Err(CodecError::corrupt(format!(
            "enhancement layer is {}x{}, expected {}x{}",
            w,
            h,
            coarse.width() * 2,
            coarse.height() * 2
        )));
    }
    let (cw, ch) = chroma_dims(w, h);
    let mut planes = Vec::with_capacity(3);
    for channel in Channel::ALL {
        let (pw, ph) = if channel.is_chroma() { (cw, ch) } else { (w, h) };
        let low = coarse.plane(channel);
        if (low.width() * 2, low.height() * 2) != (pw, ph) {
            return Err(CodecError::corrupt(format!(
                "{:?} LL of {}x{} does not match a {}x{} plane",
                channel,
                low.width(),
                low.height(),
                pw,
                ph
            )));
        }
        let mut coeffs = Plane::<i16>::new(pw, ph);
        coeffs.paste(0, 0, &low.map(|v| v as i16));

        let (bw, bh) = (pw / 2, ph / 2);
        let mut payloads = container.blocks[channel.index()].iter();
        for band in DetailBand::ALL {
            let (ox, oy) = band_origin(band, pw, ph);
            for (tx, ty, tw, th) in band_tiles(bw, bh) {
                let payload = payloads.next().ok_or_else(|| {
                    CodecError::corrupt(format!("{:?} enhancement ran out of tiles", channel))
                })?;
                let values = decode_tile(payload, band, tw * th)?;
                coeffs.paste(ox + tx, oy + ty, &Plane::from_vec(tw, th, values)?);
            }
        }
        if payloads.next().is_some() {
            return Err(CodecError::corrupt(format!("{:?} enhancement has surplus tiles", channel)));
        }

        let mut data = coeffs.into_vec();
        inverse_plane(&mut data, pw, ph)?;
        planes.push(Plane::from_vec(pw, ph, data)?.map(|v| clamp_u8(v as i32)));
    }
    let [y, cb, cr]: [Plane<u8>; 3] = planes
        .try_into()
        .map_err(|_| CodecError::corrupt("channel count mismatch"))?;
    Frame::from_planes(y, cb, cr)
}

/// Encodes `frame` as `layers` resolution layers, base first on the wire.
pub(crate) fn encode_layers(
    encoder: &Encoder,
    frame: &Frame,
    symbols: Option<&mut DcDictionary>,
) -> Result<Vec<u8>> {
    let params = encoder.params();
    let layers = params.variant.layers as usize;
    check_dims(frame.width(), frame.height(), params.variant.layers)?;
    let budgets = layer_budgets(params.target_bits, layers);

    let mut enhancements = Vec::with_capacity(layers - 1);
    let mut current = frame.clone();
    for budget in &budgets[..layers - 1] {
        let (container, low) = encode_enhancement(&current, *budget)?;
        enhancements.push(container.to_bytes()?);
        current = low;
    }
    let base = encoder
        .encode_container(&current, budgets[layers - 1], symbols)?
        .to_bytes()?;

    let mut wire = Vec::with_capacity(layers);
    wire.push(base);
    wire.extend(enhancements.into_iter().rev());
    let bytes = frame_layers(&wire)?;
    info!(
        "encoded {}x{} frame in {} layers: {} bytes, base {}x{}",
        frame.width(),
        frame.height(),
        layers,
        bytes.len(),
        current.width(),
        current.height()
    );
    Ok(bytes)
}

/// Decodes the base plus up to `max_layers - 1` enhancement layers.
///
/// `max_layers = 1` returns the base preview; anything at or above the
/// number of layers present returns the finest resolution available. The
/// stream may be a prefix holding fewer layers than the variant codes, as
/// long as the base is there.
pub fn decode_layers(bytes: &[u8], params: &DecoderParams, max_layers: u8) -> Result<Frame> {
    decode_prefix(bytes, params, max_layers, None)
}

/// [`decode_layers`] for streams whose base was coded against `dictionary`.
pub fn decode_layers_with_dictionary(
    bytes: &[u8],
    params: &DecoderParams,
    max_layers: u8,
    dictionary: &DcDictionary,
) -> Result<Frame> {
    decode_prefix(bytes, params, max_layers, Some(dictionary))
}

pub(crate) fn decode_prefix(
    bytes: &[u8],
    params: &DecoderParams,
    max_layers: u8,
    symbols: Option<&DcDictionary>,
) -> Result<Frame> {
    params.variant.validate()?;
    if max_layers == 0 {
        return Err(CodecError::InvalidArg("at least the base layer must be decoded".into()));
    }
    let layers = split_layers(bytes)?;
    if layers.len() > params.variant.layers as usize {
        return Err(CodecError::corrupt(format!(
            "stream holds {} layers, the variant codes at most {}",
            layers.len(),
            params.variant.layers
        )));
    }

    let decoder = Decoder::new(*params);
    let mut frame = decoder.decode_container(&Container::from_bytes(layers[0])?, symbols)?;
    let wanted = (max_layers as usize).min(layers.len());
    for layer in &layers[1..wanted] {
        frame = decode_enhancement(&frame, &Container::from_bytes(layer)?)?;
    }
    info!(
        "decoded {} of {} layers: {}x{}",
        wanted,
        layers.len(),
        frame.width(),
        frame.height()
    );
    Ok(frame)
}
