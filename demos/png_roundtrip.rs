//! Encodes an image file, writes the stream next to it and decodes it back.
//!
//! ```text
//! RUST_LOG=debug cargo run --example png_roundtrip -- input.png [target_bpp] [layers]
//! ```
//!
//! Without an input path a synthetic 256×192 test card is used.

use image::{ImageReader, RgbImage};
use scalable_codec::{
    Channel, CodecVariant, DecoderParams, EncoderParams, Frame, Plane, RateMode, TransformKind, decode, encode,
};
use std::error::Error;
use std::path::PathBuf;

/// Full-range BT.601 with 4:2:0 chroma averaged over each 2×2 cell.
fn frame_from_rgb(img: &RgbImage) -> Result<Frame, Box<dyn Error>> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let pixels: &[[u8; 3]] = bytemuck::cast_slice(img.as_raw());

    let mut y = Plane::new(w, h);
    let mut cb_full = vec![0f32; w * h];
    let mut cr_full = vec![0f32; w * h];
    for (i, &[r, g, b]) in pixels.iter().enumerate() {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        y.data_mut()[i] = luma.round().clamp(0.0, 255.0) as u8;
        cb_full[i] = 128.0 + (b - luma) * 0.564;
        cr_full[i] = 128.0 + (r - luma) * 0.713;
    }

    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
    let mut cb = Plane::new(cw, ch);
    let mut cr = Plane::new(cw, ch);
    for cy in 0..ch {
        for cx in 0..cw {
            let (mut sb, mut sr, mut n) = (0f32, 0f32, 0f32);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let (x, yy) = (cx * 2 + dx, cy * 2 + dy);
                if x < w && yy < h {
                    sb += cb_full[yy * w + x];
                    sr += cr_full[yy * w + x];
                    n += 1.0;
                }
            }
            cb.set(cx, cy, (sb / n).round().clamp(0.0, 255.0) as u8);
            cr.set(cx, cy, (sr / n).round().clamp(0.0, 255.0) as u8);
        }
    }
    Ok(Frame::from_planes(y, cb, cr)?)
}

fn rgb_from_frame(frame: &Frame) -> RgbImage {
    let (w, h) = (frame.width(), frame.height());
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let luma = frame.plane(Channel::Luma).get(x, y) as f32;
        let cb = frame.plane(Channel::Cb).get(x / 2, y / 2) as f32 - 128.0;
        let cr = frame.plane(Channel::Cr).get(x / 2, y / 2) as f32 - 128.0;
        let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        image::Rgb([
            to_u8(luma + 1.402 * cr),
            to_u8(luma - 0.344 * cb - 0.714 * cr),
            to_u8(luma + 1.772 * cb),
        ])
    })
}

fn test_card() -> RgbImage {
    RgbImage::from_fn(256, 192, |x, y| {
        let band = (x / 32) as u8;
        image::Rgb([band.wrapping_mul(36), (y + x / 2) as u8, if (x / 16 + y / 16) % 2 == 0 { 40 } else { 210 }])
    })
}

fn psnr(a: &Plane<u8>, b: &Plane<u8>) -> f64 {
    let mse = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(&x, &y)| (x as f64 - y as f64).powi(2))
        .sum::<f64>()
        / a.data().len() as f64;
    if mse == 0.0 { f64::INFINITY } else { 10.0 * (255.0 * 255.0 / mse).log10() }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args.next().map(PathBuf::from);
    let bpp: f64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1.5);
    let layers: u8 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);

    let (img, stem) = match &input {
        Some(path) => (
            ImageReader::open(path)?.decode()?.to_rgb8(),
            path.with_extension(""),
        ),
        None => (test_card(), PathBuf::from("test_card")),
    };
    let frame = frame_from_rgb(&img)?;
    let samples = (frame.width() * frame.height()) as f64 * 1.5;

    let variant = CodecVariant::layered(TransformKind::Lifting, layers);
    let params = EncoderParams {
        variant,
        target_bits: (samples * bpp / 1.5) as u64,
        rate_mode: RateMode::Shared,
    };
    let bytes = encode(&frame, params)?;
    let stream_path = stem.with_extension("scb");
    std::fs::write(&stream_path, &bytes)?;
    println!(
        "{}x{} -> {} bytes ({:.3} bpp) written to {}",
        frame.width(),
        frame.height(),
        bytes.len(),
        bytes.len() as f64 * 8.0 / (frame.width() * frame.height()) as f64,
        stream_path.display()
    );

    let back = decode(&bytes, DecoderParams { variant, deblock: true })?;
    for channel in Channel::ALL {
        println!(
            "{:?} PSNR {:.2} dB",
            channel,
            psnr(frame.plane(channel), back.plane(channel))
        );
    }

    let out_path = PathBuf::from(format!("{}_decoded.png", stem.display()));
    rgb_from_frame(&back).save(&out_path)?;
    println!("reconstruction written to {}", out_path.display());
    Ok(())
}
