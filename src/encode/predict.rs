// src/encode/predict.rs

//! DC prediction from already-reconstructed neighbours.
//!
//! The encoder and decoder each own a [`Predictor`] whose buffer holds exactly
//! what the decoder reconstructs. The encoder commits the local decode of
//! every block before moving on, so both sides predict from identical samples.

use crate::image::plane::{Plane, clamp_u8};

/// Prediction used when a block has no reconstructed neighbour.
pub const NEUTRAL_PREDICTION: i16 = 128;

#[derive(Debug, Clone)]
pub struct Predictor {
    recon: Plane<u8>,
}

impl Predictor {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            recon: Plane::new(width, height),
        }
    }

    /// Mean of the row above and the column to the left of the block,
    /// limited to samples inside the plane.
    pub fn predict_dc(&self, x: usize, y: usize, size: usize) -> i16 {
        let (w, h) = (self.recon.width(), self.recon.height());
        let mut sum = 0u32;
        let mut count = 0u32;
        if y > 0 && y <= h {
            for i in x..(x + size).min(w) {
                sum += self.recon.get(i, y - 1) as u32;
                count += 1;
            }
        }
        if x > 0 && x <= w {
            for j in y..(y + size).min(h) {
                sum += self.recon.get(x - 1, j) as u32;
                count += 1;
            }
        }
        if count == 0 {
            NEUTRAL_PREDICTION
        } else {
            (sum / count) as i16
        }
    }

    /// Stores `residual + prediction` for the in-plane part of the block.
    pub fn commit(&mut self, x: usize, y: usize, size: usize, residual: &[i16], prediction: i16) {
        debug_assert_eq!(residual.len(), size * size);
        let (w, h) = (self.recon.width(), self.recon.height());
        for dy in 0..size.min(h.saturating_sub(y)) {
            for dx in 0..size.min(w.saturating_sub(x)) {
                let v = residual[dy * size + dx] as i32 + prediction as i32;
                self.recon.set(x + dx, y + dy, clamp_u8(v));
            }
        }
    }

    pub fn reconstruction(&self) -> &Plane<u8> {
        &self.recon
    }

    pub fn into_plane(self) -> Plane<u8> {
        self.recon
    }
}

/// Original samples of the block minus the prediction. Samples past the plane
/// edge are read with reflect-then-clamp.
pub fn residual_block(source: &Plane<u8>, x: usize, y: usize, size: usize, prediction: i16) -> Vec<i16> {
    let mut out = Vec::with_capacity(size * size);
    for dy in 0..size {
        for dx in 0..size {
            let v = source.get_reflected((x + dx) as isize, (y + dy) as isize);
            out.push(v as i16 - prediction);
        }
    }
    out
}

#[inline]
fn soften(taps: [u8; 5]) -> (u8, u8) {
    let t = taps.map(|v| v as i32);
    let avg = t.iter().sum::<i32>() / 5;
    (
        clamp_u8((t[2] * 2 + avg) / 3),
        clamp_u8((t[3] * 2 + avg) / 3),
    )
}

/// Smooths the two samples either side of every `grid`-spaced block edge.
///
/// A decoder-side post-filter. It must never run on a predictor buffer.
pub fn deblock(plane: &mut Plane<u8>, grid: usize) {
    let (w, h) = (plane.width(), plane.height());
    if grid < 4 {
        return;
    }
    for y in 0..h {
        let mut e = grid;
        while e + 1 < w {
            let taps = [
                plane.get(e - 3, y),
                plane.get(e - 2, y),
                plane.get(e - 1, y),
                plane.get(e, y),
                plane.get(e + 1, y),
            ];
            let (a, b) = soften(taps);
            plane.set(e - 1, y, a);
            plane.set(e, y, b);
            e += grid;
        }
    }
    for x in 0..w {
        let mut e = grid;
        while e + 1 < h {
            let taps = [
                plane.get(x, e - 3),
                plane.get(x, e - 2),
                plane.get(x, e - 1),
                plane.get(x, e),
                plane.get(x, e + 1),
            ];
            let (a, b) = soften(taps);
            plane.set(x, e - 1, a);
            plane.set(x, e, b);
            e += grid;
        }
    }
}
