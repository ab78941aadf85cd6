// src/encode/wavelet/lifting.rs

//! Reversible LeGall 5/3 wavelet via integer lifting.
//!
//! One 1D pass turns `n` samples into `[low(n/2) .., high(n/2) ..]`. The
//! predict and update terms are computed in `i32` and applied with wrapping
//! 16-bit arithmetic, which keeps forward and inverse exact mirrors of each
//! other for every input.

use crate::utils::error::{CodecError, Result};

#[inline]
fn predict_term(a: i16, b: i16) -> i16 {
    ((a as i32 + b as i32) >> 1) as i16
}

#[inline]
fn update_term(a: i16, b: i16) -> i16 {
    ((a as i32 + b as i32 + 2) >> 2) as i16
}

/// Forward 5/3 on an even-length slice, in place.
pub fn lift_53(data: &mut [i16]) {
    let n = data.len();
    debug_assert!(n % 2 == 0, "lifting needs an even length");
    let half = n / 2;
    if half == 0 {
        return;
    }
    let mut low: Vec<i16> = data.iter().step_by(2).copied().collect();
    let mut high: Vec<i16> = data.iter().skip(1).step_by(2).copied().collect();

    for i in 0..half {
        let right = if i + 1 < half { low[i + 1] } else { low[i] };
        high[i] = high[i].wrapping_sub(predict_term(low[i], right));
    }
    for i in 0..half {
        let left = if i > 0 { high[i - 1] } else { high[i] };
        low[i] = low[i].wrapping_add(update_term(left, high[i]));
    }

    data[..half].copy_from_slice(&low);
    data[half..].copy_from_slice(&high);
}

/// Inverse of [`lift_53`].
pub fn unlift_53(data: &mut [i16]) {
    let n = data.len();
    debug_assert!(n % 2 == 0, "lifting needs an even length");
    let half = n / 2;
    if half == 0 {
        return;
    }
    let mut low = data[..half].to_vec();
    let mut high = data[half..].to_vec();

    for i in 0..half {
        let left = if i > 0 { high[i - 1] } else { high[i] };
        low[i] = low[i].wrapping_sub(update_term(left, high[i]));
    }
    for i in 0..half {
        let right = if i + 1 < half { low[i + 1] } else { low[i] };
        high[i] = high[i].wrapping_add(predict_term(low[i], right));
    }

    for i in 0..half {
        data[2 * i] = low[i];
        data[2 * i + 1] = high[i];
    }
}

/// Applies `f` to every row of a `width × height` region at the start of a
/// buffer with row stride `stride`.
fn for_each_row(data: &mut [i16], width: usize, height: usize, stride: usize, f: fn(&mut [i16])) {
    for y in 0..height {
        let start = y * stride;
        f(&mut data[start..start + width]);
    }
}

fn for_each_column(
    data: &mut [i16],
    width: usize,
    height: usize,
    stride: usize,
    f: fn(&mut [i16]),
) {
    let mut column = vec![0i16; height];
    for x in 0..width {
        for y in 0..height {
            column[y] = data[y * stride + x];
        }
        f(&mut column);
        for y in 0..height {
            data[y * stride + x] = column[y];
        }
    }
}

/// One 2D level over the top-left `width × height` region: rows, then columns.
pub fn forward_2d(data: &mut [i16], width: usize, height: usize, stride: usize) {
    for_each_row(data, width, height, stride, lift_53);
    for_each_column(data, width, height, stride, lift_53);
}

/// Mirror of [`forward_2d`]: columns, then rows.
pub fn inverse_2d(data: &mut [i16], width: usize, height: usize, stride: usize) {
    for_each_column(data, width, height, stride, unlift_53);
    for_each_row(data, width, height, stride, unlift_53);
}

/// Decomposition depth used for a square block.
#[inline]
pub fn block_levels(size: usize) -> usize {
    if size >= 16 { 2 } else { 1 }
}

/// Forward transform of a square block, recursing once into LL when the
/// block is at least 16 wide.
pub fn forward_block(data: &mut [i16], size: usize) {
    debug_assert_eq!(data.len(), size * size);
    forward_2d(data, size, size, size);
    if block_levels(size) == 2 {
        let half = size / 2;
        forward_2d(data, half, half, size);
    }
}

pub fn inverse_block(data: &mut [i16], size: usize) {
    debug_assert_eq!(data.len(), size * size);
    if block_levels(size) == 2 {
        let half = size / 2;
        inverse_2d(data, half, half, size);
    }
    inverse_2d(data, size, size, size);
}

fn check_plane(data: &[i16], width: usize, height: usize) -> Result<()> {
    if width % 2 != 0 || height % 2 != 0 {
        return Err(CodecError::config(format!(
            "plane transform needs even dimensions, got {}x{}",
            width, height
        )));
    }
    if data.len() != width * height {
        return Err(CodecError::InvalidArg(format!(
            "plane buffer holds {} samples, expected {}",
            data.len(),
            width * height
        )));
    }
    Ok(())
}

/// One level over a whole plane. LL lands in the top-left quadrant.
pub fn forward_plane(data: &mut [i16], width: usize, height: usize) -> Result<()> {
    check_plane(data, width, height)?;
    forward_2d(data, width, height, width);
    Ok(())
}

pub fn inverse_plane(data: &mut [i16], width: usize, height: usize) -> Result<()> {
    check_plane(data, width, height)?;
    inverse_2d(data, width, height, width);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn constant_signal_has_no_detail() {
        let mut data = [72i16; 8];
        lift_53(&mut data);
        assert_eq!(data, [72, 72, 72, 72, 0, 0, 0, 0]);
    }

    #[test]
    fn ramp_matches_hand_computation() {
        let mut data = [0i16, 2, 4, 6];
        lift_53(&mut data);
        // high: 2-(0+4)/2 = 0, 6-(4+4)/2 = 2
        // low:  0+(0+0+2)>>2 = 0, 4+(0+2+2)>>2 = 5
        assert_eq!(data, [0, 5, 0, 2]);
        unlift_53(&mut data);
        assert_eq!(data, [0, 2, 4, 6]);
    }

    #[test]
    fn one_dimensional_round_trip() {
        let mut rng = StdRng::seed_from_u64(53);
        for n in [2usize, 4, 8, 16, 32, 64] {
            for _ in 0..50 {
                let original: Vec<i16> = (0..n).map(|_| rng.r#gen::<i16>()).collect();
                let mut data = original.clone();
                lift_53(&mut data);
                unlift_53(&mut data);
                assert_eq!(data, original);
            }
        }
    }

    #[test]
    fn block_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in [8usize, 16, 32] {
            let original: Vec<i16> = (0..size * size).map(|_| rng.gen_range(-255..=255)).collect();
            let mut data = original.clone();
            forward_block(&mut data, size);
            assert_ne!(data, original);
            inverse_block(&mut data, size);
            assert_eq!(data, original);
        }
    }

    #[test]
    fn flat_block_concentrates_in_deepest_ll() {
        let size = 32;
        let mut data = vec![-40i16; size * size];
        forward_block(&mut data, size);
        for y in 0..size {
            for x in 0..size {
                let expected = if x < 8 && y < 8 { -40 } else { 0 };
                assert_eq!(data[y * size + x], expected, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn plane_round_trip() {
        let mut rng = StdRng::seed_from_u64(99);
        let (w, h) = (48, 20);
        let original: Vec<i16> = (0..w * h).map(|_| rng.gen_range(0..256)).collect();
        let mut data = original.clone();
        forward_plane(&mut data, w, h).unwrap();
        inverse_plane(&mut data, w, h).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn odd_plane_is_rejected() {
        let mut data = vec![0i16; 15];
        assert!(matches!(
            forward_plane(&mut data, 5, 3),
            Err(CodecError::InvalidConfig(_))
        ));
    }
}
