// src/encode/scan.rs

//! Coefficient reordering tables.
//!
//! Transform output is serialized in an order that puts the likely-large
//! coefficients first and the long zero tails last. Two families exist: the
//! classic zigzag over a `rows × cols` plane, and subband order for wavelet
//! blocks (deepest LL, then detail bands from coarse to fine).

use crate::utils::error::{CodecError, Result};

/// Shape of a coefficient plane, signaled in every block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneShape {
    /// `size × size`.
    Square,
    /// `size × (size - 1)`: the per-row DC column travels in its own stream.
    Truncated,
}

impl PlaneShape {
    const TRUNCATED_FLAG: u8 = 0x80;

    /// `(rows, cols)` of the plane for a block of width `size`.
    pub fn dims(self, size: usize) -> (usize, usize) {
        match self {
            PlaneShape::Square => (size, size),
            PlaneShape::Truncated => (size, size - 1),
        }
    }

    /// Packs the shape and a 7-bit scale into one header byte.
    pub fn pack_header(self, scale: u8) -> u8 {
        debug_assert!(scale < Self::TRUNCATED_FLAG);
        match self {
            PlaneShape::Square => scale,
            PlaneShape::Truncated => scale | Self::TRUNCATED_FLAG,
        }
    }

    pub fn unpack_header(byte: u8) -> (PlaneShape, u8) {
        let shape = if byte & Self::TRUNCATED_FLAG != 0 {
            PlaneShape::Truncated
        } else {
            PlaneShape::Square
        };
        (shape, byte & !Self::TRUNCATED_FLAG)
    }
}

/// Row-major indices of a `rows × cols` plane in zigzag order.
pub fn zigzag_order(rows: usize, cols: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(rows * cols);
    if rows == 0 || cols == 0 {
        return order;
    }
    for diag in 0..rows + cols - 1 {
        let r_min = diag.saturating_sub(cols - 1);
        let r_max = diag.min(rows - 1);
        if diag % 2 == 0 {
            for r in (r_min..=r_max).rev() {
                order.push(r * cols + (diag - r));
            }
        } else {
            for r in r_min..=r_max {
                order.push(r * cols + (diag - r));
            }
        }
    }
    order
}

fn push_band(order: &mut Vec<usize>, stride: usize, x0: usize, y0: usize, w: usize, h: usize) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            order.push(y * stride + x);
        }
    }
}

/// Row-major indices of a `size × size` wavelet block, band by band.
pub fn subband_order(size: usize, levels: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(size * size);
    let deepest = size >> levels;
    push_band(&mut order, size, 0, 0, deepest, deepest);
    for level in (1..=levels).rev() {
        let band = size >> level;
        push_band(&mut order, size, band, 0, band, band); // HL
        push_band(&mut order, size, 0, band, band, band); // LH
        push_band(&mut order, size, band, band, band, band); // HH
    }
    order
}

/// Number of leading entries of [`subband_order`] that belong to the deepest LL.
#[inline]
pub fn lowest_band_len(size: usize, levels: usize) -> usize {
    let deepest = size >> levels;
    deepest * deepest
}

/// Precomputed orders for every supported block size.
#[derive(Debug, Clone)]
pub struct ScanTables {
    entries: Vec<(usize, PlaneShape, Vec<usize>)>,
}

impl ScanTables {
    pub const BLOCK_SIZES: [usize; 3] = [8, 16, 32];

    /// Zigzag tables for both plane shapes.
    pub fn zigzag() -> Self {
        let mut entries = Vec::new();
        for size in Self::BLOCK_SIZES {
            for shape in [PlaneShape::Square, PlaneShape::Truncated] {
                let (rows, cols) = shape.dims(size);
                entries.push((size, shape, zigzag_order(rows, cols)));
            }
        }
        Self { entries }
    }

    /// Subband tables, square shape only.
    pub fn subbands(levels_for: fn(usize) -> usize) -> Self {
        let entries = Self::BLOCK_SIZES
            .iter()
            .map(|&size| (size, PlaneShape::Square, subband_order(size, levels_for(size))))
            .collect();
        Self { entries }
    }

    pub fn order(&self, size: usize, shape: PlaneShape) -> Result<&[usize]> {
        self.entries
            .iter()
            .find(|(s, sh, _)| *s == size && *sh == shape)
            .map(|(_, _, order)| order.as_slice())
            .ok_or_else(|| {
                CodecError::config(format!("no {:?} scan table for block size {}", shape, size))
            })
    }
}

/// Reads `data` in scan order.
pub fn gather<T: Copy>(data: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| data[i]).collect()
}

/// Writes scan-ordered `values` back to their row-major positions.
pub fn scatter<T: Copy>(values: &[T], order: &[usize], out: &mut [T]) {
    for (&v, &i) in values.iter().zip(order) {
        out[i] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(order: &[usize], n: usize) -> bool {
        let mut seen = vec![false; n];
        for &i in order {
            if i >= n || seen[i] {
                return false;
            }
            seen[i] = true;
        }
        order.len() == n
    }

    #[test]
    fn zigzag_4x4_matches_jpeg_walk() {
        assert_eq!(
            zigzag_order(4, 4),
            vec![0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15]
        );
    }

    #[test]
    fn zigzag_covers_truncated_planes() {
        for size in [8, 16, 32] {
            assert!(is_permutation(&zigzag_order(size, size - 1), size * (size - 1)));
            assert!(is_permutation(&zigzag_order(size, size), size * size));
        }
    }

    #[test]
    fn subband_order_starts_with_deepest_ll() {
        let order = subband_order(32, 2);
        assert!(is_permutation(&order, 32 * 32));
        assert_eq!(lowest_band_len(32, 2), 64);
        for &i in &order[..64] {
            assert!(i % 32 < 8 && i / 32 < 8);
        }
        // first HL2 entry
        assert_eq!(order[64], 8);

        let order8 = subband_order(8, 1);
        assert!(is_permutation(&order8, 64));
        assert_eq!(&order8[..4], &[0, 1, 2, 3]);
        assert_eq!(order8[4], 8);
    }

    #[test]
    fn header_byte_carries_shape() {
        let byte = PlaneShape::Truncated.pack_header(5);
        assert_eq!(byte, 0x85);
        assert_eq!(PlaneShape::unpack_header(byte), (PlaneShape::Truncated, 5));
        assert_eq!(PlaneShape::unpack_header(3), (PlaneShape::Square, 3));
    }

    #[test]
    fn tables_reject_unknown_sizes() {
        let tables = ScanTables::zigzag();
        assert_eq!(tables.order(8, PlaneShape::Truncated).unwrap().len(), 56);
        assert!(tables.order(12, PlaneShape::Square).is_err());
    }

    #[test]
    fn gather_scatter_invert() {
        let data: Vec<i16> = (0..56).collect();
        let order = zigzag_order(8, 7);
        let scanned = gather(&data, &order);
        let mut back = vec![0i16; 56];
        scatter(&scanned, &order, &mut back);
        assert_eq!(back, data);
    }
}
