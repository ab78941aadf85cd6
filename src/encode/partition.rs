// src/encode/partition.rs

//! Macroblock partition layouts and the similarity test that picks one.
//!
//! Luma is scanned in 32×32 macroblocks and chroma in 16×16 ones. Each
//! macroblock is split into square blocks by one of a fixed set of layouts,
//! and the layout's tag is transmitted so the decoder never re-derives it.

use crate::image::frame::Channel;
use crate::image::plane::Plane;
use crate::utils::error::{CodecError, Result};

/// Spread below which the 16-wide head/tail samples count as flat.
pub const FLAT_SPREAD: u8 = 48;
/// Tighter spread once the neighbouring 8 rows are included.
pub const NEIGHBOR_SPREAD: u8 = 24;
/// Spread over a grid spanning the whole luma macroblock.
pub const WHOLE_SPREAD: u8 = 12;

/// One square block inside a macroblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubBlock {
    pub dx: usize,
    pub dy: usize,
    pub size: usize,
}

const fn sb(dx: usize, dy: usize, size: usize) -> SubBlock {
    SubBlock { dx, dy, size }
}

const UNIFORM_8: [SubBlock; 16] = [
    sb(0, 0, 8), sb(8, 0, 8), sb(16, 0, 8), sb(24, 0, 8),
    sb(0, 8, 8), sb(8, 8, 8), sb(16, 8, 8), sb(24, 8, 8),
    sb(0, 16, 8), sb(8, 16, 8), sb(16, 16, 8), sb(24, 16, 8),
    sb(0, 24, 8), sb(8, 24, 8), sb(16, 24, 8), sb(24, 24, 8),
];

const MIXED_16_AND_8: [SubBlock; 10] = [
    sb(0, 0, 16),
    sb(16, 0, 8), sb(24, 0, 8), sb(16, 8, 8), sb(24, 8, 8),
    sb(0, 16, 8), sb(8, 16, 8), sb(0, 24, 8), sb(8, 24, 8),
    sb(16, 16, 16),
];

const QUAD_16: [SubBlock; 4] = [sb(0, 0, 16), sb(16, 0, 16), sb(0, 16, 16), sb(16, 16, 16)];

const UNIFORM_32: [SubBlock; 1] = [sb(0, 0, 32)];

const UNIFORM_16: [SubBlock; 1] = [sb(0, 0, 16)];

const QUAD_8: [SubBlock; 4] = [sb(0, 0, 8), sb(8, 0, 8), sb(0, 8, 8), sb(8, 8, 8)];

/// Partition layouts. The discriminants are the wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Partition {
    Uniform8 = 1,
    Mixed16And8 = 2,
    Quad16 = 3,
    Uniform32 = 4,
    Uniform16 = 5,
    Quad8 = 6,
}

impl Partition {
    pub const LUMA: [Partition; 4] = [
        Partition::Uniform8,
        Partition::Mixed16And8,
        Partition::Quad16,
        Partition::Uniform32,
    ];
    pub const CHROMA: [Partition; 2] = [Partition::Uniform16, Partition::Quad8];

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Resolves a transmitted tag, refusing tags that do not belong to the plane.
    pub fn from_tag(tag: u8, channel: Channel) -> Result<Self> {
        let candidates: &[Partition] = if channel.is_chroma() {
            &Self::CHROMA
        } else {
            &Self::LUMA
        };
        candidates
            .iter()
            .copied()
            .find(|p| p.tag() == tag)
            .ok_or_else(|| {
                CodecError::corrupt(format!("unknown partition tag {} for {:?}", tag, channel))
            })
    }

    pub fn blocks(self) -> &'static [SubBlock] {
        match self {
            Partition::Uniform8 => &UNIFORM_8,
            Partition::Mixed16And8 => &MIXED_16_AND_8,
            Partition::Quad16 => &QUAD_16,
            Partition::Uniform32 => &UNIFORM_32,
            Partition::Uniform16 => &UNIFORM_16,
            Partition::Quad8 => &QUAD_8,
        }
    }

    pub fn macroblock_size(self) -> usize {
        match self {
            Partition::Uniform16 | Partition::Quad8 => 16,
            _ => 32,
        }
    }

    /// Picks the layout for the macroblock at `(x, y)` from original samples.
    pub fn decide(plane: &Plane<u8>, x: usize, y: usize, channel: Channel) -> Self {
        let probe = Probe { plane, x: x as isize, y: y as isize };
        if channel.is_chroma() {
            return if probe.flat() {
                Partition::Uniform16
            } else {
                Partition::Quad8
            };
        }
        if !probe.flat() {
            Partition::Uniform8
        } else if !probe.flat_with_neighbor() {
            Partition::Mixed16And8
        } else if !probe.flat_whole() {
            Partition::Quad16
        } else {
            Partition::Uniform32
        }
    }
}

struct Probe<'a> {
    plane: &'a Plane<u8>,
    x: isize,
    y: isize,
}

impl Probe<'_> {
    fn head_tail(&self, row: isize, n: isize) -> [u8; 2] {
        [
            self.plane.get_reflected(self.x, self.y + row),
            self.plane.get_reflected(self.x + n, self.y + row),
        ]
    }

    fn flat(&self) -> bool {
        let [h0, t0] = self.head_tail(0, 16);
        let [h1, t1] = self.head_tail(15, 16);
        spread(&[h0, t0, h1, t1]) < FLAT_SPREAD
    }

    fn flat_with_neighbor(&self) -> bool {
        let [h0, t0] = self.head_tail(0, 16);
        let [h1, t1] = self.head_tail(15, 16);
        let [h2, t2] = self.head_tail(16 + 8 - 1, 16);
        spread(&[h0, t0, h1, t1, h2, t2]) < NEIGHBOR_SPREAD
    }

    fn flat_whole(&self) -> bool {
        let mut samples = [0u8; 9];
        for (i, dy) in [0isize, 16, 31].into_iter().enumerate() {
            for (j, dx) in [0isize, 16, 31].into_iter().enumerate() {
                samples[i * 3 + j] = self.plane.get_reflected(self.x + dx, self.y + dy);
            }
        }
        spread(&samples) < WHOLE_SPREAD
    }
}

fn spread(samples: &[u8]) -> u8 {
    let min = samples.iter().copied().min().unwrap_or(0);
    let max = samples.iter().copied().max().unwrap_or(0);
    max - min
}
