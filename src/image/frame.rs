// src/image/frame.rs

//! A 4:2:0 image: full-resolution luma plus two half-resolution chroma planes.

use super::plane::{Plane, clamp_u8};
use crate::utils::error::{CodecError, Result};

/// Which plane a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Luma,
    Cb,
    Cr,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Luma, Channel::Cb, Channel::Cr];

    #[inline]
    pub fn is_chroma(self) -> bool {
        self != Channel::Luma
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Luma => 0,
            Channel::Cb => 1,
            Channel::Cr => 2,
        }
    }

    /// Side of the scanning unit on this plane.
    #[inline]
    pub fn macroblock_size(self) -> usize {
        if self.is_chroma() { 16 } else { 32 }
    }
}

/// Chroma plane dimensions for a luma plane of `width × height`.
#[inline]
pub fn chroma_dims(width: usize, height: usize) -> (usize, usize) {
    (width.div_ceil(2), height.div_ceil(2))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<T = u8> {
    planes: [Plane<T>; 3],
}

impl Frame<u8> {
    /// A mid-grey frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, [128, 128, 128])
    }

    pub fn filled(width: usize, height: usize, value: [u8; 3]) -> Self {
        let (cw, ch) = chroma_dims(width, height);
        Self {
            planes: [
                Plane::filled(width, height, value[0]),
                Plane::filled(cw, ch, value[1]),
                Plane::filled(cw, ch, value[2]),
            ],
        }
    }

    pub fn to_samples(&self) -> Frame<i16> {
        Frame {
            planes: self.planes.clone().map(|p| p.map(|v| v as i16)),
        }
    }
}

impl Frame<i16> {
    pub fn zeroed(width: usize, height: usize) -> Self {
        let (cw, ch) = chroma_dims(width, height);
        Self {
            planes: [Plane::new(width, height), Plane::new(cw, ch), Plane::new(cw, ch)],
        }
    }

    /// Clamps every sample into the 8-bit pixel range.
    pub fn to_pixels(&self) -> Frame<u8> {
        Frame {
            planes: self.planes.clone().map(|p| p.map(|v| clamp_u8(v as i32))),
        }
    }
}

impl<T: Copy + Default> Frame<T> {
    /// Assembles a frame, checking that chroma is 4:2:0 relative to luma.
    pub fn from_planes(y: Plane<T>, cb: Plane<T>, cr: Plane<T>) -> Result<Self> {
        let expected = chroma_dims(y.width(), y.height());
        for (name, p) in [("Cb", &cb), ("Cr", &cr)] {
            if (p.width(), p.height()) != expected {
                return Err(CodecError::InvalidArg(format!(
                    "{} plane is {}x{}, expected {}x{} for a {}x{} luma plane",
                    name,
                    p.width(),
                    p.height(),
                    expected.0,
                    expected.1,
                    y.width(),
                    y.height()
                )));
            }
        }
        Ok(Self {
            planes: [y, cb, cr],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.planes[0].width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.planes[0].height()
    }

    #[inline]
    pub fn plane(&self, channel: Channel) -> &Plane<T> {
        &self.planes[channel.index()]
    }

    #[inline]
    pub fn plane_mut(&mut self, channel: Channel) -> &mut Plane<T> {
        &mut self.planes[channel.index()]
    }

    pub fn into_planes(self) -> [Plane<T>; 3] {
        self.planes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_dimensions_round_chroma_up() {
        let frame = Frame::new(33, 17);
        assert_eq!(frame.plane(Channel::Cb).width(), 17);
        assert_eq!(frame.plane(Channel::Cr).height(), 9);
    }

    #[test]
    fn mismatched_chroma_is_rejected() {
        let y = Plane::<u8>::new(16, 16);
        let cb = Plane::<u8>::new(8, 8);
        let cr = Plane::<u8>::new(16, 16);
        assert!(Frame::from_planes(y, cb, cr).is_err());
    }

    #[test]
    fn sample_conversion_clamps() {
        let mut samples = Frame::zeroed(4, 4);
        samples.plane_mut(Channel::Luma).set(0, 0, 300);
        samples.plane_mut(Channel::Luma).set(1, 0, -20);
        let pixels = samples.to_pixels();
        assert_eq!(pixels.plane(Channel::Luma).get(0, 0), 255);
        assert_eq!(pixels.plane(Channel::Luma).get(1, 0), 0);
        assert_eq!(pixels.to_samples().plane(Channel::Luma).get(0, 0), 255);
    }

    #[test]
    fn macroblock_sizes() {
        assert_eq!(Channel::Luma.macroblock_size(), 32);
        assert_eq!(Channel::Cr.macroblock_size(), 16);
    }
}
