use crate::utils::error::{CodecError, Result};

/// Maps a possibly out-of-range coordinate back into `0..len`.
///
/// Coordinates past either edge are mirrored about that edge, and whatever
/// is still outside after one reflection is clamped.
#[inline]
pub fn reflect_clamp(p: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    let len = len as isize;
    let reflected = if p < 0 {
        -p - 1
    } else if p >= len {
        len - 1 - (p - len)
    } else {
        p
    };
    reflected.clamp(0, len - 1) as usize
}

/// A rectangular, row-major buffer of samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Plane<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(CodecError::InvalidArg(format!(
                "plane {}x{} needs {} samples, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.offset(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.offset(x, y);
        self.data[idx] = value;
    }

    /// Reads with reflect-then-clamp boundary handling.
    #[inline]
    pub fn get_reflected(&self, x: isize, y: isize) -> T {
        self.get(reflect_clamp(x, self.width), reflect_clamp(y, self.height))
    }

    pub fn map<U: Copy + Default>(&self, f: impl Fn(T) -> U) -> Plane<U> {
        Plane {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Copies out a `w × h` window at `(x0, y0)`. The window must lie inside.
    pub fn crop(&self, x0: usize, y0: usize, w: usize, h: usize) -> Plane<T> {
        debug_assert!(x0 + w <= self.width && y0 + h <= self.height);
        let mut out = Vec::with_capacity(w * h);
        for y in y0..y0 + h {
            let start = self.offset(x0, y);
            out.extend_from_slice(&self.data[start..start + w]);
        }
        Plane {
            width: w,
            height: h,
            data: out,
        }
    }

    /// Writes `src` with its top-left corner at `(x0, y0)`.
    pub fn paste(&mut self, x0: usize, y0: usize, src: &Plane<T>) {
        debug_assert!(x0 + src.width <= self.width && y0 + src.height <= self.height);
        for y in 0..src.height {
            let dst = self.offset(x0, y0 + y);
            let from = y * src.width;
            self.data[dst..dst + src.width].copy_from_slice(&src.data[from..from + src.width]);
        }
    }
}

#[inline]
pub fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflection_then_clamp() {
        assert_eq!(reflect_clamp(3, 10), 3);
        assert_eq!(reflect_clamp(10, 10), 9);
        assert_eq!(reflect_clamp(12, 10), 7);
        assert_eq!(reflect_clamp(-1, 10), 0);
        assert_eq!(reflect_clamp(-3, 10), 2);
        // past a full reflection the coordinate is clamped
        assert_eq!(reflect_clamp(25, 10), 0);
        assert_eq!(reflect_clamp(-30, 10), 9);
        assert_eq!(reflect_clamp(5, 1), 0);
    }

    #[test]
    fn reflected_reads_stay_in_bounds() {
        let plane = Plane::from_vec(3, 2, vec![1u8, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(plane.get_reflected(3, 0), 3);
        assert_eq!(plane.get_reflected(4, 1), 5);
        assert_eq!(plane.get_reflected(0, 2), 4);
        assert_eq!(plane.get_reflected(-1, -1), 1);
    }

    #[test]
    fn crop_and_paste() {
        let data: Vec<i16> = (0..16).collect();
        let plane = Plane::from_vec(4, 4, data).unwrap();
        let corner = plane.crop(2, 2, 2, 2);
        assert_eq!(corner.data(), &[10, 11, 14, 15]);

        let mut target = Plane::<i16>::new(4, 4);
        target.paste(0, 0, &corner);
        assert_eq!(target.get(1, 1), 15);
        assert_eq!(target.get(2, 2), 0);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(Plane::from_vec(2, 2, vec![0u8; 3]).is_err());
    }
}
