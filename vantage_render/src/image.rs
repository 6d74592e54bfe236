// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Screenshot images.

/// An RGBA8 image, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Image {
    /// Wraps `pixels`, which must hold exactly `width * height` entries.
    ///
    /// Returns `None` on a length mismatch.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).ok()?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel at `(x, y)`, origin top-left.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// All pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// The raw bytes, four per pixel.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_must_match_dimensions() {
        assert!(Image::new(2, 2, vec![[0; 4]; 3]).is_none());
        assert!(Image::new(2, 2, vec![[0; 4]; 4]).is_some());
    }

    #[test]
    fn pixel_addressing_and_bytes() {
        let mut pixels = vec![[0, 0, 0, 255]; 6];
        pixels[4] = [9, 8, 7, 6];
        let img = Image::new(3, 2, pixels).unwrap();
        assert_eq!(img.pixel(1, 1), Some([9, 8, 7, 6]));
        assert_eq!(img.pixel(3, 0), None);
        assert_eq!(img.as_bytes().len(), 24);
        assert_eq!(&img.as_bytes()[16..20], &[9, 8, 7, 6]);
    }
}
