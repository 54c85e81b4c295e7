use voxport_quad::UvBounds;

/// Row-major ARGB pixels (`0xAARRGGBB`) read back from a texture.
///
/// The pixel count always equals `width * height`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    argb: Vec<u32>,
}

impl PixelImage {
    /// `None` when the pixel count does not match the dimensions.
    pub fn new(width: u32, height: u32, argb: Vec<u32>) -> Option<Self> {
        (argb.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            argb,
        })
    }

    pub fn filled(width: u32, height: u32, argb: u32) -> Self {
        Self {
            width,
            height,
            argb: vec![argb; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// `None` outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.argb.get(self.index(x, y)?).copied()
    }

    /// Writes inside the image are applied; the rest are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        if let Some(p) = self.index(x, y).and_then(|i| self.argb.get_mut(i)) {
            *p = argb;
        }
    }

    /// Mean alpha (0..=255) over the pixels covered by `region`, scaled by `tint_alpha / 255`.
    ///
    /// `None` when the region covers no pixel.
    pub fn average_alpha(&self, region: &UvBounds, tint_alpha: u8) -> Option<f32> {
        let r = region.clamped();
        let (w, h) = (self.width as f32, self.height as f32);
        let x0 = (r.u_min * w).floor() as u32;
        let x1 = ((r.u_max * w).ceil() as u32).min(self.width);
        let y0 = (r.v_min * h).floor() as u32;
        let y1 = ((r.v_max * h).ceil() as u32).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        let mut sum = 0u64;
        for y in y0..y1 {
            for x in x0..x1 {
                sum += u64::from(self.pixel(x, y)? >> 24);
            }
        }
        let count = u64::from(x1 - x0) * u64::from(y1 - y0);
        Some(sum as f32 / count as f32 * (f32::from(tint_alpha) / 255.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_count_must_match_dimensions() {
        assert!(PixelImage::new(64, 64, vec![0xFF00_0000; 16]).is_none());
        let img = PixelImage::new(2, 2, vec![0xFF00_0000; 4]).unwrap();
        assert_eq!(img.pixel(1, 1), Some(0xFF00_0000));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.average_alpha(&UvBounds::UNIT, 255), Some(255.0));
    }

    #[test]
    fn writes_outside_are_ignored() {
        let mut img = PixelImage::filled(2, 2, 0);
        img.set_pixel(5, 0, 0xFFFF_FFFF);
        img.set_pixel(1, 0, 0xFFFF_FFFF);
        assert_eq!(img.pixel(1, 0), Some(0xFFFF_FFFF));
        assert_eq!(img.average_alpha(&UvBounds::UNIT, 255), Some(63.75));
    }
}
