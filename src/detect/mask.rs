//! Binary change mask and the stages that produce it.

use image::GrayImage;

/// Single-bit-per-pixel change mask, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[self.index(x, y)]
    }

    /// Signed lookup; anything outside the frame reads as unchanged.
    #[inline]
    pub fn get_signed(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.get(x as u32, y as u32)
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.bits[idx] = value;
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Mark every pixel of the rectangle `[x0, x1) x [y0, y1)`, clipped to the mask.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.set(x, y, true);
            }
        }
    }
}

/// Absolute per-pixel difference of two equally sized maps, thresholded.
///
/// A pixel is changed when the intensities differ by strictly more than `delta`.
pub fn threshold_difference(current: &GrayImage, reference: &GrayImage, delta: u8) -> BinaryMask {
    debug_assert_eq!(current.dimensions(), reference.dimensions());
    let (width, height) = current.dimensions();
    let bits = current
        .as_raw()
        .iter()
        .zip(reference.as_raw().iter())
        .map(|(a, b)| a.abs_diff(*b) > delta)
        .collect();
    BinaryMask {
        width,
        height,
        bits,
    }
}

/// Morphological dilation with a 3x3 square element, applied `iterations` times.
pub fn dilate(mask: &BinaryMask, iterations: u32) -> BinaryMask {
    let mut current = mask.clone();
    for _ in 0..iterations {
        current = dilate_once(&current);
    }
    current
}

fn dilate_once(mask: &BinaryMask) -> BinaryMask {
    let mut out = BinaryMask::new(mask.width, mask.height);
    for y in 0..mask.height as i64 {
        for x in 0..mask.width as i64 {
            let hit = (-1..=1)
                .any(|dy| (-1..=1).any(|dx| mask.get_signed(x + dx, y + dy)));
            if hit {
                out.set(x as u32, y as u32, true);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn threshold_is_strictly_greater_than_delta() {
        let reference = GrayImage::from_pixel(3, 1, Luma([100]));
        let mut current = reference.clone();
        current.put_pixel(0, 0, Luma([125])); // diff 25
        current.put_pixel(1, 0, Luma([126])); // diff 26
        current.put_pixel(2, 0, Luma([70])); // diff 30

        let mask = threshold_difference(&current, &reference, 25);
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(mask.get(2, 0));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn dilate_grows_single_pixel_by_one_per_iteration() {
        let mut mask = BinaryMask::new(9, 9);
        mask.set(4, 4, true);

        assert_eq!(dilate(&mask, 1).count(), 9);
        assert_eq!(dilate(&mask, 2).count(), 25);
        assert_eq!(dilate(&mask, 0), mask);
    }

    #[test]
    fn dilate_merges_nearby_specks() {
        let mut mask = BinaryMask::new(10, 3);
        mask.set(2, 1, true);
        mask.set(6, 1, true);

        let merged = dilate(&mask, 2);
        for x in 0..=8 {
            assert!(merged.get(x, 1), "column {x} should be covered");
        }
    }

    #[test]
    fn dilate_clips_at_borders() {
        let mut mask = BinaryMask::new(3, 3);
        mask.set(0, 0, true);
        assert_eq!(dilate(&mask, 1).count(), 4);
    }
}
