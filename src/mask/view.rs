use super::traits::MaskView;

/// Byte mask threshold: values at or above it are foreground.
pub const U8_FOREGROUND_THRESHOLD: u8 = 128;
/// Probability mask threshold: values strictly above it are foreground.
pub const F32_FOREGROUND_THRESHOLD: f32 = 0.5;

/// Borrowed 8-bit mask, e.g. a thresholded segmentation output.
#[derive(Clone, Debug)]
pub struct MaskU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> MaskU8<'a> {
    /// Contiguous view; `None` when `data` is too short for `w × h`.
    pub fn new(w: usize, h: usize, data: &'a [u8]) -> Option<Self> {
        (data.len() >= w * h).then_some(Self {
            w,
            h,
            stride: w,
            data,
        })
    }
}

impl<'a> MaskView for MaskU8<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[u8]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
    #[inline]
    fn is_foreground(pixel: u8) -> bool {
        pixel >= U8_FOREGROUND_THRESHOLD
    }
}

/// Owned per-pixel probability mask (stride == width), as produced by
/// segmentation heads before thresholding.
#[derive(Clone, Debug)]
pub struct MaskF32 {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f32>,
}

impl MaskF32 {
    /// Zero-initialized mask of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.w + x] = v;
    }
}

impl MaskView for MaskF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.w
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[f32]> {
        Some(&self.data[..self.w * self.h])
    }
    #[inline]
    fn is_foreground(pixel: f32) -> bool {
        pixel > F32_FOREGROUND_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_mask_counts_at_threshold() {
        let data = [0u8, 127, 128, 255, 10, 200];
        let mask = MaskU8::new(3, 2, &data).unwrap();
        assert_eq!(mask.foreground_count(), 3);
        assert!(MaskU8::new(4, 2, &data).is_none());
    }

    #[test]
    fn strided_byte_mask_ignores_padding() {
        let data = [255u8, 255, 0, 0, 255, 255];
        let mask = MaskU8 {
            w: 1,
            h: 2,
            stride: 3,
            data: &data,
        };
        assert_eq!(mask.foreground_count(), 1);
    }

    #[test]
    fn probability_mask_is_strictly_above_half() {
        let mut mask = MaskF32::new(2, 2);
        mask.set(0, 0, 0.5);
        mask.set(1, 0, 0.51);
        mask.set(1, 1, 1.0);
        assert_eq!(mask.foreground_count(), 2);
        assert_eq!(mask.get(1, 1), 1.0);
    }
}
