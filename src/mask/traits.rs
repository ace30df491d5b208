/// Read-only, row-addressable view of a single-channel segmentation mask.
pub trait MaskView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn stride(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Pixel];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { mask: self, y: 0 }
    }

    fn as_slice(&self) -> Option<&[Self::Pixel]> {
        None
    }

    /// Whether a pixel belongs to the detected object.
    fn is_foreground(pixel: Self::Pixel) -> bool;

    /// Number of foreground pixels.
    fn foreground_count(&self) -> usize
    where
        Self: Sized,
    {
        match self.as_slice() {
            Some(data) => data.iter().filter(|p| Self::is_foreground(**p)).count(),
            None => self
                .rows()
                .map(|row| row.iter().filter(|p| Self::is_foreground(**p)).count())
                .sum(),
        }
    }
}

pub struct Rows<'a, M: ?Sized + MaskView> {
    mask: &'a M,
    y: usize,
}

impl<'a, M: MaskView> Iterator for Rows<'a, M> {
    type Item = &'a [M::Pixel];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.mask.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.mask.row(y))
    }
}
