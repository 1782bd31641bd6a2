use crate::error::IngestError;
use crate::raw::RawFrame;

/// Owned, packed single-channel pixel store tagged with its dimensions.
///
/// Storage is replaced only when a request arrives with dimensions that
/// differ from the current tag; same-size requests reuse the allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
    allocations: u64,
}

impl ImageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Number of times backing storage has been (re)allocated.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    /// Makes the store match `width`x`height`, returning `true` when a fresh
    /// allocation was required.
    pub fn ensure_dimensions(&mut self, width: usize, height: usize) -> bool {
        if self.width == width && self.height == height && !self.data.is_empty() {
            return false;
        }

        // Release first so the old and new stores never coexist.
        self.data = Vec::new();
        self.data = vec![0; width * height];
        self.width = width;
        self.height = height;
        self.allocations += 1;
        tracing::debug!(width, height, "allocated image buffer");
        true
    }

    /// Iterates packed rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.width.max(1))
    }
}

/// Producer-side input stage: copies each incoming frame into packed storage.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    image: ImageBuffer,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `raw` row by row into the owned store.
    ///
    /// Rejected frames leave the stored image and its dimension tag untouched.
    pub fn ingest(&mut self, raw: &RawFrame<'_>) -> Result<(), IngestError> {
        raw.validate()?;

        self.image.ensure_dimensions(raw.width(), raw.height());
        let width = raw.width();
        for (dst, src) in self
            .image
            .as_mut_slice()
            .chunks_exact_mut(width)
            .zip(raw.rows())
        {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }
}

/// Binary edge map produced by the detector; one byte per pixel, 0 or 255.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedFrame {
    image: ImageBuffer,
    sequence: u64,
}

impl ProcessedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.image.as_slice()
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    /// Monotonic index of the ingest that produced this content.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn image_mut(&mut self) -> &mut ImageBuffer {
        &mut self.image
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_dimensions_reuse_storage() {
        let mut buffer = FrameBuffer::new();
        let data = vec![7u8; 16];
        for _ in 0..5 {
            buffer
                .ingest(&RawFrame::new(Some(&data), 4, 4, 4))
                .unwrap();
        }
        assert_eq!(buffer.image().allocation_count(), 1);
    }

    #[test]
    fn dimension_change_reallocates_once_per_change() {
        let mut buffer = FrameBuffer::new();
        let small = vec![1u8; 4];
        let large = vec![2u8; 9];
        let sequence = [
            (&small, 2, 2),
            (&small, 2, 2),
            (&large, 3, 3),
            (&large, 3, 3),
            (&small, 2, 2),
        ];
        for (data, width, height) in sequence {
            buffer
                .ingest(&RawFrame::new(Some(data), width, height, width))
                .unwrap();
        }
        assert_eq!(buffer.image().allocation_count(), 3);
        assert_eq!(buffer.image().dimensions(), (2, 2));
    }

    #[test]
    fn padded_rows_are_packed() {
        let mut buffer = FrameBuffer::new();
        let data = [10u8, 20, 30, 0, 0, 40, 50, 60];
        buffer
            .ingest(&RawFrame::new(Some(&data), 3, 2, 5))
            .unwrap();
        assert_eq!(buffer.image().as_slice(), &[10, 20, 30, 40, 50, 60]);
        assert_eq!(buffer.image().rows().nth(1), Some(&[40u8, 50, 60][..]));
    }

    #[test]
    fn rejected_frame_keeps_previous_content() {
        let mut buffer = FrameBuffer::new();
        let data = vec![5u8; 4];
        buffer
            .ingest(&RawFrame::new(Some(&data), 2, 2, 2))
            .unwrap();
        let before = buffer.image().clone();

        let err = buffer.ingest(&RawFrame::new(None, 8, 8, 8)).unwrap_err();
        assert_eq!(err, IngestError::NullBuffer);
        assert_eq!(buffer.image(), &before);
    }
}
