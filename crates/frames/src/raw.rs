use crate::error::IngestError;

/// Borrowed view over an externally owned luminance plane.
///
/// The view only lives for the duration of a single ingest call; anything the
/// pipeline wants to keep is copied into owned storage. `data` is `None` when
/// the producer handed over a null buffer.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    data: Option<&'a [u8]>,
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> RawFrame<'a> {
    pub fn new(data: Option<&'a [u8]>, width: usize, height: usize, stride: usize) -> Self {
        Self {
            data,
            width,
            height,
            stride,
        }
    }

    /// Builds a view over foreign memory, mapping a null pointer to the
    /// rejected "no buffer" case.
    ///
    /// # Safety
    ///
    /// When `ptr` is non-null it must point to at least
    /// `stride * (height - 1) + width` readable bytes that stay valid and
    /// unmodified for `'a`. Zero dimensions produce an empty view and never
    /// dereference `ptr`.
    pub unsafe fn from_raw_parts(
        ptr: *const u8,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Self {
        let data = if ptr.is_null() {
            None
        } else {
            let len = required_len(width, height, stride);
            Some(std::slice::from_raw_parts(ptr, len))
        };
        Self::new(data, width, height, stride)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Checks the frame contract and returns the backing bytes when it holds.
    pub fn validate(&self) -> Result<&'a [u8], IngestError> {
        let data = self.data.ok_or(IngestError::NullBuffer)?;
        if self.width == 0 || self.height == 0 {
            return Err(IngestError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        if self.stride < self.width {
            return Err(IngestError::StrideTooSmall {
                stride: self.stride,
                width: self.width,
            });
        }
        let needed = required_len(self.width, self.height, self.stride);
        if data.len() < needed {
            return Err(IngestError::BufferTooShort {
                needed,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Iterates the visible part of each row, skipping stride padding.
    ///
    /// Callers must have validated the frame first; an invalid frame yields
    /// no rows.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        let data = self.validate().unwrap_or_default();
        let width = self.width;
        let rows = if data.is_empty() { 0 } else { self.height };
        (0..rows).map(move |row| {
            let start = row * self.stride;
            &data[start..start + width]
        })
    }
}

/// The last row does not need to carry its padding.
fn required_len(width: usize, height: usize, stride: usize) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    stride.saturating_mul(height - 1).saturating_add(width)
}
