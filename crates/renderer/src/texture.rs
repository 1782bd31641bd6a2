use frames::FrameExchange;

use crate::backend::{GpuBackend, SamplerParams, TextureId};
use crate::error::{GpuObject, RenderError};

/// The single texture the edge map is streamed into.
#[derive(Debug, Default)]
pub struct TexturePipeline {
    texture: Option<TextureId>,
    dimensions: (u32, u32),
    uploads: u64,
}

impl TexturePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the texture with linear filtering and clamped borders and
    /// leaves unit 0 unbound.
    pub fn initialize<B: GpuBackend>(&mut self, backend: &mut B) -> Result<TextureId, RenderError> {
        self.release(backend);

        let texture = backend
            .create_texture()
            .ok_or(RenderError::ObjectCreationFailed(GpuObject::Texture))?;
        backend.bind_texture(0, Some(texture));
        backend.texture_parameters(texture, SamplerParams::LINEAR_CLAMP);
        backend.bind_texture(0, None);

        self.texture = Some(texture);
        tracing::debug!(texture = texture.get(), "frame texture created");
        Ok(texture)
    }

    /// Re-specifies the texture from the published frame, if there is one.
    ///
    /// Returns `false` without touching the GPU when nothing new was
    /// published since the last upload. The frame buffer goes back to the
    /// producer once its bytes are on the GPU.
    pub fn upload_if_dirty<B: GpuBackend>(&mut self, backend: &mut B, exchange: &FrameExchange) -> bool {
        let Some(texture) = self.texture else {
            return false;
        };
        let Some(frame) = exchange.take() else {
            return false;
        };

        let dimensions = (u32::try_from(frame.width()), u32::try_from(frame.height()));
        let uploaded = match dimensions {
            _ if frame.is_empty() => false,
            (Ok(width), Ok(height)) => {
                backend.bind_texture(0, Some(texture));
                backend.texture_image_luma8(texture, width, height, frame.as_slice());
                if self.dimensions != (width, height) {
                    tracing::debug!(width, height, "frame texture resized");
                }
                self.dimensions = (width, height);
                self.uploads += 1;
                tracing::trace!(sequence = frame.sequence(), width, height, "uploaded edge map");
                true
            }
            _ => {
                tracing::warn!(
                    width = frame.width(),
                    height = frame.height(),
                    "edge map too large for a texture; skipped"
                );
                false
            }
        };

        exchange.recycle(frame);
        uploaded
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Driver-style handle; `0` means "not ready".
    pub fn raw_handle(&self) -> u32 {
        self.texture.map_or(0, TextureId::get)
    }

    /// Dimensions of the last uploaded image; `(0, 0)` before the first upload.
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    pub fn release<B: GpuBackend>(&mut self, backend: &mut B) {
        if let Some(texture) = self.texture.take() {
            backend.delete_texture(texture);
            tracing::debug!(texture = texture.get(), "frame texture released");
        }
        self.dimensions = (0, 0);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use frames::{FrameProcessor, RawFrame};

    use super::*;
    use crate::testing::{Call, RecordingBackend};

    fn publish(processor: &mut FrameProcessor, width: usize, height: usize) {
        let data = vec![0u8; width * height];
        processor
            .process(&RawFrame::new(Some(&data), width, height, width))
            .unwrap();
    }

    #[test]
    fn initialize_sets_sampling_and_unbinds() {
        let mut backend = RecordingBackend::new();
        let journal = backend.journal();
        let mut pipeline = TexturePipeline::new();

        let texture = pipeline.initialize(&mut backend).unwrap();

        let journal = journal.borrow();
        assert_eq!(
            journal.calls,
            vec![
                Call::CreateTexture(texture),
                Call::BindTexture(0, Some(texture)),
                Call::TextureParameters(texture, SamplerParams::LINEAR_CLAMP),
                Call::BindTexture(0, None),
            ]
        );
        assert_eq!(pipeline.raw_handle(), texture.get());
    }

    #[test]
    fn refused_texture_leaves_the_pipeline_unready() {
        let mut backend = RecordingBackend::new();
        backend.refuse_textures = true;
        let mut pipeline = TexturePipeline::new();

        let err = pipeline.initialize(&mut backend).unwrap_err();
        assert_eq!(err, RenderError::ObjectCreationFailed(GpuObject::Texture));
        assert_eq!(pipeline.raw_handle(), 0);
    }

    #[test]
    fn uploads_once_per_publish() {
        let mut backend = RecordingBackend::new();
        let journal = backend.journal();
        let exchange = Arc::new(FrameExchange::new());
        let mut processor = FrameProcessor::new(Arc::clone(&exchange));
        let mut pipeline = TexturePipeline::new();
        pipeline.initialize(&mut backend).unwrap();

        assert!(!pipeline.upload_if_dirty(&mut backend, &exchange));

        publish(&mut processor, 4, 3);
        assert!(pipeline.upload_if_dirty(&mut backend, &exchange));
        assert!(!pipeline.upload_if_dirty(&mut backend, &exchange));
        assert!(!pipeline.upload_if_dirty(&mut backend, &exchange));

        publish(&mut processor, 6, 2);
        assert!(pipeline.upload_if_dirty(&mut backend, &exchange));

        let uploads = journal.borrow().uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!((uploads[0].0, uploads[0].1), (4, 3));
        assert_eq!((uploads[1].0, uploads[1].1), (6, 2));
        assert_eq!(uploads[1].2.len(), 12);
        assert_eq!(pipeline.dimensions(), (6, 2));
        assert_eq!(pipeline.upload_count(), 2);
    }

    #[test]
    fn frames_wait_until_the_texture_exists() {
        let mut backend = RecordingBackend::new();
        let exchange = Arc::new(FrameExchange::new());
        let mut processor = FrameProcessor::new(Arc::clone(&exchange));
        let mut pipeline = TexturePipeline::new();

        publish(&mut processor, 2, 2);
        assert!(!pipeline.upload_if_dirty(&mut backend, &exchange));
        assert!(exchange.is_dirty());

        pipeline.initialize(&mut backend).unwrap();
        assert!(pipeline.upload_if_dirty(&mut backend, &exchange));
    }

    #[test]
    fn release_deletes_the_texture_once() {
        let mut backend = RecordingBackend::new();
        let journal = backend.journal();
        let mut pipeline = TexturePipeline::new();
        pipeline.initialize(&mut backend).unwrap();

        pipeline.release(&mut backend);
        pipeline.release(&mut backend);

        let journal = journal.borrow();
        assert_eq!(journal.count(|c| matches!(c, Call::DeleteTexture(_))), 1);
        assert!(journal.is_clean());
    }
}
