use std::sync::Arc;

use frames::{ExchangeStats, FrameExchange, FrameProcessor, RawFrame};

use crate::backend::GpuBackend;
use crate::error::RenderError;
use crate::render_loop::{RenderLoop, TickOutcome};
use crate::shader::ShaderProgram;
use crate::shaders::{LUMA_FRAGMENT_GLSL, QUAD_VERTEX_GLSL};
use crate::texture::TexturePipeline;
use crate::types::ViewerConfig;

/// Render-context half of the viewer.
///
/// Owns the graphics backend and every GPU object created through it. The
/// host drives it from the thread that owns the surface; frames arrive
/// through the paired [`FrameSink`].
pub struct EdgeViewer<B: GpuBackend> {
    backend: Option<B>,
    program: ShaderProgram,
    textures: TexturePipeline,
    render_loop: RenderLoop,
    exchange: Arc<FrameExchange>,
    last_tick: TickOutcome,
}

/// Producer half of the viewer: ingest, edge detection and publish.
///
/// Exactly one sink exists per viewer. It can be moved to whatever thread
/// delivers frames.
#[derive(Debug)]
pub struct FrameSink {
    processor: FrameProcessor,
}

impl<B: GpuBackend> EdgeViewer<B> {
    pub fn create(backend: B, config: ViewerConfig) -> (Self, FrameSink) {
        let exchange = Arc::new(FrameExchange::new());
        let viewer = Self {
            backend: Some(backend),
            program: ShaderProgram::new(),
            textures: TexturePipeline::new(),
            render_loop: RenderLoop::new(config.clear_color),
            exchange: Arc::clone(&exchange),
            last_tick: TickOutcome::default(),
        };
        let sink = FrameSink {
            processor: FrameProcessor::new(exchange),
        };
        tracing::debug!("edge viewer created");
        (viewer, sink)
    }

    /// Builds the shader program and the frame texture for a new surface.
    ///
    /// Objects from a previous surface are released first. On failure
    /// everything created so far is released again and drawing stays
    /// disabled until the next successful call.
    pub fn on_surface_created(&mut self) -> Result<(), RenderError> {
        let backend = self.backend.as_mut().ok_or(RenderError::Destroyed)?;
        self.textures.release(backend);
        self.program.release(backend);

        let result = self
            .program
            .compile_and_link(backend, QUAD_VERTEX_GLSL, LUMA_FRAGMENT_GLSL)
            .and_then(|_| self.textures.initialize(backend).map(|_| ()));

        match &result {
            Ok(()) => tracing::debug!(
                program = self.program.raw_handle(),
                texture = self.textures.raw_handle(),
                "surface resources ready"
            ),
            Err(err) => {
                self.textures.release(backend);
                self.program.release(backend);
                tracing::warn!(error = %err, "surface initialisation failed; drawing disabled");
            }
        }
        result
    }

    pub fn on_surface_resized(&mut self, width: u32, height: u32) {
        if let Some(backend) = self.backend.as_mut() {
            self.render_loop.resize(backend, width, height);
        }
    }

    /// Runs one render tick and returns the current frames-per-second estimate.
    pub fn on_draw_frame(&mut self) -> f32 {
        let Some(backend) = self.backend.as_mut() else {
            return 0.0;
        };
        self.last_tick =
            self.render_loop
                .tick(backend, &self.program, &mut self.textures, &self.exchange);
        self.render_loop.fps()
    }

    /// Releases the texture, then the program, then the backend itself.
    ///
    /// Calling it again is a no-op.
    pub fn destroy(&mut self) {
        let Some(mut backend) = self.backend.take() else {
            return;
        };
        self.textures.release(&mut backend);
        self.program.release(&mut backend);
        drop(backend);
        self.exchange.close();
        tracing::debug!("edge viewer destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.backend.is_none()
    }

    pub fn is_ready(&self) -> bool {
        self.program.is_ready() && self.textures.texture().is_some()
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn textures(&self) -> &TexturePipeline {
        &self.textures
    }

    pub fn last_tick(&self) -> TickOutcome {
        self.last_tick
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.render_loop.viewport()
    }

    pub fn exchange_stats(&self) -> ExchangeStats {
        self.exchange.stats()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }
}

impl<B: GpuBackend> Drop for EdgeViewer<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl FrameSink {
    /// Delivers one luminance frame. Returns whether a new edge map was
    /// published.
    ///
    /// `buffer` is only read for the duration of the call. A missing buffer
    /// or invalid geometry is logged and ignored.
    pub fn on_frame_available(
        &mut self,
        width: usize,
        height: usize,
        buffer: Option<&[u8]>,
        stride: usize,
    ) -> bool {
        self.submit(&RawFrame::new(buffer, width, height, stride))
    }

    /// [`FrameSink::on_frame_available`] for a buffer handed over as a raw
    /// pointer. A null pointer is treated as a missing buffer.
    ///
    /// # Safety
    ///
    /// See [`RawFrame::from_raw_parts`].
    pub unsafe fn on_raw_frame_available(
        &mut self,
        ptr: *const u8,
        width: usize,
        height: usize,
        stride: usize,
    ) -> bool {
        let raw = RawFrame::from_raw_parts(ptr, width, height, stride);
        self.submit(&raw)
    }

    pub fn submit(&mut self, raw: &RawFrame<'_>) -> bool {
        if !self.is_connected() {
            tracing::trace!("viewer destroyed; frame ignored");
            return false;
        }
        match self.processor.process(raw) {
            Ok(published) => published,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    width = raw.width(),
                    height = raw.height(),
                    stride = raw.stride(),
                    "frame rejected"
                );
                false
            }
        }
    }

    /// False once the viewer has been destroyed.
    pub fn is_connected(&self) -> bool {
        !self.processor.exchange().is_closed()
    }

    pub fn frames_published(&self) -> u64 {
        self.processor.sequence()
    }
}
