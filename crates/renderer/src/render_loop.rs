use std::time::Instant;

use frames::FrameExchange;

use crate::backend::GpuBackend;
use crate::shader::ShaderProgram;
use crate::shaders::{QUAD_POSITIONS, QUAD_TEX_COORDS};
use crate::stats::FpsCounter;
use crate::texture::TexturePipeline;

/// What a single [`RenderLoop::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub drew: bool,
    pub uploaded: bool,
}

/// Per-refresh draw of the edge map as a full-screen quad.
#[derive(Debug)]
pub struct RenderLoop {
    clear_color: [f32; 4],
    viewport: (u32, u32),
    fps: FpsCounter,
}

impl RenderLoop {
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self {
            clear_color,
            viewport: (0, 0),
            fps: FpsCounter::new(),
        }
    }

    /// Clears, then draws if both the program and the texture are ready.
    ///
    /// A missing program or texture is the normal state before the surface
    /// exists; the frame is still cleared and presented.
    pub fn tick<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        program: &ShaderProgram,
        textures: &mut TexturePipeline,
        exchange: &FrameExchange,
    ) -> TickOutcome {
        backend.begin_frame(self.clear_color);
        let outcome = draw(backend, program, textures, exchange);
        backend.end_frame();

        if let Some(fps) = self.fps.record(Instant::now()) {
            tracing::debug!(fps = fps.round(), "render loop rate");
        }
        outcome
    }

    /// Stores and applies new viewport dimensions.
    pub fn resize<B: GpuBackend>(&mut self, backend: &mut B, width: u32, height: u32) {
        self.viewport = (width, height);
        backend.viewport(width, height);
        tracing::debug!(width, height, "viewport resized");
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }
}

fn draw<B: GpuBackend>(
    backend: &mut B,
    program: &ShaderProgram,
    textures: &mut TexturePipeline,
    exchange: &FrameExchange,
) -> TickOutcome {
    let (Some(id), Some(locations)) = (program.program(), program.locations()) else {
        return TickOutcome::default();
    };
    let Some(texture) = textures.texture() else {
        return TickOutcome::default();
    };

    let uploaded = textures.upload_if_dirty(backend, exchange);

    backend.use_program(Some(id));
    backend.bind_texture(0, Some(texture));
    backend.vertex_attrib_array(locations.position, 2, &QUAD_POSITIONS);
    backend.vertex_attrib_array(locations.tex_coord, 2, &QUAD_TEX_COORDS);
    backend.uniform_sampler(locations.texture, 0);
    backend.draw_triangle_strip(0, 4);
    backend.disable_vertex_attrib_array(locations.position);
    backend.disable_vertex_attrib_array(locations.tex_coord);
    backend.bind_texture(0, None);

    TickOutcome {
        drew: true,
        uploaded,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use frames::{FrameProcessor, RawFrame};

    use super::*;
    use crate::shaders::{LUMA_FRAGMENT_GLSL, QUAD_VERTEX_GLSL};
    use crate::testing::{Call, RecordingBackend};

    const CLEAR: [f32; 4] = [0.1, 0.2, 0.3, 1.0];

    struct Fixture {
        backend: RecordingBackend,
        program: ShaderProgram,
        textures: TexturePipeline,
        exchange: Arc<FrameExchange>,
        render_loop: RenderLoop,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: RecordingBackend::new(),
                program: ShaderProgram::new(),
                textures: TexturePipeline::new(),
                exchange: Arc::new(FrameExchange::new()),
                render_loop: RenderLoop::new(CLEAR),
            }
        }

        fn ready() -> Self {
            let mut fixture = Self::new();
            fixture
                .program
                .compile_and_link(&mut fixture.backend, QUAD_VERTEX_GLSL, LUMA_FRAGMENT_GLSL)
                .unwrap();
            fixture.textures.initialize(&mut fixture.backend).unwrap();
            fixture
        }

        fn tick(&mut self) -> TickOutcome {
            self.render_loop.tick(
                &mut self.backend,
                &self.program,
                &mut self.textures,
                &self.exchange,
            )
        }
    }

    #[test]
    fn tick_before_surface_clears_without_drawing() {
        let mut fixture = Fixture::new();
        let journal = fixture.backend.journal();

        assert_eq!(fixture.tick(), TickOutcome::default());

        let journal = journal.borrow();
        assert_eq!(journal.calls, vec![Call::BeginFrame(CLEAR), Call::EndFrame]);
    }

    #[test]
    fn failed_program_skips_the_draw() {
        let mut fixture = Fixture::new();
        let journal = fixture.backend.journal();
        let _ = fixture
            .program
            .compile_and_link(&mut fixture.backend, QUAD_VERTEX_GLSL, "broken");
        fixture.textures.initialize(&mut fixture.backend).unwrap();

        assert!(!fixture.tick().drew);
        assert_eq!(journal.borrow().draws(), 0);
    }

    #[test]
    fn ready_tick_draws_the_quad_in_order() {
        let mut fixture = Fixture::ready();
        let journal = fixture.backend.journal();
        journal.borrow_mut().calls.clear();
        let program = fixture.program.program().unwrap();
        let texture = fixture.textures.texture().unwrap();

        let outcome = fixture.tick();
        assert_eq!(
            outcome,
            TickOutcome {
                drew: true,
                uploaded: false,
            }
        );

        let journal = journal.borrow();
        assert_eq!(
            journal.calls,
            vec![
                Call::BeginFrame(CLEAR),
                Call::UseProgram(Some(program)),
                Call::BindTexture(0, Some(texture)),
                Call::VertexAttribArray {
                    location: 0,
                    components: 2,
                    data: QUAD_POSITIONS.to_vec(),
                },
                Call::VertexAttribArray {
                    location: 1,
                    components: 2,
                    data: QUAD_TEX_COORDS.to_vec(),
                },
                Call::UniformSampler(0, 0),
                Call::DrawTriangleStrip(0, 4),
                Call::DisableVertexAttribArray(0),
                Call::DisableVertexAttribArray(1),
                Call::BindTexture(0, None),
                Call::EndFrame,
            ]
        );
    }

    #[test]
    fn upload_happens_before_the_draw_and_only_once() {
        let mut fixture = Fixture::ready();
        let journal = fixture.backend.journal();
        let mut processor = FrameProcessor::new(Arc::clone(&fixture.exchange));
        let data = [0u8, 0, 255, 255].repeat(4);
        processor
            .process(&RawFrame::new(Some(&data), 4, 4, 4))
            .unwrap();

        assert!(fixture.tick().uploaded);
        assert!(!fixture.tick().uploaded);
        assert!(!fixture.tick().uploaded);

        let journal = journal.borrow();
        assert_eq!(journal.uploads().len(), 1);
        assert_eq!(journal.draws(), 3);
        let upload = journal
            .position(|c| matches!(c, Call::TextureImage { .. }))
            .unwrap();
        let draw = journal
            .position(|c| matches!(c, Call::DrawTriangleStrip(..)))
            .unwrap();
        assert!(upload < draw);
    }

    #[test]
    fn resize_only_touches_the_viewport() {
        let mut fixture = Fixture::ready();
        let journal = fixture.backend.journal();
        journal.borrow_mut().calls.clear();

        fixture.render_loop.resize(&mut fixture.backend, 800, 600);

        assert_eq!(fixture.render_loop.viewport(), (800, 600));
        assert_eq!(journal.borrow().calls, vec![Call::Viewport(800, 600)]);
    }
}
