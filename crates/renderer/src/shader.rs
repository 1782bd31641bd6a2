use crate::backend::{GpuBackend, ProgramId, ShaderId, ShaderStage};
use crate::error::{GpuObject, RenderError};
use crate::shaders::{POSITION_ATTRIBUTE, TEXTURE_UNIFORM, TEX_COORD_ATTRIBUTE};

/// Upper bound on diagnostic text kept from the driver.
pub const INFO_LOG_LIMIT: usize = 512;

/// Progress of [`ShaderProgram::compile_and_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgramState {
    #[default]
    Uncompiled,
    VertexCompiled,
    FragmentCompiled,
    Linked,
    Failed,
}

/// Locations resolved once after a successful link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLocations {
    pub position: u32,
    pub tex_coord: u32,
    pub texture: u32,
}

/// Two-stage textured-quad program.
///
/// Owns at most one program object. Intermediate shader objects never outlive
/// a call to [`ShaderProgram::compile_and_link`], whatever its outcome.
#[derive(Debug, Default)]
pub struct ShaderProgram {
    state: ProgramState,
    program: Option<ProgramId>,
    locations: Option<ProgramLocations>,
}

impl ShaderProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    /// The program object, present only once linked.
    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn locations(&self) -> Option<ProgramLocations> {
        self.locations
    }

    /// Driver-style handle; `0` means "not ready".
    pub fn raw_handle(&self) -> u32 {
        self.program.map_or(0, ProgramId::get)
    }

    pub fn is_ready(&self) -> bool {
        self.state == ProgramState::Linked && self.program.is_some()
    }

    pub fn compile_and_link<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, RenderError> {
        self.release(backend);

        let result = self.build(backend, vertex_source, fragment_source);
        match &result {
            Ok(program) => {
                tracing::debug!(program = program.get(), "shader program linked");
            }
            Err(err) => {
                self.state = ProgramState::Failed;
                tracing::error!(error = %err, "shader program unavailable");
            }
        }
        result
    }

    fn build<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, RenderError> {
        let vertex = compile_stage(backend, ShaderStage::Vertex, vertex_source)?;
        self.state = ProgramState::VertexCompiled;

        let fragment = match compile_stage(backend, ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(err) => {
                backend.delete_shader(vertex);
                return Err(err);
            }
        };
        self.state = ProgramState::FragmentCompiled;

        let Some(program) = backend.create_program() else {
            backend.delete_shader(vertex);
            backend.delete_shader(fragment);
            return Err(RenderError::ObjectCreationFailed(GpuObject::Program));
        };

        backend.attach_shader(program, vertex);
        backend.attach_shader(program, fragment);
        backend.link_program(program);
        let linked = backend.program_link_status(program);

        // Shader objects are dead weight once the program is linked (or failed to).
        for shader in [vertex, fragment] {
            backend.detach_shader(program, shader);
            backend.delete_shader(shader);
        }

        if !linked {
            let log = bounded_log(backend.program_info_log(program));
            backend.delete_program(program);
            return Err(RenderError::LinkFailed { log });
        }

        let locations = match resolve_locations(backend, program) {
            Ok(locations) => locations,
            Err(err) => {
                backend.delete_program(program);
                return Err(err);
            }
        };

        self.program = Some(program);
        self.locations = Some(locations);
        self.state = ProgramState::Linked;
        Ok(program)
    }

    /// Deletes the program object, if any, and returns to `Uncompiled`.
    pub fn release<B: GpuBackend>(&mut self, backend: &mut B) {
        if let Some(program) = self.program.take() {
            backend.delete_program(program);
            tracing::debug!(program = program.get(), "shader program released");
        }
        self.locations = None;
        self.state = ProgramState::Uncompiled;
    }
}

fn compile_stage<B: GpuBackend>(
    backend: &mut B,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderId, RenderError> {
    let shader = backend
        .create_shader(stage)
        .ok_or(RenderError::ObjectCreationFailed(GpuObject::Shader(stage)))?;
    backend.shader_source(shader, source);
    backend.compile_shader(shader);
    if backend.shader_compile_status(shader) {
        return Ok(shader);
    }

    let log = bounded_log(backend.shader_info_log(shader));
    backend.delete_shader(shader);
    Err(RenderError::CompileFailed { stage, log })
}

fn resolve_locations<B: GpuBackend>(
    backend: &B,
    program: ProgramId,
) -> Result<ProgramLocations, RenderError> {
    let attribute = |name: &'static str| {
        backend
            .attrib_location(program, name)
            .ok_or(RenderError::MissingBinding {
                kind: "attribute",
                name,
            })
    };
    let position = attribute(POSITION_ATTRIBUTE)?;
    let tex_coord = attribute(TEX_COORD_ATTRIBUTE)?;
    let texture = backend
        .uniform_location(program, TEXTURE_UNIFORM)
        .ok_or(RenderError::MissingBinding {
            kind: "uniform",
            name: TEXTURE_UNIFORM,
        })?;
    Ok(ProgramLocations {
        position,
        tex_coord,
        texture,
    })
}

fn bounded_log(mut log: String) -> String {
    if log.len() > INFO_LOG_LIMIT {
        let mut end = INFO_LOG_LIMIT;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}
