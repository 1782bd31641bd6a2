//! In-memory [`GpuBackend`] that records every call.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::backend::{GpuBackend, ProgramId, SamplerParams, ShaderId, ShaderStage, TextureId};
use crate::gpu::reflect::{self, Resource, VertexInput};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateShader(ShaderStage, ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    DetachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateTexture(TextureId),
    BindTexture(u32, Option<TextureId>),
    TextureParameters(TextureId, SamplerParams),
    TextureImage {
        texture: TextureId,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    DeleteTexture(TextureId),
    Viewport(u32, u32),
    BeginFrame([f32; 4]),
    UseProgram(Option<ProgramId>),
    VertexAttribArray {
        location: u32,
        components: u32,
        data: Vec<f32>,
    },
    DisableVertexAttribArray(u32),
    UniformSampler(u32, u32),
    DrawTriangleStrip(u32, u32),
    EndFrame,
}

/// Observable side of a [`RecordingBackend`]; survives the backend itself.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub calls: Vec<Call>,
    pub live_shaders: BTreeSet<u32>,
    pub live_programs: BTreeSet<u32>,
    pub live_textures: BTreeSet<u32>,
    pub dropped: bool,
}

impl Journal {
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn draws(&self) -> usize {
        self.count(|call| matches!(call, Call::DrawTriangleStrip(..)))
    }

    pub fn uploads(&self) -> Vec<(u32, u32, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::TextureImage {
                    width,
                    height,
                    pixels,
                    ..
                } => Some((*width, *height, pixels.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }

    pub fn is_clean(&self) -> bool {
        self.live_shaders.is_empty() && self.live_programs.is_empty() && self.live_textures.is_empty()
    }
}

/// Interface reflected from a linked program.
#[derive(Debug, Default)]
struct LinkedInterface {
    attributes: Vec<VertexInput>,
    resources: Vec<Resource>,
}

/// Shaders compile through the same `naga` front end as the wgpu backend,
/// so syntax and validation errors surface here too. Locations come from
/// the reflected interface.
#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    journal: Rc<RefCell<Journal>>,
    next_id: u32,
    stages: HashMap<ShaderId, ShaderStage>,
    sources: HashMap<ShaderId, String>,
    compiled: HashMap<ShaderId, Result<wgpu::naga::Module, String>>,
    attached: HashMap<ProgramId, Vec<ShaderId>>,
    linked: HashMap<ProgramId, Result<LinkedInterface, String>>,
    pub refuse_shaders: bool,
    pub refuse_programs: bool,
    pub refuse_textures: bool,
    pub fail_link: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Rc<RefCell<Journal>> {
        Rc::clone(&self.journal)
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&self, call: Call) {
        self.journal.borrow_mut().calls.push(call);
    }

    fn link_interface(&self, program: ProgramId) -> Result<LinkedInterface, String> {
        if self.fail_link {
            return Err("error: varying v_texCoord not written by vertex shader".to_owned());
        }
        let module = |stage: ShaderStage| {
            self.attached
                .get(&program)
                .into_iter()
                .flatten()
                .copied()
                .filter(|id| self.stages.get(id) == Some(&stage))
                .find_map(|id| self.compiled.get(&id).and_then(|result| result.as_ref().ok()))
                .ok_or_else(|| format!("error: no compiled {stage} shader attached"))
        };
        let vertex = module(ShaderStage::Vertex)?;
        let fragment = module(ShaderStage::Fragment)?;

        let mut resources = reflect::resources(vertex);
        resources.extend(reflect::resources(fragment));
        Ok(LinkedInterface {
            attributes: reflect::vertex_inputs(vertex)?,
            resources,
        })
    }
}

impl Drop for RecordingBackend {
    fn drop(&mut self) {
        self.journal.borrow_mut().dropped = true;
    }
}

impl GpuBackend for RecordingBackend {
    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        if self.refuse_shaders {
            return None;
        }
        let id = ShaderId::new(self.next())?;
        self.stages.insert(id, stage);
        self.journal.borrow_mut().live_shaders.insert(id.get());
        self.record(Call::CreateShader(stage, id));
        Some(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        self.sources.insert(shader, source.to_owned());
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        let result = match (self.stages.get(&shader), self.sources.get(&shader)) {
            (Some(&stage), Some(source)) => reflect::parse_glsl(stage, source),
            _ => Err(format!("shader {shader} has no source")),
        };
        self.compiled.insert(shader, result);
        self.record(Call::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        matches!(self.compiled.get(&shader), Some(Ok(_)))
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        match self.compiled.get(&shader) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.journal.borrow_mut().live_shaders.remove(&shader.get());
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        if self.refuse_programs {
            return None;
        }
        let id = ProgramId::new(self.next())?;
        self.journal.borrow_mut().live_programs.insert(id.get());
        self.record(Call::CreateProgram(id));
        Some(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.attached.entry(program).or_default().push(shader);
        self.record(Call::AttachShader(program, shader));
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(shaders) = self.attached.get_mut(&program) {
            shaders.retain(|&attached| attached != shader);
        }
        self.record(Call::DetachShader(program, shader));
    }

    fn link_program(&mut self, program: ProgramId) {
        let result = self.link_interface(program);
        self.linked.insert(program, result);
        self.record(Call::LinkProgram(program));
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        matches!(self.linked.get(&program), Some(Ok(_)))
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        match self.linked.get(&program) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.journal.borrow_mut().live_programs.remove(&program.get());
        self.record(Call::DeleteProgram(program));
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let Some(Ok(linked)) = self.linked.get(&program) else {
            return None;
        };
        linked
            .attributes
            .iter()
            .find(|input| input.name == name)
            .map(|input| input.location)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let Some(Ok(linked)) = self.linked.get(&program) else {
            return None;
        };
        linked
            .resources
            .iter()
            .find(|resource| resource.name == name)
            .map(|resource| resource.binding)
    }

    fn create_texture(&mut self) -> Option<TextureId> {
        if self.refuse_textures {
            return None;
        }
        let id = TextureId::new(self.next())?;
        self.journal.borrow_mut().live_textures.insert(id.get());
        self.record(Call::CreateTexture(id));
        Some(id)
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        self.record(Call::BindTexture(unit, texture));
    }

    fn texture_parameters(&mut self, texture: TextureId, params: SamplerParams) {
        self.record(Call::TextureParameters(texture, params));
    }

    fn texture_image_luma8(&mut self, texture: TextureId, width: u32, height: u32, pixels: &[u8]) {
        self.record(Call::TextureImage {
            texture,
            width,
            height,
            pixels: pixels.to_vec(),
        });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.journal.borrow_mut().live_textures.remove(&texture.get());
        self.record(Call::DeleteTexture(texture));
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.record(Call::Viewport(width, height));
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) {
        self.record(Call::BeginFrame(clear_color));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.record(Call::UseProgram(program));
    }

    fn vertex_attrib_array(&mut self, location: u32, components: u32, data: &[f32]) {
        self.record(Call::VertexAttribArray {
            location,
            components,
            data: data.to_vec(),
        });
    }

    fn disable_vertex_attrib_array(&mut self, location: u32) {
        self.record(Call::DisableVertexAttribArray(location));
    }

    fn uniform_sampler(&mut self, location: u32, unit: u32) {
        self.record(Call::UniformSampler(location, unit));
    }

    fn draw_triangle_strip(&mut self, first: u32, count: u32) {
        self.record(Call::DrawTriangleStrip(first, count));
    }

    fn end_frame(&mut self) {
        self.record(Call::EndFrame);
    }
}
