//! [`GpuBackend`] over `wgpu`.
//!
//! Shader objects hold GLSL that is validated by `naga` at compile time and
//! turned into `wgpu` modules; linking reflects the attribute and texture
//! interface and builds the render pipeline. A frame is one surface texture,
//! one command encoder and render passes that clear on first use.

mod context;
pub(crate) mod reflect;

use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::Result;
use wgpu::util::DeviceExt;

use crate::backend::{
    GpuBackend, ProgramId, SamplerParams, ShaderId, ShaderStage, TextureFilter, TextureId,
    TextureWrap,
};
use crate::types::BackendOptions;

use context::GpuContext;
use reflect::{Resource, ResourceKind, VertexInput};

const TEXTURE_UNITS: usize = 8;

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    module: Option<wgpu::ShaderModule>,
    interface: Option<wgpu::naga::Module>,
    log: String,
}

struct LinkedProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    attributes: Vec<VertexInput>,
    resources: Vec<Resource>,
    bind_group: BindGroupCache<wgpu::BindGroup>,
}

/// A bind group kept until the revisions of the objects it references change.
struct BindGroupCache<G> {
    entry: Option<(Vec<u64>, G)>,
}

impl<G> Default for BindGroupCache<G> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<G> BindGroupCache<G> {
    fn is_current(&self, key: &[u64]) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|(cached, _)| cached.as_slice() == key)
    }

    fn store(&mut self, key: Vec<u64>, group: G) {
        self.entry = Some((key, group));
    }

    fn group(&self) -> Option<&G> {
        self.entry.as_ref().map(|(_, group)| group)
    }
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: Option<LinkedProgram>,
    log: String,
}

struct TextureObject {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: (u32, u32),
    /// Changes whenever the view or sampler is replaced.
    revision: u64,
}

struct VertexStream {
    components: u32,
    data: Vec<f32>,
    buffer: wgpu::Buffer,
}

struct Frame {
    surface: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    clear_color: wgpu::Color,
    cleared: bool,
}

/// Production backend driving a window surface.
pub struct WgpuBackend {
    context: GpuContext,
    next_id: u32,
    next_revision: u64,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    textures: HashMap<TextureId, TextureObject>,
    units: [Option<TextureId>; TEXTURE_UNITS],
    current_program: Option<ProgramId>,
    streams: HashMap<u32, VertexStream>,
    sampler_units: HashMap<u32, u32>,
    viewport: Option<(u32, u32)>,
    frame: Option<Frame>,
}

impl WgpuBackend {
    /// Creates the device and configures `target` as the presentation surface.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        options: BackendOptions,
    ) -> Result<Self> {
        let context = GpuContext::new(target, width, height, &options)?;
        Ok(Self {
            context,
            next_id: 0,
            next_revision: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            units: [None; TEXTURE_UNITS],
            current_program: None,
            streams: HashMap::new(),
            sampler_units: HashMap::new(),
            viewport: None,
            frame: None,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.context.adapter_name
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.context.size()
    }

    /// Resizes the swapchain. Viewport state is left to the caller.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    fn bump_revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    fn with_error_scope<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(device);
        match pollster::block_on(device.pop_error_scope()) {
            None => Ok(value),
            Some(error) => Err(error.to_string()),
        }
    }

    fn link(&self, program: &ProgramObject) -> Result<LinkedProgram, String> {
        let stage = |wanted: ShaderStage| {
            program
                .attached
                .iter()
                .filter_map(|id| self.shaders.get(id))
                .find(|shader| shader.stage == wanted)
                .ok_or_else(|| format!("no {wanted} shader attached"))
        };
        let vertex = stage(ShaderStage::Vertex)?;
        let fragment = stage(ShaderStage::Fragment)?;
        let (Some(vertex_module), Some(vertex_interface)) = (&vertex.module, &vertex.interface)
        else {
            return Err("vertex shader is not compiled".to_owned());
        };
        let (Some(fragment_module), Some(fragment_interface)) =
            (&fragment.module, &fragment.interface)
        else {
            return Err("fragment shader is not compiled".to_owned());
        };

        let attributes = reflect::vertex_inputs(vertex_interface)?;
        let mut resources = reflect::resources(vertex_interface);
        for resource in reflect::resources(fragment_interface) {
            if !resources
                .iter()
                .any(|known| known.binding == resource.binding && known.group == resource.group)
            {
                resources.push(resource);
            }
        }
        if let Some(resource) = resources
            .iter()
            .find(|resource| resource.group != 0 || resource.kind == ResourceKind::Other)
        {
            return Err(format!(
                "`{}` (set {}, binding {}) is not a set 0 texture or sampler",
                resource.name, resource.group, resource.binding
            ));
        }

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = resources
            .iter()
            .map(|resource| wgpu::BindGroupLayoutEntry {
                binding: resource.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: match resource.kind {
                    ResourceKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                    _ => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                },
                count: None,
            })
            .collect();

        let attribute_layouts: Vec<[wgpu::VertexAttribute; 1]> = attributes
            .iter()
            .map(|input| {
                [wgpu::VertexAttribute {
                    format: input.format,
                    offset: 0,
                    shader_location: input.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
            .iter()
            .zip(&attribute_layouts)
            .map(|(input, attribute)| wgpu::VertexBufferLayout {
                array_stride: u64::from(reflect::components(input.format)) * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let surface_format = self.context.config.format;
        let (bind_group_layout, pipeline) = self.with_error_scope(|device| {
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("edge program bindings"),
                    entries: &layout_entries,
                });
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("edge program layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("edge program"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: vertex_module,
                    entry_point: Some("main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &buffers,
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: fragment_module,
                    entry_point: Some("main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
                cache: None,
            });
            (bind_group_layout, pipeline)
        })?;

        Ok(LinkedProgram {
            pipeline,
            bind_group_layout,
            attributes,
            resources,
            bind_group: BindGroupCache::default(),
        })
    }

    fn create_texture_object(&self, width: u32, height: u32, params: SamplerParams) -> TextureObject {
        let texture = self
            .context
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("edge map"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        TextureObject {
            texture,
            view,
            sampler: self.create_sampler(params),
            size: (width, height),
            revision: 0,
        }
    }

    fn create_sampler(&self, params: SamplerParams) -> wgpu::Sampler {
        let filter = |filter: TextureFilter| match filter {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        };
        let wrap = |wrap: TextureWrap| match wrap {
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
            TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        };
        self.context
            .device
            .create_sampler(&wgpu::SamplerDescriptor {
                label: Some("edge map sampler"),
                address_mode_u: wrap(params.wrap_s),
                address_mode_v: wrap(params.wrap_t),
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter(params.mag_filter),
                min_filter: filter(params.min_filter),
                ..Default::default()
            })
    }

    fn write_luma8(&self, object: &TextureObject, pixels: &[u8]) {
        let (width, height) = object.size;
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &object.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn texture_for(&self, binding: u32) -> Option<&TextureObject> {
        let unit = self.sampler_units.get(&binding).copied().unwrap_or(0) as usize;
        self.units
            .get(unit)
            .copied()
            .flatten()
            .and_then(|id| self.textures.get(&id))
    }

    /// Separate samplers take their state from the first sampled texture.
    fn primary_texture(&self, linked: &LinkedProgram) -> Option<&TextureObject> {
        linked
            .resources
            .iter()
            .filter(|resource| resource.kind == ResourceKind::Texture)
            .map(|resource| resource.binding)
            .min()
            .and_then(|binding| self.texture_for(binding))
    }

    /// Revisions of the objects each binding would reference; `None` when one
    /// is missing.
    fn binding_key(&self, linked: &LinkedProgram) -> Option<Vec<u64>> {
        linked
            .resources
            .iter()
            .map(|resource| match resource.kind {
                ResourceKind::Texture => self.texture_for(resource.binding).map(|t| t.revision),
                ResourceKind::Sampler => self.primary_texture(linked).map(|t| t.revision),
                ResourceKind::Other => None,
            })
            .collect()
    }

    fn bind_group(&self, linked: &LinkedProgram) -> Option<wgpu::BindGroup> {
        let primary = self.primary_texture(linked);
        let mut entries = Vec::with_capacity(linked.resources.len());
        for resource in &linked.resources {
            let resource_binding = match resource.kind {
                ResourceKind::Texture => {
                    wgpu::BindingResource::TextureView(&self.texture_for(resource.binding)?.view)
                }
                ResourceKind::Sampler => wgpu::BindingResource::Sampler(&primary?.sampler),
                ResourceKind::Other => return None,
            };
            entries.push(wgpu::BindGroupEntry {
                binding: resource.binding,
                resource: resource_binding,
            });
        }

        Some(
            self.context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("edge program bind group"),
                    layout: &linked.bind_group_layout,
                    entries: &entries,
                }),
        )
    }
}

impl GpuBackend for WgpuBackend {
    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        let id = ShaderId::new(self.allocate_id())?;
        self.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                module: None,
                interface: None,
                log: String::new(),
            },
        );
        Some(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(object) = self.shaders.get_mut(&shader) {
            object.source = source.to_owned();
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        let Some(object) = self.shaders.get(&shader) else {
            return;
        };
        let stage = object.stage;
        let source = object.source.clone();

        let compiled = reflect::parse_glsl(stage, &source).and_then(|interface| {
            let naga_stage = match stage {
                ShaderStage::Vertex => wgpu::naga::ShaderStage::Vertex,
                ShaderStage::Fragment => wgpu::naga::ShaderStage::Fragment,
            };
            let module = self.with_error_scope(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(match stage {
                        ShaderStage::Vertex => "edge vertex",
                        ShaderStage::Fragment => "edge fragment",
                    }),
                    source: wgpu::ShaderSource::Glsl {
                        shader: Cow::Owned(source.clone()),
                        stage: naga_stage,
                        defines: &[],
                    },
                })
            })?;
            Ok((module, interface))
        });

        if let Some(object) = self.shaders.get_mut(&shader) {
            match compiled {
                Ok((module, interface)) => {
                    object.module = Some(module);
                    object.interface = Some(interface);
                    object.log.clear();
                }
                Err(log) => {
                    object.module = None;
                    object.interface = None;
                    object.log = log;
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders
            .get(&shader)
            .is_some_and(|object| object.module.is_some())
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId::new(self.allocate_id())?;
        self.programs.insert(id, ProgramObject::default());
        Some(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.programs.get_mut(&program) {
            if !object.attached.contains(&shader) {
                object.attached.push(shader);
            }
        }
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.programs.get_mut(&program) {
            object.attached.retain(|&attached| attached != shader);
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        let Some(object) = self.programs.get(&program) else {
            return;
        };
        let linked = self.link(object);
        if let Some(object) = self.programs.get_mut(&program) {
            match linked {
                Ok(linked) => {
                    object.linked = Some(linked);
                    object.log.clear();
                }
                Err(log) => {
                    object.linked = None;
                    object.log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.programs
            .get(&program)
            .is_some_and(|object| object.linked.is_some())
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let linked = self.programs.get(&program)?.linked.as_ref()?;
        linked
            .attributes
            .iter()
            .find(|input| input.name == name)
            .map(|input| input.location)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let linked = self.programs.get(&program)?.linked.as_ref()?;
        linked
            .resources
            .iter()
            .find(|resource| resource.name == name)
            .map(|resource| resource.binding)
    }

    fn create_texture(&mut self) -> Option<TextureId> {
        let id = TextureId::new(self.allocate_id())?;
        let mut object = self.create_texture_object(1, 1, SamplerParams::default());
        object.revision = self.bump_revision();
        self.write_luma8(&object, &[0]);
        self.textures.insert(id, object);
        Some(id)
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        match self.units.get_mut(unit as usize) {
            Some(slot) => *slot = texture,
            None => tracing::warn!(unit, "texture unit out of range"),
        }
    }

    fn texture_parameters(&mut self, texture: TextureId, params: SamplerParams) {
        let sampler = self.create_sampler(params);
        let revision = self.bump_revision();
        if let Some(object) = self.textures.get_mut(&texture) {
            object.sampler = sampler;
            object.revision = revision;
        }
    }

    fn texture_image_luma8(&mut self, texture: TextureId, width: u32, height: u32, pixels: &[u8]) {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || pixels.len() < expected {
            tracing::warn!(width, height, len = pixels.len(), "texture image ignored");
            return;
        }
        let Some(current) = self.textures.get(&texture) else {
            return;
        };

        if current.size != (width, height) {
            let limit = self.context.device.limits().max_texture_dimension_2d;
            if width > limit || height > limit {
                tracing::warn!(width, height, limit, "texture image exceeds device limits");
                return;
            }
            let mut replacement = self.create_texture_object(width, height, SamplerParams::default());
            replacement.revision = self.bump_revision();
            if let Some(current) = self.textures.remove(&texture) {
                replacement.sampler = current.sampler;
            }
            tracing::debug!(texture = texture.get(), width, height, "texture storage reallocated");
            self.textures.insert(texture, replacement);
        }

        if let Some(object) = self.textures.get(&texture) {
            self.write_luma8(object, &pixels[..expected]);
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(object) = self.textures.remove(&texture) {
            object.texture.destroy();
        }
        for slot in &mut self.units {
            if *slot == Some(texture) {
                *slot = None;
            }
        }
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) {
        if self.frame.is_some() {
            tracing::warn!("frame already in progress; finishing it first");
            self.end_frame();
        }

        let surface = match self.context.surface.get_current_texture() {
            Ok(surface) => surface,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout; retrying next frame");
                return;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to acquire surface texture; skipping frame");
                return;
            }
        };
        let view = surface
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("edgecam frame"),
            });
        let [r, g, b, a] = clear_color.map(f64::from);
        self.frame = Some(Frame {
            surface,
            view,
            encoder,
            clear_color: wgpu::Color { r, g, b, a },
            cleared: false,
        });
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
    }

    fn vertex_attrib_array(&mut self, location: u32, components: u32, data: &[f32]) {
        if let Some(stream) = self.streams.get(&location) {
            if stream.components == components && stream.data == data {
                return;
            }
        }
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertex attribute"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.streams.insert(
            location,
            VertexStream {
                components,
                data: data.to_vec(),
                buffer,
            },
        );
    }

    // Streams are kept so the next frame can reuse their buffers.
    fn disable_vertex_attrib_array(&mut self, _location: u32) {}

    fn uniform_sampler(&mut self, location: u32, unit: u32) {
        self.sampler_units.insert(location, unit);
    }

    fn draw_triangle_strip(&mut self, first: u32, count: u32) {
        if self.frame.is_none() {
            return;
        }
        let Some(program) = self.current_program else {
            tracing::warn!("draw without a program; skipped");
            return;
        };
        let Some(linked) = self
            .programs
            .get(&program)
            .and_then(|object| object.linked.as_ref())
        else {
            tracing::warn!(program = program.get(), "draw with an unlinked program; skipped");
            return;
        };
        let Some(key) = self.binding_key(linked) else {
            tracing::warn!("no texture bound for the program; skipped draw");
            return;
        };
        if !linked.bind_group.is_current(&key) {
            let Some(group) = self.bind_group(linked) else {
                return;
            };
            if let Some(linked) = self
                .programs
                .get_mut(&program)
                .and_then(|object| object.linked.as_mut())
            {
                linked.bind_group.store(key, group);
                tracing::trace!(program = program.get(), "bind group rebuilt");
            }
        }
        let Some(linked) = self
            .programs
            .get(&program)
            .and_then(|object| object.linked.as_ref())
        else {
            return;
        };
        let Some(bind_group) = linked.bind_group.group() else {
            return;
        };

        let mut buffers = Vec::with_capacity(linked.attributes.len());
        for input in &linked.attributes {
            match self.streams.get(&input.location) {
                Some(stream) if stream.components == reflect::components(input.format) => {
                    buffers.push(stream.buffer.slice(..));
                }
                _ => {
                    tracing::warn!(attribute = %input.name, "vertex attribute not set; skipped draw");
                    return;
                }
            }
        }
        let viewport = self.viewport;
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let load = if frame.cleared {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(frame.clear_color)
        };
        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("edge map pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        if let Some((width, height)) = viewport {
            let (surface_width, surface_height) =
                (frame.surface.texture.width(), frame.surface.texture.height());
            render_pass.set_viewport(
                0.0,
                0.0,
                width.min(surface_width) as f32,
                height.min(surface_height) as f32,
                0.0,
                1.0,
            );
        }
        render_pass.set_pipeline(&linked.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        for (slot, buffer) in buffers.into_iter().enumerate() {
            render_pass.set_vertex_buffer(slot as u32, buffer);
        }
        render_pass.draw(first..first + count, 0..1);
        drop(render_pass);
        frame.cleared = true;
    }

    fn end_frame(&mut self) {
        let Some(mut frame) = self.frame.take() else {
            return;
        };
        if !frame.cleared {
            let _ = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.context.queue.submit(Some(frame.encoder.finish()));
        frame.surface.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_group_cache_follows_revisions() {
        let mut cache = BindGroupCache::default();
        assert!(!cache.is_current(&[1, 1]));
        assert!(cache.group().is_none());

        cache.store(vec![1, 1], "first");
        assert!(cache.is_current(&[1, 1]));
        assert_eq!(cache.group(), Some(&"first"));

        // A reallocated texture carries a new revision.
        assert!(!cache.is_current(&[2, 2]));
        cache.store(vec![2, 2], "second");
        assert!(!cache.is_current(&[1, 1]));
        assert_eq!(cache.group(), Some(&"second"));
    }
}
