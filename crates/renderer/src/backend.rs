//! The seam between the render core and a graphics API.
//!
//! The operations follow a classic shader/program/texture object model so the
//! core can drive its state machines step by step and check status after
//! each one. Object identifiers are non-zero; "no object" is `None`.

use std::fmt;
use std::num::NonZeroU32;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            pub fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

object_id!(
    /// Shader object handle.
    ShaderId
);
object_id!(
    /// Linked (or linking) program handle.
    ProgramId
);
object_id!(
    /// 2D texture handle.
    TextureId
);

/// Pipeline stage a shader object compiles for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
}

/// Sampling state attached to a texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
}

impl SamplerParams {
    /// Linear filtering, clamped at the borders.
    pub const LINEAR_CLAMP: SamplerParams = SamplerParams {
        min_filter: TextureFilter::Linear,
        mag_filter: TextureFilter::Linear,
        wrap_s: TextureWrap::ClampToEdge,
        wrap_t: TextureWrap::ClampToEdge,
    };
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
        }
    }
}

/// Graphics API used by the render core.
///
/// Every call happens on the render context that owns the implementation.
/// Creation calls return `None` when the driver cannot provide an object.
pub trait GpuBackend {
    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId>;
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    fn compile_shader(&mut self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> Option<ProgramId>;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn link_program(&mut self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn delete_program(&mut self, program: ProgramId);
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    fn create_texture(&mut self) -> Option<TextureId>;
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>);
    fn texture_parameters(&mut self, texture: TextureId, params: SamplerParams);
    /// Re-specifies the full image of `texture` as one 8-bit luminance channel.
    fn texture_image_luma8(&mut self, texture: TextureId, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&mut self, texture: TextureId);

    fn viewport(&mut self, width: u32, height: u32);
    /// Starts a frame by clearing the colour buffer.
    fn begin_frame(&mut self, clear_color: [f32; 4]);
    fn use_program(&mut self, program: Option<ProgramId>);
    /// Enables attribute `location` and points it at tightly packed floats.
    fn vertex_attrib_array(&mut self, location: u32, components: u32, data: &[f32]);
    fn disable_vertex_attrib_array(&mut self, location: u32);
    fn uniform_sampler(&mut self, location: u32, unit: u32);
    fn draw_triangle_strip(&mut self, first: u32, count: u32);
    /// Finishes the frame started by [`GpuBackend::begin_frame`].
    fn end_frame(&mut self);
}
