//! Render-context side of the edge viewer.
//!
//! The crate streams the edge maps produced by [`frames`] onto a GPU texture
//! and draws them as a full-screen quad once per display refresh:
//!
//! ```text
//!   FrameSink ──▶ FrameExchange ──▶ EdgeViewer::on_draw_frame
//!                                        │
//!                                        ├─▶ TexturePipeline::upload_if_dirty
//!                                        └─▶ RenderLoop::tick ──▶ GpuBackend
//! ```
//!
//! All GPU work goes through the [`GpuBackend`] trait. [`WgpuBackend`] is the
//! production implementation; the core itself never touches `wgpu` directly.
//! Failures degrade to "nothing drawn this tick" rather than tearing the
//! render loop down.

mod backend;
mod error;
mod gpu;
mod render_loop;
mod shader;
pub mod shaders;
mod stats;
mod texture;
mod types;
mod viewer;

#[cfg(test)]
mod testing;

pub use backend::{
    GpuBackend, ProgramId, SamplerParams, ShaderId, ShaderStage, TextureFilter, TextureId,
    TextureWrap,
};
pub use error::{GpuObject, RenderError};
pub use gpu::WgpuBackend;
pub use render_loop::{RenderLoop, TickOutcome};
pub use shader::{ProgramLocations, ProgramState, ShaderProgram, INFO_LOG_LIMIT};
pub use stats::FpsCounter;
pub use texture::TexturePipeline;
pub use types::{BackendOptions, GpuPowerPreference, ViewerConfig};
pub use viewer::{EdgeViewer, FrameSink};
