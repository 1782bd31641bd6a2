/// Settings for the render-context side of an [`EdgeViewer`](crate::EdgeViewer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfig {
    /// RGBA colour the frame is cleared to every tick.
    pub clear_color: [f32; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Adapter selection hint passed to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

/// Options for creating a [`WgpuBackend`](crate::WgpuBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendOptions {
    pub power: GpuPowerPreference,
    /// Present with `Fifo` when true; otherwise prefer `Immediate`, then `Mailbox`.
    pub vsync: bool,
    /// Frames the presentation engine may queue, clamped to `1..=3`.
    pub max_frame_latency: u32,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            power: GpuPowerPreference::Low,
            vsync: true,
            max_frame_latency: 2,
        }
    }
}
