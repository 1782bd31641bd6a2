/// Reasons an incoming frame is rejected before it touches any stored state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("frame buffer pointer is null")]
    NullBuffer,
    #[error("frame has zero dimension ({width}x{height})")]
    ZeroDimension { width: usize, height: usize },
    #[error("row stride {stride} is smaller than frame width {width}")]
    StrideTooSmall { stride: usize, width: usize },
    #[error("frame buffer holds {actual} bytes but {needed} are required")]
    BufferTooShort { needed: usize, actual: usize },
}
