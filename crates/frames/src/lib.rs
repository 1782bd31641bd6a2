//! CPU side of the edge viewer: frame ingestion, edge detection and the
//! handoff to the render context.
//!
//! ```text
//!   producer ── RawFrame ──▶ FrameBuffer ──▶ EdgeDetector ──▶ ProcessedFrame
//!                                                                 │ publish
//!                                                                 ▼
//!                                         render loop ◀── take ── FrameExchange
//! ```
//!
//! Everything here runs synchronously inside the caller's context; the only
//! state shared between producer and consumer lives in [`FrameExchange`].

mod buffer;
mod edge;
mod error;
mod exchange;
mod processor;
mod raw;

pub use buffer::{FrameBuffer, ImageBuffer, ProcessedFrame};
pub use edge::{EdgeDetector, Thresholds};
pub use error::IngestError;
pub use exchange::{DirtyFlag, ExchangeStats, FrameExchange};
pub use processor::FrameProcessor;
pub use raw::RawFrame;
