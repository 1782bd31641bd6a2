use std::sync::Arc;

use crate::buffer::{FrameBuffer, ImageBuffer, ProcessedFrame};
use crate::edge::EdgeDetector;
use crate::error::IngestError;
use crate::exchange::FrameExchange;
use crate::raw::RawFrame;

/// Producer-context pipeline: ingest, detect, publish.
#[derive(Debug)]
pub struct FrameProcessor {
    input: FrameBuffer,
    detector: EdgeDetector,
    back: ProcessedFrame,
    sequence: u64,
    exchange: Arc<FrameExchange>,
}

impl FrameProcessor {
    pub fn new(exchange: Arc<FrameExchange>) -> Self {
        Self {
            input: FrameBuffer::new(),
            detector: EdgeDetector::new(),
            back: ProcessedFrame::new(),
            sequence: 0,
            exchange,
        }
    }

    /// Runs one frame through the pipeline.
    ///
    /// Returns `Ok(true)` when a new edge map was published. Rejected input
    /// leaves every stage, and the dirty flag, exactly as it was.
    pub fn process(&mut self, raw: &RawFrame<'_>) -> Result<bool, IngestError> {
        self.input.ingest(raw)?;
        if !self.detector.apply(self.input.image(), &mut self.back) {
            return Ok(false);
        }

        let sequence = self.sequence + 1;
        self.back.set_sequence(sequence);
        let finished = std::mem::take(&mut self.back);
        match self.exchange.publish(finished) {
            Ok(next) => {
                self.back = next;
                self.sequence = sequence;
                tracing::trace!(
                    sequence,
                    width = raw.width(),
                    height = raw.height(),
                    "published edge map"
                );
                Ok(true)
            }
            Err(refused) => {
                self.back = refused;
                tracing::trace!(sequence, "edge map not published");
                Ok(false)
            }
        }
    }

    pub fn input(&self) -> &ImageBuffer {
        self.input.image()
    }

    /// Number of frames published so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn exchange(&self) -> &Arc<FrameExchange> {
        &self.exchange
    }
}
