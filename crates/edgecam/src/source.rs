//! Frame sources standing in for a camera: they hand padded luminance rows to
//! a [`FrameSink`] at a fixed cadence from a dedicated thread.

use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use renderer::FrameSink;

use crate::config::{SourceConfig, SourceKind};

/// One delivered frame: `height` rows of `stride` bytes, `width` of them live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFrame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
}

impl SourceFrame {
    fn blank(width: usize, height: usize, padding: usize) -> Self {
        let stride = width + padding;
        Self {
            data: vec![0; stride * height],
            width,
            height,
            stride,
        }
    }

    fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let width = self.width;
        self.data
            .chunks_exact_mut(self.stride)
            .map(move |row| &mut row[..width])
    }
}

/// Moving diagonal bars over a bright disc.
#[derive(Debug)]
pub struct SyntheticPattern {
    frame: SourceFrame,
    phase: usize,
}

impl SyntheticPattern {
    const BAR_WIDTH: usize = 24;

    pub fn new(width: usize, height: usize, padding: usize) -> Self {
        Self {
            frame: SourceFrame::blank(width, height, padding),
            phase: 0,
        }
    }

    fn advance(&mut self) -> &SourceFrame {
        let phase = self.phase;
        let (width, height) = (self.frame.width, self.frame.height);
        let (cx, cy) = (width / 2, height / 2);
        let radius = width.min(height) / 4;
        for (y, row) in self.frame.rows_mut().enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                let dx = x.abs_diff(cx);
                let dy = y.abs_diff(cy);
                *pixel = if dx * dx + dy * dy <= radius * radius {
                    230
                } else if ((x + y + phase) / Self::BAR_WIDTH) % 2 == 0 {
                    40
                } else {
                    150
                };
            }
        }
        self.phase = (phase + 2) % (Self::BAR_WIDTH * 2);
        &self.frame
    }
}

/// A still image converted to luminance and delivered repeatedly.
#[derive(Debug)]
pub struct StillImage {
    frame: SourceFrame,
}

impl StillImage {
    pub fn open(path: &Path, padding: usize) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to load source image {}", path.display()))?
            .to_luma8();
        let (width, height) = (image.width() as usize, image.height() as usize);
        if width == 0 || height == 0 {
            anyhow::bail!("source image {} is empty", path.display());
        }

        let mut frame = SourceFrame::blank(width, height, padding);
        for (dst, src) in frame.rows_mut().zip(image.as_raw().chunks_exact(width)) {
            dst.copy_from_slice(src);
        }
        tracing::debug!(path = %path.display(), width, height, "loaded still image source");
        Ok(Self { frame })
    }
}

#[derive(Debug)]
pub enum FrameSource {
    Synthetic(SyntheticPattern),
    Image(StillImage),
}

impl FrameSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let padding = config.row_padding as usize;
        match config.kind {
            SourceKind::Synthetic => Ok(Self::Synthetic(SyntheticPattern::new(
                config.width as usize,
                config.height as usize,
                padding,
            ))),
            SourceKind::Image => {
                let path = config
                    .path
                    .as_deref()
                    .context("image source requires a path")?;
                Ok(Self::Image(StillImage::open(path, padding)?))
            }
        }
    }

    pub fn next_frame(&mut self) -> &SourceFrame {
        match self {
            Self::Synthetic(pattern) => pattern.advance(),
            Self::Image(image) => &image.frame,
        }
    }
}

/// Runs `source` on its own thread, delivering a frame every `interval`
/// until `shutdown` fires or disconnects, or the viewer goes away.
pub fn spawn(
    mut source: FrameSource,
    interval: Duration,
    mut sink: FrameSink,
    shutdown: Receiver<()>,
) -> Result<JoinHandle<u64>> {
    thread::Builder::new()
        .name("edgecam-source".into())
        .spawn(move || {
            loop {
                match shutdown.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let frame = source.next_frame();
                sink.on_frame_available(frame.width, frame.height, Some(&frame.data), frame.stride);
                if !sink.is_connected() {
                    break;
                }
            }
            let published = sink.frames_published();
            tracing::debug!(published, "frame source stopped");
            published
        })
        .context("failed to spawn frame source thread")
}

pub fn interval_for(fps: f32) -> Duration {
    Duration::from_secs_f32(1.0 / fps.max(0.1))
}
