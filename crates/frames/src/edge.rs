//! Two-threshold (Canny style) edge detection on 8-bit luminance.
//!
//! The transform runs in three passes over the input:
//!
//! 1. 3x3 Sobel gradients with replicated borders, combined into an L1
//!    magnitude `|gx| + |gy|`.
//! 2. Non-maximum suppression along the quantised gradient direction. Pixels
//!    that survive and exceed the low threshold become candidates; those above
//!    the high threshold seed the edge set.
//! 3. Hysteresis: candidates 8-connected to a seed are promoted.
//!
//! Output pixels are 255 on edges and 0 elsewhere.

use crate::buffer::{ImageBuffer, ProcessedFrame};

/// tan(22.5°) and tan(67.5°) scaled by 2^15 for integer direction binning.
const TAN_22_5_Q15: i64 = 13_573;
const TAN_67_5_Q15: i64 = 79_109;

const EDGE: u8 = 255;

/// Gradient magnitude thresholds for the hysteresis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub low: i32,
    pub high: i32,
}

impl Thresholds {
    pub const DEFAULT: Thresholds = Thresholds { low: 50, high: 100 };
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Suppressed,
    Candidate,
    Edge,
}

#[derive(Debug, Default)]
struct Scratch {
    gx: Vec<i32>,
    gy: Vec<i32>,
    magnitude: Vec<i32>,
    marks: Vec<Mark>,
    stack: Vec<usize>,
}

impl Scratch {
    fn reset(&mut self, len: usize) {
        for plane in [&mut self.gx, &mut self.gy, &mut self.magnitude] {
            plane.clear();
            plane.resize(len, 0);
        }
        self.marks.clear();
        self.marks.resize(len, Mark::Suppressed);
        self.stack.clear();
    }
}

/// Fixed-threshold edge detector.
///
/// The scratch planes are reused between calls to avoid per-frame
/// allocation; they carry no information from one call to the next, so the
/// output depends only on the input pixels.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    thresholds: Thresholds,
    scratch: Scratch,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Writes the edge map of `input` into `output`.
    ///
    /// Returns `false` without touching `output` when `input` is empty.
    pub fn apply(&mut self, input: &ImageBuffer, output: &mut ProcessedFrame) -> bool {
        let (width, height) = input.dimensions();
        if width == 0 || height == 0 || input.is_empty() {
            return false;
        }

        self.scratch.reset(width * height);
        sobel(input, &mut self.scratch);
        suppress_non_maxima(width, height, self.thresholds, &mut self.scratch);
        hysteresis(width, height, &mut self.scratch);

        let target = output.image_mut();
        target.ensure_dimensions(width, height);
        for (dst, mark) in target.as_mut_slice().iter_mut().zip(&self.scratch.marks) {
            *dst = if *mark == Mark::Edge { EDGE } else { 0 };
        }
        true
    }
}

fn sobel(input: &ImageBuffer, scratch: &mut Scratch) {
    let (width, height) = input.dimensions();
    let pixels = input.as_slice();
    let at = |x: isize, y: isize| -> i32 {
        let x = x.clamp(0, width as isize - 1) as usize;
        let y = y.clamp(0, height as isize - 1) as usize;
        i32::from(pixels[y * width + x])
    };

    for y in 0..height as isize {
        for x in 0..width as isize {
            let gx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
            let index = y as usize * width + x as usize;
            scratch.gx[index] = gx;
            scratch.gy[index] = gy;
            scratch.magnitude[index] = gx.abs() + gy.abs();
        }
    }
}

fn suppress_non_maxima(width: usize, height: usize, thresholds: Thresholds, scratch: &mut Scratch) {
    let magnitude = &scratch.magnitude;
    // Outside the image the magnitude is treated as zero.
    let mag = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0
        } else {
            magnitude[y as usize * width + x as usize]
        }
    };

    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            let m = magnitude[index];
            if m <= thresholds.low {
                continue;
            }

            let gx = i64::from(scratch.gx[index]);
            let gy = i64::from(scratch.gy[index]);
            let (ax, ay) = (gx.abs(), gy.abs() << 15);
            let (xi, yi) = (x as isize, y as isize);

            let is_peak = if ay < ax * TAN_22_5_Q15 {
                m > mag(xi - 1, yi) && m >= mag(xi + 1, yi)
            } else if ay > ax * TAN_67_5_Q15 {
                m > mag(xi, yi - 1) && m >= mag(xi, yi + 1)
            } else {
                let s: isize = if (gx < 0) != (gy < 0) { -1 } else { 1 };
                m > mag(xi - s, yi - 1) && m > mag(xi + s, yi + 1)
            };

            if !is_peak {
                continue;
            }
            if m > thresholds.high {
                scratch.marks[index] = Mark::Edge;
                scratch.stack.push(index);
            } else {
                scratch.marks[index] = Mark::Candidate;
            }
        }
    }
}

fn hysteresis(width: usize, height: usize, scratch: &mut Scratch) {
    while let Some(index) = scratch.stack.pop() {
        let (x, y) = ((index % width) as isize, (index / width) as isize);
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let neighbour = ny as usize * width + nx as usize;
                if scratch.marks[neighbour] == Mark::Candidate {
                    scratch.marks[neighbour] = Mark::Edge;
                    scratch.stack.push(neighbour);
                }
            }
        }
    }
}
