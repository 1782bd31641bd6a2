use std::time::{Duration, Instant};

/// Frames-per-second estimate refreshed once per window.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::with_window(Duration::from_secs(1))
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Counts one frame at `now`. Returns the new estimate when a window closes.
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window {
            return None;
        }

        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Some(now);
        Some(self.fps)
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn reset(&mut self) {
        self.window_start = None;
        self.frames = 0;
        self.fps = 0.0;
    }
}
