//! Frame timing for the render loop.

use std::time::{Duration, Instant};

/// Tracks per-frame delta time and a smoothed frame rate.
///
/// `tick()` is called once per loop iteration; the returned delta feeds
/// camera movement and animation, while the smoothed rate is what the
/// application logs periodically.
#[derive(Debug)]
pub struct FrameTimer {
    start: Instant,
    last_tick: Instant,
    smoothed_fps: f32,
}

/// Smoothing factor for the exponential moving average of the frame rate.
const FPS_SMOOTHING: f32 = 0.05;

impl FrameTimer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            smoothed_fps: 0.0,
        }
    }

    /// Total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in seconds since the timer was created.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Advance the timer by one frame and return the delta since the
    /// previous tick.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;

        let secs = delta.as_secs_f32();
        if secs > 0.0 {
            let instant_fps = 1.0 / secs;
            self.smoothed_fps = if self.smoothed_fps == 0.0 {
                instant_fps
            } else {
                self.smoothed_fps + (instant_fps - self.smoothed_fps) * FPS_SMOOTHING
            };
        }

        delta
    }

    /// Delta time in seconds since the last tick.
    pub fn delta_secs(&mut self) -> f32 {
        self.tick().as_secs_f32()
    }

    /// Exponentially smoothed frames per second, 0.0 until the first tick.
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    /// Reset the timer to the current time.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_tick = now;
        self.smoothed_fps = 0.0;
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
