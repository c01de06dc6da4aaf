//! Frame timing and render-loop ownership
//!
//! Browser frame callbacks hand us millisecond timestamps. Physics constants
//! are tuned per 60th of a second, so each frame's delta is the elapsed time
//! in those units. There is no accumulator and no clamping: a slow frame is
//! simulated as one long tick.

use crate::consts::TICKS_PER_SECOND;

/// Turns frame timestamps into tick deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    prev: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta for a frame at `now_ms`. The first frame counts as one tick.
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        let delta = match self.prev {
            Some(prev) => (now_ms - prev) * TICKS_PER_SECOND / 1000.0,
            None => 1.0,
        };
        self.prev = Some(now_ms);
        delta as f32
    }

    /// Forget the previous frame, e.g. after a new level is attached
    pub fn reset(&mut self) {
        self.prev = None;
    }
}

/// At most one scheduled frame callback per canvas
///
/// Attaching a new level bumps the generation. Callbacks carry the
/// generation they were scheduled under and stop rescheduling once it is
/// stale, so an old loop dies even if its pending handle could not be
/// cancelled.
#[derive(Debug, Clone, Default)]
pub struct RenderLoop {
    generation: u64,
    pending: Option<i32>,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new loop. Returns its generation and the previous loop's
    /// pending handle, which the caller should cancel.
    pub fn attach(&mut self) -> (u64, Option<i32>) {
        self.generation += 1;
        log::info!("Render loop generation {}", self.generation);
        (self.generation, self.pending.take())
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Record the handle of the next callback for `generation`. Ignored for
    /// stale generations.
    pub fn scheduled(&mut self, generation: u64, handle: i32) {
        if self.is_current(generation) {
            self.pending = Some(handle);
        }
    }

    /// The pending callback just ran
    pub fn fired(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.pending = None;
        }
    }
}

/// Rolling frames-per-second over the last 60 frames
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_times: [f64; 60],
    frame_index: usize,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }
    }
}

impl FpsCounter {
    pub fn record(&mut self, now_ms: f64) {
        self.frame_times[self.frame_index] = now_ms;
        self.frame_index = (self.frame_index + 1) % self.frame_times.len();

        // Oldest sample sits where the next write goes
        let oldest = self.frame_times[self.frame_index];
        if oldest > 0.0 {
            let elapsed = now_ms - oldest;
            if elapsed > 0.0 {
                let intervals = (self.frame_times.len() - 1) as f64;
                self.fps = (intervals * 1000.0 / elapsed).round() as u32;
            }
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_is_in_sixtieths() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(1000.0), 1.0);
        let d = clock.delta(1000.0 + 1000.0 / 60.0);
        assert!((d - 1.0).abs() < 1e-4);
        // A stalled frame is not clamped
        assert!((clock.delta(2000.0 + 1000.0 / 60.0) - 60.0).abs() < 0.01);
        clock.reset();
        assert_eq!(clock.delta(9000.0), 1.0);
    }

    #[test]
    fn test_attach_supersedes_previous_loop() {
        let mut rl = RenderLoop::new();
        let (first, prev) = rl.attach();
        assert_eq!(prev, None);
        rl.scheduled(first, 11);

        let (second, prev) = rl.attach();
        assert_eq!(prev, Some(11));
        assert!(!rl.is_current(first));
        assert!(rl.is_current(second));

        // The old loop's late reschedule is ignored
        rl.scheduled(first, 12);
        rl.scheduled(second, 13);
        let (_, prev) = rl.attach();
        assert_eq!(prev, Some(13));
    }

    #[test]
    fn test_fps_counter() {
        let mut fps = FpsCounter::default();
        for i in 1..=120 {
            fps.record(i as f64 * 1000.0 / 60.0);
        }
        assert_eq!(fps.fps(), 60);
    }
}
