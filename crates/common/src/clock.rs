//! Pacing utilities for the per-frame loop.
//!
//! - [`frame_interval`] converts a target rate into a tick period
//! - [`FpsMeter`] estimates achieved throughput over a sliding window

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame interval for a target rate. Rates below 1 Hz are treated as 1 Hz.
pub fn frame_interval(target_hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / target_hz.max(1) as u64)
}

/// Sliding-window frames-per-second estimate.
#[derive(Debug)]
pub struct FpsMeter {
    window: Duration,
    samples: VecDeque<Instant>,
}

impl FpsMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Record a completed frame at `now`.
    pub fn record(&mut self, now: Instant) {
        self.samples.push_back(now);
        while let Some(&front) = self.samples.front() {
            if now.duration_since(front) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Frames per second over the retained window; `0.0` with fewer than two samples.
    pub fn fps(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) if self.samples.len() >= 2 => {
                let span = last.duration_since(*first).as_secs_f64();
                if span <= f64::EPSILON {
                    0.0
                } else {
                    (self.samples.len() - 1) as f64 / span
                }
            }
            _ => 0.0,
        }
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}
