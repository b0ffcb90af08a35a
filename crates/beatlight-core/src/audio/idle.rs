//! Idle animation shown while playback is stopped

use std::sync::atomic::{AtomicBool, Ordering};

/// Render ticks per full sweep of a three-primitive ring.
pub const IDLE_PERIOD_TICKS: u16 = 256 * 8;

const PEAK_WIDTH: f32 = 256.0;
const SPACING: f32 = 1024.0;
const SPEED: f32 = 1.5;

/// Binary playback mode shared between the audio and render flows.
///
/// Toggled only by the start/stop lifecycle calls, never inferred from
/// silence.
#[derive(Debug)]
pub struct PlaybackMode {
    idle: AtomicBool,
}

impl PlaybackMode {
    pub fn new() -> Self {
        Self {
            idle: AtomicBool::new(true),
        }
    }

    pub fn set_idle(&self, idle: bool) {
        self.idle.store(idle, Ordering::Release);
    }

    pub fn is_idle(&self) -> bool {
        self.idle.load(Ordering::Acquire)
    }
}

impl Default for PlaybackMode {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic brightness sweep travelling across `primitives` outputs.
///
/// Each output has a triangular peak; the peaks sit `1024` units apart on
/// a ring of `1024 * primitives` units and the sweep position advances
/// `1.5` units per tick.
#[derive(Debug, Clone)]
pub struct IdleAnimation {
    primitives: usize,
    position: f32,
}

impl IdleAnimation {
    pub fn new(primitives: usize) -> Self {
        Self {
            primitives: primitives.max(1),
            position: 0.0,
        }
    }

    /// Sweep position on the ring.
    pub fn position(&self) -> f32 {
        self.position
    }

    fn ring(&self) -> f32 {
        SPACING * self.primitives as f32
    }

    /// Levels in `[0, 1]` for the current tick without advancing.
    pub fn levels(&self) -> Vec<f32> {
        let ring = self.ring();

        (0..self.primitives)
            .map(|i| {
                let centre = SPACING * i as f32;
                let d = (self.position - centre).abs() % ring;
                let distance = d.min(ring - d);
                (0.25 * (3.0 - distance / PEAK_WIDTH)).clamp(0.0, 1.0)
            })
            .collect()
    }

    /// Levels for the current tick, then advance one tick.
    pub fn step(&mut self) -> Vec<f32> {
        let levels = self.levels();
        self.position += SPEED;
        if self.position >= self.ring() {
            self.position -= self.ring();
        }
        levels
    }
}
