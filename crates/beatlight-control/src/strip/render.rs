//! Strip colour render loop
//!
//! Runs at its own rate, independent of the audio flow. While idle the
//! strip shows the idle sweep; while playing it shows the three effect
//! channels as red, green and blue and ages them one step per tick.

use super::link::StripLink;
use beatlight_core::{ChannelBank, IdleAnimation, PlaybackMode, Rgb};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Per-component ceiling of the idle sweep
pub const IDLE_MAX: Rgb = Rgb::new(255, 63, 23);

fn scale(level: f32, max: u8) -> u8 {
    (level * f32::from(max)).clamp(1.0, f32::from(max)) as u8
}

fn component(levels: &[f32], index: usize, max: u8) -> u8 {
    scale(levels.get(index).copied().unwrap_or(0.0), max)
}

pub fn idle_color(levels: &[f32]) -> Rgb {
    Rgb::new(
        component(levels, 0, IDLE_MAX.r),
        component(levels, 1, IDLE_MAX.g),
        component(levels, 2, IDLE_MAX.b),
    )
}

pub fn active_color(values: &[f32]) -> Rgb {
    Rgb::new(
        component(values, 0, u8::MAX),
        component(values, 1, u8::MAX),
        component(values, 2, u8::MAX),
    )
}

pub struct StripRenderer {
    animation: IdleAnimation,
    mode: Arc<PlaybackMode>,
    bank: Arc<Mutex<ChannelBank>>,
}

impl StripRenderer {
    pub fn new(mode: Arc<PlaybackMode>, bank: Arc<Mutex<ChannelBank>>) -> Self {
        Self {
            animation: IdleAnimation::new(3),
            mode,
            bank,
        }
    }

    /// Colour for this tick. Advances the sweep or ages the channels.
    pub fn next_color(&mut self) -> Rgb {
        if self.mode.is_idle() {
            return idle_color(&self.animation.step());
        }

        let mut bank = self.bank.lock();
        let color = active_color(&bank.values());
        bank.tick();
        color
    }
}

/// Render until `alive` clears or the link fails.
pub fn run_render_loop<W: Write>(
    mut renderer: StripRenderer,
    link: Arc<Mutex<StripLink<W>>>,
    period: Duration,
    alive: &AtomicBool,
) {
    let mut next = Instant::now();

    while alive.load(Ordering::SeqCst) {
        let color = renderer.next_color();
        if let Err(e) = link.lock().send_rgb(color) {
            error!("Strip write failed, stopping render loop: {}", e);
            break;
        }

        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            next = now;
        }
    }

    info!(
        "Strip render loop done, {} frames sent",
        link.lock().frames_sent()
    );
}
