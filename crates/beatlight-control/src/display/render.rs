//! Spectrum bars and the display render loop

use beatlight_core::{FrameHandler, PlaybackMode, SpectrumFrame, SpectrumSink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::error;

/// Low bins shown per channel
pub const BARS_PER_CHANNEL: usize = 68;
pub const BAR_COUNT: usize = 2 * BARS_PER_CHANNEL;

/// Latest bars, written by the audio flow and read by the render loop.
pub type SharedBars = Arc<Mutex<Vec<f32>>>;

/// First bins of both channels, clamped to `[0, 1]`, interleaved L/R.
pub fn bars_from_spectrum(spectrum: &SpectrumFrame, bars: &mut [f32]) {
    for (i, pair) in bars.chunks_exact_mut(2).enumerate() {
        pair[0] = spectrum.left.get(i).copied().unwrap_or(0.0).clamp(0.0, 1.0);
        pair[1] = spectrum.right.get(i).copied().unwrap_or(0.0).clamp(0.0, 1.0);
    }
}

pub struct DisplayHandler {
    bars: SharedBars,
    scratch: Vec<f32>,
}

impl DisplayHandler {
    pub fn new() -> Self {
        Self {
            bars: Arc::new(Mutex::new(vec![0.0; BAR_COUNT])),
            scratch: vec![0.0; BAR_COUNT],
        }
    }

    pub fn bars(&self) -> SharedBars {
        Arc::clone(&self.bars)
    }
}

impl Default for DisplayHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHandler for DisplayHandler {
    fn handle_frame(&mut self, spectrum: &SpectrumFrame) {
        bars_from_spectrum(spectrum, &mut self.scratch);
        self.bars.lock().copy_from_slice(&self.scratch);
    }

    fn on_stop(&mut self) {
        self.bars.lock().fill(0.0);
    }
}

/// Present bars at the given period, skipping frames that did not change.
pub fn run_render_loop<S: SpectrumSink>(
    bars: SharedBars,
    mode: Arc<PlaybackMode>,
    mut sink: S,
    period: Duration,
    alive: &AtomicBool,
) {
    let mut shown: Option<(Vec<f32>, bool)> = None;
    let mut next = Instant::now();

    while alive.load(Ordering::SeqCst) {
        let frame = (bars.lock().clone(), mode.is_idle());
        if shown.as_ref() != Some(&frame) {
            if let Err(e) = sink.present(&frame.0, frame.1) {
                error!("Display sink failed, stopping render loop: {}", e);
                break;
            }
            shown = Some(frame);
        }

        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            next = now;
        }
    }
}
