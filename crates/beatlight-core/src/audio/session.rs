//! Per-backend audio session
//!
//! Bundles the pacer, the spectral extractor and a backend-specific
//! [`FrameHandler`] into one context object, so that every backend
//! instance owns its own analysis state.

use super::pacer::{PacingMode, SamplePacer};
use super::spectrum::{Normalization, SpectralExtractor, SpectrumFrame};
use tracing::{debug, info};

/// Backend policy invoked once per analysed frame.
pub trait FrameHandler: Send {
    fn handle_frame(&mut self, spectrum: &SpectrumFrame);

    fn on_start(&mut self, _sample_rate: u32) {}

    fn on_stop(&mut self) {}

    fn on_flush(&mut self) {}
}

/// Audio-ingest path: buffer, pace, transform, hand off.
pub struct AudioSession<H> {
    pacer: SamplePacer,
    extractor: SpectralExtractor,
    handler: H,
    frames_analyzed: u64,
    sample_rate: u32,
}

impl<H: FrameHandler> AudioSession<H> {
    pub fn new(
        frame_size: usize,
        normalization: Normalization,
        pacing: PacingMode,
        handler: H,
    ) -> Self {
        Self {
            pacer: SamplePacer::new(frame_size, pacing),
            extractor: SpectralExtractor::new(frame_size, normalization),
            handler,
            frames_analyzed: 0,
            sample_rate: 0,
        }
    }

    pub fn start(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.pacer.start(sample_rate);
        self.handler.on_start(sample_rate);
        info!("Audio session started at Fs={} Hz", sample_rate);
    }

    pub fn stop(&mut self) {
        self.handler.on_stop();
        info!(
            "Audio session stopped after {} analysed frames",
            self.frames_analyzed
        );
    }

    pub fn flush(&mut self) {
        self.pacer.flush();
        self.handler.on_flush();
        debug!("Audio session flushed");
    }

    /// Accept interleaved stereo samples from the host. Blocks only for
    /// real-time pacing.
    pub fn submit(&mut self, samples: &[i16]) {
        let Self {
            pacer,
            extractor,
            handler,
            frames_analyzed,
            ..
        } = self;

        pacer.push(samples, |frame| {
            let spectrum = extractor.process(frame);
            handler.handle_frame(spectrum);
            *frames_analyzed += 1;
        });
    }

    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn pacer(&self) -> &SamplePacer {
        &self.pacer
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}
