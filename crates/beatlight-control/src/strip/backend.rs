//! LED strip lifecycle and audio handler

use super::link::StripLink;
use super::models::StripConfig;
use super::render::{run_render_loop, StripRenderer};
use crate::backend::BackendSetup;
use crate::error::ControlError;
use beatlight_core::audio::excitation_band;
use beatlight_core::{
    AudioOutput, AudioSession, ChannelTuning, EffectEngine, ExcitationSignal, FrameHandler,
    Normalization, OnsetTuning, PlaybackMode, Rgb, Shutdown, SpectrumFrame, Worker, FRAME_SIZE,
};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Red, green and blue
pub const STRIP_CHANNELS: usize = 3;
/// Sent right after the link opens
pub const OPEN_COLOR: Rgb = Rgb::new(1, 1, 1);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

pub fn onset_tuning() -> OnsetTuning {
    OnsetTuning::default()
}

pub fn channel_tuning() -> ChannelTuning {
    ChannelTuning::default()
}

/// Detects onsets and fires colour channels; ageing happens in the
/// render loop.
pub struct StripHandler {
    engine: EffectEngine,
}

impl StripHandler {
    pub fn new() -> Self {
        Self {
            engine: EffectEngine::new(STRIP_CHANNELS, onset_tuning(), channel_tuning()),
        }
    }

    pub fn engine(&self) -> &EffectEngine {
        &self.engine
    }
}

impl Default for StripHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHandler for StripHandler {
    fn handle_frame(&mut self, spectrum: &SpectrumFrame) {
        let signal = ExcitationSignal::from_spectrum(
            spectrum,
            excitation_band(FRAME_SIZE),
            FRAME_SIZE as f32,
        );
        self.engine.trigger(signal);
    }

    fn on_start(&mut self, _sample_rate: u32) {
        self.engine.reset();
    }
}

pub struct StripBackend<W = Box<dyn Write + Send>> {
    link: Arc<Mutex<StripLink<W>>>,
    mode: Arc<PlaybackMode>,
    session: AudioSession<StripHandler>,
    render: Option<Worker>,
}

impl<W: Write + Send + 'static> StripBackend<W> {
    /// Build the backend on an already open byte stream.
    pub fn with_writer(writer: W, setup: BackendSetup<StripConfig>) -> Result<Self, ControlError> {
        setup.audio.validate()?;
        setup.backend.validate()?;

        let mut link = StripLink::new(writer);
        link.send_rgb(OPEN_COLOR)?;
        let link = Arc::new(Mutex::new(link));

        let mode = Arc::new(PlaybackMode::new());
        let handler = StripHandler::new();
        let renderer = StripRenderer::new(Arc::clone(&mode), handler.engine().bank());

        let period = setup.backend.frame_period();
        let render_link = Arc::clone(&link);
        let render = Worker::spawn(
            "strip-render",
            Arc::new(AtomicBool::new(false)),
            move |alive| run_render_loop(renderer, render_link, period, alive),
        )?;

        Ok(Self {
            link,
            mode,
            session: AudioSession::new(
                FRAME_SIZE,
                Normalization::Length,
                setup.audio.pacing,
                handler,
            ),
            render: Some(render),
        })
    }

    pub fn session(&self) -> &AudioSession<StripHandler> {
        &self.session
    }

    pub fn is_idle(&self) -> bool {
        self.mode.is_idle()
    }

    fn shutdown(&mut self) {
        if let Some(render) = self.render.take() {
            if render.shutdown(SHUTDOWN_TIMEOUT) != Shutdown::Joined {
                warn!("Strip render loop did not stop cleanly");
            }
        }
        if let Err(e) = self.link.lock().send_rgb(Rgb::BLACK) {
            error!("Failed to blank strip: {}", e);
        }
    }

    /// Tear down and hand back the transport.
    pub fn close(mut self) -> Option<W> {
        self.shutdown();
        let Self { link, session, .. } = self;
        drop(session);
        Arc::try_unwrap(link)
            .ok()
            .map(|link| link.into_inner().into_inner())
    }
}

impl AudioOutput for StripBackend {
    type Config = BackendSetup<StripConfig>;
    type Error = ControlError;

    fn init(setup: Self::Config) -> Result<Self, Self::Error> {
        let transport = &setup.backend.transport;
        let writer = transport
            .open()
            .map_err(|e| ControlError::Strip(format!("cannot open {}: {}", transport, e)))?;
        info!("Strip link open on {}", transport);
        Self::with_writer(writer, setup)
    }

    fn start(&mut self, sample_rate: u32) {
        self.session.start(sample_rate);
        self.mode.set_idle(false);
    }

    fn play(&mut self, samples: &[i16]) {
        self.session.submit(samples);
    }

    fn flush(&mut self) {
        self.session.flush();
    }

    fn stop(&mut self) {
        self.session.stop();
        self.mode.set_idle(true);
    }

    fn deinit(self) {
        self.close();
        info!("Strip backend stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatlight_core::PacingMode;

    fn setup() -> BackendSetup<StripConfig> {
        let mut setup = BackendSetup::new(StripConfig {
            frame_rate: 200,
            ..Default::default()
        });
        setup.audio.pacing = PacingMode::Unpaced;
        setup
    }

    fn spectrum_with_peak(peak: f32) -> SpectrumFrame {
        let mut left = vec![0.0; FRAME_SIZE / 2 + 1];
        left[10] = peak;
        SpectrumFrame {
            right: left.clone(),
            left,
        }
    }

    #[test]
    fn test_handler_fires_without_ageing() {
        let mut handler = StripHandler::new();
        handler.handle_frame(&spectrum_with_peak(0.0));
        handler.handle_frame(&spectrum_with_peak(50_000.0));
        for _ in 0..20 {
            handler.handle_frame(&spectrum_with_peak(0.0));
        }

        let bank = handler.engine().bank();
        let bank = bank.lock();
        let fired = &bank.channels()[0];
        assert!(fired.value > 0.0);
        assert_eq!(fired.refractory, fired.refractory_mark);
        assert_eq!(handler.engine().onset_count(), 1);
    }

    #[test]
    fn test_open_and_close_frames() {
        let backend = StripBackend::with_writer(Vec::new(), setup()).unwrap();
        assert!(backend.is_idle());
        let written = backend.close().unwrap();

        assert!(written.starts_with(b"#01010100\0"));
        assert!(written.ends_with(b"#00000000\0"));
        assert_eq!(written.len() % 10, 0);
    }

    #[test]
    fn test_start_and_stop_toggle_idle() {
        let writer: Box<dyn Write + Send> = Box::new(Vec::new());
        let mut backend = StripBackend::with_writer(writer, setup()).unwrap();
        backend.start(44_100);
        assert!(!backend.is_idle());
        backend.play(&[0i16; FRAME_SIZE * 2]);
        assert_eq!(backend.session().frames_analyzed(), 1);
        backend.stop();
        assert!(backend.is_idle());
        backend.close();
    }

    #[test]
    fn test_init_rejects_bad_frame_rate() {
        let setup = BackendSetup::new(StripConfig {
            frame_rate: 0,
            ..Default::default()
        });
        assert!(matches!(
            StripBackend::with_writer(Vec::new(), setup),
            Err(ControlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_init_fails_on_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let setup = BackendSetup::new(StripConfig {
            transport: super::super::StripTransport::Device {
                path: dir.path().join("rfcomm9"),
            },
            ..Default::default()
        });
        assert!(matches!(
            <StripBackend as AudioOutput>::init(setup),
            Err(ControlError::Strip(_))
        ));
    }
}
