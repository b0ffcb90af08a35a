//! Display lifecycle: audio handler, render loop, metadata loop

use super::models::DisplayConfig;
use super::render::{run_render_loop, DisplayHandler};
use super::terminal::TerminalDisplay;
use crate::backend::BackendSetup;
use crate::error::ControlError;
use beatlight_core::metadata::open_source;
use beatlight_core::{
    AudioOutput, AudioSession, MetadataReader, Normalization, PlaybackMode, Shutdown,
    SpectrumSink, Worker, FRAME_SIZE,
};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const RENDER_TIMEOUT: Duration = Duration::from_secs(1);

/// Terminal sink shared by the render and metadata loops
pub type SharedTerminal = Arc<Mutex<TerminalDisplay<Box<dyn Write + Send>>>>;

pub struct DisplayBackend {
    mode: Arc<PlaybackMode>,
    session: AudioSession<DisplayHandler>,
    render: Option<Worker>,
    metadata: Option<MetadataReader>,
    metadata_timeout: Duration,
}

impl DisplayBackend {
    /// Build the backend around any shareable spectrum sink.
    pub fn with_sink<S>(sink: S, setup: BackendSetup<DisplayConfig>) -> Result<Self, ControlError>
    where
        S: SpectrumSink + Clone + 'static,
    {
        setup.audio.validate()?;
        setup.backend.validate()?;

        // Opening a FIFO blocks until the writer side shows up
        let metadata = match &setup.metadata.pipe_path {
            Some(path) => {
                let source = open_source(path)?;
                Some(MetadataReader::spawn(
                    source,
                    sink.clone(),
                    Arc::new(AtomicBool::new(false)),
                )?)
            }
            None => {
                info!("No metadata pipe configured");
                None
            }
        };

        let handler = DisplayHandler::new();
        let bars = handler.bars();
        let mode = Arc::new(PlaybackMode::new());
        let render_mode = Arc::clone(&mode);
        let period = setup.backend.frame_period();
        let render = Worker::spawn(
            "display-render",
            Arc::new(AtomicBool::new(false)),
            move |alive| run_render_loop(bars, render_mode, sink, period, alive),
        )?;

        info!(
            "Display backend initialised at {} Hz",
            setup.backend.frame_rate
        );
        Ok(Self {
            mode,
            session: AudioSession::new(
                FRAME_SIZE,
                Normalization::Perceptual,
                setup.audio.pacing,
                handler,
            ),
            render: Some(render),
            metadata,
            metadata_timeout: setup.metadata.join_timeout(),
        })
    }

    pub fn session(&self) -> &AudioSession<DisplayHandler> {
        &self.session
    }

    pub fn is_idle(&self) -> bool {
        self.mode.is_idle()
    }

    pub fn metadata_finished(&self) -> bool {
        self.metadata.as_ref().map_or(true, MetadataReader::is_finished)
    }
}

impl AudioOutput for DisplayBackend {
    type Config = BackendSetup<DisplayConfig>;
    type Error = ControlError;

    fn init(setup: Self::Config) -> Result<Self, Self::Error> {
        let out: Box<dyn Write + Send> = Box::new(io::stdout());
        let terminal: SharedTerminal = Arc::new(Mutex::new(TerminalDisplay::new(
            out,
            setup.backend.artwork_path.clone(),
        )));
        Self::with_sink(terminal, setup)
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

    fn deinit(mut self) {
        if let Some(render) = self.render.take() {
            if render.shutdown(RENDER_TIMEOUT) != Shutdown::Joined {
                warn!("Display render loop did not stop cleanly");
            }
        }
        if let Some(metadata) = self.metadata.take() {
            // A reader blocked on an idle pipe is left behind
            metadata.shutdown(self.metadata_timeout);
        }
        info!("Display backend stopped");
    }
}
