//! Lamp flashing driven by onsets

use super::controller::{HueController, HueLamps};
use super::models::{HueConfig, LightState};
use crate::backend::BackendSetup;
use crate::error::ControlError;
use beatlight_core::audio::excitation_band;
use beatlight_core::{
    AudioOutput, AudioSession, ChannelTuning, EffectEngine, ExcitationSignal, FrameHandler,
    LampLevel, LampSink, Normalization, OnsetTuning, SpectrumFrame, FRAME_SIZE,
};
use std::time::Duration;
use tracing::{info, warn};

/// Transition of the fade-out after a flash (x100 ms)
pub const RESET_TRANSITION: u16 = 5;
/// Stop sends the parked state this many times
const PARK_REPEATS: usize = 2;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

pub fn onset_tuning() -> OnsetTuning {
    OnsetTuning::default()
}

/// Lamps flash and free up immediately; only the settle delay matters.
pub fn channel_tuning() -> ChannelTuning {
    ChannelTuning {
        refractory_scale: 0.0,
        ..Default::default()
    }
}

/// Bridge brightness for an onset of the given steepness.
pub fn onset_brightness(steepness: f32) -> u8 {
    (1024.0 * steepness).clamp(0.0, 255.0) as u8
}

/// Per-frame policy: excitation, onset, one lamp flash, fade-outs.
pub struct HueHandler<S> {
    engine: EffectEngine,
    sink: S,
}

impl<S: LampSink> HueHandler<S> {
    pub fn new(channels: usize, sink: S) -> Self {
        Self {
            engine: EffectEngine::new(channels, onset_tuning(), channel_tuning()),
            sink,
        }
    }

    pub fn engine(&self) -> &EffectEngine {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: LampSink> FrameHandler for HueHandler<S> {
    fn handle_frame(&mut self, spectrum: &SpectrumFrame) {
        let signal = ExcitationSignal::from_spectrum(
            spectrum,
            excitation_band(FRAME_SIZE),
            FRAME_SIZE as f32,
        );
        let update = self.engine.process(signal);

        if let Some(fire) = update.fired {
            let level = LampLevel::new(onset_brightness(fire.strength), 0);
            if let Err(e) = self.sink.set_level(fire.channel, level) {
                warn!("Lamp flash on channel {} dropped: {}", fire.channel, e);
            }
        }
        for channel in update.resets {
            if let Err(e) = self
                .sink
                .set_level(channel, LampLevel::new(0, RESET_TRANSITION))
            {
                warn!("Lamp fade on channel {} dropped: {}", channel, e);
            }
        }
    }

    fn on_start(&mut self, _sample_rate: u32) {
        self.engine.reset();
    }
}

pub struct HueBackend {
    controller: HueController,
    lamps: HueLamps,
    session: AudioSession<HueHandler<HueLamps>>,
}

impl HueBackend {
    pub fn session(&self) -> &AudioSession<HueHandler<HueLamps>> {
        &self.session
    }

    fn broadcast(&self, what: &str, state: impl Fn(usize) -> LightState) {
        if let Err(e) = self.lamps.broadcast(state) {
            warn!("Failed to queue {} for all lamps: {}", what, e);
        }
    }
}

impl AudioOutput for HueBackend {
    type Config = BackendSetup<HueConfig>;
    type Error = ControlError;

    fn init(setup: Self::Config) -> Result<Self, Self::Error> {
        setup.audio.validate()?;
        let controller = HueController::new(&setup.backend)?;
        let lamps = controller.lamps();
        let handler = HueHandler::new(lamps.lamps().len(), controller.lamps());

        info!("Hue backend initialised: {:?}", setup.backend);
        Ok(Self {
            controller,
            lamps,
            session: AudioSession::new(
                FRAME_SIZE,
                Normalization::HalfLength,
                setup.audio.pacing,
                handler,
            ),
        })
    }

    fn start(&mut self, sample_rate: u32) {
        let count = self.lamps.lamps().len();
        self.broadcast("colour loop", |i| LightState::colorloop(i, count));
        self.session.start(sample_rate);
    }

    fn play(&mut self, samples: &[i16]) {
        self.session.submit(samples);
    }

    fn flush(&mut self) {
        self.session.flush();
    }

    fn stop(&mut self) {
        self.session.stop();
        for _ in 0..PARK_REPEATS {
            self.broadcast("parked state", |_| LightState::parked());
        }
    }

    fn delay(&self) -> Option<u64> {
        Some(2 * FRAME_SIZE as u64)
    }

    fn deinit(self) {
        let Self {
            controller,
            session,
            lamps,
        } = self;
        drop(session);
        drop(lamps);
        controller.shutdown(SHUTDOWN_TIMEOUT);
    }
}
