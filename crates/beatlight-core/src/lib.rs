//! Beatlight Core - audio analysis and metadata pipeline
//!
//! This crate holds everything that is independent of a concrete output:
//! - PCM buffering and real-time pacing
//! - Spectrum, excitation and onset detection
//! - Effect channel scheduling and the idle animation
//! - The metadata tag-stream parser and now-playing state
//! - Sink and backend lifecycle traits

pub mod audio;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod sink;
pub mod worker;

pub use audio::{
    AnalysisFrame, AudioSession, ChannelBank, ChannelTuning, EffectEngine, EffectUpdate,
    ExcitationSignal, FrameHandler, IdleAnimation, Normalization, OnsetDetector, OnsetTuning,
    PacingMode, PlaybackMode, SamplePacer, SpectralExtractor, SpectrumFrame, FRAME_SIZE,
};
pub use backend::AudioOutput;
pub use config::{AudioSettings, MetadataSettings};
pub use error::{CoreError, MetadataError, Result};
pub use logging::LogConfig;
pub use metadata::{MetadataReader, MetadataRecord, NowPlayingState, NowPlayingTracker};
pub use sink::{LampLevel, LampSink, NowPlayingSink, Rgb, SinkError, SpectrumSink};
pub use worker::{Shutdown, Worker};
