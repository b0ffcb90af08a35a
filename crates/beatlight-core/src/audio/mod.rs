//! Real-time audio pipeline
//!
//! ```text
//! submit(&[i16]) -> SamplePacer -> SpectralExtractor -> FrameHandler
//!                                                         |
//!                              ExcitationSignal -> OnsetDetector -> ChannelBank
//! ```

pub mod channels;
pub mod effects;
pub mod idle;
pub mod onset;
pub mod pacer;
pub mod session;
pub mod spectrum;

pub use channels::{ChannelBank, ChannelFire, ChannelState, ChannelTuning};
pub use effects::{EffectEngine, EffectUpdate};
pub use idle::{IdleAnimation, PlaybackMode};
pub use onset::{EnvelopeState, Onset, OnsetDetector, OnsetTuning};
pub use pacer::{AnalysisFrame, PacingMode, SamplePacer, FRAME_SIZE};
pub use session::{AudioSession, FrameHandler};
pub use spectrum::{ExcitationSignal, Normalization, SpectralExtractor, SpectrumFrame};

/// Bins `0..N/4` form the low sub-band used for excitation.
pub const fn excitation_band(frame_size: usize) -> usize {
    frame_size / 4
}
