//! Spectrum display with now-playing text
//!
//! Bars come from the perceptual spectrum of the low bins; metadata from
//! the tag-stream pipe. Both land on one [`SpectrumSink`].
//!
//! [`SpectrumSink`]: beatlight_core::SpectrumSink

pub mod backend;
pub mod models;
pub mod render;
pub mod terminal;

pub use backend::{DisplayBackend, SharedTerminal};
pub use models::DisplayConfig;
pub use render::{bars_from_spectrum, DisplayHandler, BARS_PER_CHANNEL, BAR_COUNT};
pub use terminal::TerminalDisplay;
