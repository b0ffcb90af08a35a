//! Beatlight Control - output backends
//!
//! This crate turns the analysis pipeline of `beatlight-core` into light:
//! - **Display**: spectrum bars and now-playing text on a text sink
//! - **Hue**: Philips Hue lamps flashed through the bridge REST API
//! - **Strip**: an LED strip fed colour frames over a byte stream
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beatlight_control::{AppConfig, Backend};
//! use beatlight_core::AudioOutput;
//!
//! # fn main() -> beatlight_control::Result<()> {
//! let config = AppConfig::load("beatlight.toml")?;
//! let mut backend = Backend::init(config)?;
//! backend.start(44_100);
//! backend.play(&[0i16; 2048]);
//! backend.stop();
//! backend.deinit();
//! # Ok(())
//! # }
//! ```

/// Backend selection and setup
pub mod backend;
/// Application configuration
pub mod config;
/// Spectrum display
pub mod display;
/// Error types
pub mod error;
/// Philips Hue integration
pub mod hue;
/// LED strip output
pub mod strip;

pub use backend::{Backend, BackendKind, BackendSetup};
pub use config::{AppConfig, BackendConfig};
pub use display::{DisplayBackend, DisplayConfig};
pub use error::{ControlError, Result};
pub use hue::{HueBackend, HueConfig};
pub use strip::{StripBackend, StripConfig, StripTransport};
