//! Backend selection at composition time

use crate::config::{AppConfig, BackendConfig};
use crate::display::DisplayBackend;
use crate::error::ControlError;
use crate::hue::HueBackend;
use crate::strip::StripBackend;
use beatlight_core::{AudioOutput, AudioSettings, MetadataSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Backend-specific settings plus the shared audio and metadata settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSetup<C> {
    pub backend: C,
    pub audio: AudioSettings,
    pub metadata: MetadataSettings,
}

impl<C> BackendSetup<C> {
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            audio: AudioSettings::default(),
            metadata: MetadataSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Display,
    Hue,
    Strip,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::Display, Self::Hue, Self::Strip];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Hue => "hue",
            Self::Strip => "strip",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ControlError::InvalidConfig(format!("unknown backend {:?}", s)))
    }
}

/// One of the output backends.
pub enum Backend {
    Display(DisplayBackend),
    Hue(HueBackend),
    Strip(StripBackend),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Display(_) => BackendKind::Display,
            Self::Hue(_) => BackendKind::Hue,
            Self::Strip(_) => BackendKind::Strip,
        }
    }
}

impl AudioOutput for Backend {
    type Config = AppConfig;
    type Error = ControlError;

    fn init(config: Self::Config) -> Result<Self, Self::Error> {
        let AppConfig {
            backend,
            audio,
            metadata,
            ..
        } = config;

        if metadata.pipe_path.is_some() && backend.kind() != BackendKind::Display {
            warn!(
                "Metadata pipe is only read by the display backend, ignored for {}",
                backend.kind()
            );
        }

        let backend = match backend {
            BackendConfig::Display(c) => Self::Display(DisplayBackend::init(BackendSetup {
                backend: c,
                audio,
                metadata,
            })?),
            BackendConfig::Hue(c) => Self::Hue(HueBackend::init(BackendSetup {
                backend: c,
                audio,
                metadata,
            })?),
            BackendConfig::Strip(c) => Self::Strip(StripBackend::init(BackendSetup {
                backend: c,
                audio,
                metadata,
            })?),
        };
        info!("Output backend: {}", backend.kind());
        Ok(backend)
    }

    fn start(&mut self, sample_rate: u32) {
        match self {
            Self::Display(b) => b.start(sample_rate),
            Self::Hue(b) => b.start(sample_rate),
            Self::Strip(b) => b.start(sample_rate),
        }
    }

    fn play(&mut self, samples: &[i16]) {
        match self {
            Self::Display(b) => b.play(samples),
            Self::Hue(b) => b.play(samples),
            Self::Strip(b) => b.play(samples),
        }
    }

    fn flush(&mut self) {
        match self {
            Self::Display(b) => b.flush(),
            Self::Hue(b) => b.flush(),
            Self::Strip(b) => b.flush(),
        }
    }

    fn stop(&mut self) {
        match self {
            Self::Display(b) => b.stop(),
            Self::Hue(b) => b.stop(),
            Self::Strip(b) => b.stop(),
        }
    }

    fn delay(&self) -> Option<u64> {
        match self {
            Self::Display(b) => b.delay(),
            Self::Hue(b) => b.delay(),
            Self::Strip(b) => b.delay(),
        }
    }

    fn deinit(self) {
        match self {
            Self::Display(b) => b.deinit(),
            Self::Hue(b) => b.deinit(),
            Self::Strip(b) => b.deinit(),
        }
    }
}
