//! Audio and metadata settings shared by every backend

use crate::audio::PacingMode;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Sample rate assumed for raw PCM input
    pub sample_rate: u32,
    pub pacing: PacingMode,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            pacing: PacingMode::RealTime,
        }
    }
}

impl AudioSettings {
    pub fn validate(&self) -> Result<()> {
        if !(8_000..=384_000).contains(&self.sample_rate) {
            return Err(CoreError::InvalidConfig(format!(
                "sample_rate {} outside 8000..=384000",
                self.sample_rate
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Named pipe carrying the tag stream; no metadata loop when unset
    pub pipe_path: Option<PathBuf>,
    /// How long shutdown waits for a blocked reader
    pub join_timeout_ms: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            pipe_path: None,
            join_timeout_ms: 500,
        }
    }
}

impl MetadataSettings {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let audio = AudioSettings::default();
        assert_eq!(audio.sample_rate, 44_100);
        assert_eq!(audio.pacing, PacingMode::RealTime);
        assert!(audio.validate().is_ok());
        assert_eq!(
            MetadataSettings::default().join_timeout(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let audio = AudioSettings {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(audio.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_deserialize() {
        let audio: AudioSettings = toml::from_str("pacing = \"unpaced\"").unwrap();
        assert_eq!(audio.pacing, PacingMode::Unpaced);
        assert_eq!(audio.sample_rate, 44_100);

        let metadata: MetadataSettings =
            toml::from_str("pipe_path = \"/tmp/shairport-sync-metadata\"").unwrap();
        assert_eq!(
            metadata.pipe_path,
            Some(PathBuf::from("/tmp/shairport-sync-metadata"))
        );
    }
}
