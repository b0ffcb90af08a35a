//! Application configuration (TOML)

use crate::backend::BackendKind;
use crate::display::DisplayConfig;
use crate::error::{ControlError, Result};
use crate::hue::HueConfig;
use crate::strip::StripConfig;
use beatlight_core::{AudioSettings, LogConfig, MetadataSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

/// Settings of the selected backend, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Display(DisplayConfig),
    Hue(HueConfig),
    Strip(StripConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Display(DisplayConfig::default())
    }
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Display(_) => BackendKind::Display,
            Self::Hue(_) => BackendKind::Hue,
            Self::Strip(_) => BackendKind::Strip,
        }
    }

    /// Default settings for `kind`.
    pub fn for_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Display => Self::Display(DisplayConfig::default()),
            BackendKind::Hue => Self::Hue(HueConfig::default()),
            BackendKind::Strip => Self::Strip(StripConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub audio: AudioSettings,
    pub metadata: MetadataSettings,
    pub logging: LogConfig,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ControlError::IoError(io::Error::new(
                e.kind(),
                format!("cannot read config {}: {}", path.display(), e),
            ))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Switch backend, keeping the current settings if the kind is unchanged.
    pub fn select_backend(&mut self, kind: BackendKind) {
        if self.backend.kind() != kind {
            self.backend = BackendConfig::for_kind(kind);
        }
    }

    /// Checks what can be checked without touching the hardware.
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        match &self.backend {
            BackendConfig::Display(c) => c.validate(),
            BackendConfig::Hue(c) => Ok(c.validate()?),
            BackendConfig::Strip(c) => c.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strip::StripTransport;
    use beatlight_core::PacingMode;
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend.kind(), BackendKind::Display);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hue_config() {
        let config = AppConfig::from_toml_str(
            r#"
            [backend]
            kind = "hue"
            bridge_ip = "192.168.1.20"
            username = "abc"
            lamps = [1, 2, 3]

            [audio]
            sample_rate = 48000
            "#,
        )
        .unwrap();

        match &config.backend {
            BackendConfig::Hue(hue) => {
                assert_eq!(hue.bridge_ip, "192.168.1.20");
                assert_eq!(hue.lamps, vec![1, 2, 3]);
                assert_eq!(hue.request_timeout_ms, 1000);
            }
            other => panic!("Expected hue, got {:?}", other),
        }
        assert_eq!(config.audio.sample_rate, 48_000);
        assert_eq!(config.audio.pacing, PacingMode::RealTime);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strip_config_with_nested_transport() {
        let config = AppConfig::from_toml_str(
            r#"
            [backend]
            kind = "strip"

            [backend.transport]
            type = "device"
            path = "/dev/rfcomm1"

            [metadata]
            pipe_path = "/tmp/shairport-sync-metadata"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.backend,
            BackendConfig::Strip(StripConfig {
                transport: StripTransport::Device {
                    path: PathBuf::from("/dev/rfcomm1")
                },
                frame_rate: 25,
            })
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.metadata.pipe_path.is_some());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[backend\nkind = "),
            Err(ControlError::ConfigParse(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[backend]\nkind = \"gl\""),
            Err(ControlError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_validate_reports_backend_errors() {
        let config = AppConfig {
            backend: BackendConfig::Hue(HueConfig::default()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ControlError::Hue(_))));
    }

    #[test]
    fn test_select_backend() {
        let mut config = AppConfig::default();
        config.select_backend(BackendKind::Strip);
        assert_eq!(config.backend, BackendConfig::Strip(StripConfig::default()));

        if let BackendConfig::Strip(strip) = &mut config.backend {
            strip.frame_rate = 10;
        }
        config.select_backend(BackendKind::Strip);
        assert!(matches!(&config.backend, BackendConfig::Strip(s) if s.frame_rate == 10));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beatlight.toml");
        fs::write(&path, "[backend]\nkind = \"display\"\nframe_rate = 60\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Display(DisplayConfig {
                frame_rate: 60,
                artwork_path: None,
            })
        );

        assert!(matches!(
            AppConfig::load(dir.path().join("missing.toml")),
            Err(ControlError::IoError(_))
        ));
    }
}
