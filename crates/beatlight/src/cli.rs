//! Command line interface

use anyhow::{Context, Result};
use beatlight_control::{AppConfig, BackendConfig, BackendKind, HueConfig, StripTransport};
use beatlight_core::PacingMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "beatlight", version)]
#[command(about = "Audio-reactive lights and now-playing display for raw PCM streams")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Interleaved s16le stereo PCM, `-` for stdin
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Output backend (display, hue or strip)
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Sample rate of the input
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Named pipe carrying the metadata tag stream
    #[arg(long)]
    pub metadata_pipe: Option<PathBuf>,

    /// Process input as fast as it arrives
    #[arg(long)]
    pub unpaced: bool,

    /// Hue bridge address
    #[arg(short = 'b', long)]
    pub hue_bridge: Option<String>,

    /// Hue application key
    #[arg(short = 'i', long)]
    pub hue_user: Option<String>,

    /// Comma separated Hue lamp ids, e.g. `1,2,5`
    #[arg(short = 'l', long)]
    pub lamps: Option<String>,

    /// Strip device path or `host:port`
    #[arg(short = 'd', long)]
    pub strip_device: Option<String>,
}

impl Cli {
    fn hue_flags(&self) -> bool {
        self.hue_bridge.is_some() || self.hue_user.is_some() || self.lamps.is_some()
    }

    /// Backend named on the command line, or implied by backend flags.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.or_else(|| {
            if self.hue_flags() {
                Some(BackendKind::Hue)
            } else if self.strip_device.is_some() {
                Some(BackendKind::Strip)
            } else {
                None
            }
        })
    }

    /// Config file (or defaults) with the flags applied on top.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AppConfig::default(),
        };
        self.apply(&mut config)?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(kind) = self.backend_kind() {
            config.select_backend(kind);
        }
        if let Some(rate) = self.sample_rate {
            config.audio.sample_rate = rate;
        }
        if self.unpaced {
            config.audio.pacing = PacingMode::Unpaced;
        }
        if let Some(pipe) = &self.metadata_pipe {
            config.metadata.pipe_path = Some(pipe.clone());
        }

        match &mut config.backend {
            BackendConfig::Hue(hue) => {
                if let Some(bridge) = &self.hue_bridge {
                    hue.bridge_ip = bridge.clone();
                }
                if let Some(user) = &self.hue_user {
                    hue.username = user.clone();
                }
                if let Some(lamps) = &self.lamps {
                    hue.lamps = HueConfig::parse_lamps(lamps).context("Invalid --lamps")?;
                }
            }
            BackendConfig::Strip(strip) => {
                if let Some(device) = &self.strip_device {
                    strip.transport = parse_transport(device);
                }
            }
            BackendConfig::Display(_) => {}
        }
        Ok(())
    }
}

/// Paths stay devices; anything else with a port is a TCP address.
pub fn parse_transport(device: &str) -> StripTransport {
    if !device.starts_with('/') && device.contains(':') {
        StripTransport::Tcp {
            address: device.to_string(),
        }
    } else {
        StripTransport::Device {
            path: PathBuf::from(device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("beatlight").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.input, "-");
        assert_eq!(cli.backend_kind(), None);
        let config = cli.load_config().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_hue_flags_imply_hue() {
        let cli = parse(&["-b", "10.0.0.2", "-i", "key", "-l", "1,3"]);
        let config = cli.load_config().unwrap();
        match config.backend {
            BackendConfig::Hue(hue) => {
                assert_eq!(hue.bridge_ip, "10.0.0.2");
                assert_eq!(hue.username, "key");
                assert_eq!(hue.lamps, vec![1, 3]);
            }
            other => panic!("Expected hue, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_lamp_list() {
        let cli = parse(&["--backend", "hue", "-l", "1,x"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let args = ["beatlight", "--backend", "gl"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beatlight.toml");
        fs::write(
            &path,
            "[backend]\nkind = \"strip\"\nframe_rate = 20\n\n[audio]\nsample_rate = 48000\n",
        )
        .unwrap();

        let cli = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--sample-rate",
            "44100",
            "--unpaced",
            "-d",
            "192.168.4.1:8888",
            "--metadata-pipe",
            "/tmp/meta",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.audio.sample_rate, 44_100);
        assert_eq!(config.audio.pacing, PacingMode::Unpaced);
        assert_eq!(config.metadata.pipe_path, Some(PathBuf::from("/tmp/meta")));
        match config.backend {
            BackendConfig::Strip(strip) => {
                assert_eq!(strip.frame_rate, 20);
                assert_eq!(
                    strip.transport,
                    StripTransport::Tcp {
                        address: "192.168.4.1:8888".into()
                    }
                );
            }
            other => panic!("Expected strip, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_transport() {
        assert_eq!(
            parse_transport("/dev/rfcomm0"),
            StripTransport::Device {
                path: PathBuf::from("/dev/rfcomm0")
            }
        );
        assert_eq!(
            parse_transport("strip.local:23"),
            StripTransport::Tcp {
                address: "strip.local:23".into()
            }
        );
    }
}
