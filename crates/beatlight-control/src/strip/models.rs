use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ControlError, Result};

/// Byte stream the colour frames are written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StripTransport {
    /// Character device such as a bound RFCOMM port or a serial tty
    Device { path: PathBuf },
    /// `host:port` of a network bridge
    Tcp { address: String },
}

impl Default for StripTransport {
    fn default() -> Self {
        Self::Device {
            path: PathBuf::from("/dev/rfcomm0"),
        }
    }
}

impl StripTransport {
    pub fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        match self {
            Self::Device { path } => {
                let file = OpenOptions::new().write(true).open(path)?;
                Ok(Box::new(file))
            }
            Self::Tcp { address } => {
                let stream = TcpStream::connect(address)?;
                stream.set_nodelay(true)?;
                Ok(Box::new(stream))
            }
        }
    }
}

impl std::fmt::Display for StripTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device { path } => write!(f, "{}", path.display()),
            Self::Tcp { address } => write!(f, "tcp://{}", address),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    pub transport: StripTransport,
    /// Render loop rate in Hz
    pub frame_rate: u32,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            transport: StripTransport::default(),
            frame_rate: 25,
        }
    }
}

impl StripConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.frame_rate) {
            return Err(ControlError::InvalidConfig(format!(
                "strip frame_rate {} outside 1..=1000",
                self.frame_rate
            )));
        }
        Ok(())
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}
