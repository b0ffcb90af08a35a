use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ControlError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Bars are presented at most this often (Hz)
    pub frame_rate: u32,
    /// Cover art is written here when set
    pub artwork_path: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            artwork_path: None,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=240).contains(&self.frame_rate) {
            return Err(ControlError::InvalidConfig(format!(
                "display frame_rate {} outside 1..=240",
                self.frame_rate
            )));
        }
        Ok(())
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}
