use beatlight_core::{LampLevel, Rgb};
use serde::{Deserialize, Serialize};

use super::error::HueError;

/// Hue bridge and the lamps driven by the effect channels.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueConfig {
    pub bridge_ip: String,
    pub username: String, // Application key, part of every request path
    /// Bridge light ids; channel `i` drives `lamps[i]`
    pub lamps: Vec<u32>,
    pub request_timeout_ms: u64,
}

impl Default for HueConfig {
    fn default() -> Self {
        Self {
            bridge_ip: String::new(),
            username: String::new(),
            lamps: Vec::new(),
            request_timeout_ms: 1000,
        }
    }
}

impl std::fmt::Debug for HueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HueConfig")
            .field("bridge_ip", &self.bridge_ip)
            .field("username", &"***REDACTED***")
            .field("lamps", &self.lamps)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl HueConfig {
    pub fn validate(&self) -> Result<(), HueError> {
        if self.bridge_ip.trim().is_empty() {
            return Err(HueError::MissingBridge);
        }
        if self.username.trim().is_empty() {
            return Err(HueError::MissingUsername);
        }
        if self.lamps.is_empty() {
            return Err(HueError::NoLamps);
        }
        Ok(())
    }

    /// Parse a comma separated lamp list such as `"1,2,5"`.
    pub fn parse_lamps(list: &str) -> Result<Vec<u32>, HueError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().map_err(|_| HueError::InvalidLampId(s.to_string())))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LightEffect {
    None,
    Colorloop,
}

/// Body of `PUT /api/<user>/lights/<id>/state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    /// Multiples of 100 ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<LightEffect>,
}

/// Colour temperature of the warm white the lamps are parked at (mired)
pub const PARKED_CT: u16 = 467;

impl LightState {
    pub fn level(level: LampLevel) -> Self {
        Self {
            bri: Some(level.brightness),
            transitiontime: Some(level.transition),
            ..Default::default()
        }
    }

    /// Dark colour loop, hues spread evenly over `count` lamps.
    pub fn colorloop(index: usize, count: usize) -> Self {
        let count = count.max(1) as u64;
        let hue = 65_535 * index as u64 / count;
        Self {
            on: Some(true),
            bri: Some(0),
            sat: Some(255),
            hue: Some(hue.min(u64::from(u16::MAX)) as u16),
            transitiontime: Some(1),
            effect: Some(LightEffect::Colorloop),
            ..Default::default()
        }
    }

    /// Warm white at zero brightness, colour loop off.
    pub fn parked() -> Self {
        Self {
            on: Some(true),
            bri: Some(0),
            ct: Some(PARKED_CT),
            effect: Some(LightEffect::None),
            ..Default::default()
        }
    }

    pub fn color(color: Rgb) -> Self {
        let (hue, sat, bri) = rgb_to_hsv(color);
        Self {
            on: Some(true),
            hue: Some(hue),
            sat: Some(sat),
            bri: Some(bri),
            ..Default::default()
        }
    }
}

/// Hue on the bridge's 0..=65535 wheel, saturation and value on 0..=255.
fn rgb_to_hsv(color: Rgb) -> (u16, u8, u8) {
    let r = f32::from(color.r) / 255.0;
    let g = f32::from(color.g) / 255.0;
    let b = f32::from(color.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (
        (degrees / 360.0 * 65_535.0).round() as u16,
        (saturation * 255.0).round() as u8,
        (max * 255.0).round() as u8,
    )
}
