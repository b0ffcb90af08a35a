//! Output sink abstraction
//!
//! Backends talk to their hardware through these traits. Callers only
//! invoke a sink when the value actually changed.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// I/O error on the underlying transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink was closed
    #[error("Sink closed")]
    Closed,

    /// Channel index outside the sink
    #[error("Channel {channel} out of range ({count} channels)")]
    ChannelOutOfRange { channel: usize, count: usize },

    /// The device refused the update
    #[error("Update rejected: {0}")]
    Rejected(String),
}

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Brightness change with a device-side transition time (in device units).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LampLevel {
    pub brightness: u8,
    pub transition: u16,
}

impl LampLevel {
    pub const fn new(brightness: u8, transition: u16) -> Self {
        Self {
            brightness,
            transition,
        }
    }
}

/// Individually addressable light channels
pub trait LampSink: Send {
    fn set_level(&mut self, channel: usize, level: LampLevel) -> Result<(), SinkError>;

    fn set_color(&mut self, channel: usize, color: Rgb) -> Result<(), SinkError>;
}

/// Target for now-playing text and artwork.
pub trait NowPlayingSink: Send {
    /// `text` is `title\nartist\nalbum`.
    fn set_display_text(&mut self, text: &str) -> Result<(), SinkError>;

    /// Encoded image bytes; empty clears the artwork.
    fn set_artwork(&mut self, artwork: &[u8]) -> Result<(), SinkError>;
}

/// Display that also shows spectrum bars
pub trait SpectrumSink: NowPlayingSink {
    fn present(&mut self, bars: &[f32], idle: bool) -> Result<(), SinkError>;
}

impl<S: NowPlayingSink + ?Sized> NowPlayingSink for Arc<Mutex<S>> {
    fn set_display_text(&mut self, text: &str) -> Result<(), SinkError> {
        self.lock().set_display_text(text)
    }

    fn set_artwork(&mut self, artwork: &[u8]) -> Result<(), SinkError> {
        self.lock().set_artwork(artwork)
    }
}

impl<S: SpectrumSink + ?Sized> SpectrumSink for Arc<Mutex<S>> {
    fn present(&mut self, bars: &[f32], idle: bool) -> Result<(), SinkError> {
        self.lock().present(bars, idle)
    }
}

impl<S: LampSink + ?Sized> LampSink for Arc<Mutex<S>> {
    fn set_level(&mut self, channel: usize, level: LampLevel) -> Result<(), SinkError> {
        self.lock().set_level(channel, level)
    }

    fn set_color(&mut self, channel: usize, color: Rgb) -> Result<(), SinkError> {
        self.lock().set_color(channel, color)
    }
}
