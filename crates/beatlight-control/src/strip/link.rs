//! Byte-stream link to the strip controller

use super::frame::ColorFrame;
use beatlight_core::{LampLevel, LampSink, Rgb, SinkError};
use std::io::Write;
use tracing::trace;

/// Sends colour frames, skipping any frame equal to the last one sent.
///
/// A failed write leaves the last-sent frame untouched, so the same
/// colour is tried again on the next call.
pub struct StripLink<W> {
    writer: W,
    last: Option<ColorFrame>,
    frames_sent: u64,
}

impl<W: Write> StripLink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last: None,
            frames_sent: 0,
        }
    }

    /// Write `frame` unless it repeats the previous one. Returns whether
    /// anything was written.
    pub fn send(&mut self, frame: ColorFrame) -> Result<bool, SinkError> {
        if self.last == Some(frame) {
            return Ok(false);
        }

        // write_all retries short writes and reports WriteZero
        self.writer.write_all(frame.as_bytes())?;
        self.writer.flush()?;

        self.last = Some(frame);
        self.frames_sent += 1;
        trace!("Strip frame #{}: {:?}", self.frames_sent, frame);
        Ok(true)
    }

    pub fn send_rgb(&mut self, color: Rgb) -> Result<bool, SinkError> {
        self.send(ColorFrame::rgb(color))
    }

    pub fn last(&self) -> Option<ColorFrame> {
        self.last
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// The whole strip is channel 0.
impl<W: Write + Send> LampSink for StripLink<W> {
    fn set_level(&mut self, channel: usize, level: LampLevel) -> Result<(), SinkError> {
        let v = level.brightness;
        self.set_color(channel, Rgb::new(v, v, v))
    }

    fn set_color(&mut self, channel: usize, color: Rgb) -> Result<(), SinkError> {
        if channel != 0 {
            return Err(SinkError::ChannelOutOfRange { channel, count: 1 });
        }
        self.send_rgb(color).map(|_| ())
    }
}
