//! Text-mode display sink
//!
//! Writes one line per presented frame and one per metadata change.
//! Cover art is not rendered, only stored to a file when configured.

use beatlight_core::{NowPlayingSink, SinkError, SpectrumSink};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Character for a bar height in `[0, 1]`.
pub fn bar_glyph(level: f32) -> char {
    let top = LEVELS.len() - 1;
    let index = (level.clamp(0.0, 1.0) * top as f32).round() as usize;
    LEVELS[index.min(top)]
}

pub struct TerminalDisplay<W> {
    out: W,
    artwork_path: Option<PathBuf>,
    frames: u64,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W, artwork_path: Option<PathBuf>) -> Self {
        Self {
            out,
            artwork_path,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn store_artwork(&self, artwork: &[u8]) -> io::Result<()> {
        let Some(path) = &self.artwork_path else {
            return Ok(());
        };
        if artwork.is_empty() {
            match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => return Ok(()),
            }
        }
        fs::write(path, artwork)?;
        debug!("Artwork written to {}", path.display());
        Ok(())
    }
}

impl<W: Write + Send> NowPlayingSink for TerminalDisplay<W> {
    fn set_display_text(&mut self, text: &str) -> Result<(), SinkError> {
        info!("Now playing: {}", text.replace('\n', " / "));
        writeln!(self.out, "now playing: {}", text.replace('\n', " / "))?;
        self.out.flush()?;
        Ok(())
    }

    fn set_artwork(&mut self, artwork: &[u8]) -> Result<(), SinkError> {
        self.store_artwork(artwork)?;
        if artwork.is_empty() {
            writeln!(self.out, "artwork: none")?;
        } else {
            writeln!(self.out, "artwork: {} bytes", artwork.len())?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> SpectrumSink for TerminalDisplay<W> {
    fn present(&mut self, bars: &[f32], idle: bool) -> Result<(), SinkError> {
        let line: String = bars.iter().map(|&b| bar_glyph(b)).collect();
        let marker = if idle { '-' } else { '|' };
        writeln!(self.out, "{}{}{}", marker, line, marker)?;
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }
}
