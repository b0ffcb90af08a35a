//! Now playing state and its diff against what the sink shows

use super::record::{MetadataRecord, PropertyCode};
use crate::sink::{NowPlayingSink, SinkError};
use tracing::{debug, warn};

/// Longest stored text field, in bytes
pub const TEXT_FIELD_MAX: usize = 255;
/// Largest accepted artwork, in bytes
pub const ARTWORK_MAX: usize = 1024 * 1024;

const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NowPlayingState {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork: Vec<u8>,
}

impl NowPlayingState {
    /// Fold one record into the state. Returns whether anything changed.
    pub fn apply(&mut self, record: &MetadataRecord) -> bool {
        match record.property() {
            PropertyCode::Title => set_text(&mut self.title, &record.payload),
            PropertyCode::Artist => set_text(&mut self.artist, &record.payload),
            PropertyCode::Album => set_text(&mut self.album, &record.payload),
            PropertyCode::Artwork => self.set_artwork(&record.payload),
            PropertyCode::Other(_) => false,
        }
    }

    fn set_artwork(&mut self, artwork: &[u8]) -> bool {
        if artwork.len() > ARTWORK_MAX {
            warn!(
                "Artwork of {} bytes exceeds {} byte limit, clearing",
                artwork.len(),
                ARTWORK_MAX
            );
            let changed = !self.artwork.is_empty();
            self.artwork.clear();
            return changed;
        }
        if self.artwork == artwork {
            return false;
        }
        self.artwork.clear();
        self.artwork.extend_from_slice(artwork);
        true
    }

    /// `title\nartist\nalbum`, with `-` standing in for empty fields.
    pub fn display_text(&self) -> String {
        format!(
            "{}\n{}\n{}",
            or_placeholder(&self.title),
            or_placeholder(&self.artist),
            or_placeholder(&self.album)
        )
    }

    fn same_text(&self, other: &NowPlayingState) -> bool {
        self.title == other.title && self.artist == other.artist && self.album == other.album
    }
}

fn or_placeholder(field: &str) -> &str {
    if field.is_empty() {
        PLACEHOLDER
    } else {
        field
    }
}

/// Text up to the first NUL, lossily decoded and cut at a char boundary.
fn set_text(field: &mut String, payload: &[u8]) -> bool {
    let raw = payload.split(|&b| b == 0).next().unwrap_or_default();
    let decoded = String::from_utf8_lossy(raw);
    let text = truncate_at_boundary(&decoded, TEXT_FIELD_MAX);
    if field == text {
        return false;
    }
    field.clear();
    field.push_str(text);
    true
}

fn truncate_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// What a sync pushed to the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub text_pushed: bool,
    pub artwork_pushed: bool,
}

/// Current state plus a shadow of what the sink last accepted.
#[derive(Debug, Default)]
pub struct NowPlayingTracker {
    state: NowPlayingState,
    shown: NowPlayingState,
}

impl NowPlayingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &NowPlayingState {
        &self.state
    }

    pub fn apply(&mut self, record: &MetadataRecord) -> bool {
        self.state.apply(record)
    }

    /// Push whatever differs from the shadow. The shadow only moves after
    /// the sink accepted the update, so a failed push is retried next time.
    /// Text and artwork are tried independently; the first error is returned.
    pub fn sync(&mut self, sink: &mut dyn NowPlayingSink) -> Result<SyncOutcome, SinkError> {
        let mut outcome = SyncOutcome::default();
        let mut first_error = None;

        if !self.state.same_text(&self.shown) {
            let text = self.state.display_text();
            match sink.set_display_text(&text) {
                Ok(()) => {
                    self.shown.title.clone_from(&self.state.title);
                    self.shown.artist.clone_from(&self.state.artist);
                    self.shown.album.clone_from(&self.state.album);
                    outcome.text_pushed = true;
                    debug!("Now playing: {:?}", text);
                }
                Err(e) => first_error = Some(e),
            }
        }

        if self.state.artwork != self.shown.artwork {
            match sink.set_artwork(&self.state.artwork) {
                Ok(()) => {
                    self.shown.artwork.clone_from(&self.state.artwork);
                    outcome.artwork_pushed = true;
                    debug!("Artwork updated ({} bytes)", self.shown.artwork.len());
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }
}
