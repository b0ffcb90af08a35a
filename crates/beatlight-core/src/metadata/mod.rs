//! Out-of-band track metadata
//!
//! A line-framed tag stream (usually a named pipe) carries records whose
//! payloads are base64 encoded. Records fold into a [`NowPlayingState`],
//! and the [`NowPlayingTracker`] pushes only what changed to the sink.

pub mod base64;
pub mod now_playing;
pub mod parser;
pub mod reader;
pub mod record;

pub use now_playing::{NowPlayingState, NowPlayingTracker, SyncOutcome, ARTWORK_MAX, TEXT_FIELD_MAX};
pub use parser::{ParserStats, TagStreamParser, RECORD_LEN_MAX};
pub use reader::{open_source, run_metadata_loop, MetadataReader};
pub use record::{FourCc, MetadataRecord, PropertyCode, RecordHeader};
