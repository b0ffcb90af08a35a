//! Metadata loop: pipe -> parser -> now playing state -> sink

use super::now_playing::NowPlayingTracker;
use super::parser::{ParserStats, TagStreamParser};
use crate::error::{CoreError, MetadataError};
use crate::sink::NowPlayingSink;
use crate::worker::{Shutdown, Worker};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Open the metadata pipe. Blocks until a writer opens a FIFO.
pub fn open_source(path: impl AsRef<Path>) -> crate::Result<BufReader<File>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        CoreError::IoError(io::Error::new(
            e.kind(),
            format!("cannot open metadata source {}: {}", path.display(), e),
        ))
    })?;
    info!("Metadata source opened: {}", path.display());
    Ok(BufReader::new(file))
}

/// Parse records from `source` and keep `sink` in sync until end of
/// stream, transport failure or `alive` is cleared.
///
/// Sink failures are logged; the tracker retries them with the next record.
pub fn run_metadata_loop<R: BufRead>(
    source: R,
    sink: &mut dyn NowPlayingSink,
    alive: &AtomicBool,
) -> Result<ParserStats, MetadataError> {
    let mut parser = TagStreamParser::new(source);
    let mut tracker = NowPlayingTracker::new();

    while alive.load(Ordering::SeqCst) {
        let Some(record) = parser.next_record()? else {
            info!("Metadata stream ended");
            break;
        };
        tracker.apply(&record);
        if let Err(e) = tracker.sync(sink) {
            error!("Failed to update now playing: {}", e);
        }
    }

    Ok(parser.stats())
}

/// Metadata loop on its own thread.
pub struct MetadataReader {
    worker: Worker,
}

impl MetadataReader {
    pub fn spawn<R, S>(source: R, mut sink: S, alive: Arc<AtomicBool>) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
        S: NowPlayingSink + 'static,
    {
        let worker = Worker::spawn("metadata", alive, move |alive| {
            match run_metadata_loop(source, &mut sink, alive) {
                Ok(stats) => info!(
                    "Metadata loop done: {} records, {} discarded",
                    stats.records, stats.discarded
                ),
                Err(e) => error!("Metadata transport failed: {}", e),
            }
        })?;
        Ok(Self { worker })
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    pub fn shutdown(self, timeout: Duration) -> Shutdown {
        self.worker.shutdown(timeout)
    }
}
