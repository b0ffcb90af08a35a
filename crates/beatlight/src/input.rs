//! Raw PCM input

use std::io::{self, Read};
use tracing::debug;

/// Stereo pairs handed to the backend per `play` call
pub const CHUNK_PAIRS: usize = 352;

/// Reads interleaved s16le stereo samples in fixed-size chunks.
pub struct PcmReader<R> {
    reader: R,
    bytes: Vec<u8>,
    samples: Vec<i16>,
    total_pairs: u64,
}

impl<R: Read> PcmReader<R> {
    pub fn new(reader: R, chunk_pairs: usize) -> Self {
        let chunk_pairs = chunk_pairs.max(1);
        Self {
            reader,
            bytes: vec![0; chunk_pairs * 4],
            samples: Vec::with_capacity(chunk_pairs * 2),
            total_pairs: 0,
        }
    }

    pub fn total_pairs(&self) -> u64 {
        self.total_pairs
    }

    /// Next chunk of samples; short only at end of input. A trailing
    /// partial stereo pair is dropped.
    pub fn next_chunk(&mut self) -> io::Result<Option<&[i16]>> {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let whole = filled - filled % 4;
        if whole != filled {
            debug!("Dropping {} trailing bytes of a partial pair", filled - whole);
        }
        if whole == 0 {
            return Ok(None);
        }

        self.samples.clear();
        self.samples.extend(
            self.bytes[..whole]
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]])),
        );
        self.total_pairs += (whole / 4) as u64;
        Ok(Some(&self.samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most three bytes per read.
    struct Dribble(Cursor<Vec<u8>>);

    impl Read for Dribble {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3);
            self.0.read(&mut buf[..n])
        }
    }

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_chunks_and_tail() {
        let samples: Vec<i16> = (0..10).map(|i| i * 1000 - 4000).collect();
        let mut reader = PcmReader::new(Cursor::new(pcm(&samples)), 2);

        assert_eq!(reader.next_chunk().unwrap().unwrap(), &samples[..4]);
        assert_eq!(reader.next_chunk().unwrap().unwrap(), &samples[4..8]);
        assert_eq!(reader.next_chunk().unwrap().unwrap(), &samples[8..]);
        assert!(reader.next_chunk().unwrap().is_none());
        assert_eq!(reader.total_pairs(), 5);
    }

    #[test]
    fn test_short_reads_fill_whole_chunks() {
        let samples: Vec<i16> = (0..8).collect();
        let mut reader = PcmReader::new(Dribble(Cursor::new(pcm(&samples))), 4);
        assert_eq!(reader.next_chunk().unwrap().unwrap(), &samples[..]);
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_partial_pair_is_dropped() {
        let mut bytes = pcm(&[1, -1, 2, -2]);
        bytes.extend_from_slice(&[7, 0, 9]);
        let mut reader = PcmReader::new(Cursor::new(bytes), 8);
        assert_eq!(reader.next_chunk().unwrap().unwrap(), &[1, -1, 2, -2]);
        assert!(reader.next_chunk().unwrap().is_none());
    }
}
