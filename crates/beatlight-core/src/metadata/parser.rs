//! Tag-stream parser
//!
//! Reads line-framed records:
//!
//! ```text
//! <item><type>636f7265</type><code>6d696e6d</code><length>5</length>
//! <data encoding="base64">
//! aGVsbG8=</data></item>
//! ```
//!
//! Malformed input never ends the stream. The parser logs, drops the
//! record and resynchronises on the next line starting with `<`.

use super::base64;
use super::now_playing::ARTWORK_MAX;
use super::record::{MetadataRecord, RecordHeader};
use crate::error::MetadataError;
use std::io::BufRead;
use tracing::{debug, warn};

/// Opening tag of a payload block
pub const DATA_TAG: &[u8] = b"<data encoding=\"base64\">";
/// Closing tags after a payload block
pub const END_TAG: &[u8] = b"</data></item>";
const ITEM_TAG: &[u8] = b"<item>";
/// Largest declared payload the parser will collect, in bytes
pub const RECORD_LEN_MAX: usize = 16 * ARTWORK_MAX;

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub records: u64,
    pub discarded: u64,
}

enum Payload {
    Decoded(Vec<u8>),
    Discarded(MetadataError),
    EndOfStream,
}

enum Scan {
    /// Block complete; index of the first byte after it
    Complete(usize),
    /// A tag started before the block was complete
    Interrupted(usize),
    NeedMore,
}

/// Pull parser over any buffered byte source.
pub struct TagStreamParser<R> {
    reader: R,
    /// Line to examine again before reading new input
    pending: Option<Vec<u8>>,
    stats: ParserStats,
}

impl<R: BufRead> TagStreamParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: None,
            stats: ParserStats::default(),
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Next well-formed record.
    ///
    /// `Ok(None)` at end of stream, `Err` only on transport failure.
    pub fn next_record(&mut self) -> Result<Option<MetadataRecord>, MetadataError> {
        loop {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            if !line.starts_with(b"<") {
                continue;
            }

            let Some(header) = parse_header(&line) else {
                self.discard(MetadataError::MalformedHeader(lossy_trimmed(&line)));
                continue;
            };

            if header.length == 0 {
                return Ok(Some(self.accept(header, Vec::new())));
            }

            match self.read_payload(&header)? {
                Payload::Decoded(payload) => return Ok(Some(self.accept(header, payload))),
                Payload::Discarded(err) => self.discard(err),
                Payload::EndOfStream => return Ok(None),
            }
        }
    }

    fn next_line(&mut self) -> Result<Option<Vec<u8>>, MetadataError> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }

    fn read_payload(&mut self, header: &RecordHeader) -> Result<Payload, MetadataError> {
        let Some(line) = self.next_line()? else {
            return Ok(Payload::EndOfStream);
        };
        if !line.starts_with(DATA_TAG) {
            let seen = lossy_trimmed(&line);
            self.pending = Some(line);
            return Ok(Payload::Discarded(MetadataError::MissingDataTag(seen)));
        }

        let mut chunk = line[DATA_TAG.len()..].to_vec();
        let needed = match base64::encoded_len(header.length) {
            Some(needed) if header.length <= RECORD_LEN_MAX => needed,
            _ => {
                if !self.skip_block(chunk)? {
                    return Ok(Payload::EndOfStream);
                }
                return Ok(Payload::Discarded(MetadataError::RecordTooLarge {
                    declared: header.length,
                    max: RECORD_LEN_MAX,
                }));
            }
        };
        let mut encoded = Vec::new();

        let trailer = loop {
            match take_symbols(&chunk, &mut encoded, needed) {
                Scan::Complete(at) => break chunk.split_off(at),
                Scan::Interrupted(at) => {
                    self.keep_for_seek(chunk.split_off(at));
                    return Ok(Payload::Discarded(MetadataError::TruncatedPayload {
                        expected: needed,
                        found: encoded.len(),
                    }));
                }
                Scan::NeedMore => match self.next_line()? {
                    Some(line) => chunk = line,
                    None => return Ok(Payload::EndOfStream),
                },
            }
        };

        self.check_trailer(trailer)?;

        Ok(match base64::decode(&encoded, header.length) {
            Ok(payload) if payload.len() == header.length => Payload::Decoded(payload),
            Ok(payload) => Payload::Discarded(MetadataError::LengthMismatch {
                declared: header.length,
                decoded: payload.len(),
            }),
            Err(err) => Payload::Discarded(err.into()),
        })
    }

    /// Drop symbols up to the next tag without keeping them. Returns
    /// `false` if the stream ended first.
    fn skip_block(&mut self, mut chunk: Vec<u8>) -> Result<bool, MetadataError> {
        loop {
            if let Some(at) = chunk.iter().position(|&b| b == b'<') {
                self.check_trailer(chunk.split_off(at))?;
                return Ok(true);
            }
            match self.next_line()? {
                Some(line) => chunk = line,
                None => return Ok(false),
            }
        }
    }

    /// A wrong closing tag is only reported; the record is kept.
    fn check_trailer(&mut self, mut trailer: Vec<u8>) -> Result<(), MetadataError> {
        if trim(&trailer).is_empty() {
            match self.next_line()? {
                Some(line) => trailer = line,
                None => return Ok(()),
            }
        }

        if trim(&trailer) != END_TAG {
            warn!("End data tag not seen, {:?} seen instead", lossy_trimmed(&trailer));
            self.keep_for_seek(trailer);
        }
        Ok(())
    }

    /// Hand a line back to Seek if it may start the next record.
    fn keep_for_seek(&mut self, line: Vec<u8>) {
        if trim(&line).starts_with(ITEM_TAG) {
            self.pending = Some(line);
        }
    }

    fn accept(&mut self, header: RecordHeader, payload: Vec<u8>) -> MetadataRecord {
        self.stats.records += 1;
        debug!(
            "Metadata record {}/{} ({} bytes)",
            header.type_code,
            header.code,
            payload.len()
        );
        MetadataRecord {
            type_code: header.type_code,
            code: header.code,
            payload,
        }
    }

    fn discard(&mut self, err: MetadataError) {
        self.stats.discarded += 1;
        warn!("Discarding metadata record: {}", err);
    }
}

impl<R: BufRead> Iterator for TagStreamParser<R> {
    type Item = Result<MetadataRecord, MetadataError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn parse_header(line: &[u8]) -> Option<RecordHeader> {
    std::str::from_utf8(line).ok().and_then(RecordHeader::parse)
}

/// Collect base64 symbols from `src` until `needed` are gathered.
/// Whitespace is skipped.
fn take_symbols(src: &[u8], encoded: &mut Vec<u8>, needed: usize) -> Scan {
    for (i, &byte) in src.iter().enumerate() {
        if encoded.len() == needed {
            return Scan::Complete(i);
        }
        match byte {
            b'<' => return Scan::Interrupted(i),
            b if b.is_ascii_whitespace() => {}
            b => encoded.push(b),
        }
    }
    if encoded.len() == needed {
        Scan::Complete(src.len())
    } else {
        Scan::NeedMore
    }
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn lossy_trimmed(line: &[u8]) -> String {
    String::from_utf8_lossy(trim(line)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::base64::encode;
    use crate::metadata::record::{FourCc, PropertyCode, TYPE_CORE};
    use std::io::Cursor;

    fn record_text(code: &[u8; 4], payload: &[u8]) -> String {
        let header = RecordHeader {
            type_code: TYPE_CORE,
            code: FourCc::new(code),
            length: payload.len(),
        };
        if payload.is_empty() {
            return format!("{}\n", header.to_line());
        }
        format!(
            "{}\n<data encoding=\"base64\">\n{}</data></item>\n",
            header.to_line(),
            encode(payload)
        )
    }

    fn parse_all(input: &str) -> (Vec<MetadataRecord>, ParserStats) {
        let mut parser = TagStreamParser::new(Cursor::new(input.as_bytes().to_vec()));
        let mut records = Vec::new();
        while let Some(record) = parser.next_record().unwrap() {
            records.push(record);
        }
        (records, parser.stats())
    }

    #[test]
    fn test_parses_wire_example() {
        let input = "<item><type>636f7265</type><code>6d696e6d</code><length>5</length>\n\
                     <data encoding=\"base64\">\n\
                     aGVsbG8=</data></item>\n";
        let (records, stats) = parse_all(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property(), PropertyCode::Title);
        assert_eq!(records[0].type_code, TYPE_CORE);
        assert_eq!(records[0].payload, b"hello");
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn test_block_on_same_line_as_data_tag() {
        let input = "<item><type>636f7265</type><code>61736172</code><length>3</length>\n\
                     <data encoding=\"base64\">YWJj</data></item>\n";
        let (records, _) = parse_all(input);
        assert_eq!(records[0].property(), PropertyCode::Artist);
        assert_eq!(records[0].payload, b"abc");
    }

    #[test]
    fn test_zero_length_record_has_no_block() {
        let input = format!(
            "{}{}",
            record_text(b"asal", b""),
            record_text(b"minm", b"next")
        );
        let (records, _) = parse_all(&input);
        assert_eq!(records.len(), 2);
        assert!(records[0].is_empty());
        assert_eq!(records[1].payload, b"next");
    }

    #[test]
    fn test_skips_noise_before_records() {
        let input = format!("garbage\n\n  more\n{}", record_text(b"minm", b"x"));
        let (records, stats) = parse_all(&input);
        assert_eq!(records.len(), 1);
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn test_malformed_header_is_skipped() {
        let input = format!(
            "<item><type>zz</type><code>6d696e6d</code><length>5</length>\n{}",
            record_text(b"minm", b"ok")
        );
        let (records, stats) = parse_all(&input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, b"ok");
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_missing_data_tag_reexamines_line() {
        let header = RecordHeader {
            type_code: TYPE_CORE,
            code: FourCc::new(b"minm"),
            length: 4,
        };
        let input = format!("{}\n{}", header.to_line(), record_text(b"asar", b"band"));
        let (records, stats) = parse_all(&input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property(), PropertyCode::Artist);
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_invalid_block_is_discarded() {
        let input = format!(
            "<item><type>636f7265</type><code>6d696e6d</code><length>3</length>\n\
             <data encoding=\"base64\">\n\
             Y!Jj</data></item>\n{}",
            record_text(b"asal", b"lp")
        );
        let (records, stats) = parse_all(&input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, b"lp");
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_truncated_block_resyncs_on_next_tag() {
        let input = format!(
            "<item><type>636f7265</type><code>6d696e6d</code><length>9</length>\n\
             <data encoding=\"base64\">\n\
             YWJj</data></item>\n{}",
            record_text(b"asal", b"lp")
        );
        let (records, stats) = parse_all(&input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property(), PropertyCode::Album);
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_wrong_end_tag_keeps_record() {
        let input = "<item><type>636f7265</type><code>6d696e6d</code><length>3</length>\n\
                     <data encoding=\"base64\">\n\
                     YWJj</data>\n";
        let (records, stats) = parse_all(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, b"abc");
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn test_end_tag_on_its_own_line() {
        let input = format!(
            "{}\n<data encoding=\"base64\">\n{}\n</data></item>\n{}",
            RecordHeader {
                type_code: TYPE_CORE,
                code: FourCc::new(b"minm"),
                length: 5,
            }
            .to_line(),
            encode(b"hello"),
            record_text(b"asar", b"me")
        );
        let (records, stats) = parse_all(&input);
        assert_eq!(records.len(), 2);
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn test_end_of_stream_mid_record() {
        let input = "<item><type>636f7265</type><code>6d696e6d</code><length>5</length>\n\
                     <data encoding=\"base64\">\naGVs";
        let (records, _) = parse_all(input);
        assert!(records.is_empty());
    }

    #[test]
    fn test_large_block_spanning_lines() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        let encoded = encode(&payload);
        let (first, second) = encoded.split_at(1000);
        let input = format!(
            "{}\n<data encoding=\"base64\">\n{}\n{}</data></item>\n",
            RecordHeader {
                type_code: TYPE_CORE,
                code: FourCc::new(b"PICT"),
                length: payload.len(),
            }
            .to_line(),
            first,
            second
        );
        let (records, _) = parse_all(&input);
        assert_eq!(records[0].property(), PropertyCode::Artwork);
        assert_eq!(records[0].payload, payload);
    }

    fn oversized_record(length: &str) -> String {
        format!(
            "<item><type>636f7265</type><code>50494354</code><length>{}</length>\n\
             <data encoding=\"base64\">\n\
             aGVsbG8=\n\
             aGVsbG8=</data></item>\n{}",
            length,
            record_text(b"asar", b"band")
        )
    }

    #[test]
    fn test_huge_declared_length_is_discarded() {
        let (records, stats) = parse_all(&oversized_record("4000000000000000"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property(), PropertyCode::Artist);
        assert_eq!(records[0].payload, b"band");
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_maximum_declared_length_is_discarded() {
        let (records, stats) = parse_all(&oversized_record(&usize::MAX.to_string()));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, b"band");
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_length_just_over_limit_is_discarded() {
        let (records, stats) = parse_all(&oversized_record(&(RECORD_LEN_MAX + 1).to_string()));
        assert_eq!(records.len(), 1);
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_iterator_yields_records() {
        let input = format!(
            "{}{}",
            record_text(b"minm", b"a"),
            record_text(b"asar", b"b")
        );
        let parser = TagStreamParser::new(Cursor::new(input.into_bytes()));
        let codes: Vec<_> = parser.map(|r| r.unwrap().property()).collect();
        assert_eq!(codes, vec![PropertyCode::Title, PropertyCode::Artist]);
    }
}
