//! Metadata records and their textual header

use std::fmt;

/// Four-character code carried as 8 hex digits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    pub const fn from_u32(code: u32) -> Self {
        Self(code.to_be_bytes())
    }

    pub const fn as_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Item type of records sent by the player core
pub const TYPE_CORE: FourCc = FourCc::new(b"core");
/// Item type of records generated by the streaming receiver itself
pub const TYPE_SSNC: FourCc = FourCc::new(b"ssnc");

/// Properties the now-playing state understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyCode {
    /// `minm`
    Title,
    /// `asar`
    Artist,
    /// `asal`
    Album,
    /// `PICT`
    Artwork,
    Other(FourCc),
}

impl From<FourCc> for PropertyCode {
    fn from(code: FourCc) -> Self {
        match &code.0 {
            b"minm" => Self::Title,
            b"asar" => Self::Artist,
            b"asal" => Self::Album,
            b"PICT" => Self::Artwork,
            _ => Self::Other(code),
        }
    }
}

impl From<PropertyCode> for FourCc {
    fn from(code: PropertyCode) -> Self {
        match code {
            PropertyCode::Title => FourCc::new(b"minm"),
            PropertyCode::Artist => FourCc::new(b"asar"),
            PropertyCode::Album => FourCc::new(b"asal"),
            PropertyCode::Artwork => FourCc::new(b"PICT"),
            PropertyCode::Other(code) => code,
        }
    }
}

/// Header line of one record: `<item><type>..</type><code>..</code><length>..</length>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub type_code: FourCc,
    pub code: FourCc,
    pub length: usize,
}

impl RecordHeader {
    /// Parse a header line. Text after `</length>` is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("<item>")?;
        let (type_hex, rest) = tagged(rest, "type")?;
        let (code_hex, rest) = tagged(rest, "code")?;
        let (length, _) = tagged(rest, "length")?;

        Some(Self {
            type_code: FourCc::from_u32(hex_u32(type_hex)?),
            code: FourCc::from_u32(hex_u32(code_hex)?),
            length: decimal(length)?,
        })
    }

    /// Render the header line (without newline).
    pub fn to_line(&self) -> String {
        format!(
            "<item><type>{:08x}</type><code>{:08x}</code><length>{}</length>",
            self.type_code.as_u32(),
            self.code.as_u32(),
            self.length
        )
    }
}

fn tagged<'a>(input: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let rest = input.strip_prefix('<')?.strip_prefix(name)?.strip_prefix('>')?;
    let (value, rest) = rest.split_once("</")?;
    let rest = rest.strip_prefix(name)?.strip_prefix('>')?;
    Some((value, rest))
}

fn hex_u32(digits: &str) -> Option<u32> {
    if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn decimal(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// One decoded record. Never kept beyond one parse cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub type_code: FourCc,
    pub code: FourCc,
    pub payload: Vec<u8>,
}

impl MetadataRecord {
    pub fn new(type_code: FourCc, code: impl Into<FourCc>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            type_code,
            code: code.into(),
            payload: payload.into(),
        }
    }

    pub fn property(&self) -> PropertyCode {
        self.code.into()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
