//! Bounds-checked base64 decoding for metadata payloads
//!
//! Standard 64-symbol alphabet with canonical padding. The last one or two
//! symbols of the input may be `=`, each removing one byte from the decoded
//! length. The exact decoded length is checked against the caller's
//! capacity before anything is written.

use ::base64::engine::general_purpose::STANDARD;
use ::base64::{DecodeSliceError, Engine};
use thiserror::Error;

const PAD: u8 = b'=';

/// Payload decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("encoded length {0} is not a multiple of 4")]
    InvalidLength(usize),

    #[error("decoded length {needed} exceeds capacity {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("invalid symbol {symbol:#04x} at offset {offset}")]
    InvalidSymbol { symbol: u8, offset: usize },

    #[error("invalid padding")]
    InvalidPadding,
}

impl From<::base64::DecodeError> for DecodeError {
    fn from(err: ::base64::DecodeError) -> Self {
        match err {
            ::base64::DecodeError::InvalidByte(offset, symbol)
            | ::base64::DecodeError::InvalidLastSymbol(offset, symbol) => {
                DecodeError::InvalidSymbol { symbol, offset }
            }
            ::base64::DecodeError::InvalidLength(len) => DecodeError::InvalidLength(len),
            ::base64::DecodeError::InvalidPadding => DecodeError::InvalidPadding,
        }
    }
}

/// Number of encoded symbols needed for `decoded` bytes, `None` on overflow.
pub const fn encoded_len(decoded: usize) -> Option<usize> {
    decoded.div_ceil(3).checked_mul(4)
}

/// Decoded length of `input`, honouring up to two trailing pad symbols.
pub fn decoded_len(input: &[u8]) -> Result<usize, DecodeError> {
    if input.len() % 4 != 0 {
        return Err(DecodeError::InvalidLength(input.len()));
    }
    Ok(input.len() / 4 * 3 - padding(input))
}

fn padding(input: &[u8]) -> usize {
    match input {
        [.., PAD, PAD] => 2,
        [.., PAD] => 1,
        _ => 0,
    }
}

/// Decode `input` into `out`, returning the number of bytes written.
///
/// Fails without touching `out` when the decoded length exceeds
/// `out.len()`.
pub fn decode_into(input: &[u8], out: &mut [u8]) -> Result<usize, DecodeError> {
    let needed = decoded_len(input)?;
    if needed > out.len() {
        return Err(DecodeError::CapacityExceeded {
            needed,
            capacity: out.len(),
        });
    }

    STANDARD
        .decode_slice(input, &mut out[..needed])
        .map_err(|err| match err {
            DecodeSliceError::DecodeError(err) => err.into(),
            DecodeSliceError::OutputSliceTooSmall => DecodeError::CapacityExceeded {
                needed,
                capacity: needed,
            },
        })
}

/// Decode `input` into a new buffer of at most `capacity` bytes.
pub fn decode(input: &[u8], capacity: usize) -> Result<Vec<u8>, DecodeError> {
    let needed = decoded_len(input)?;
    if needed > capacity {
        return Err(DecodeError::CapacityExceeded { needed, capacity });
    }
    let mut out = vec![0; needed];
    let written = decode_into(input, &mut out)?;
    out.truncate(written);
    Ok(out)
}

#[cfg(test)]
pub(crate) fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_single_byte_block() {
        let mut out = [0u8; 1];
        assert_eq!(decode_into(b"QQ==", &mut out), Ok(1));
        assert_eq!(out, [b'A']);
    }

    #[test]
    fn test_decode_known_vectors() {
        assert_eq!(decode(b"aGVsbG8=", 16).unwrap(), b"hello");
        assert_eq!(decode(b"Zm9vYmFy", 16).unwrap(), b"foobar");
        assert_eq!(decode(b"Zm9vYg==", 16).unwrap(), b"foob");
        assert_eq!(decode(b"", 0).unwrap(), b"");
    }

    #[test]
    fn test_rejects_length_not_multiple_of_four() {
        for input in [&b"Q"[..], b"QQ", b"QQ=", b"aGVsbG8"] {
            assert_eq!(
                decode(input, 64),
                Err(DecodeError::InvalidLength(input.len()))
            );
        }
    }

    #[test]
    fn test_rejects_capacity_overflow_without_writing() {
        let mut out = [0xAAu8; 4];
        assert_eq!(
            decode_into(b"aGVsbG8=", &mut out),
            Err(DecodeError::CapacityExceeded {
                needed: 5,
                capacity: 4
            })
        );
        assert_eq!(out, [0xAA; 4]);
    }

    #[test]
    fn test_rejects_foreign_symbols() {
        assert_eq!(
            decode(b"aG!s", 8),
            Err(DecodeError::InvalidSymbol {
                symbol: b'!',
                offset: 2
            })
        );
        assert!(decode(&[b'a', b'G', 0xC3, b's'], 8).is_err());
    }

    #[test]
    fn test_rejects_interior_padding() {
        assert!(decode(b"QQ==QQ==", 8).is_err());
        assert!(decode(b"Q=Q=", 8).is_err());
        assert!(decode(b"Q===", 8).is_err());
    }

    #[test]
    fn test_maps_crate_errors() {
        assert_eq!(
            DecodeError::from(::base64::DecodeError::InvalidByte(3, b'*')),
            DecodeError::InvalidSymbol {
                symbol: b'*',
                offset: 3
            }
        );
        assert_eq!(
            DecodeError::from(::base64::DecodeError::InvalidPadding),
            DecodeError::InvalidPadding
        );
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(encoded_len(0), Some(0));
        assert_eq!(encoded_len(1), Some(4));
        assert_eq!(encoded_len(3), Some(4));
        assert_eq!(encoded_len(4), Some(8));
        assert_eq!(encoded_len(5), Some(8));
        assert_eq!(encoded_len(usize::MAX), None);
    }

    proptest! {
        #[test]
        fn prop_round_trip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = STANDARD.encode(&data);
            prop_assert_eq!(Some(encoded.len()), encoded_len(data.len()));
            prop_assert_eq!(decode(encoded.as_bytes(), data.len()).unwrap(), data);
        }

        #[test]
        fn prop_never_writes_past_capacity(
            data in proptest::collection::vec(any::<u8>(), 1..256),
            shortfall in 1usize..4,
        ) {
            let encoded = STANDARD.encode(&data);
            let capacity = data.len().saturating_sub(shortfall);
            let mut out = vec![0x5Au8; capacity + 8];
            let result = decode_into(encoded.as_bytes(), &mut out[..capacity]);
            let is_capacity_error = matches!(result, Err(DecodeError::CapacityExceeded { .. }));
            prop_assert!(is_capacity_error);
            prop_assert!(out.iter().all(|&b| b == 0x5A));
        }
    }
}
