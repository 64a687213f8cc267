//! Binary codec for wire messages.
//!
//! Centralizes the bincode configuration so every message in the crate is
//! encoded identically: `standard()` with fixed-integer encoding. Fixed-size
//! integers matter twice over here: message sizes are predictable (no
//! variable-length surprises in bandwidth budgeting) and, more importantly,
//! the serialized form is deterministic, which the checksum substrate relies
//! on.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

fn config() -> impl bincode::config::Config {
    bincode::config::standard().with_fixed_int_encoding()
}

/// Errors from encoding or decoding.
#[derive(Debug)]
pub enum CodecError {
    /// The encoding operation failed.
    Encode(String),
    /// The decoding operation failed.
    Decode(String),
    /// The provided buffer was too small for the encoded value.
    BufferTooSmall {
        /// Bytes the encoding needed.
        required: usize,
        /// Bytes the buffer provided.
        provided: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(msg) => write!(f, "encoding failed: {msg}"),
            Self::Decode(msg) => write!(f, "decoding failed: {msg}"),
            Self::BufferTooSmall { required, provided } => {
                write!(
                    f,
                    "buffer too small: needed {required} bytes, but only {provided} provided"
                )
            },
        }
    }
}

impl std::error::Error for CodecError {}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Encodes a value into a new `Vec<u8>`.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] when serialization fails.
pub fn encode<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, config()).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Encodes a value into an existing buffer, returning the number of bytes
/// written. Avoids allocation on hot send paths.
///
/// # Errors
///
/// Returns [`CodecError::BufferTooSmall`] when the buffer cannot hold the
/// encoding, or [`CodecError::Encode`] for other serialization failures.
pub fn encode_into<T: Serialize>(value: &T, buffer: &mut [u8]) -> CodecResult<usize> {
    match bincode::serde::encode_into_slice(value, buffer, config()) {
        Ok(written) => Ok(written),
        Err(bincode::error::EncodeError::UnexpectedEnd) => {
            // bincode does not report the required size; measure it
            let required = encode(value)?.len();
            Err(CodecError::BufferTooSmall {
                required,
                provided: buffer.len(),
            })
        },
        Err(other) => Err(CodecError::Encode(other.to_string())),
    }
}

/// Decodes a value from bytes, returning it together with the number of
/// bytes consumed.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] when the bytes do not form a valid
/// encoding of `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<(T, usize)> {
    bincode::serde::decode_from_slice(bytes, config()).map_err(|e| CodecError::Decode(e.to_string()))
}

// #########
// # TESTS #
// #########

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod codec_tests {
    use super::*;

    #[test]
    fn round_trip_primitive() {
        let value: u32 = 0xDEAD_BEEF;
        let bytes = encode(&value).unwrap();
        let (decoded, consumed): (u32, usize) = decode(&bytes).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn fixed_int_encoding_is_fixed_size() {
        // With variable-length encoding these would differ in size.
        let small = encode(&1_u64).unwrap();
        let large = encode(&u64::MAX).unwrap();
        assert_eq!(small.len(), large.len());
        assert_eq!(small.len(), 8);
    }

    #[test]
    fn encode_into_reports_buffer_too_small() {
        let value: u64 = 42;
        let mut tiny = [0_u8; 2];
        match encode_into(&value, &mut tiny) {
            Err(CodecError::BufferTooSmall { required, provided }) => {
                assert_eq!(required, 8);
                assert_eq!(provided, 2);
            },
            other => panic!("expected BufferTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn encode_into_matches_encode() {
        let value: (u32, i64) = (7, -9);
        let vec = encode(&value).unwrap();
        let mut buffer = [0_u8; 64];
        let written = encode_into(&value, &mut buffer).unwrap();
        assert_eq!(&buffer[..written], vec.as_slice());
    }

    #[test]
    fn decode_rejects_garbage() {
        let result: CodecResult<(String, usize)> = decode(&[0xFF, 0xFF, 0xFF]);
        assert!(result.is_err());
    }

    #[test]
    fn encoding_is_deterministic() {
        #[derive(serde::Serialize)]
        struct Payload {
            frame: u32,
            values: [i64; 3],
        }
        let payload = Payload {
            frame: 88,
            values: [1, -2, 3],
        };
        assert_eq!(encode(&payload).unwrap(), encode(&payload).unwrap());
    }
}
