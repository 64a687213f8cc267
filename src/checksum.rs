//! Deterministic checksum substrate for desync detection.
//!
//! Peers exchange `u32` state checksums to verify they are simulating the
//! same world. That only works when every peer produces identical checksums
//! for identical states, so the std `DefaultHasher` (randomly seeded per
//! process) is useless here. This module provides FNV-1a/32: fast, simple,
//! seedless, identical on every platform.
//!
//! Checksums flow through `std::hash::Hash`, which feeds fields one by one:
//! struct padding bytes never reach the stream. Types with partially-dead
//! storage (the in-place containers) implement `Hash` by hand so only live
//! data participates.
//!
//! FNV-1a is not cryptographically secure. For state-divergence detection
//! between cooperating peers, it does not need to be.

use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::net::codec::{self, CodecError};

/// FNV-1a 32-bit offset basis.
const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime.
const FNV32_PRIME: u32 = 16_777_619;

/// A deterministic hasher using the 32-bit FNV-1a algorithm.
///
/// Results are consistent across processes, platforms, and runs.
#[derive(Debug, Clone)]
pub struct Fnv1a32Hasher {
    state: u32,
}

impl Fnv1a32Hasher {
    /// Creates a hasher at the standard offset basis.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: FNV32_OFFSET_BASIS,
        }
    }

    /// Returns the 32-bit digest accumulated so far.
    #[inline]
    #[must_use]
    pub const fn digest(&self) -> u32 {
        self.state
    }
}

impl Default for Fnv1a32Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1a32Hasher {
    #[inline]
    fn finish(&self) -> u64 {
        u64::from(self.state)
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        // FNV-1a: XOR the byte in, then multiply by the prime
        for &byte in bytes {
            self.state ^= u32::from(byte);
            self.state = self.state.wrapping_mul(FNV32_PRIME);
        }
    }
}

/// Computes the deterministic checksum of any `Hash` value.
#[must_use]
pub fn checksum_of<T: Hash + ?Sized>(value: &T) -> u32 {
    let mut hasher = Fnv1a32Hasher::new();
    value.hash(&mut hasher);
    hasher.digest()
}

/// Computes the deterministic checksum of a raw byte slice.
#[must_use]
pub fn checksum_of_bytes(bytes: &[u8]) -> u32 {
    let mut hasher = Fnv1a32Hasher::new();
    hasher.write(bytes);
    hasher.digest()
}

/// Computes a checksum by serializing the value with the crate's canonical
/// (fixed-integer) encoding and hashing the bytes.
///
/// Useful for host snapshot types whose natural identity is their serialized
/// form. Requires the state to serialize identically on every peer, which the
/// fixed-integer bincode configuration guarantees for plain-data types.
///
/// # Errors
///
/// Returns an error when the value fails to serialize.
pub fn serialized_checksum<T: Serialize>(value: &T) -> Result<u32, CodecError> {
    let bytes = codec::encode(value)?;
    Ok(checksum_of_bytes(&bytes))
}

// #########
// # TESTS #
// #########
