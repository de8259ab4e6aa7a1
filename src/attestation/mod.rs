// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Attestation
//!
//! Waiting for the guardian network to sign the published packet.
//!
//! An attestation is addressed by `(emitter chain, emitter address,
//! sequence)`. The emitter is the bridge contract, left-padded to 32 bytes.

pub mod fetcher;
pub mod guardian;
pub mod vaa;

use std::fmt;

use alloy::primitives::{Address, B256};
use base64ct::{Base64, Encoding};

use crate::error::AttestationError;

pub use fetcher::{AttestationFetcher, FetchPolicy};
pub use guardian::{FetchOutcome, GuardianClient, GuardianError, HttpGuardianClient};
pub use vaa::ParsedVaa;

/// Sequence number assigned by the core contract at publish time.
pub type SequenceNumber = u64;

/// 32-byte Wormhole emitter address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterAddress([u8; 32]);

impl EmitterAddress {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<Address> for EmitterAddress {
    fn from(address: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_slice());
        Self(bytes)
    }
}

/// 64 lowercase hex characters, no `0x`, as used in guardian REST paths.
impl fmt::Display for EmitterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&alloy::hex::encode(self.0))
    }
}

/// Key under which the guardians publish a VAA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationKey {
    pub chain: u16,
    pub emitter: EmitterAddress,
    pub sequence: SequenceNumber,
}

impl fmt::Display for AttestationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.chain, self.emitter, self.sequence)
    }
}

/// A fetched, quorum-signed VAA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationArtifact {
    bytes: Vec<u8>,
    parsed: ParsedVaa,
}

impl AttestationArtifact {
    /// Parse `bytes` and check it is the VAA for `key`.
    pub fn for_key(bytes: Vec<u8>, key: &AttestationKey) -> Result<Self, AttestationError> {
        let parsed = ParsedVaa::parse(&bytes)?;

        if parsed.emitter_chain != key.chain {
            return Err(AttestationError::Mismatch(format!(
                "emitter chain {} != {}",
                parsed.emitter_chain, key.chain
            )));
        }
        if parsed.emitter_address != *key.emitter.as_bytes() {
            return Err(AttestationError::Mismatch(format!(
                "emitter {} != {}",
                EmitterAddress::new(parsed.emitter_address),
                key.emitter
            )));
        }
        if parsed.sequence != key.sequence {
            return Err(AttestationError::Mismatch(format!(
                "sequence {} != {}",
                parsed.sequence, key.sequence
            )));
        }

        Ok(Self { bytes, parsed })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.bytes)
    }

    pub fn parsed(&self) -> &ParsedVaa {
        &self.parsed
    }

    /// Body digest signed by the guardians.
    pub fn digest(&self) -> B256 {
        self.parsed.hash
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.parsed.sequence
    }
}

/// Build a minimal single-signature VAA for tests.
#[cfg(test)]
pub(crate) fn test_vaa(
    chain: u16,
    emitter: EmitterAddress,
    sequence: u64,
    payload: &[u8],
) -> Vec<u8> {
    let mut bytes = vec![1u8];
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.push(1);
    bytes.extend_from_slice(&[0u8; 66]);
    bytes.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes.extend_from_slice(&chain.to_be_bytes());
    bytes.extend_from_slice(emitter.as_bytes());
    bytes.extend_from_slice(&sequence.to_be_bytes());
    bytes.push(1);
    bytes.extend_from_slice(payload);
    bytes
}
