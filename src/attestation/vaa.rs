// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! VAA v1 parsing.
//!
//! ```text
//! header:
//! 0   uint8       version
//! 1   uint32      guardian set index
//! 5   uint8       signature count
//! 6   [66]uint8   signatures (index, r, s, v)
//!
//! body:
//! 0   uint32      timestamp
//! 4   uint32      nonce
//! 8   uint16      emitter chain
//! 10  [32]uint8   emitter address
//! 42  uint64      sequence
//! 50  uint8       consistency level
//! 51  []uint8     payload
//! ```
//!
//! Signatures are not checked here; the gateway contract verifies them
//! against the current guardian set.

use alloy::primitives::{keccak256, B256};

use crate::error::AttestationError;

const HEADER_LEN: usize = 6;
const SIGNATURE_LEN: usize = 66;
const GUARDIAN_SET_INDEX_POS: usize = 1;
const LEN_SIGNER_POS: usize = 5;

const NONCE_POS: usize = 4;
const EMITTER_CHAIN_POS: usize = 8;
const EMITTER_ADDRESS_POS: usize = 10;
const SEQUENCE_POS: usize = 42;
const CONSISTENCY_LEVEL_POS: usize = 50;
const PAYLOAD_POS: usize = 51;

/// Header and body fields of a signed VAA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVaa {
    pub version: u8,
    pub guardian_set_index: u32,
    pub len_signers: u8,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: u16,
    pub emitter_address: [u8; 32],
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
    /// `keccak256(keccak256(body))`, the digest guardians sign.
    pub hash: B256,
}

impl ParsedVaa {
    pub fn parse(data: &[u8]) -> Result<Self, AttestationError> {
        if data.len() < HEADER_LEN {
            return Err(malformed(format!("{} bytes is shorter than the header", data.len())));
        }

        let version = data[0];
        let guardian_set_index = read_u32(data, GUARDIAN_SET_INDEX_POS)?;
        let len_signers = data[LEN_SIGNER_POS];

        let body_offset = HEADER_LEN + SIGNATURE_LEN * len_signers as usize;
        if body_offset + PAYLOAD_POS > data.len() {
            return Err(malformed(format!(
                "{} bytes cannot hold {} signatures and a body",
                data.len(),
                len_signers
            )));
        }
        let body = &data[body_offset..];

        let mut emitter_address = [0u8; 32];
        emitter_address.copy_from_slice(&body[EMITTER_ADDRESS_POS..SEQUENCE_POS]);

        Ok(Self {
            version,
            guardian_set_index,
            len_signers,
            timestamp: read_u32(body, 0)?,
            nonce: read_u32(body, NONCE_POS)?,
            emitter_chain: read_u16(body, EMITTER_CHAIN_POS)?,
            emitter_address,
            sequence: read_u64(body, SEQUENCE_POS)?,
            consistency_level: body[CONSISTENCY_LEVEL_POS],
            payload: body[PAYLOAD_POS..].to_vec(),
            hash: keccak256(keccak256(body)),
        })
    }
}

fn malformed(reason: String) -> AttestationError {
    AttestationError::Malformed(reason)
}

fn read_array<const N: usize>(data: &[u8], pos: usize) -> Result<[u8; N], AttestationError> {
    data.get(pos..pos + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| malformed(format!("truncated at offset {pos}")))
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16, AttestationError> {
    read_array::<2>(data, pos).map(u16::from_be_bytes)
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, AttestationError> {
    read_array::<4>(data, pos).map(u32::from_be_bytes)
}

fn read_u64(data: &[u8], pos: usize) -> Result<u64, AttestationError> {
    read_array::<8>(data, pos).map(u64::from_be_bytes)
}
