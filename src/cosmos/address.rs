// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bech32 account addresses.

use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::SigningError;

/// `bech32(prefix, ripemd160(sha256(compressed_key)))`.
pub fn cosmos_address(prefix: &str, compressed_key: &[u8]) -> Result<String, SigningError> {
    let hrp = Hrp::parse(prefix)
        .map_err(|e| SigningError::InvalidPublicKey(format!("Invalid bech32 prefix: {e}")))?;
    let account_id = Ripemd160::digest(Sha256::digest(compressed_key));
    bech32::encode::<Bech32>(hrp, &account_id[..])
        .map_err(|e| SigningError::InvalidPublicKey(format!("bech32 encoding failed: {e}")))
}

/// Decode a bech32 address, returning its human readable part and payload.
pub fn decode_address(address: &str) -> Result<(String, Vec<u8>), String> {
    let (hrp, data) = bech32::decode(address).map_err(|e| e.to_string())?;
    Ok((hrp.to_string(), data))
}
