// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Amino JSON sign documents and the destination account signer.
//!
//! The sign document used for a link proof is never broadcast. It has no
//! messages, zero fee, account number and sequence, and carries the source
//! address in its memo.
//!
//! ## Canonical form
//!
//! Keys sorted lexicographically at every level, no whitespace, and `&`, `<`,
//! `>` escaped as `\u0026`, `\u003c`, `\u003e`. Struct fields below are
//! declared in sorted order so `serde_json` emits them that way.

use std::fmt;

use k256::ecdsa::{signature::Signer, Signature, SigningKey};
use serde::{Deserialize, Serialize};

use crate::error::SigningError;
use crate::proof::{ChainAddress, ProofScheme, ProofSigner, PubKey};

/// A fee coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub amount: String,
    pub denom: String,
}

/// Transaction fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: String,
}

/// Amino `StdSignDoc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignDoc {
    pub account_number: String,
    pub chain_id: String,
    pub fee: StdFee,
    pub memo: String,
    pub msgs: Vec<serde_json::Value>,
    pub sequence: String,
}

impl StdSignDoc {
    /// Zero-fee, zero-account, zero-sequence document carrying `memo`.
    pub fn attestation(chain_id: &str, memo: &str) -> Self {
        Self {
            account_number: "0".to_string(),
            chain_id: chain_id.to_string(),
            fee: StdFee {
                amount: Vec::new(),
                gas: "0".to_string(),
            },
            memo: memo.to_string(),
            msgs: Vec::new(),
            sequence: "0".to_string(),
        }
    }

    /// Whether this is an attestation container rather than a real
    /// transaction.
    pub fn is_attestation(&self) -> bool {
        self.account_number == "0"
            && self.sequence == "0"
            && self.fee.amount.is_empty()
            && self.fee.gas == "0"
            && self.msgs.is_empty()
    }

    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(escape_characters(&json).into_bytes())
    }

    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn escape_characters(json: &str) -> String {
    json.replace('&', "\\u0026")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

/// Amino proof signer backed by a local destination account key.
#[derive(Clone)]
pub struct CosmosKeySigner {
    key: SigningKey,
    prefix: String,
}

impl CosmosKeySigner {
    pub fn new(key: SigningKey, prefix: impl Into<String>) -> Self {
        Self {
            key,
            prefix: prefix.into(),
        }
    }

    /// Parse a hex secp256k1 scalar (with or without `0x`).
    pub fn from_hex(
        private_key_hex: &str,
        prefix: impl Into<String>,
    ) -> Result<Self, SigningError> {
        let trimmed = private_key_hex.trim();
        let bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::new(key, prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Debug for CosmosKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmosKeySigner")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl ProofSigner for CosmosKeySigner {
    fn scheme(&self) -> ProofScheme {
        ProofScheme::CosmosAmino
    }

    fn derive_public_key(&self) -> Result<PubKey, SigningError> {
        Ok(PubKey::encode(
            ProofScheme::CosmosAmino,
            self.key.verifying_key(),
        ))
    }

    fn address(&self) -> Result<ChainAddress, SigningError> {
        let value = self.derive_public_key()?.cosmos_address(&self.prefix)?;
        Ok(ChainAddress::new(self.prefix.clone(), value))
    }

    /// SHA-256 ECDSA; k256 always emits low-S signatures.
    fn sign(&self, plaintext: &[u8]) -> Result<Vec<u8>, SigningError> {
        let signature: Signature = self
            .key
            .try_sign(plaintext)
            .map_err(|e| SigningError::Rejected(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_serialization_is_sorted_and_compact() {
        let doc = StdSignDoc::attestation(
            "morpheus-apollo-3",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        );
        let bytes = doc.to_canonical_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"account_number":"0","chain_id":"morpheus-apollo-3","fee":{"amount":[],"gas":"0"},"memo":"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed","msgs":[],"sequence":"0"}"#
        );
    }

    #[test]
    fn html_characters_are_escaped() {
        let doc = StdSignDoc::attestation("chain", "a&b<c>d");
        let json = String::from_utf8(doc.to_canonical_bytes().unwrap()).unwrap();
        assert!(json.contains(r#""memo":"a\u0026b\u003cc\u003ed""#));

        let parsed = StdSignDoc::from_canonical_bytes(json.as_bytes()).unwrap();
        assert_eq!(parsed.memo, "a&b<c>d");
    }

    #[test]
    fn attestation_doc_is_recognised() {
        let mut doc = StdSignDoc::attestation("chain", "memo");
        assert!(doc.is_attestation());
        doc.sequence = "3".to_string();
        assert!(!doc.is_attestation());
    }

    #[test]
    fn signer_address_uses_prefix() {
        let signer = CosmosKeySigner::from_hex(&"22".repeat(32), "desmos").unwrap();
        let address = signer.address().unwrap();
        assert_eq!(address.prefix, "desmos");
        assert!(address.value.starts_with("desmos1"));
    }

    #[test]
    fn signature_is_64_bytes_low_s() {
        let signer = CosmosKeySigner::from_hex(&"22".repeat(32), "desmos").unwrap();
        let bytes = signer.sign(b"payload").unwrap();
        assert_eq!(bytes.len(), 64);
        let signature = Signature::from_slice(&bytes).unwrap();
        assert!(signature.normalize_s().is_none());
    }

    #[test]
    fn invalid_key_is_rejected() {
        assert!(matches!(
            CosmosKeySigner::from_hex(&"00".repeat(32), "desmos"),
            Err(SigningError::InvalidPrivateKey(_))
        ));
    }
}
