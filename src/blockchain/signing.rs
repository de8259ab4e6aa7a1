// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Source account key loading and personal-sign signing.
//!
//! Keys arrive either as hex or as PEM (PKCS#8 or SEC1). Both end up in an
//! alloy `PrivateKeySigner`, which signs the bridge transaction and the
//! personal-sign proof.

use std::fmt;

use alloy::{
    network::EthereumWallet,
    primitives::keccak256,
    signers::{local::PrivateKeySigner, SignerSync},
};
use k256::SecretKey;

use crate::error::SigningError;
use crate::proof::{ChainAddress, ProofScheme, ProofSigner, PubKey};

/// Parse a private key from PEM format to hex string.
///
/// # Arguments
/// * `pem_bytes` - The PEM-encoded private key bytes
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(SigningError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, SigningError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

/// Parse PKCS#8 DER to extract the secret key.
fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key (with or without `0x`).
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, SigningError> {
    let trimmed = private_key_hex.trim();
    let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
}

/// Create a signer from PEM-encoded private key.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, SigningError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}

/// Personal-sign proof signer backed by a local source account key.
#[derive(Clone)]
pub struct EvmKeySigner {
    inner: PrivateKeySigner,
}

impl EvmKeySigner {
    pub fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }

    pub fn from_hex(private_key_hex: &str) -> Result<Self, SigningError> {
        signer_from_hex(private_key_hex).map(Self::new)
    }

    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, SigningError> {
        signer_from_pem(pem_bytes).map(Self::new)
    }

    pub fn inner(&self) -> &PrivateKeySigner {
        &self.inner
    }

    /// Wallet for signing the bridge transaction with the same key.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.inner.clone())
    }
}

impl fmt::Debug for EvmKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmKeySigner")
            .field("address", &self.inner.address())
            .finish_non_exhaustive()
    }
}

impl ProofSigner for EvmKeySigner {
    fn scheme(&self) -> ProofScheme {
        ProofScheme::EvmPersonalSign
    }

    fn derive_public_key(&self) -> Result<PubKey, SigningError> {
        Ok(PubKey::encode(
            ProofScheme::EvmPersonalSign,
            self.inner.credential().verifying_key(),
        ))
    }

    fn address(&self) -> Result<ChainAddress, SigningError> {
        Ok(ChainAddress::evm(self.inner.address()))
    }

    /// `plaintext` is already the prefixed personal message; only the hash
    /// is signed here.
    fn sign(&self, plaintext: &[u8]) -> Result<Vec<u8>, SigningError> {
        let signature = self
            .inner
            .sign_hash_sync(&keccak256(plaintext))
            .map_err(|e| SigningError::Rejected(e.to_string()))?;
        Ok(signature.as_bytes().to_vec())
    }
}
