// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature proofs over canonical messages.
//!
//! A [`SignatureProof`] is self-contained: public key, the exact plaintext
//! that was signed and the signature. [`SignatureProof::verify`] re-checks it
//! without any other context, the same way the destination verifier does.
//!
//! Public keys are encoded for their scheme when the [`PubKey`] is built:
//! uncompressed with the `0x04` format byte for personal-sign, compressed for
//! amino. There is no conversion at verification time.

pub mod builder;

use std::fmt;

use alloy::primitives::{keccak256, Address};
use base64ct::{Base64, Encoding};
use k256::ecdsa::{signature::Verifier, RecoveryId, Signature, VerifyingKey};

use crate::cosmos::address::cosmos_address;
use crate::error::SigningError;

pub use builder::{build_destination_proof, build_source_proof};

/// Length of an uncompressed SEC1 secp256k1 key (`0x04 || x || y`).
pub const UNCOMPRESSED_KEY_LEN: usize = 65;
/// Length of a compressed SEC1 secp256k1 key (`0x02|0x03 || x`).
pub const COMPRESSED_KEY_LEN: usize = 33;

/// Signature scheme of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofScheme {
    /// EIP-191 personal message signed with an account-chain key.
    EvmPersonalSign,
    /// Amino JSON sign document signed with a Cosmos key.
    CosmosAmino,
}

impl fmt::Display for ProofScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofScheme::EvmPersonalSign => f.write_str("PERSONAL_SIGN"),
            ProofScheme::CosmosAmino => f.write_str("COSMOS_AMINO"),
        }
    }
}

/// A scheme-encoded secp256k1 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubKey {
    scheme: ProofScheme,
    bytes: Vec<u8>,
}

impl PubKey {
    /// Encode `key` the way `scheme` requires.
    pub fn encode(scheme: ProofScheme, key: &VerifyingKey) -> Self {
        let compress = scheme == ProofScheme::CosmosAmino;
        Self {
            scheme,
            bytes: key.to_encoded_point(compress).as_bytes().to_vec(),
        }
    }

    /// Wrap already-encoded key bytes, checking the length and format byte
    /// expected by `scheme`.
    pub fn from_encoded(scheme: ProofScheme, bytes: Vec<u8>) -> Result<Self, SigningError> {
        let well_formed = match scheme {
            ProofScheme::EvmPersonalSign => {
                bytes.len() == UNCOMPRESSED_KEY_LEN && bytes[0] == 0x04
            }
            ProofScheme::CosmosAmino => {
                bytes.len() == COMPRESSED_KEY_LEN && matches!(bytes[0], 0x02 | 0x03)
            }
        };
        if !well_formed {
            return Err(SigningError::InvalidPublicKey(format!(
                "{} key must be {} bytes in SEC1 {} form",
                scheme,
                match scheme {
                    ProofScheme::EvmPersonalSign => UNCOMPRESSED_KEY_LEN,
                    ProofScheme::CosmosAmino => COMPRESSED_KEY_LEN,
                },
                match scheme {
                    ProofScheme::EvmPersonalSign => "uncompressed",
                    ProofScheme::CosmosAmino => "compressed",
                }
            )));
        }
        Ok(Self { scheme, bytes })
    }

    pub fn scheme(&self) -> ProofScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.bytes)
    }

    pub fn verifying_key(&self) -> Result<VerifyingKey, SigningError> {
        VerifyingKey::from_sec1_bytes(&self.bytes)
            .map_err(|e| SigningError::InvalidPublicKey(e.to_string()))
    }

    /// EVM address of an uncompressed key: `keccak256(x || y)[12..]`.
    pub fn evm_address(&self) -> Result<Address, SigningError> {
        if self.scheme != ProofScheme::EvmPersonalSign {
            return Err(SigningError::SchemeMismatch {
                expected: ProofScheme::EvmPersonalSign,
                actual: self.scheme,
            });
        }
        let hash = keccak256(&self.bytes[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }

    /// Bech32 account address of a compressed key under `prefix`.
    pub fn cosmos_address(&self, prefix: &str) -> Result<String, SigningError> {
        if self.scheme != ProofScheme::CosmosAmino {
            return Err(SigningError::SchemeMismatch {
                expected: ProofScheme::CosmosAmino,
                actual: self.scheme,
            });
        }
        cosmos_address(prefix, &self.bytes)
    }
}

/// An address on one of the linked chains.
///
/// `prefix` is the address-format marker (`0x` for EVM, the bech32 human
/// readable part for Cosmos chains); `value` is the full textual address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAddress {
    pub prefix: String,
    pub value: String,
}

impl ChainAddress {
    pub fn new(prefix: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            value: value.into(),
        }
    }

    /// EIP-55 checksummed EVM address.
    pub fn evm(address: Address) -> Self {
        Self::new("0x", address.to_checksum(None))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A signed, independently checkable proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureProof {
    pub_key: PubKey,
    plaintext: Vec<u8>,
    signature: Vec<u8>,
}

impl SignatureProof {
    pub fn new(pub_key: PubKey, plaintext: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            pub_key,
            plaintext,
            signature,
        }
    }

    pub fn scheme(&self) -> ProofScheme {
        self.pub_key.scheme()
    }

    pub fn pub_key(&self) -> &PubKey {
        &self.pub_key
    }

    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Check the signature against the embedded key and plaintext.
    pub fn verify(&self) -> Result<(), SigningError> {
        match self.scheme() {
            ProofScheme::EvmPersonalSign => self.verify_personal_sign(),
            ProofScheme::CosmosAmino => self.verify_amino(),
        }
    }

    /// Verify, then check the embedded key controls `source_address`.
    pub fn verify_source_link(&self, source_address: &ChainAddress) -> Result<(), SigningError> {
        self.verify()?;
        let claimed: Address = source_address
            .as_str()
            .parse()
            .map_err(|e| SigningError::InvalidPublicKey(format!("Invalid EVM address: {e}")))?;
        if self.pub_key.evm_address()? != claimed {
            return Err(SigningError::InvalidPublicKey(format!(
                "key does not control {source_address}"
            )));
        }
        Ok(())
    }

    /// Verify, then check the embedded key controls `destination_address`
    /// under its bech32 prefix.
    pub fn verify_destination_link(
        &self,
        destination_address: &ChainAddress,
    ) -> Result<(), SigningError> {
        self.verify()?;
        if self.pub_key.cosmos_address(&destination_address.prefix)? != destination_address.value {
            return Err(SigningError::InvalidPublicKey(format!(
                "key does not control {destination_address}"
            )));
        }
        Ok(())
    }

    /// `r || s || v` over `keccak256(plaintext)`; the recovered key must be
    /// the embedded one.
    fn verify_personal_sign(&self) -> Result<(), SigningError> {
        if self.signature.len() != 65 {
            return Err(SigningError::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                self.signature.len()
            )));
        }
        let signature = Signature::from_slice(&self.signature[..64])
            .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;
        let v = self.signature[64];
        let parity = match v {
            27 | 28 => v - 27,
            0 | 1 => v,
            other => {
                return Err(SigningError::InvalidSignature(format!(
                    "invalid recovery byte {other}"
                )))
            }
        };
        let recovery_id = RecoveryId::from_byte(parity)
            .ok_or_else(|| SigningError::InvalidSignature("invalid recovery id".to_string()))?;

        let digest = keccak256(&self.plaintext);
        let recovered =
            VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
                .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;

        if recovered != self.pub_key.verifying_key()? {
            return Err(SigningError::InvalidSignature(
                "recovered key does not match proof key".to_string(),
            ));
        }
        Ok(())
    }

    /// 64-byte `r || s` ECDSA over `sha256(plaintext)`.
    fn verify_amino(&self) -> Result<(), SigningError> {
        let signature = Signature::from_slice(&self.signature)
            .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;
        if signature.normalize_s().is_some() {
            return Err(SigningError::InvalidSignature(
                "signature is not in low-S form".to_string(),
            ));
        }
        self.pub_key
            .verifying_key()?
            .verify(&self.plaintext, &signature)
            .map_err(|e| SigningError::InvalidSignature(e.to_string()))
    }
}

/// Signing capability for one proof scheme.
///
/// Implementations hold the key; callers pick the implementation that
/// matches the proof they need.
pub trait ProofSigner: Send + Sync {
    /// Scheme of the proofs this signer produces.
    fn scheme(&self) -> ProofScheme;

    /// Scheme-encoded public key.
    fn derive_public_key(&self) -> Result<PubKey, SigningError>;

    /// Account address controlled by this key.
    fn address(&self) -> Result<ChainAddress, SigningError>;

    /// Sign a canonical plaintext and return the scheme's signature bytes.
    fn sign(&self, plaintext: &[u8]) -> Result<Vec<u8>, SigningError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn key() -> SigningKey {
        SigningKey::from_slice(&[7u8; 32]).unwrap()
    }

    #[test]
    fn encode_uses_scheme_specific_form() {
        let vk = *key().verifying_key();

        let evm = PubKey::encode(ProofScheme::EvmPersonalSign, &vk);
        assert_eq!(evm.as_bytes().len(), UNCOMPRESSED_KEY_LEN);
        assert_eq!(evm.as_bytes()[0], 0x04);

        let cosmos = PubKey::encode(ProofScheme::CosmosAmino, &vk);
        assert_eq!(cosmos.as_bytes().len(), COMPRESSED_KEY_LEN);
        assert!(matches!(cosmos.as_bytes()[0], 0x02 | 0x03));

        assert_eq!(evm.verifying_key().unwrap(), cosmos.verifying_key().unwrap());
    }

    #[test]
    fn from_encoded_rejects_wrong_encoding() {
        let vk = *key().verifying_key();
        let compressed = PubKey::encode(ProofScheme::CosmosAmino, &vk);
        let err = PubKey::from_encoded(
            ProofScheme::EvmPersonalSign,
            compressed.as_bytes().to_vec(),
        )
        .unwrap_err();
        assert!(matches!(err, SigningError::InvalidPublicKey(_)));
    }

    #[test]
    fn address_derivation_is_scheme_bound() {
        let vk = *key().verifying_key();
        let cosmos = PubKey::encode(ProofScheme::CosmosAmino, &vk);
        assert!(matches!(
            cosmos.evm_address(),
            Err(SigningError::SchemeMismatch { .. })
        ));
    }

    #[test]
    fn evm_checksum_address() {
        let addr: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let chain_address = ChainAddress::evm(addr);
        assert_eq!(chain_address.prefix, "0x");
        assert_eq!(
            chain_address.value,
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }
}
