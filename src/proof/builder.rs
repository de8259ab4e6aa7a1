// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Builds the two proofs of a link.
//!
//! The source proof is an EIP-191 personal signature over the destination
//! address. The destination proof is an amino signature over a zero-fee sign
//! document whose memo carries the source address.

use crate::cosmos::amino::StdSignDoc;
use crate::error::SigningError;

use super::{ChainAddress, ProofScheme, ProofSigner, SignatureProof};

/// EIP-191 personal message prefix.
pub const PERSONAL_SIGN_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Canonical personal-sign encoding of `message`: prefix, decimal byte
/// length, message.
pub fn personal_sign_plaintext(message: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(PERSONAL_SIGN_PREFIX.len() + 4 + message.len());
    out.extend_from_slice(PERSONAL_SIGN_PREFIX.as_bytes());
    out.extend_from_slice(message.len().to_string().as_bytes());
    out.extend_from_slice(message.as_bytes());
    out
}

/// Sign the destination address with the source chain key.
pub fn build_source_proof(
    destination_address: &ChainAddress,
    signer: &dyn ProofSigner,
) -> Result<SignatureProof, SigningError> {
    ensure_scheme(signer, ProofScheme::EvmPersonalSign)?;

    let plaintext = personal_sign_plaintext(destination_address.as_str());
    let pub_key = signer.derive_public_key()?;
    let signature = signer.sign(&plaintext)?;

    tracing::debug!(
        destination = %destination_address,
        "Built personal-sign source proof"
    );

    Ok(SignatureProof::new(pub_key, plaintext, signature))
}

/// Sign the attestation sign document carrying `source_address` with the
/// destination chain key.
pub fn build_destination_proof(
    source_address: &ChainAddress,
    signer: &dyn ProofSigner,
    chain_id: &str,
) -> Result<SignatureProof, SigningError> {
    ensure_scheme(signer, ProofScheme::CosmosAmino)?;

    let plaintext = StdSignDoc::attestation(chain_id, source_address.as_str())
        .to_canonical_bytes()
        .map_err(|e| SigningError::Encoding(e.to_string()))?;
    let pub_key = signer.derive_public_key()?;
    let signature = signer.sign(&plaintext)?;

    tracing::debug!(
        source = %source_address,
        chain_id = %chain_id,
        "Built amino destination proof"
    );

    Ok(SignatureProof::new(pub_key, plaintext, signature))
}

fn ensure_scheme(signer: &dyn ProofSigner, expected: ProofScheme) -> Result<(), SigningError> {
    let actual = signer.scheme();
    if actual != expected {
        return Err(SigningError::SchemeMismatch { expected, actual });
    }
    Ok(())
}
