// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Packet assembly and local validation.
//!
//! Everything here is pure: a rejected packet leaves no trace outside the
//! returned error.

use crate::blockchain::source_chain;
use crate::cosmos::address::decode_address;
use crate::cosmos::amino::StdSignDoc;
use crate::error::ValidationError;
use crate::proof::builder::personal_sign_plaintext;
use crate::proof::{ChainAddress, SignatureProof};

use super::{LinkPacket, ProofSlot};

/// Address grammar checks for both sides of a link.
pub trait AddressValidator: Send + Sync {
    fn validate_source(&self, address: &ChainAddress) -> Result<(), ValidationError>;
    fn validate_destination(&self, address: &ChainAddress) -> Result<(), ValidationError>;
}

/// Hex addresses on the source side, bech32 under a fixed prefix on the
/// destination side.
#[derive(Debug, Clone)]
pub struct ChainAddressValidator {
    destination_prefix: String,
}

impl ChainAddressValidator {
    pub fn new(destination_prefix: impl Into<String>) -> Self {
        Self {
            destination_prefix: destination_prefix.into(),
        }
    }
}

impl AddressValidator for ChainAddressValidator {
    fn validate_source(&self, address: &ChainAddress) -> Result<(), ValidationError> {
        if address.prefix != "0x" {
            return Err(ValidationError::InvalidSourceAddress(format!(
                "unexpected prefix {:?}",
                address.prefix
            )));
        }
        let hex = address
            .value
            .strip_prefix("0x")
            .ok_or_else(|| ValidationError::InvalidSourceAddress(address.value.clone()))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidSourceAddress(address.value.clone()));
        }
        Ok(())
    }

    fn validate_destination(&self, address: &ChainAddress) -> Result<(), ValidationError> {
        if address.prefix != self.destination_prefix {
            return Err(ValidationError::InvalidDestinationAddress(format!(
                "expected prefix {:?}, got {:?}",
                self.destination_prefix, address.prefix
            )));
        }
        if !address.value.starts_with(&format!("{}1", address.prefix)) {
            return Err(ValidationError::InvalidDestinationAddress(format!(
                "{} does not start with {}1",
                address.value, address.prefix
            )));
        }
        let (hrp, payload) = decode_address(&address.value).map_err(|e| {
            ValidationError::InvalidDestinationAddress(format!("{}: {}", address.value, e))
        })?;
        if hrp != address.prefix || payload.len() != 20 {
            return Err(ValidationError::InvalidDestinationAddress(
                address.value.clone(),
            ));
        }
        Ok(())
    }
}

/// Combines two proofs and their addresses into a [`LinkPacket`].
#[derive(Debug, Clone)]
pub struct LinkPacketAssembler<V = ChainAddressValidator> {
    validator: V,
    destination_chain_id: String,
}

impl<V: AddressValidator> LinkPacketAssembler<V> {
    /// `destination_chain_id` is the chain id every destination sign
    /// document must carry.
    pub fn new(validator: V, destination_chain_id: impl Into<String>) -> Self {
        Self {
            validator,
            destination_chain_id: destination_chain_id.into(),
        }
    }

    /// Validate and assemble.
    ///
    /// Checks, in order: the chain is known, both addresses are well formed,
    /// both signatures are non-empty, each proof uses the scheme of its slot,
    /// each plaintext attests the counterpart address, and each proof
    /// verifies against the address it claims. The destination plaintext
    /// must be the canonical encoding of a sign document for the configured
    /// chain id.
    pub fn assemble(
        &self,
        source_proof: SignatureProof,
        destination_proof: SignatureProof,
        source_chain_name: &str,
        source_address: &ChainAddress,
        destination_address: &ChainAddress,
    ) -> Result<LinkPacket, ValidationError> {
        let chain = source_chain(source_chain_name)
            .ok_or_else(|| ValidationError::UnknownChain(source_chain_name.to_string()))?;

        self.validator.validate_source(source_address)?;
        self.validator.validate_destination(destination_address)?;

        check_slot(ProofSlot::Source, &source_proof)?;
        check_slot(ProofSlot::Destination, &destination_proof)?;

        if source_proof.plaintext() != personal_sign_plaintext(destination_address.as_str()) {
            return Err(ValidationError::PlaintextMismatch(ProofSlot::Source));
        }
        let doc = StdSignDoc::from_canonical_bytes(destination_proof.plaintext())
            .map_err(|_| ValidationError::PlaintextMismatch(ProofSlot::Destination))?;
        let canonical = doc
            .to_canonical_bytes()
            .map_err(|e| ValidationError::Encoding(e.to_string()))?;
        if canonical != destination_proof.plaintext()
            || !doc.is_attestation()
            || doc.chain_id != self.destination_chain_id
            || doc.memo != source_address.value
        {
            return Err(ValidationError::PlaintextMismatch(ProofSlot::Destination));
        }

        source_proof
            .verify_source_link(source_address)
            .map_err(|e| ValidationError::InvalidProof {
                slot: ProofSlot::Source,
                reason: e.to_string(),
            })?;
        destination_proof
            .verify_destination_link(destination_address)
            .map_err(|e| ValidationError::InvalidProof {
                slot: ProofSlot::Destination,
                reason: e.to_string(),
            })?;

        let packet = LinkPacket::new(
            chain,
            source_address.clone(),
            source_proof,
            destination_address.clone(),
            destination_proof,
        )
        .map_err(|e| ValidationError::Encoding(e.to_string()))?;

        tracing::debug!(
            chain = chain.name,
            source = %source_address,
            destination = %destination_address,
            bytes = packet.as_bytes().len(),
            "Assembled link packet"
        );

        Ok(packet)
    }
}

fn check_slot(slot: ProofSlot, proof: &SignatureProof) -> Result<(), ValidationError> {
    if proof.signature().is_empty() {
        return Err(ValidationError::EmptySignature(slot));
    }
    let expected = slot.expected_scheme();
    if proof.scheme() != expected {
        return Err(ValidationError::SchemeMismatch {
            slot,
            expected,
            actual: proof.scheme(),
        });
    }
    Ok(())
}
