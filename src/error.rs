// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for the attestation pipeline.
//!
//! Each stage fails with its own error type. The pipeline wraps the first
//! failure in a [`PipelineError`] that names the stage it happened in.

use std::time::Duration;

use crate::packet::ProofSlot;
use crate::pipeline::{Stage, Step};
use crate::proof::ProofScheme;

/// Failure to produce or check a signature proof.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signer rejected the request: {0}")]
    Rejected(String),

    #[error("Signer produces {actual} proofs, expected {expected}")]
    SchemeMismatch {
        expected: ProofScheme,
        actual: ProofScheme,
    },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Failed to encode sign document: {0}")]
    Encoding(String),
}

/// Local, side-effect free rejection of a packet or one of its inputs.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown source chain: {0}")]
    UnknownChain(String),

    #[error("Invalid source address: {0}")]
    InvalidSourceAddress(String),

    #[error("Invalid destination address: {0}")]
    InvalidDestinationAddress(String),

    #[error("{0} proof carries an empty signature")]
    EmptySignature(ProofSlot),

    #[error("{slot} proof uses {actual}, expected {expected}")]
    SchemeMismatch {
        slot: ProofSlot,
        expected: ProofScheme,
        actual: ProofScheme,
    },

    #[error("{0} proof plaintext does not attest the counterpart address")]
    PlaintextMismatch(ProofSlot),

    #[error("{slot} proof does not verify: {reason}")]
    InvalidProof { slot: ProofSlot, reason: String },

    #[error("Failed to serialize packet: {0}")]
    Encoding(String),
}

/// Failure while publishing a packet on the source chain.
///
/// None of these variants carries a sequence number: a failed publish never
/// yields one.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to encode publish envelope: {0}")]
    Encoding(String),

    #[error("RPC error: {0}")]
    Transport(String),

    #[error("Timed out after {0:?} waiting for transaction receipt")]
    Timeout(Duration),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Transaction {tx_hash} emitted no LogMessagePublished entry for the bridge")]
    MissingSequenceLog { tx_hash: String },

    #[error("Transaction {tx_hash} emitted {count} LogMessagePublished entries for the bridge")]
    AmbiguousSequenceLog { tx_hash: String, count: usize },

    #[error("Failed to decode LogMessagePublished: {0}")]
    LogDecode(String),
}

/// Failure while waiting for the guardian network to sign a VAA.
#[derive(Debug, thiserror::Error)]
pub enum AttestationError {
    #[error("No attestation after {elapsed:?} ({attempts} attempts)")]
    Timeout { elapsed: Duration, attempts: u32 },

    #[error("Attestation network does not know {chain}/{emitter}/{sequence}")]
    NotFound {
        chain: u16,
        emitter: String,
        sequence: u64,
    },

    #[error("Attestation wait cancelled")]
    Cancelled,

    #[error("Malformed VAA: {0}")]
    Malformed(String),

    #[error("VAA does not match request: {0}")]
    Mismatch(String),
}

/// Failure while redeeming a VAA on the gateway contract.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The gateway already consumed this VAA. The attestation took effect.
    #[error("VAA already consumed by the gateway")]
    AlreadyConsumed,

    #[error("Gateway rejected VAA: {0}")]
    Rejected(String),

    #[error("Gateway transport error: {0}")]
    Transport(String),
}

impl RelayError {
    /// Whether this outcome means the attestation is in effect on the
    /// destination chain.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, RelayError::AlreadyConsumed)
    }
}

/// The cause of a pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Attestation(#[from] AttestationError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("pipeline is in {actual}, transition requires {expected}")]
    OutOfOrder { expected: Stage, actual: Stage },

    #[error("pipeline cancelled")]
    Cancelled,
}

/// A stage failure annotated with the step that failed and the state the
/// pipeline halted in.
#[derive(Debug, thiserror::Error)]
#[error("{step} stage failed in {halted_at}: {source}")]
pub struct PipelineError {
    pub step: Step,
    pub halted_at: Stage,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(step: Step, halted_at: Stage, source: impl Into<StageError>) -> Self {
        Self {
            step,
            halted_at,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_already_consumed_is_terminal_success() {
        assert!(RelayError::AlreadyConsumed.is_terminal_success());
        assert!(!RelayError::Rejected("boom".into()).is_terminal_success());
        assert!(!RelayError::Transport("down".into()).is_terminal_success());
    }

    #[test]
    fn pipeline_error_names_stage_and_cause() {
        let err = PipelineError::new(
            Step::Publish,
            Stage::PacketAssembled,
            PublishError::Reverted {
                tx_hash: "0xabc".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "publish stage failed in PACKET_ASSEMBLED: Transaction 0xabc reverted"
        );
        assert!(matches!(
            err.source,
            StageError::Publish(PublishError::Reverted { .. })
        ));
    }
}
