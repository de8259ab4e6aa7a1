// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Link Relay - Cross-chain identity link attestation
//!
//! Proves that one actor controls an address on an EVM source chain and an
//! address on a Desmos-style Cosmos chain, publishes the proof through the
//! source chain's Wormhole-connected bridge contract and relays the resulting
//! VAA to the IBC gateway contract on the gateway chain.
//!
//! ## Modules
//!
//! - `proof` - Signature proofs and the `ProofSigner` capability
//! - `blockchain` - EVM source chain: keys, known chains, bridge contract
//! - `cosmos` - Destination chain: bech32 addresses, amino signing, gateway
//! - `packet` - Link packet assembly and the frozen wire encoding
//! - `publisher` - Publishing a packet and recovering its sequence number
//! - `attestation` - VAA parsing and guardian polling
//! - `relay` - Redeeming a VAA on the gateway contract
//! - `pipeline` - The staged end-to-end run

pub mod attestation;
pub mod blockchain;
pub mod config;
pub mod cosmos;
pub mod error;
pub mod packet;
pub mod pipeline;
pub mod proof;
pub mod publisher;
pub mod relay;

pub use config::RelayConfig;
pub use error::{
    AttestationError, PipelineError, PublishError, RelayError, SigningError, StageError,
    ValidationError,
};
pub use pipeline::{LinkPipeline, LinkSigners, PipelineReport, RelayOutcome, Stage, Step};
