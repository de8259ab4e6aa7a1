// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Link Packet
//!
//! The packet the destination chain's profile module verifies. Its JSON shape
//! is consumed by a separately deployed verifier, so every field name and
//! `@type` / `valueType` literal below is fixed data.
//!
//! ```text
//! { sourceChainConfig, sourceAddress, sourceProof, destinationProof, destinationAddress }
//! ```
//!
//! A packet is encoded exactly once, at assembly, and the same bytes are
//! embedded in the publish envelope.

pub mod assembler;

use std::fmt;

use base64ct::{Base64, Encoding};
use serde::Serialize;

use crate::blockchain::SourceChain;
use crate::proof::{ChainAddress, ProofScheme, SignatureProof};

pub use assembler::{AddressValidator, ChainAddressValidator, LinkPacketAssembler};

pub const HEX_ADDRESS_TYPE_URL: &str = "/desmos.profiles.v3.HexAddress";
pub const SINGLE_SIGNATURE_TYPE_URL: &str = "/desmos.profiles.v3.SingleSignature";
pub const ETHSECP256K1_PUBKEY_TYPE_URL: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
pub const VALUE_TYPE_EVM_PERSONAL_SIGN: &str = "SIGNATURE_VALUE_TYPE_EVM_PERSONAL_SIGN";
pub const VALUE_TYPE_COSMOS_AMINO: &str = "SIGNATURE_VALUE_TYPE_COSMOS_AMINO";

impl ProofScheme {
    /// `@type` of the public key for this scheme.
    pub const fn pubkey_type_url(self) -> &'static str {
        match self {
            ProofScheme::EvmPersonalSign => ETHSECP256K1_PUBKEY_TYPE_URL,
            ProofScheme::CosmosAmino => SECP256K1_PUBKEY_TYPE_URL,
        }
    }

    /// `valueType` of the signature for this scheme.
    pub const fn value_type(self) -> &'static str {
        match self {
            ProofScheme::EvmPersonalSign => VALUE_TYPE_EVM_PERSONAL_SIGN,
            ProofScheme::CosmosAmino => VALUE_TYPE_COSMOS_AMINO,
        }
    }
}

/// Which side of the link a proof belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofSlot {
    Source,
    Destination,
}

impl ProofSlot {
    /// Scheme the proof in this slot must use.
    pub const fn expected_scheme(self) -> ProofScheme {
        match self {
            ProofSlot::Source => ProofScheme::EvmPersonalSign,
            ProofSlot::Destination => ProofScheme::CosmosAmino,
        }
    }
}

impl fmt::Display for ProofSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofSlot::Source => f.write_str("source"),
            ProofSlot::Destination => f.write_str("destination"),
        }
    }
}

/// An assembled, immutable link packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPacket {
    source_chain: &'static SourceChain,
    source_address: ChainAddress,
    source_proof: SignatureProof,
    destination_address: ChainAddress,
    destination_proof: SignatureProof,
    encoded: Vec<u8>,
}

impl LinkPacket {
    /// Build the packet and its wire bytes. Callers go through
    /// [`LinkPacketAssembler::assemble`], which validates the inputs first.
    pub(crate) fn new(
        source_chain: &'static SourceChain,
        source_address: ChainAddress,
        source_proof: SignatureProof,
        destination_address: ChainAddress,
        destination_proof: SignatureProof,
    ) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_vec(&WirePacket {
            source_chain_config: WireChainConfig {
                name: source_chain.name,
            },
            source_address: WireHexAddress {
                type_url: HEX_ADDRESS_TYPE_URL,
                prefix: &source_address.prefix,
                value: &source_address.value,
            },
            source_proof: WireProof::from(&source_proof),
            destination_proof: WireProof::from(&destination_proof),
            destination_address: &destination_address.value,
        })?;

        Ok(Self {
            source_chain,
            source_address,
            source_proof,
            destination_address,
            destination_proof,
            encoded,
        })
    }

    pub fn source_chain(&self) -> &'static SourceChain {
        self.source_chain
    }

    pub fn source_address(&self) -> &ChainAddress {
        &self.source_address
    }

    pub fn source_proof(&self) -> &SignatureProof {
        &self.source_proof
    }

    pub fn destination_address(&self) -> &ChainAddress {
        &self.destination_address
    }

    pub fn destination_proof(&self) -> &SignatureProof {
        &self.destination_proof
    }

    /// JSON wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.encoded)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePacket<'a> {
    source_chain_config: WireChainConfig<'a>,
    source_address: WireHexAddress<'a>,
    source_proof: WireProof,
    destination_proof: WireProof,
    destination_address: &'a str,
}

#[derive(Serialize)]
struct WireChainConfig<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct WireHexAddress<'a> {
    #[serde(rename = "@type")]
    type_url: &'static str,
    prefix: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireProof {
    pub_key: WirePubKey,
    plain_text: String,
    signature: WireSignature,
}

#[derive(Serialize)]
struct WirePubKey {
    #[serde(rename = "@type")]
    type_url: &'static str,
    key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSignature {
    #[serde(rename = "@type")]
    type_url: &'static str,
    value_type: &'static str,
    signature: String,
}

impl From<&SignatureProof> for WireProof {
    fn from(proof: &SignatureProof) -> Self {
        let scheme = proof.scheme();
        Self {
            pub_key: WirePubKey {
                type_url: scheme.pubkey_type_url(),
                key: proof.pub_key().to_base64(),
            },
            plain_text: alloy::hex::encode(proof.plaintext()),
            signature: WireSignature {
                type_url: SINGLE_SIGNATURE_TYPE_URL,
                value_type: scheme.value_type(),
                signature: Base64::encode_string(proof.signature()),
            },
        }
    }
}
