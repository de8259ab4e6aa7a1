// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Attestation Publisher
//!
//! Sends an assembled packet through the bridge contract and recovers the
//! sequence number the guardians will sign it under.
//!
//! The bridge takes one JSON string argument:
//!
//! ```text
//! {"channel_id": "<ibc channel>", "packet": "<base64 packet JSON>"}
//! ```

use alloy::primitives::{Address, B256};
use serde::Serialize;
use tracing::{info, warn};

use crate::attestation::{EmitterAddress, SequenceNumber};
use crate::blockchain::bridge::{extract_sequence, BridgeTransport};
use crate::error::PublishError;
use crate::packet::LinkPacket;

#[derive(Serialize)]
struct PublishEnvelope<'a> {
    channel_id: &'a str,
    packet: String,
}

/// Result of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    pub sequence: SequenceNumber,
    pub tx_hash: B256,
    /// The bridge contract as a Wormhole emitter.
    pub emitter: EmitterAddress,
}

/// Publishes packets on one IBC channel.
#[derive(Debug, Clone)]
pub struct AttestationPublisher {
    channel_id: String,
    core_contract: Address,
}

impl AttestationPublisher {
    /// `core_contract` is the Wormhole core contract whose
    /// `LogMessagePublished` entry carries the sequence number.
    pub fn new(channel_id: impl Into<String>, core_contract: Address) -> Self {
        Self {
            channel_id: channel_id.into(),
            core_contract,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// JSON envelope carrying the packet's wire bytes.
    pub fn envelope(&self, packet: &LinkPacket) -> Result<String, PublishError> {
        serde_json::to_string(&PublishEnvelope {
            channel_id: &self.channel_id,
            packet: packet.to_base64(),
        })
        .map_err(|e| PublishError::Encoding(e.to_string()))
    }

    /// Send `packet` to `bridge` and return the sequence number it was
    /// published under.
    pub async fn publish<B>(
        &self,
        packet: &LinkPacket,
        client: &B,
        bridge: Address,
    ) -> Result<Published, PublishError>
    where
        B: BridgeTransport + ?Sized,
    {
        let payload = self.envelope(packet)?;
        let receipt = client.send_packet(bridge, payload).await?;

        if !receipt.success {
            warn!(tx_hash = %receipt.tx_hash, "Bridge transaction reverted");
            return Err(PublishError::Reverted {
                tx_hash: receipt.tx_hash.to_string(),
            });
        }

        let sequence = extract_sequence(&receipt, self.core_contract, bridge)?;
        info!(
            tx_hash = %receipt.tx_hash,
            sequence,
            channel_id = %self.channel_id,
            "Packet published"
        );

        Ok(Published {
            sequence,
            tx_hash: receipt.tx_hash,
            emitter: EmitterAddress::from(bridge),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use alloy::primitives::{address, Bytes};
    use alloy::rpc::types::Log;
    use alloy::sol_types::SolEvent;
    use async_trait::async_trait;
    use base64ct::{Base64, Encoding};

    use crate::blockchain::bridge::{BridgeReceipt, LogMessagePublished};
    use crate::blockchain::signing::EvmKeySigner;
    use crate::cosmos::amino::CosmosKeySigner;
    use crate::packet::{ChainAddressValidator, LinkPacketAssembler};
    use crate::proof::{build_destination_proof, build_source_proof, ProofSigner};

    pub(crate) const BRIDGE: Address = address!("0x1111111111111111111111111111111111111111");
    pub(crate) const CORE: Address = address!("0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0");

    pub(crate) enum BridgeBehaviour {
        Publish(u64),
        Revert,
        Timeout,
    }

    /// Bridge fake recording every payload it is asked to send.
    pub(crate) struct FakeBridge {
        behaviour: BridgeBehaviour,
        pub(crate) calls: AtomicU32,
        pub(crate) payloads: Mutex<Vec<String>>,
    }

    impl FakeBridge {
        pub(crate) fn new(behaviour: BridgeBehaviour) -> Self {
            Self {
                behaviour,
                calls: AtomicU32::new(0),
                payloads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BridgeTransport for FakeBridge {
        async fn send_packet(
            &self,
            bridge: Address,
            payload: String,
        ) -> Result<BridgeReceipt, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(payload.clone());

            let tx_hash = B256::repeat_byte(0xAA);
            match self.behaviour {
                BridgeBehaviour::Publish(sequence) => {
                    let event = LogMessagePublished {
                        sender: bridge,
                        sequence,
                        nonce: 0,
                        payload: Bytes::from(payload.into_bytes()),
                        consistencyLevel: 1,
                    };
                    Ok(BridgeReceipt {
                        tx_hash,
                        success: true,
                        logs: vec![Log {
                            inner: alloy::primitives::Log {
                                address: CORE,
                                data: event.encode_log_data(),
                            },
                            ..Default::default()
                        }],
                    })
                }
                BridgeBehaviour::Revert => Ok(BridgeReceipt {
                    tx_hash,
                    success: false,
                    logs: Vec::new(),
                }),
                BridgeBehaviour::Timeout => Err(PublishError::Timeout(
                    std::time::Duration::from_secs(120),
                )),
            }
        }
    }

    pub(crate) fn sample_packet() -> LinkPacket {
        let evm = EvmKeySigner::from_hex(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        let cosmos = CosmosKeySigner::from_hex(&"11".repeat(32), "desmos").unwrap();
        let source = evm.address().unwrap();
        let destination = cosmos.address().unwrap();

        LinkPacketAssembler::new(ChainAddressValidator::new("desmos"), "morpheus-apollo-3")
            .assemble(
                build_source_proof(&destination, &evm).unwrap(),
                build_destination_proof(&source, &cosmos, "morpheus-apollo-3").unwrap(),
                "polygon",
                &source,
                &destination,
            )
            .unwrap()
    }

    #[test]
    fn envelope_embeds_packet_bytes_verbatim() {
        let packet = sample_packet();
        let envelope = AttestationPublisher::new("channel-0", CORE).envelope(&packet).unwrap();

        let value: serde_json::Value = serde_json::from_str(&envelope).unwrap();
        assert_eq!(value["channel_id"], "channel-0");
        let embedded = Base64::decode_vec(value["packet"].as_str().unwrap()).unwrap();
        assert_eq!(embedded, packet.as_bytes());
        assert!(envelope.starts_with(r#"{"channel_id":"channel-0","packet":""#));
    }

    #[tokio::test]
    async fn publish_returns_sequence_from_receipt() {
        let bridge = FakeBridge::new(BridgeBehaviour::Publish(31));
        let published = AttestationPublisher::new("channel-0", CORE)
            .publish(&sample_packet(), &bridge, BRIDGE)
            .await
            .unwrap();

        assert_eq!(published.sequence, 31);
        assert_eq!(published.emitter, EmitterAddress::from(BRIDGE));
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn revert_yields_error_and_no_sequence() {
        let bridge = FakeBridge::new(BridgeBehaviour::Revert);
        let result = AttestationPublisher::new("channel-0", CORE)
            .publish(&sample_packet(), &bridge, BRIDGE)
            .await;

        match result {
            Err(PublishError::Reverted { tx_hash }) => {
                assert_eq!(tx_hash, B256::repeat_byte(0xAA).to_string())
            }
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn receipt_timeout_is_surfaced() {
        let bridge = FakeBridge::new(BridgeBehaviour::Timeout);
        let result = AttestationPublisher::new("channel-0", CORE)
            .publish(&sample_packet(), &bridge, BRIDGE)
            .await;
        assert!(matches!(result, Err(PublishError::Timeout(_))));
    }
}
