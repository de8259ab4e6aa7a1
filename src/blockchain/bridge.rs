// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bridge contract interactions on the source chain.
//!
//! The bridge exposes `sendIBCPacket(string)`, which forwards the payload to
//! the Wormhole core contract. The core contract emits `LogMessagePublished`
//! with the bridge as indexed `sender`; that entry carries the sequence
//! number the guardians sign under.

use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256},
    providers::ProviderBuilder,
    rpc::types::Log,
    sol,
    sol_types::SolEvent,
};
use async_trait::async_trait;

use crate::error::PublishError;

sol! {
    #[sol(rpc)]
    interface IBridge {
        function sendIBCPacket(string payload) external payable;
    }

    event LogMessagePublished(
        address indexed sender,
        uint64 sequence,
        uint32 nonce,
        bytes payload,
        uint8 consistencyLevel
    );
}

/// Signing HTTP provider with the recommended fillers (gas, blob gas, nonce,
/// chain id) and a wallet.
type WalletProvider = alloy::providers::fillers::FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::fillers::JoinFill<
            alloy::providers::Identity,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::GasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::BlobGasFiller,
                    alloy::providers::fillers::JoinFill<
                        alloy::providers::fillers::NonceFiller,
                        alloy::providers::fillers::ChainIdFiller,
                    >,
                >,
            >,
        >,
        alloy::providers::fillers::WalletFiller<EthereumWallet>,
    >,
    alloy::providers::RootProvider<alloy::network::Ethereum>,
>;

/// Receipt of an included bridge transaction.
#[derive(Debug, Clone)]
pub struct BridgeReceipt {
    pub tx_hash: B256,
    /// Receipt status; `false` means the transaction reverted.
    pub success: bool,
    pub logs: Vec<Log>,
}

/// Source chain client able to send the bridge's packet call.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Send `sendIBCPacket(payload)` to `bridge` and wait for inclusion.
    async fn send_packet(&self, bridge: Address, payload: String)
        -> Result<BridgeReceipt, PublishError>;
}

/// [`BridgeTransport`] over an alloy HTTP provider.
///
/// Nonces come from the provider's nonce filler, so concurrent pipelines
/// sharing one transport do not collide.
pub struct AlloyBridgeTransport {
    provider: WalletProvider,
    receipt_timeout: Duration,
}

impl AlloyBridgeTransport {
    pub fn new(rpc_url: url::Url, wallet: EthereumWallet, receipt_timeout: Duration) -> Self {
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(rpc_url);
        Self {
            provider,
            receipt_timeout,
        }
    }
}

#[async_trait]
impl BridgeTransport for AlloyBridgeTransport {
    async fn send_packet(
        &self,
        bridge: Address,
        payload: String,
    ) -> Result<BridgeReceipt, PublishError> {
        let contract = IBridge::new(bridge, self.provider.clone());

        let pending = contract
            .sendIBCPacket(payload)
            .send()
            .await
            .map_err(|e| PublishError::Transport(format!("Failed to send: {}", e)))?;

        let tx_hash = *pending.tx_hash();
        tracing::debug!(tx_hash = %tx_hash, "Bridge transaction sent, waiting for receipt");

        let receipt = tokio::time::timeout(self.receipt_timeout, pending.get_receipt())
            .await
            .map_err(|_| PublishError::Timeout(self.receipt_timeout))?
            .map_err(|e| PublishError::Transport(format!("Failed to get receipt: {}", e)))?;

        Ok(BridgeReceipt {
            tx_hash,
            success: receipt.status(),
            logs: receipt.inner.logs().to_vec(),
        })
    }
}

/// Sequence number of the single `LogMessagePublished` entry emitted by
/// `core` whose sender is `bridge`.
///
/// Topics and data are decoded from the same log entry. Entries emitted by
/// any other contract are ignored.
pub fn extract_sequence(
    receipt: &BridgeReceipt,
    core: Address,
    bridge: Address,
) -> Result<u64, PublishError> {
    let mut sequences = Vec::new();

    for log in &receipt.logs {
        if log.address() != core
            || log.topics().first() != Some(&LogMessagePublished::SIGNATURE_HASH)
        {
            continue;
        }
        let decoded = log
            .log_decode::<LogMessagePublished>()
            .map_err(|e| PublishError::LogDecode(e.to_string()))?;
        if decoded.inner.data.sender == bridge {
            sequences.push(decoded.inner.data.sequence);
        }
    }

    match sequences.as_slice() {
        [sequence] => Ok(*sequence),
        [] => Err(PublishError::MissingSequenceLog {
            tx_hash: receipt.tx_hash.to_string(),
        }),
        many => Err(PublishError::AmbiguousSequenceLog {
            tx_hash: receipt.tx_hash.to_string(),
            count: many.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes, LogData};

    const BRIDGE: Address = address!("0x1111111111111111111111111111111111111111");
    const CORE: Address = address!("0x0CBE91CF822c73C2315FB05100C2F714765d5c20");

    fn published(sender: Address, sequence: u64) -> Log {
        published_by(CORE, sender, sequence)
    }

    fn published_by(emitter: Address, sender: Address, sequence: u64) -> Log {
        let event = LogMessagePublished {
            sender,
            sequence,
            nonce: 0,
            payload: Bytes::from_static(b"{}"),
            consistencyLevel: 1,
        };
        Log {
            inner: alloy::primitives::Log {
                address: emitter,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    fn unrelated() -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: BRIDGE,
                data: LogData::new_unchecked(vec![B256::repeat_byte(0xEE)], Bytes::new()),
            },
            ..Default::default()
        }
    }

    fn receipt(logs: Vec<Log>) -> BridgeReceipt {
        BridgeReceipt {
            tx_hash: B256::repeat_byte(0xAA),
            success: true,
            logs,
        }
    }

    #[test]
    fn sequence_comes_from_matching_entry() {
        let receipt = receipt(vec![unrelated(), published(BRIDGE, 42), unrelated()]);
        assert_eq!(extract_sequence(&receipt, CORE, BRIDGE).unwrap(), 42);
    }

    #[test]
    fn other_senders_are_ignored() {
        let other = address!("0x2222222222222222222222222222222222222222");
        let receipt = receipt(vec![published(other, 9), published(BRIDGE, 10)]);
        assert_eq!(extract_sequence(&receipt, CORE, BRIDGE).unwrap(), 10);
    }

    #[test]
    fn entries_from_other_contracts_are_ignored() {
        let impostor = address!("0x3333333333333333333333333333333333333333");
        let mixed = receipt(vec![published_by(impostor, BRIDGE, 99), published(BRIDGE, 5)]);
        assert_eq!(extract_sequence(&mixed, CORE, BRIDGE).unwrap(), 5);

        let forged_only = receipt(vec![published_by(impostor, BRIDGE, 99)]);
        assert!(matches!(
            extract_sequence(&forged_only, CORE, BRIDGE),
            Err(PublishError::MissingSequenceLog { .. })
        ));
    }

    #[test]
    fn missing_log_is_an_error() {
        let receipt = receipt(vec![unrelated()]);
        assert!(matches!(
            extract_sequence(&receipt, CORE, BRIDGE),
            Err(PublishError::MissingSequenceLog { .. })
        ));
    }

    #[test]
    fn duplicate_logs_are_ambiguous() {
        let receipt = receipt(vec![published(BRIDGE, 1), published(BRIDGE, 2)]);
        assert!(matches!(
            extract_sequence(&receipt, CORE, BRIDGE),
            Err(PublishError::AmbiguousSequenceLog { count: 2, .. })
        ));
    }

    #[test]
    fn truncated_data_is_a_decode_error() {
        let mut log = published(BRIDGE, 3);
        let topics = log.inner.data.topics().to_vec();
        log.inner.data = LogData::new_unchecked(topics, Bytes::from_static(&[0u8; 8]));

        assert!(matches!(
            extract_sequence(&receipt(vec![log]), CORE, BRIDGE),
            Err(PublishError::LogDecode(_))
        ));
    }
}
