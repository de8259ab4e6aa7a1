// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Redeeming a VAA on the gateway contract.
//!
//! The gateway archives every VAA it executes. Submitting the same VAA twice
//! surfaces [`RelayError::AlreadyConsumed`], which callers treat as success.

use tracing::{info, warn};

use crate::attestation::AttestationArtifact;
use crate::cosmos::gateway::{GatewayError, GatewayExecuteMsg, GatewayTransport, TxResult};
use crate::error::RelayError;

/// Submits VAAs to the gateway contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelaySubmitter;

impl RelaySubmitter {
    pub fn new() -> Self {
        Self
    }

    /// The `submit_vaa` execute message for `artifact`.
    pub fn execute_msg(artifact: &AttestationArtifact) -> GatewayExecuteMsg {
        GatewayExecuteMsg::SubmitVaa {
            data: artifact.to_base64(),
        }
    }

    /// Submit `artifact` to `contract`. One round trip, no retry.
    pub async fn submit<G>(
        &self,
        artifact: &AttestationArtifact,
        client: &G,
        contract: &str,
    ) -> Result<TxResult, RelayError>
    where
        G: GatewayTransport + ?Sized,
    {
        let msg = Self::execute_msg(artifact);

        match client.execute(contract, &msg).await {
            Ok(result) => {
                info!(
                    tx_hash = %result.tx_hash,
                    height = result.height,
                    sequence = artifact.sequence(),
                    "VAA redeemed on gateway"
                );
                Ok(result)
            }
            Err(e) if e.is_already_executed() => {
                info!(
                    sequence = artifact.sequence(),
                    digest = %artifact.digest(),
                    "VAA already consumed by gateway"
                );
                Err(RelayError::AlreadyConsumed)
            }
            Err(GatewayError::Rejected { raw_log }) => {
                warn!(sequence = artifact.sequence(), raw_log = %raw_log, "Gateway rejected VAA");
                Err(RelayError::Rejected(raw_log))
            }
            Err(GatewayError::Transport(e)) => Err(RelayError::Transport(e)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::attestation::{test_vaa, AttestationKey, EmitterAddress};
    use crate::cosmos::gateway::VAA_ALREADY_EXECUTED;

    /// Gateway fake that archives VAAs the way the contract does.
    #[derive(Default)]
    pub(crate) struct ArchivingGateway {
        archive: Mutex<HashSet<String>>,
        pub(crate) calls: AtomicU32,
    }

    #[async_trait]
    impl GatewayTransport for ArchivingGateway {
        async fn execute(
            &self,
            _contract: &str,
            msg: &GatewayExecuteMsg,
        ) -> Result<TxResult, GatewayError> {
            let height = self.calls.fetch_add(1, Ordering::SeqCst) as u64 + 100;
            let GatewayExecuteMsg::SubmitVaa { data } = msg;
            if !self.archive.lock().unwrap().insert(data.clone()) {
                return Err(GatewayError::Rejected {
                    raw_log: format!("Generic error: {VAA_ALREADY_EXECUTED}"),
                });
            }
            Ok(TxResult {
                tx_hash: format!("TX{height}"),
                height,
            })
        }
    }

    pub(crate) fn artifact(sequence: u64) -> AttestationArtifact {
        let key = AttestationKey {
            chain: 5,
            emitter: EmitterAddress::new([0x22; 32]),
            sequence,
        };
        AttestationArtifact::for_key(test_vaa(key.chain, key.emitter, sequence, b"p"), &key)
            .unwrap()
    }

    #[tokio::test]
    async fn second_submission_is_already_consumed() {
        let gateway = ArchivingGateway::default();
        let artifact = artifact(8);
        let submitter = RelaySubmitter::new();

        let first = submitter.submit(&artifact, &gateway, "wasm1gateway").await;
        assert!(first.is_ok());

        let second = submitter
            .submit(&artifact, &gateway, "wasm1gateway")
            .await
            .unwrap_err();
        assert!(matches!(second, RelayError::AlreadyConsumed));
        assert!(second.is_terminal_success());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    struct RejectingGateway(GatewayError);

    #[async_trait]
    impl GatewayTransport for RejectingGateway {
        async fn execute(
            &self,
            _contract: &str,
            _msg: &GatewayExecuteMsg,
        ) -> Result<TxResult, GatewayError> {
            Err(match &self.0 {
                GatewayError::Rejected { raw_log } => GatewayError::Rejected {
                    raw_log: raw_log.clone(),
                },
                GatewayError::Transport(e) => GatewayError::Transport(e.clone()),
            })
        }
    }

    #[tokio::test]
    async fn other_failures_are_not_terminal() {
        let submitter = RelaySubmitter::new();

        let rejected = RejectingGateway(GatewayError::Rejected {
            raw_log: "unregistered channel".into(),
        });
        let err = submitter
            .submit(&artifact(1), &rejected, "wasm1gateway")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Rejected(_)));

        let down = RejectingGateway(GatewayError::Transport("connection refused".into()));
        let err = submitter
            .submit(&artifact(1), &down, "wasm1gateway")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
        assert!(!err.is_terminal_success());
    }

    #[test]
    fn execute_msg_carries_base64_vaa() {
        let artifact = artifact(4);
        let json = serde_json::to_value(RelaySubmitter::execute_msg(&artifact)).unwrap();
        assert_eq!(json["submit_vaa"]["data"], artifact.to_base64());
    }
}
