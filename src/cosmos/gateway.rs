// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway contract interface on the gateway chain.
//!
//! The gateway verifies a VAA through the core Wormhole contract, archives
//! its hash and forwards the packet over IBC. A second submission of the same
//! VAA fails with the contract's `VaaAlreadyExecuted` error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error string the gateway returns for a VAA it already archived.
pub const VAA_ALREADY_EXECUTED: &str = "VaaAlreadyExecuted";

/// Gateway execute message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayExecuteMsg {
    SubmitVaa {
        /// Base64 VAA bytes
        data: String,
    },
}

/// Result of an included gateway transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    pub tx_hash: String,
    pub height: u64,
}

/// Gateway transaction failures as reported by the destination client.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The contract executed and returned an error.
    #[error("execution rejected: {raw_log}")]
    Rejected { raw_log: String },

    /// The transaction never reached the contract.
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Whether the contract refused the VAA because it was already consumed.
    pub fn is_already_executed(&self) -> bool {
        matches!(self, GatewayError::Rejected { raw_log } if raw_log.contains(VAA_ALREADY_EXECUTED))
    }
}

/// Destination chain client able to execute a contract message.
///
/// Implementations sign with the relayer account and wait for inclusion.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn execute(
        &self,
        contract: &str,
        msg: &GatewayExecuteMsg,
    ) -> Result<TxResult, GatewayError>;
}
