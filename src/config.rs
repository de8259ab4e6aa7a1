// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! [`RelayConfig`] is built once at process start and passed by reference to
//! the pipeline. Only the binary calls [`RelayConfig::from_env`]; library code
//! never reads the environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `EVM_RPC` | Source chain JSON-RPC endpoint | Required |
//! | `EVM_PRIVATE_KEY` | Source account key (hex) | Required unless `EVM_PRIVATE_KEY_PEM_PATH` is set |
//! | `EVM_PRIVATE_KEY_PEM_PATH` | Source account key (PKCS#8 / SEC1 PEM file) | Optional |
//! | `EVM_CONTRACT` | Bridge contract address | Required |
//! | `WORMHOLE_CORE_CONTRACT` | Wormhole core contract on the source chain | Required |
//! | `SOURCE_CHAIN` | Source chain name | `polygon` |
//! | `GUARDIAN_RPC` | Guardian REST endpoint | Wormholescan testnet |
//! | `COSMWASM_CONTRACT` | Gateway contract address | Required |
//! | `IBC_CHANNEL_ID` | IBC channel towards the destination chain | Required |
//! | `DESMOS_PRIVATE_KEY` | Destination account key (hex) | Required |
//! | `DESMOS_PREFIX` | Destination bech32 prefix | `desmos` |
//! | `DESMOS_CHAIN_ID` | Chain id embedded in the amino sign document | `morpheus-apollo-3` |
//! | `POLL_INTERVAL_SECS` | Guardian poll interval | `5` |
//! | `ATTESTATION_TIMEOUT_SECS` | Maximum attestation wait | `900` |
//! | `RECEIPT_TIMEOUT_SECS` | Maximum wait for the publish receipt | `120` |
//! | `RESUME_SEQUENCE` | Re-drive an already published packet | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,relational_link_relay=debug` |

use std::{env, fmt, str::FromStr, time::Duration};

use alloy::primitives::Address;
use url::Url;

use crate::blockchain::{source_chain, SourceChain};

pub const EVM_RPC_ENV: &str = "EVM_RPC";
pub const EVM_PRIVATE_KEY_ENV: &str = "EVM_PRIVATE_KEY";
pub const EVM_PRIVATE_KEY_PEM_PATH_ENV: &str = "EVM_PRIVATE_KEY_PEM_PATH";
pub const EVM_CONTRACT_ENV: &str = "EVM_CONTRACT";
pub const WORMHOLE_CORE_CONTRACT_ENV: &str = "WORMHOLE_CORE_CONTRACT";
pub const SOURCE_CHAIN_ENV: &str = "SOURCE_CHAIN";
pub const GUARDIAN_RPC_ENV: &str = "GUARDIAN_RPC";
pub const COSMWASM_CONTRACT_ENV: &str = "COSMWASM_CONTRACT";
pub const IBC_CHANNEL_ID_ENV: &str = "IBC_CHANNEL_ID";
pub const DESMOS_PRIVATE_KEY_ENV: &str = "DESMOS_PRIVATE_KEY";
pub const DESMOS_PREFIX_ENV: &str = "DESMOS_PREFIX";
pub const DESMOS_CHAIN_ID_ENV: &str = "DESMOS_CHAIN_ID";
pub const POLL_INTERVAL_SECS_ENV: &str = "POLL_INTERVAL_SECS";
pub const ATTESTATION_TIMEOUT_SECS_ENV: &str = "ATTESTATION_TIMEOUT_SECS";
pub const RECEIPT_TIMEOUT_SECS_ENV: &str = "RECEIPT_TIMEOUT_SECS";
pub const RESUME_SEQUENCE_ENV: &str = "RESUME_SEQUENCE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SOURCE_CHAIN: &str = "polygon";
pub const DEFAULT_GUARDIAN_RPC: &str = "https://api.testnet.wormholescan.io";
pub const DEFAULT_DESMOS_PREFIX: &str = "desmos";
pub const DEFAULT_DESMOS_CHAIN_ID: &str = "morpheus-apollo-3";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_ATTESTATION_TIMEOUT: Duration = Duration::from_secs(900);
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_LOG_FILTER: &str = "info,relational_link_relay=debug";

/// Where the source account key comes from.
#[derive(Clone)]
pub enum EvmKeySource {
    Hex(SecretString),
    PemFile(String),
}

impl fmt::Debug for EvmKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvmKeySource::Hex(_) => f.write_str("Hex(<redacted>)"),
            EvmKeySource::PemFile(path) => f.debug_tuple("PemFile").field(path).finish(),
        }
    }
}

/// String holding key material. `Debug` never prints the value.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Fully typed relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub evm_rpc: Url,
    pub evm_key: EvmKeySource,
    pub bridge_contract: Address,
    /// Emitter of the `LogMessagePublished` entry for bridge sends.
    pub core_contract: Address,
    pub source_chain: &'static SourceChain,
    pub guardian_rpc: Url,
    pub gateway_contract: String,
    pub channel_id: String,
    pub destination_key: SecretString,
    pub destination_prefix: String,
    pub destination_chain_id: String,
    pub poll_interval: Duration,
    pub attestation_timeout: Duration,
    pub receipt_timeout: Duration,
    pub resume_sequence: Option<u64>,
}

impl RelayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let evm_rpc = parse_url(EVM_RPC_ENV, &required(EVM_RPC_ENV)?)?;

        let evm_key = match (get(EVM_PRIVATE_KEY_ENV), get(EVM_PRIVATE_KEY_PEM_PATH_ENV)) {
            (Some(hex), _) => EvmKeySource::Hex(SecretString::new(hex)),
            (None, Some(path)) => EvmKeySource::PemFile(path),
            (None, None) => return Err(ConfigError::Missing(EVM_PRIVATE_KEY_ENV)),
        };

        let bridge_contract = Address::from_str(required(EVM_CONTRACT_ENV)?.trim())
            .map_err(|e| ConfigError::invalid(EVM_CONTRACT_ENV, e))?;
        let core_contract = Address::from_str(required(WORMHOLE_CORE_CONTRACT_ENV)?.trim())
            .map_err(|e| ConfigError::invalid(WORMHOLE_CORE_CONTRACT_ENV, e))?;

        let chain_name = get(SOURCE_CHAIN_ENV).unwrap_or_else(|| DEFAULT_SOURCE_CHAIN.to_string());
        let source_chain = source_chain(&chain_name).ok_or_else(|| {
            ConfigError::invalid(SOURCE_CHAIN_ENV, format!("unknown chain `{chain_name}`"))
        })?;

        let guardian_rpc = parse_url(
            GUARDIAN_RPC_ENV,
            &get(GUARDIAN_RPC_ENV).unwrap_or_else(|| DEFAULT_GUARDIAN_RPC.to_string()),
        )?;

        Ok(Self {
            evm_rpc,
            evm_key,
            bridge_contract,
            core_contract,
            source_chain,
            guardian_rpc,
            gateway_contract: required(COSMWASM_CONTRACT_ENV)?,
            channel_id: required(IBC_CHANNEL_ID_ENV)?,
            destination_key: SecretString::new(required(DESMOS_PRIVATE_KEY_ENV)?),
            destination_prefix: get(DESMOS_PREFIX_ENV)
                .unwrap_or_else(|| DEFAULT_DESMOS_PREFIX.to_string()),
            destination_chain_id: get(DESMOS_CHAIN_ID_ENV)
                .unwrap_or_else(|| DEFAULT_DESMOS_CHAIN_ID.to_string()),
            poll_interval: parse_secs(POLL_INTERVAL_SECS_ENV, get(POLL_INTERVAL_SECS_ENV))?
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            attestation_timeout: parse_secs(
                ATTESTATION_TIMEOUT_SECS_ENV,
                get(ATTESTATION_TIMEOUT_SECS_ENV),
            )?
            .unwrap_or(DEFAULT_ATTESTATION_TIMEOUT),
            receipt_timeout: parse_secs(RECEIPT_TIMEOUT_SECS_ENV, get(RECEIPT_TIMEOUT_SECS_ENV))?
                .unwrap_or(DEFAULT_RECEIPT_TIMEOUT),
            resume_sequence: get(RESUME_SEQUENCE_ENV)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|e| ConfigError::invalid(RESUME_SEQUENCE_ENV, e))
                })
                .transpose()?,
        })
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::invalid(name, e))
}

fn parse_secs(name: &'static str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::invalid(name, e))?;
            if secs == 0 {
                return Err(ConfigError::invalid(name, "must be greater than zero"));
            }
            Ok(Some(Duration::from_secs(secs)))
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl fmt::Display) -> Self {
        ConfigError::Invalid {
            name,
            reason: reason.to_string(),
        }
    }
}
