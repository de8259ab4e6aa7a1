// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `link-relay`: build, publish and attest one identity link.
//!
//! The run stops at `ATTESTED` and prints the gateway `submit_vaa` message
//! for an external Cosmos broadcaster. Setting `RESUME_SEQUENCE` skips
//! straight to the attestation wait for an already published packet.

use std::{env, process::ExitCode};

use relational_link_relay::{
    attestation::{GuardianError, HttpGuardianClient},
    blockchain::{AlloyBridgeTransport, EvmKeySigner},
    config::{ConfigError, EvmKeySource, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    cosmos::CosmosKeySigner,
    relay::RelaySubmitter,
    LinkPipeline, LinkSigners, PipelineError, RelayConfig, SigningError,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    KeyFile {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Guardian(#[from] GuardianError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to encode execute message: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "link-relay failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_evm_signer(source: &EvmKeySource) -> Result<EvmKeySigner, AppError> {
    match source {
        EvmKeySource::Hex(key) => Ok(EvmKeySigner::from_hex(key.expose())?),
        EvmKeySource::PemFile(path) => {
            let pem = std::fs::read(path).map_err(|source| AppError::KeyFile {
                path: path.clone(),
                source,
            })?;
            Ok(EvmKeySigner::from_pem(&pem)?)
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = RelayConfig::from_env()?;

    let evm_signer = load_evm_signer(&config.evm_key)?;
    let cosmos_signer = CosmosKeySigner::from_hex(
        config.destination_key.expose(),
        config.destination_prefix.clone(),
    )?;

    info!(
        source_chain = config.source_chain.name,
        bridge = %config.bridge_contract,
        core = %config.core_contract,
        channel_id = %config.channel_id,
        signer = ?evm_signer,
        "Starting link relay"
    );

    let bridge = AlloyBridgeTransport::new(
        config.evm_rpc.clone(),
        evm_signer.wallet(),
        config.receipt_timeout,
    );
    let guardian = HttpGuardianClient::new(config.guardian_rpc.clone())?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            shutdown.cancel();
        }
    });

    let mut pipeline = match config.resume_sequence {
        Some(sequence) => LinkPipeline::resume_published(&config, sequence),
        None => LinkPipeline::new(&config),
    };

    let signers = LinkSigners {
        source: &evm_signer,
        destination: &cosmos_signer,
    };
    let artifact = pipeline
        .run_until_attested(signers, &bridge, &guardian, &cancel)
        .await?;

    info!(
        sequence = artifact.sequence(),
        digest = %artifact.digest(),
        gateway = %config.gateway_contract,
        "VAA ready for gateway submission"
    );

    let msg = RelaySubmitter::execute_msg(&artifact);
    println!("{}", serde_json::to_string_pretty(&msg)?);

    Ok(())
}
