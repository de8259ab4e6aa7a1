// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Link Pipeline
//!
//! One attestation run, advanced one transition at a time:
//!
//! ```text
//! INIT -> PROOFS_BUILT -> PACKET_ASSEMBLED -> PUBLISHED(seq) -> ATTESTED -> RELAYED -> DONE
//! ```
//!
//! Each transition consumes the artifact produced by the previous one. A
//! failed transition leaves the pipeline in the stage it started from and
//! nothing is rolled back. A packet that was published but never relayed is
//! re-driven with [`LinkPipeline::resume_published`].
//!
//! Clients are passed to the transition that needs them, so a pipeline that
//! stops at `ATTESTED` never needs a gateway client.

use std::fmt;

use alloy::primitives::{Address, B256};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::attestation::{
    AttestationArtifact, AttestationFetcher, AttestationKey, EmitterAddress, FetchPolicy,
    GuardianClient, SequenceNumber,
};
use crate::blockchain::{BridgeTransport, SourceChain};
use crate::config::RelayConfig;
use crate::cosmos::gateway::{GatewayTransport, TxResult};
use crate::error::{PipelineError, StageError};
use crate::packet::{ChainAddressValidator, LinkPacket, LinkPacketAssembler};
use crate::proof::{
    build_destination_proof, build_source_proof, ChainAddress, ProofSigner, SignatureProof,
};
use crate::publisher::AttestationPublisher;
use crate::relay::RelaySubmitter;

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    ProofsBuilt,
    PacketAssembled,
    Published,
    Attested,
    Relayed,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "INIT",
            Stage::ProofsBuilt => "PROOFS_BUILT",
            Stage::PacketAssembled => "PACKET_ASSEMBLED",
            Stage::Published => "PUBLISHED",
            Stage::Attested => "ATTESTED",
            Stage::Relayed => "RELAYED",
            Stage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// A transition between two stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    BuildProofs,
    Assemble,
    Publish,
    Attest,
    Relay,
}

impl Step {
    /// Stage the transition starts from.
    pub const fn from_stage(self) -> Stage {
        match self {
            Step::BuildProofs => Stage::Init,
            Step::Assemble => Stage::ProofsBuilt,
            Step::Publish => Stage::PacketAssembled,
            Step::Attest => Stage::Published,
            Step::Relay => Stage::Attested,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::BuildProofs => "build_proofs",
            Step::Assemble => "assemble",
            Step::Publish => "publish",
            Step::Attest => "attest",
            Step::Relay => "relay",
        };
        f.write_str(name)
    }
}

/// How the gateway received the VAA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Submitted(TxResult),
    /// The gateway had already consumed the VAA.
    AlreadyConsumed,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub sequence: SequenceNumber,
    /// `None` when the run was resumed from a recorded sequence.
    pub publish_tx: Option<B256>,
    pub vaa_digest: B256,
    pub relay: RelayOutcome,
}

/// The two signers of a link.
#[derive(Clone, Copy)]
pub struct LinkSigners<'a> {
    pub source: &'a dyn ProofSigner,
    pub destination: &'a dyn ProofSigner,
}

#[derive(Debug, Clone)]
struct LinkProofs {
    source_address: ChainAddress,
    destination_address: ChainAddress,
    source_proof: SignatureProof,
    destination_proof: SignatureProof,
}

#[derive(Debug, Clone, Copy)]
struct Publication {
    key: AttestationKey,
    tx_hash: Option<B256>,
}

#[derive(Debug, Clone)]
enum State {
    Init,
    ProofsBuilt(LinkProofs),
    PacketAssembled(LinkPacket),
    Published(Publication),
    Attested(Publication, AttestationArtifact),
    Relayed(Publication, AttestationArtifact, RelayOutcome),
    Done(PipelineReport),
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            State::Init => Stage::Init,
            State::ProofsBuilt(_) => Stage::ProofsBuilt,
            State::PacketAssembled(_) => Stage::PacketAssembled,
            State::Published(_) => Stage::Published,
            State::Attested(..) => Stage::Attested,
            State::Relayed(..) => Stage::Relayed,
            State::Done(_) => Stage::Done,
        }
    }
}

/// A single link attestation run.
#[derive(Debug)]
pub struct LinkPipeline {
    state: State,
    source_chain: &'static SourceChain,
    bridge_contract: Address,
    gateway_contract: String,
    destination_chain_id: String,
    assembler: LinkPacketAssembler,
    publisher: AttestationPublisher,
    fetcher: AttestationFetcher,
    submitter: RelaySubmitter,
}

impl LinkPipeline {
    /// New pipeline in `INIT`. Key material in `config` is not retained.
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            state: State::Init,
            source_chain: config.source_chain,
            bridge_contract: config.bridge_contract,
            gateway_contract: config.gateway_contract.clone(),
            destination_chain_id: config.destination_chain_id.clone(),
            assembler: LinkPacketAssembler::new(
                ChainAddressValidator::new(config.destination_prefix.clone()),
                config.destination_chain_id.clone(),
            ),
            publisher: AttestationPublisher::new(config.channel_id.clone(), config.core_contract),
            fetcher: AttestationFetcher::new(FetchPolicy {
                poll_interval: config.poll_interval,
                timeout: config.attestation_timeout,
            }),
            submitter: RelaySubmitter::new(),
        }
    }

    /// Pipeline in `PUBLISHED` for a packet already published under
    /// `sequence` by the configured bridge.
    pub fn resume_published(config: &RelayConfig, sequence: SequenceNumber) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.state = State::Published(Publication {
            key: pipeline.attestation_key(sequence),
            tx_hash: None,
        });
        info!(sequence, stage = %Stage::Published, "Resuming published packet");
        pipeline
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn packet(&self) -> Option<&LinkPacket> {
        match &self.state {
            State::PacketAssembled(packet) => Some(packet),
            _ => None,
        }
    }

    pub fn sequence(&self) -> Option<SequenceNumber> {
        match &self.state {
            State::Published(p) | State::Attested(p, _) | State::Relayed(p, ..) => {
                Some(p.key.sequence)
            }
            State::Done(report) => Some(report.sequence),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&AttestationArtifact> {
        match &self.state {
            State::Attested(_, artifact) | State::Relayed(_, artifact, _) => Some(artifact),
            _ => None,
        }
    }

    fn attestation_key(&self, sequence: SequenceNumber) -> AttestationKey {
        AttestationKey {
            chain: self.source_chain.wormhole_chain_id,
            emitter: EmitterAddress::from(self.bridge_contract),
            sequence,
        }
    }

    fn out_of_order(&self, step: Step) -> PipelineError {
        let actual = self.stage();
        PipelineError::new(
            step,
            actual,
            StageError::OutOfOrder {
                expected: step.from_stage(),
                actual,
            },
        )
    }

    fn fail(&self, step: Step, cause: impl Into<StageError>) -> PipelineError {
        let err = PipelineError::new(step, self.stage(), cause);
        tracing::error!(
            step = %err.step,
            stage = %err.halted_at,
            error = %err.source,
            "Pipeline stage failed"
        );
        err
    }

    fn advance(&mut self, state: State) {
        self.state = state;
        info!(stage = %self.stage(), "Pipeline advanced");
    }

    /// `INIT -> PROOFS_BUILT`.
    pub fn build_proofs(&mut self, signers: LinkSigners<'_>) -> Result<(), PipelineError> {
        let step = Step::BuildProofs;
        if !matches!(self.state, State::Init) {
            return Err(self.out_of_order(step));
        }

        let source_address = signers.source.address().map_err(|e| self.fail(step, e))?;
        let destination_address = signers
            .destination
            .address()
            .map_err(|e| self.fail(step, e))?;

        let source_proof = build_source_proof(&destination_address, signers.source)
            .map_err(|e| self.fail(step, e))?;
        let destination_proof = build_destination_proof(
            &source_address,
            signers.destination,
            &self.destination_chain_id,
        )
        .map_err(|e| self.fail(step, e))?;

        self.advance(State::ProofsBuilt(LinkProofs {
            source_address,
            destination_address,
            source_proof,
            destination_proof,
        }));
        Ok(())
    }

    /// `PROOFS_BUILT -> PACKET_ASSEMBLED`. Local only.
    pub fn assemble(&mut self) -> Result<(), PipelineError> {
        let State::ProofsBuilt(proofs) = &self.state else {
            return Err(self.out_of_order(Step::Assemble));
        };

        let packet = self
            .assembler
            .assemble(
                proofs.source_proof.clone(),
                proofs.destination_proof.clone(),
                self.source_chain.name,
                &proofs.source_address,
                &proofs.destination_address,
            )
            .map_err(|e| self.fail(Step::Assemble, e))?;

        self.advance(State::PacketAssembled(packet));
        Ok(())
    }

    /// `PACKET_ASSEMBLED -> PUBLISHED(seq)`.
    pub async fn publish<B>(&mut self, client: &B) -> Result<SequenceNumber, PipelineError>
    where
        B: BridgeTransport + ?Sized,
    {
        let State::PacketAssembled(packet) = &self.state else {
            return Err(self.out_of_order(Step::Publish));
        };

        let published = self
            .publisher
            .publish(packet, client, self.bridge_contract)
            .await
            .map_err(|e| self.fail(Step::Publish, e))?;

        let key = self.attestation_key(published.sequence);
        self.advance(State::Published(Publication {
            key,
            tx_hash: Some(published.tx_hash),
        }));
        Ok(published.sequence)
    }

    /// `PUBLISHED -> ATTESTED`. The only transition that retries.
    pub async fn attest<W>(
        &mut self,
        client: &W,
        cancel: &CancellationToken,
    ) -> Result<AttestationArtifact, PipelineError>
    where
        W: GuardianClient + ?Sized,
    {
        let State::Published(publication) = self.state.clone() else {
            return Err(self.out_of_order(Step::Attest));
        };

        let artifact = self
            .fetcher
            .fetch_attestation(client, &publication.key, cancel)
            .await
            .map_err(|e| self.fail(Step::Attest, e))?;

        self.advance(State::Attested(publication, artifact.clone()));
        Ok(artifact)
    }

    /// `ATTESTED -> RELAYED`. An already consumed VAA counts as relayed.
    pub async fn relay<G>(&mut self, client: &G) -> Result<(), PipelineError>
    where
        G: GatewayTransport + ?Sized,
    {
        let State::Attested(publication, artifact) = self.state.clone() else {
            return Err(self.out_of_order(Step::Relay));
        };

        let outcome = match self
            .submitter
            .submit(&artifact, client, &self.gateway_contract)
            .await
        {
            Ok(result) => RelayOutcome::Submitted(result),
            Err(e) if e.is_terminal_success() => RelayOutcome::AlreadyConsumed,
            Err(e) => return Err(self.fail(Step::Relay, e)),
        };

        self.advance(State::Relayed(publication, artifact, outcome));
        Ok(())
    }

    /// `RELAYED -> DONE`, returning the run summary.
    pub fn complete(&mut self) -> Result<PipelineReport, PipelineError> {
        let report = match &self.state {
            State::Relayed(publication, artifact, outcome) => PipelineReport {
                sequence: publication.key.sequence,
                publish_tx: publication.tx_hash,
                vaa_digest: artifact.digest(),
                relay: outcome.clone(),
            },
            State::Done(report) => return Ok(report.clone()),
            _ => {
                let actual = self.stage();
                return Err(PipelineError::new(
                    Step::Relay,
                    actual,
                    StageError::OutOfOrder {
                        expected: Stage::Relayed,
                        actual,
                    },
                ));
            }
        };

        self.advance(State::Done(report.clone()));
        Ok(report)
    }

    fn check_cancelled(&self, step: Step, cancel: &CancellationToken) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(self.fail(step, StageError::Cancelled));
        }
        Ok(())
    }

    /// Drive the pipeline from its current stage up to `ATTESTED`.
    pub async fn run_until_attested<B, W>(
        &mut self,
        signers: LinkSigners<'_>,
        bridge: &B,
        guardian: &W,
        cancel: &CancellationToken,
    ) -> Result<AttestationArtifact, PipelineError>
    where
        B: BridgeTransport + ?Sized,
        W: GuardianClient + ?Sized,
    {
        loop {
            match self.stage() {
                Stage::Init => {
                    self.check_cancelled(Step::BuildProofs, cancel)?;
                    self.build_proofs(signers)?;
                }
                Stage::ProofsBuilt => {
                    self.check_cancelled(Step::Assemble, cancel)?;
                    self.assemble()?;
                }
                Stage::PacketAssembled => {
                    self.check_cancelled(Step::Publish, cancel)?;
                    self.publish(bridge).await?;
                }
                Stage::Published => {
                    self.check_cancelled(Step::Attest, cancel)?;
                    return self.attest(guardian, cancel).await;
                }
                Stage::Attested | Stage::Relayed | Stage::Done => {
                    return self
                        .artifact()
                        .cloned()
                        .ok_or_else(|| self.out_of_order(Step::Attest));
                }
            }
        }
    }

    /// Drive the pipeline from its current stage to `DONE`.
    pub async fn run<B, W, G>(
        &mut self,
        signers: LinkSigners<'_>,
        bridge: &B,
        guardian: &W,
        gateway: &G,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError>
    where
        B: BridgeTransport + ?Sized,
        W: GuardianClient + ?Sized,
        G: GatewayTransport + ?Sized,
    {
        if self.stage() == Stage::Done {
            return self.complete();
        }

        self.run_until_attested(signers, bridge, guardian, cancel)
            .await?;

        if self.stage() == Stage::Attested {
            self.check_cancelled(Step::Relay, cancel)?;
            self.relay(gateway).await?;
        }
        self.complete()
    }
}
