// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Attestation Fetcher
//!
//! Polls the guardian network until the VAA for a published packet exists.
//!
//! ## Strategy
//!
//! Every `poll_interval` the fetcher:
//! 1. Checks the cancellation token.
//! 2. Queries the guardians once.
//! 3. Returns the VAA on `Found`, fails on `Unknown`, and otherwise sleeps
//!    until the next attempt or the deadline, whichever comes first.
//!
//! Transport failures are logged and retried like "not yet observed".

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_ATTESTATION_TIMEOUT, DEFAULT_POLL_INTERVAL};
use crate::error::AttestationError;

use super::guardian::{FetchOutcome, GuardianClient, GuardianError};
use super::{AttestationArtifact, AttestationKey};

/// Poll cadence and overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_ATTESTATION_TIMEOUT,
        }
    }
}

/// Waits for the guardian quorum to sign a published packet.
#[derive(Debug, Clone, Default)]
pub struct AttestationFetcher {
    policy: FetchPolicy,
}

impl AttestationFetcher {
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Poll `client` for the VAA under `key` until it is found, the network
    /// reports the key unknown, the deadline passes, or `cancel` fires.
    pub async fn fetch_attestation<C>(
        &self,
        client: &C,
        key: &AttestationKey,
        cancel: &CancellationToken,
    ) -> Result<AttestationArtifact, AttestationError>
    where
        C: GuardianClient + ?Sized,
    {
        let started = Instant::now();
        let deadline = started + self.policy.timeout;
        let mut attempts: u32 = 0;

        info!(
            key = %key,
            interval_secs = self.policy.poll_interval.as_secs(),
            timeout_secs = self.policy.timeout.as_secs(),
            "Waiting for guardian attestation"
        );

        loop {
            if cancel.is_cancelled() {
                info!(key = %key, attempts, "Attestation wait cancelled");
                return Err(AttestationError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(AttestationError::Timeout {
                    elapsed: started.elapsed(),
                    attempts,
                });
            }

            attempts += 1;
            debug!(key = %key, attempt = attempts, "Polling guardians");

            // A request in flight never outlives the deadline.
            let outcome = tokio::select! {
                outcome = tokio::time::timeout_at(deadline, client.fetch(key)) => match outcome {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        return Err(AttestationError::Timeout {
                            elapsed: started.elapsed(),
                            attempts,
                        });
                    }
                },
                _ = cancel.cancelled() => {
                    info!(key = %key, attempts, "Attestation wait cancelled");
                    return Err(AttestationError::Cancelled);
                }
            };

            match outcome {
                Ok(FetchOutcome::Found(bytes)) => {
                    let artifact = AttestationArtifact::for_key(bytes, key)?;
                    info!(
                        key = %key,
                        attempts,
                        digest = %artifact.digest(),
                        "Guardian attestation received"
                    );
                    return Ok(artifact);
                }
                Ok(FetchOutcome::NotYetObserved) => {
                    debug!(key = %key, attempt = attempts, "Not yet observed");
                }
                Ok(FetchOutcome::Unknown) => {
                    return Err(AttestationError::NotFound {
                        chain: key.chain,
                        emitter: key.emitter.to_string(),
                        sequence: key.sequence,
                    });
                }
                Err(GuardianError::Transport(e)) => {
                    warn!(
                        key = %key,
                        attempt = attempts,
                        error = %e,
                        "Guardian query failed, retrying"
                    );
                }
                Err(GuardianError::Malformed(e)) => {
                    return Err(AttestationError::Malformed(e));
                }
            }

            let wake = (Instant::now() + self.policy.poll_interval).min(deadline);
            tokio::select! {
                _ = tokio::time::sleep_until(wake) => {},
                _ = cancel.cancelled() => {
                    info!(key = %key, attempts, "Attestation wait cancelled");
                    return Err(AttestationError::Cancelled);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::attestation::{test_vaa, EmitterAddress};

    /// Guardian fake that replays a script, then reports "not yet observed".
    pub(crate) struct ScriptedGuardian {
        script: Mutex<VecDeque<Result<FetchOutcome, GuardianError>>>,
        pub(crate) calls: AtomicU32,
        pub(crate) call_times: Mutex<Vec<Instant>>,
    }

    impl ScriptedGuardian {
        pub(crate) fn new(script: Vec<Result<FetchOutcome, GuardianError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                call_times: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GuardianClient for ScriptedGuardian {
        async fn fetch(&self, _key: &AttestationKey) -> Result<FetchOutcome, GuardianError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().unwrap().push(Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(FetchOutcome::NotYetObserved))
        }
    }

    fn key() -> AttestationKey {
        AttestationKey {
            chain: 5,
            emitter: EmitterAddress::new([0x11; 32]),
            sequence: 3,
        }
    }

    fn fetcher(interval_secs: u64, timeout_secs: u64) -> AttestationFetcher {
        AttestationFetcher::new(FetchPolicy {
            poll_interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn third_poll_returns_artifact_at_interval_spacing() {
        let key = key();
        let vaa = test_vaa(key.chain, key.emitter, key.sequence, b"packet");
        let guardian = ScriptedGuardian::new(vec![
            Ok(FetchOutcome::NotYetObserved),
            Ok(FetchOutcome::NotYetObserved),
            Ok(FetchOutcome::Found(vaa.clone())),
        ]);

        let artifact = fetcher(5, 60)
            .fetch_attestation(&guardian, &key, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(artifact.as_bytes(), vaa.as_slice());
        assert_eq!(guardian.calls.load(Ordering::SeqCst), 3);

        let times = guardian.call_times.lock().unwrap();
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_secs(5) && gap < Duration::from_millis(5_010));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_deadline() {
        let guardian = ScriptedGuardian::new(Vec::new());

        let err = fetcher(5, 12)
            .fetch_attestation(&guardian, &key(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            AttestationError::Timeout { elapsed, attempts } => {
                assert_eq!(attempts, 3);
                assert!(elapsed >= Duration::from_secs(12) && elapsed < Duration::from_secs(13));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    /// Guardian whose requests take `delay` before reporting "not yet observed".
    struct SlowGuardian {
        delay: Duration,
        calls: AtomicU32,
    }

    #[async_trait]
    impl GuardianClient for SlowGuardian {
        async fn fetch(&self, _key: &AttestationKey) -> Result<FetchOutcome, GuardianError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(FetchOutcome::NotYetObserved)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_is_cut_off_at_deadline() {
        let guardian = SlowGuardian {
            delay: Duration::from_secs(15),
            calls: AtomicU32::new(0),
        };

        // The first request alone would run 3s past the deadline.
        let err = fetcher(10, 12)
            .fetch_attestation(&guardian, &key(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            AttestationError::Timeout { elapsed, attempts } => {
                assert_eq!(attempts, 1);
                assert!(elapsed >= Duration::from_secs(12) && elapsed < Duration::from_secs(13));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(guardian.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_sequence_is_not_found_without_retry() {
        let guardian = ScriptedGuardian::new(vec![Ok(FetchOutcome::Unknown)]);

        let err = fetcher(5, 60)
            .fetch_attestation(&guardian, &key(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationError::NotFound { sequence: 3, .. }));
        assert_eq!(guardian.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_are_retried() {
        let key = key();
        let guardian = ScriptedGuardian::new(vec![
            Err(GuardianError::Transport("connection reset".into())),
            Ok(FetchOutcome::Found(test_vaa(key.chain, key.emitter, key.sequence, b""))),
        ]);

        fetcher(5, 60)
            .fetch_attestation(&guardian, &key, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(guardian.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_wait() {
        let guardian = ScriptedGuardian::new(Vec::new());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.cancel();
        });

        let err = fetcher(5, 60)
            .fetch_attestation(&guardian, &key(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationError::Cancelled));
        assert_eq!(guardian.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_calls() {
        let guardian = ScriptedGuardian::new(Vec::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetcher(5, 60)
            .fetch_attestation(&guardian, &key(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationError::Cancelled));
        assert_eq!(guardian.calls.load(Ordering::SeqCst), 0);
    }
}
