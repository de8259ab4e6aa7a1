// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Guardian network client.
//!
//! Signed VAAs are served by the guardian REST API:
//!
//! ```text
//! GET {base}/v1/signed_vaa/{chain}/{emitter}/{sequence}
//! 200 {"vaaBytes": "<base64>"}
//! ```
//!
//! A 404 means the guardians have not (yet) reached quorum for the message.

use std::time::Duration;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::AttestationKey;

/// Per-request timeout for guardian queries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a single guardian query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Signed VAA bytes.
    Found(Vec<u8>),
    /// Not signed yet; ask again later.
    NotYetObserved,
    /// The network rejects the key outright.
    Unknown,
}

/// Guardian query failures.
#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    /// The query did not complete. Worth retrying.
    #[error("Guardian request failed: {0}")]
    Transport(String),

    /// The guardian answered with something that is not a VAA response.
    #[error("Guardian response malformed: {0}")]
    Malformed(String),
}

/// Attestation network client.
#[async_trait]
pub trait GuardianClient: Send + Sync {
    async fn fetch(&self, key: &AttestationKey) -> Result<FetchOutcome, GuardianError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedVaaResponse {
    vaa_bytes: String,
}

/// [`GuardianClient`] over the guardian REST API.
#[derive(Debug, Clone)]
pub struct HttpGuardianClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpGuardianClient {
    pub fn new(base_url: Url) -> Result<Self, GuardianError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GuardianError::Transport(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    fn signed_vaa_url(&self, key: &AttestationKey) -> String {
        format!(
            "{}/v1/signed_vaa/{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            key.chain,
            key.emitter,
            key.sequence
        )
    }
}

/// Outcome implied by a non-success status, or `None` when the status is
/// not a verdict on the key.
fn classify_status(status: StatusCode) -> Option<FetchOutcome> {
    if status == StatusCode::NOT_FOUND
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        Some(FetchOutcome::NotYetObserved)
    } else if status.is_client_error() {
        Some(FetchOutcome::Unknown)
    } else {
        None
    }
}

#[async_trait]
impl GuardianClient for HttpGuardianClient {
    async fn fetch(&self, key: &AttestationKey) -> Result<FetchOutcome, GuardianError> {
        let response = self
            .client
            .get(self.signed_vaa_url(key))
            .send()
            .await
            .map_err(|e| GuardianError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return classify_status(status).ok_or_else(|| {
                GuardianError::Transport(format!("HTTP {} from guardian endpoint", status))
            });
        }

        let body: SignedVaaResponse = response
            .json()
            .await
            .map_err(|e| GuardianError::Malformed(e.to_string()))?;
        let bytes = Base64::decode_vec(&body.vaa_bytes)
            .map_err(|e| GuardianError::Malformed(format!("vaaBytes: {}", e)))?;

        Ok(FetchOutcome::Found(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::EmitterAddress;

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            Some(FetchOutcome::NotYetObserved)
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(FetchOutcome::NotYetObserved)
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            Some(FetchOutcome::NotYetObserved)
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST),
            Some(FetchOutcome::Unknown)
        );
        assert_eq!(classify_status(StatusCode::MOVED_PERMANENTLY), None);
    }

    #[test]
    fn signed_vaa_path() {
        let client =
            HttpGuardianClient::new(Url::parse("https://guardian.example/").unwrap()).unwrap();
        let key = AttestationKey {
            chain: 5,
            emitter: EmitterAddress::new([0xAB; 32]),
            sequence: 12,
        };
        assert_eq!(
            client.signed_vaa_url(&key),
            format!("https://guardian.example/v1/signed_vaa/5/{}/12", "ab".repeat(32))
        );
    }

    #[test]
    fn response_body_shape() {
        let body: SignedVaaResponse = serde_json::from_str(r#"{"vaaBytes":"AQID"}"#).unwrap();
        assert_eq!(Base64::decode_vec(&body.vaa_bytes).unwrap(), vec![1, 2, 3]);
    }
}
