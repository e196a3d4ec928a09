use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::types::{
    Attestation, BeaconHeader, Block, ChainSpec, Committee, Epoch, Genesis, PendingConsolidation,
    PendingDeposit, PendingWithdrawal, ProposerDuty, RewardsData, Slot, Validator,
    ValidatorIndex, ValidatorLiveness,
};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Errors from the beacon node API.
///
/// `Transport` and 5xx `Status` errors are retried by the client; everything
/// else is terminal for the request that produced it.
#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(
        "endpoint not found (HTTP 404): {path} - this beacon node may not \
         support this API endpoint: {body}"
    )]
    NotFound { path: String, body: String },

    #[error("HTTP {status} from {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("decoding response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BeaconError {
    /// Whether the failure was a 404, meaning the resource (or the whole
    /// endpoint) does not exist on this node.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::NotFound { .. } | Self::Decode { .. } => false,
        }
    }
}

/// Standard `{"data": ...}` envelope around beacon API payloads.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Beacon node API client with retry on transient failures.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a client from the watcher configuration.
    pub fn new(cfg: &Config) -> Result<Self, BeaconError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.beacon_timeout())
            .build()
            .map_err(|source| BeaconError::Transport {
                path: "<client>".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: cfg.beacon_url.trim_end_matches('/').to_string(),
        })
    }

    /// Perform a request with up to [`MAX_ATTEMPTS`] tries and linear
    /// back-off. Only transport errors and 5xx responses are retried.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, BeaconError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                debug!(path, attempt = attempt + 1, max = MAX_ATTEMPTS, "retrying request");
            }

            let mut req = self
                .http
                .request(method.clone(), &url)
                .header("Accept", "application/json");

            if let Some(body) = body {
                req = req.json(body);
            }

            let response = match req.send().await {
                Ok(response) => response,
                Err(source) => {
                    last_err = Some(BeaconError::Transport {
                        path: path.to_string(),
                        source,
                    });
                    continue;
                }
            };

            let status = response.status();

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();

                let err = if status == StatusCode::NOT_FOUND {
                    BeaconError::NotFound {
                        path: path.to_string(),
                        body,
                    }
                } else {
                    BeaconError::Status {
                        status: status.as_u16(),
                        path: path.to_string(),
                        body,
                    }
                };

                if err.is_retryable() {
                    last_err = Some(err);
                    continue;
                }

                return Err(err);
            }

            let raw = match response.bytes().await {
                Ok(raw) => raw,
                Err(source) => {
                    last_err = Some(BeaconError::Transport {
                        path: path.to_string(),
                        source,
                    });
                    continue;
                }
            };

            return serde_json::from_slice(&raw).map_err(|source| BeaconError::Decode {
                path: path.to_string(),
                source,
            });
        }

        Err(last_err.expect("at least one attempt was made"))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BeaconError> {
        self.request(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, BeaconError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Fetch genesis information.
    pub async fn get_genesis(&self) -> Result<Genesis, BeaconError> {
        let resp: Envelope<Genesis> = self.get("/eth/v1/beacon/genesis").await?;
        Ok(resp.data)
    }

    /// Fetch the chain spec parameters.
    pub async fn get_spec(&self) -> Result<ChainSpec, BeaconError> {
        let resp: Envelope<ChainSpec> = self.get("/eth/v1/config/spec").await?;
        Ok(resp.data)
    }

    /// Fetch a block header by state id ("head", "finalized", a slot, ...).
    pub async fn get_header(&self, state_id: &str) -> Result<BeaconHeader, BeaconError> {
        let path = format!("/eth/v1/beacon/headers/{state_id}");
        let resp: Envelope<BeaconHeader> = self.get(&path).await?;
        Ok(resp.data)
    }

    /// Fetch the entire validator set. One very large response; tens of
    /// seconds on mainnet.
    pub async fn get_all_validators(&self, state_id: &str) -> Result<Vec<Validator>, BeaconError> {
        let path = format!("/eth/v1/beacon/states/{state_id}/validators");
        let resp: Envelope<Vec<Validator>> = self.get(&path).await?;
        debug!(count = resp.data.len(), "loaded full validator set");
        Ok(resp.data)
    }

    /// Fetch validators by index. Submitted as a request body so large
    /// watched sets never hit URL length limits.
    pub async fn get_validators(
        &self,
        state_id: &str,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<Validator>, BeaconError> {
        let ids: Vec<String> = indices.iter().map(ToString::to_string).collect();
        let path = format!("/eth/v1/beacon/states/{state_id}/validators");
        let resp: Envelope<Vec<Validator>> =
            self.post(&path, &serde_json::json!({ "ids": ids })).await?;
        Ok(resp.data)
    }

    /// Fetch validators by public key, also via request body.
    pub async fn get_validators_by_pubkeys(
        &self,
        state_id: &str,
        pubkeys: &[String],
    ) -> Result<Vec<Validator>, BeaconError> {
        let path = format!("/eth/v1/beacon/states/{state_id}/validators");
        debug!(count = pubkeys.len(), "fetching validators by pubkeys");
        let resp: Envelope<Vec<Validator>> = self
            .post(&path, &serde_json::json!({ "ids": pubkeys }))
            .await?;
        Ok(resp.data)
    }

    /// Fetch the proposer duties for an epoch.
    pub async fn get_proposer_duties(&self, epoch: Epoch) -> Result<Vec<ProposerDuty>, BeaconError> {
        let path = format!("/eth/v1/validator/duties/proposer/{epoch}");
        let resp: Envelope<Vec<ProposerDuty>> = self.get(&path).await?;
        Ok(resp.data)
    }

    /// Fetch a block by id. A missing block surfaces as a 404
    /// ([`BeaconError::is_missing`]).
    pub async fn get_block(&self, block_id: &str) -> Result<Block, BeaconError> {
        let path = format!("/eth/v2/beacon/blocks/{block_id}");
        let resp: Envelope<Block> = self.get(&path).await?;
        Ok(resp.data)
    }

    /// Fetch the attestations included in the block at `slot`.
    pub async fn get_attestations(&self, slot: Slot) -> Result<Vec<Attestation>, BeaconError> {
        let path = format!("/eth/v1/beacon/blocks/{slot}/attestations");
        let resp: Envelope<Vec<Attestation>> = self.get(&path).await?;
        Ok(resp.data)
    }

    /// Fetch committee rosters, optionally narrowed to an epoch or slot.
    pub async fn get_committees(
        &self,
        state_id: &str,
        epoch: Option<Epoch>,
        slot: Option<Slot>,
    ) -> Result<Vec<Committee>, BeaconError> {
        let mut path = format!("/eth/v1/beacon/states/{state_id}/committees");

        let mut params = Vec::new();
        if let Some(epoch) = epoch {
            params.push(format!("epoch={epoch}"));
        }
        if let Some(slot) = slot {
            params.push(format!("slot={slot}"));
        }
        if !params.is_empty() {
            path.push('?');
            path.push_str(&params.join("&"));
        }

        let resp: Envelope<Vec<Committee>> = self.get(&path).await?;
        Ok(resp.data)
    }

    /// Fetch liveness of the given validators over an epoch.
    pub async fn get_liveness(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<Vec<ValidatorLiveness>, BeaconError> {
        let ids: Vec<String> = indices.iter().map(ToString::to_string).collect();
        let path = format!("/eth/v1/validator/liveness/{epoch}");
        let resp: Envelope<Vec<ValidatorLiveness>> =
            self.post(&path, &serde_json::json!(ids)).await?;
        Ok(resp.data)
    }

    /// Fetch attestation rewards for the given validators over an epoch.
    pub async fn get_rewards(
        &self,
        epoch: Epoch,
        indices: &[ValidatorIndex],
    ) -> Result<RewardsData, BeaconError> {
        let ids: Vec<String> = indices.iter().map(ToString::to_string).collect();
        let path = format!("/eth/v1/beacon/rewards/attestations/{epoch}");
        let resp: Envelope<RewardsData> = self.post(&path, &serde_json::json!(ids)).await?;
        Ok(resp.data)
    }

    /// Fetch the pending deposit queue. Optional endpoint; degrades to an
    /// empty list on nodes that do not serve it.
    pub async fn get_pending_deposits(
        &self,
        state_id: &str,
    ) -> Result<Vec<PendingDeposit>, BeaconError> {
        let path = format!("/eth/v1/beacon/states/{state_id}/pending_deposits");
        match self.get::<Envelope<Vec<PendingDeposit>>>(&path).await {
            Ok(resp) => Ok(resp.data),
            Err(e) => {
                warn_optional_endpoint("pending_deposits", &e);
                Ok(Vec::new())
            }
        }
    }

    /// Fetch the pending consolidation queue. Optional endpoint.
    pub async fn get_pending_consolidations(
        &self,
        state_id: &str,
    ) -> Result<Vec<PendingConsolidation>, BeaconError> {
        let path = format!("/eth/v1/beacon/states/{state_id}/pending_consolidations");
        match self.get::<Envelope<Vec<PendingConsolidation>>>(&path).await {
            Ok(resp) => Ok(resp.data),
            Err(e) => {
                warn_optional_endpoint("pending_consolidations", &e);
                Ok(Vec::new())
            }
        }
    }

    /// Fetch the withdrawal queue. Optional endpoint.
    pub async fn get_pending_withdrawals(
        &self,
        state_id: &str,
    ) -> Result<Vec<PendingWithdrawal>, BeaconError> {
        let path = format!("/eth/v1/beacon/states/{state_id}/withdrawal_queue");
        match self.get::<Envelope<Vec<PendingWithdrawal>>>(&path).await {
            Ok(resp) => Ok(resp.data),
            Err(e) => {
                warn_optional_endpoint("withdrawal_queue", &e);
                Ok(Vec::new())
            }
        }
    }
}

fn warn_optional_endpoint(endpoint: &str, err: &BeaconError) {
    if err.is_missing() {
        debug!(endpoint, "optional endpoint not supported by this node");
    } else {
        warn!(endpoint, error = %err, "optional endpoint failed, treating as empty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_retryable() {
        // Build a reqwest error by parsing an invalid URL through the client.
        let err = reqwest::Client::new().get("http://").build().unwrap_err();
        let err = BeaconError::Transport {
            path: "/eth/v1/beacon/genesis".to_string(),
            source: err,
        };
        assert!(err.is_retryable());
        assert!(!err.is_missing());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = BeaconError::Status {
            status: 503,
            path: "/eth/v1/config/spec".to_string(),
            body: "overloaded".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_errors_are_terminal() {
        let err = BeaconError::Status {
            status: 400,
            path: "/eth/v1/config/spec".to_string(),
            body: "bad request".to_string(),
        };
        assert!(!err.is_retryable());

        let err = BeaconError::NotFound {
            path: "/eth/v2/beacon/blocks/100".to_string(),
            body: "block not found".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.is_missing());
    }

    #[test]
    fn test_not_found_message_mentions_endpoint_support() {
        let err = BeaconError::NotFound {
            path: "/eth/v1/beacon/states/head/pending_deposits".to_string(),
            body: "{}".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("may not support"));
    }

    #[test]
    fn test_envelope_decodes_validators() {
        let raw = r#"{"data": [{
            "index": "7",
            "balance": "32000000000",
            "status": "active_ongoing",
            "validator": {
                "pubkey": "0xaa",
                "withdrawal_credentials": "0x00bb",
                "effective_balance": "32000000000",
                "slashed": false,
                "activation_eligibility_epoch": "0",
                "activation_epoch": "0",
                "exit_epoch": "18446744073709551615",
                "withdrawable_epoch": "18446744073709551615"
            }
        }]}"#;

        let envelope: Envelope<Vec<Validator>> =
            serde_json::from_str(raw).expect("should decode");
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].index, 7);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let cfg = Config {
            beacon_url: "http://localhost:5052/".to_string(),
            ..Default::default()
        };
        let client = Client::new(&cfg).expect("should build");
        assert_eq!(client.base_url, "http://localhost:5052");
    }
}
