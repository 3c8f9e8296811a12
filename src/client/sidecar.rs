//! HTTP sidecar backend.
//!
//! The sidecar is an out-of-process service that talks to the chain on our
//! behalf:
//!
//! | Request                              | Body / answer                       |
//! |--------------------------------------|-------------------------------------|
//! | `GET  /health`                       | 200 when healthy                    |
//! | `PUT  /configure`                    | [`ConfigureRequest`] JSON           |
//! | `POST /blob`                         | `{"data": hex}` → `{"transaction_id": hex}` |
//! | `GET  /blob?transaction_id=<hex>`    | `{"data": hex}`                     |
//!
//! Hex is lower-case without a `0x` prefix. Each call is one blocking
//! request; any status other than 200 is a failure. The underlying HTTP
//! client pools connections and is safe to share across threads.

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{DaBackend, RetrievedBlob};
use crate::blob::{Blob, TxId};
use crate::config::{ConfigureRequest, SidecarConfig};
use crate::error::{DaError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct TransactionIdBody {
    #[serde(with = "hex::serde")]
    transaction_id: Vec<u8>,
}

pub struct SidecarClient {
    http:   Client,
    host:   Url,
    config: Option<ConfigureRequest>,
}

impl SidecarClient {
    /// Build a client without touching the network.
    pub fn new(config: &SidecarConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DaError::Initialization(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            host:   config.host.clone(),
            config: config.configure.clone(),
        })
    }

    /// Build a client, check the sidecar is healthy and push the configure
    /// request if the config carries one.
    pub fn connect(config: &SidecarConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.health()?;
        if client.config.is_some() {
            client.configure(None)?;
        }
        info!(host = %client.host, "connected to DA sidecar");
        Ok(client)
    }

    pub fn host(&self) -> &Url {
        &self.host
    }

    /// `host` with `path` appended as a segment. A path prefix on the host
    /// is kept: `http://h/da` serves `blob` at `http://h/da/blob`.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| DaError::Initialization(format!("sidecar host {} cannot carry a path", self.host)))?
            .pop_if_empty()
            .push(path);
        Ok(url)
    }

    /// Bind the sidecar to an account, contract and network. `None` re-sends
    /// the request the client was configured with.
    pub fn configure(&self, request: Option<&ConfigureRequest>) -> Result<()> {
        let request = request
            .or(self.config.as_ref())
            .ok_or_else(|| DaError::Initialization("no configure request to send".into()))?;
        debug!(?request, "configuring sidecar");

        let resp = self
            .http
            .put(self.endpoint("configure")?)
            .json(request)
            .send()
            .map_err(|e| DaError::Initialization(format!("failed to send configure request: {e}")))?;
        expect_ok(resp, "configure client").map_err(DaError::Initialization)?;
        Ok(())
    }
}

impl DaBackend for SidecarClient {
    fn submit(&self, blob: &Blob) -> Result<Vec<u8>> {
        debug!(len = blob.len(), "sidecar submit");
        let resp = self
            .http
            .post(self.endpoint("blob")?)
            .json(blob)
            .send()
            .map_err(|e| DaError::SubmissionFailed(format!("failed to send submit blob request: {e}")))?;
        let body: TransactionIdBody = expect_ok(resp, "submit blob")
            .map_err(DaError::SubmissionFailed)?
            .json()
            .map_err(|e| DaError::SubmissionFailed(format!("failed to decode transaction ID: {e}")))?;
        Ok(body.transaction_id)
    }

    fn get(&self, tx_id: &TxId) -> Result<RetrievedBlob> {
        let id = hex::encode(tx_id);
        debug!(transaction_id = %id, "sidecar get");
        let resp = self
            .http
            .get(self.endpoint("blob")?)
            .query(&[("transaction_id", id.as_str())])
            .send()
            .map_err(|e| DaError::RetrievalFailed(format!("failed to send get blob request: {e}")))?;
        let blob: Blob = expect_ok(resp, "get blob")
            .map_err(DaError::RetrievalFailed)?
            .json()
            .map_err(|e| DaError::RetrievalFailed(format!("failed to decode blob response: {e}")))?;
        Ok(RetrievedBlob { data: blob.data, commitment: None })
    }

    fn health(&self) -> Result<()> {
        let resp = self
            .http
            .get(self.endpoint("health")?)
            .send()
            .map_err(|e| DaError::HealthCheck(format!("failed to send health check request: {e}")))?;
        expect_ok(resp, "health check").map_err(DaError::HealthCheck)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sidecar"
    }
}

fn expect_ok(resp: Response, what: &str) -> std::result::Result<Response, String> {
    match resp.status() {
        StatusCode::OK => Ok(resp),
        status => {
            let body = resp.text().unwrap_or_default();
            Err(format!("failed to {what}, status code: {}: {body}", status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_onto_host() {
        let client = SidecarClient::new(&SidecarConfig::new("http://localhost:5888").unwrap()).unwrap();
        assert_eq!(client.endpoint("blob").unwrap().as_str(), "http://localhost:5888/blob");
        assert_eq!(client.endpoint("health").unwrap().as_str(), "http://localhost:5888/health");
    }

    #[test]
    fn endpoints_keep_host_path_prefix() {
        for host in ["http://localhost:5888/da", "http://localhost:5888/da/"] {
            let client = SidecarClient::new(&SidecarConfig::new(host).unwrap()).unwrap();
            assert_eq!(client.endpoint("blob").unwrap().as_str(), "http://localhost:5888/da/blob");
        }
        let client = SidecarClient::new(&SidecarConfig::new("http://localhost:5888/a/b").unwrap()).unwrap();
        assert_eq!(client.endpoint("health").unwrap().as_str(), "http://localhost:5888/a/b/health");
    }

    #[test]
    fn cannot_be_a_base_host_is_rejected() {
        let client = SidecarClient::new(&SidecarConfig::new("mailto:da@example.com").unwrap()).unwrap();
        assert!(matches!(client.endpoint("blob"), Err(DaError::Initialization(_))));
    }

    #[test]
    fn transaction_id_body_is_lower_hex() {
        let body: TransactionIdBody =
            serde_json::from_str(&format!(r#"{{"transaction_id":"{}"}}"#, "ab".repeat(32))).unwrap();
        assert_eq!(body.transaction_id, vec![0xAB; 32]);
        assert!(serde_json::from_str::<TransactionIdBody>(r#"{"transaction_id":"0xab"}"#).is_err());
    }

    #[test]
    fn configure_without_request_is_an_error() {
        let client = SidecarClient::new(&SidecarConfig::default()).unwrap();
        assert!(matches!(client.configure(None), Err(DaError::Initialization(_))));
    }
}
