//! Client configuration.
//!
//! Both backends are configured once, at construction. Configs are plain
//! serde structs so they can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "host": "http://localhost:5888",
//!   "timeout_secs": 30,
//!   "configure": {
//!     "account_id": "rollup.testnet",
//!     "secret_key": "ed25519:...",
//!     "contract_id": "blobstore.testnet",
//!     "network": "testnet",
//!     "namespace": { "version": 0, "id": 1 }
//!   }
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::namespace::Namespace;
use crate::reference::ReferenceKind;

pub const DEFAULT_SIDECAR_HOST:   &str = "http://localhost:5888";
pub const DEFAULT_TIMEOUT_SECS:   u64  = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid network: {0}")]
    InvalidNetwork(String),
    #[error("invalid host: {0}")]
    InvalidHost(#[from] url::ParseError),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Network ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Localnet,
}

impl Network {
    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet  => "mainnet",
            Network::Testnet  => "testnet",
            Network::Localnet => "localnet",
        }
    }

    pub fn rpc_endpoint(self) -> &'static str {
        match self {
            Network::Mainnet  => "https://rpc.mainnet.near.org",
            Network::Testnet  => "https://rpc.testnet.near.org",
            Network::Localnet => "http://localhost:3030",
        }
    }

    pub fn archive_endpoint(self) -> &'static str {
        match self {
            Network::Mainnet  => "https://archival-rpc.mainnet.near.org",
            Network::Testnet  => "https://archival-rpc.testnet.near.org",
            Network::Localnet => "http://localhost:3030",
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet"  => Ok(Network::Mainnet),
            "testnet"  => Ok(Network::Testnet),
            "localnet" => Ok(Network::Localnet),
            _          => Err(ConfigError::InvalidNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Network {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Sidecar ──────────────────────────────────────────────────────────────────

/// Capability bundle sent once to the sidecar via `PUT /configure`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub account_id:  String,
    pub secret_key:  String,
    pub contract_id: String,
    pub network:     Network,
    pub namespace:   Namespace,
}

// Keeps the secret key out of logs.
impl fmt::Debug for ConfigureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureRequest")
            .field("account_id", &self.account_id)
            .field("secret_key", &"<redacted>")
            .field("contract_id", &self.contract_id)
            .field("network", &self.network)
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarConfig {
    #[serde(default = "default_host")]
    pub host:           Url,
    /// Sent on connect when present; otherwise the sidecar is assumed to be
    /// configured already.
    #[serde(default)]
    pub configure:      Option<ConfigureRequest>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs:   u64,
    #[serde(default = "default_sidecar_kind")]
    pub reference_kind: ReferenceKind,
}

fn default_host() -> Url {
    Url::parse(DEFAULT_SIDECAR_HOST).expect("default sidecar host is a valid URL")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_sidecar_kind() -> ReferenceKind {
    ReferenceKind::Blob
}

fn default_native_kind() -> ReferenceKind {
    ReferenceKind::Frame
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            host:           default_host(),
            configure:      None,
            timeout_secs:   DEFAULT_TIMEOUT_SECS,
            reference_kind: default_sidecar_kind(),
        }
    }
}

impl SidecarConfig {
    /// Config for `host`; an empty string selects the default sidecar address.
    pub fn new(host: &str) -> Result<Self, ConfigError> {
        let host = if host.is_empty() { default_host() } else { Url::parse(host)? };
        Ok(Self { host, ..Self::default() })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Namespace the sidecar will be bound to, if this config binds one.
    pub fn namespace(&self) -> Namespace {
        self.configure.as_ref().map(|c| c.namespace).unwrap_or_default()
    }
}

// ── Native ───────────────────────────────────────────────────────────────────

/// Arguments for the native library's client constructor.
#[derive(Clone, Serialize, Deserialize)]
pub struct NativeConfig {
    pub account_id:     String,
    pub secret_key:     String,
    pub contract:       String,
    /// Kept as text so an unknown selector surfaces as `InvalidNetwork` at
    /// construction rather than as a parse failure of the whole file.
    pub network:        String,
    #[serde(default)]
    pub namespace:      Namespace,
    #[serde(default = "default_native_kind")]
    pub reference_kind: ReferenceKind,
}

impl fmt::Debug for NativeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeConfig")
            .field("account_id", &self.account_id)
            .field("secret_key", &"<redacted>")
            .field("contract", &self.contract)
            .field("network", &self.network)
            .field("namespace", &self.namespace)
            .field("reference_kind", &self.reference_kind)
            .finish()
    }
}

impl NativeConfig {
    pub fn new(
        account_id: impl Into<String>,
        secret_key: impl Into<String>,
        contract:   impl Into<String>,
        network:    impl Into<String>,
        namespace:  Namespace,
    ) -> Self {
        Self {
            account_id:     account_id.into(),
            secret_key:     secret_key.into(),
            contract:       contract.into(),
            network:        network.into(),
            namespace,
            reference_kind: default_native_kind(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn network(&self) -> Result<Network, ConfigError> {
        self.network.parse()
    }
}
