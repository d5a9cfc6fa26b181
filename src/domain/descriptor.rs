//! # Chain Descriptors
//!
//! Declarative chain descriptions and their endpoint resolution.
//!
//! A [`ChainDescriptor`] is the JSON-compatible input form of a chain. Its
//! endpoint specification may reference environment variables through the
//! `env:NAME` marker; resolution happens exactly once, at registry
//! construction, against an [`EnvSource`]. An absent or empty variable
//! leaves that URL unresolved rather than failing, so a deployment
//! configuring only some chains simply gets a smaller registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::chain::{ChainKind, Currency, EndpointUrls};

/// Marker prefix for environment-variable URL references.
pub const ENV_URL_PREFIX: &str = "env:";

/// Source of environment variables for `env:` URL resolution.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// Read from the process environment.
    #[default]
    Process,
    /// Read from an explicit map. Hermetic; what tests and embedders with
    /// their own configuration layer use.
    Map(HashMap<String, String>),
}

impl EnvSource {
    /// Returns the value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            Self::Process => std::env::var(name).ok(),
            Self::Map(vars) => vars.get(name).cloned(),
        }
    }
}

impl From<HashMap<String, String>> for EnvSource {
    fn from(vars: HashMap<String, String>) -> Self {
        Self::Map(vars)
    }
}

/// Endpoint specification of a chain descriptor.
///
/// Either one URL string or an object with independent `http` and `ws`
/// fields. Any URL may be an `env:NAME` reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointSpec {
    /// One URL; routed to the WebSocket slot when its resolved scheme is
    /// `ws`/`wss`, to the HTTP slot otherwise.
    Single(String),
    /// Independent per-transport URLs.
    Split {
        /// HTTP endpoint URL or `env:` reference.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        http: Option<String>,
        /// WebSocket endpoint URL or `env:` reference.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ws: Option<String>,
    },
}

impl EndpointSpec {
    /// Creates a single-URL specification.
    #[must_use]
    pub fn single(url: impl Into<String>) -> Self {
        Self::Single(url.into())
    }

    /// Creates a specification with both transport URLs.
    #[must_use]
    pub fn split(http: impl Into<String>, ws: impl Into<String>) -> Self {
        Self::Split {
            http: Some(http.into()),
            ws: Some(ws.into()),
        }
    }

    /// Creates a specification with only an HTTP URL.
    #[must_use]
    pub fn http_only(url: impl Into<String>) -> Self {
        Self::Split {
            http: Some(url.into()),
            ws: None,
        }
    }

    /// Creates a specification with only a WebSocket URL.
    #[must_use]
    pub fn ws_only(url: impl Into<String>) -> Self {
        Self::Split {
            http: None,
            ws: Some(url.into()),
        }
    }

    /// Resolves this specification to concrete URLs against `env`.
    ///
    /// A literal URL is used as-is; an `env:NAME` reference is replaced by
    /// the variable's current value. An absent variable, or a value (or
    /// literal) that is empty, leaves that slot unresolved. The two fields
    /// of the split form resolve independently.
    #[must_use]
    pub fn resolve_with(&self, env: &EnvSource) -> EndpointUrls {
        match self {
            Self::Single(raw) => match resolve_url(raw, env) {
                Some(url) if is_ws_url(&url) => EndpointUrls::new(None, Some(url)),
                Some(url) => EndpointUrls::new(Some(url), None),
                None => EndpointUrls::default(),
            },
            Self::Split { http, ws } => EndpointUrls::new(
                http.as_deref().and_then(|raw| resolve_url(raw, env)),
                ws.as_deref().and_then(|raw| resolve_url(raw, env)),
            ),
        }
    }

    /// Resolves against the process environment.
    #[must_use]
    pub fn resolve(&self) -> EndpointUrls {
        self.resolve_with(&EnvSource::Process)
    }
}

fn resolve_url(raw: &str, env: &EnvSource) -> Option<String> {
    let value = match raw.strip_prefix(ENV_URL_PREFIX) {
        Some(name) => env.get(name)?,
        None => raw.to_owned(),
    };
    if value.is_empty() { None } else { Some(value) }
}

fn is_ws_url(url: &str) -> bool {
    url.starts_with("ws://") || url.starts_with("wss://")
}

/// Declarative description of one chain.
///
/// The input form of a [`Chain`](super::chain::Chain); immutable, and
/// JSON-compatible with the schema
/// `{ id, chainId, type, url, currency, mainnet? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// String identifier, unique within one registry.
    pub id: String,
    /// Numeric chain id, unique within one registry.
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    /// Chain category.
    #[serde(rename = "type")]
    pub kind: ChainKind,
    /// Endpoint specification, resolved once at registry construction.
    pub url: EndpointSpec,
    /// Native currency metadata.
    pub currency: Currency,
    /// For testnets, the string identifier of the associated mainnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mainnet: Option<String>,
}

impl ChainDescriptor {
    /// Creates a descriptor with no mainnet reference.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        chain_id: u64,
        kind: ChainKind,
        url: EndpointSpec,
        currency: Currency,
    ) -> Self {
        Self {
            id: id.into(),
            chain_id,
            kind,
            url,
            currency,
            mainnet: None,
        }
    }

    /// Sets the mainnet reference, for testnet descriptors.
    #[must_use]
    pub fn with_mainnet(mut self, mainnet: impl Into<String>) -> Self {
        self.mainnet = Some(mainnet.into());
        self
    }
}
