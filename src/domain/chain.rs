//! # Resolved Chain Model
//!
//! Types describing a usable blockchain network after endpoint resolution.
//!
//! A [`Chain`] is created exclusively during registry construction and is
//! immutable afterwards. Mainnets carry the resolved lists of their testnets
//! and of all localnets; testnets carry a back-reference to their mainnet.
//! The association graph is wired once, in the registry's second
//! construction pass, and holds `Weak` back-edges so the graph stays
//! acyclic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use super::descriptor::ChainDescriptor;
use super::transport::Transport;

/// The three chain categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    /// A production network.
    Mainnet,
    /// A test network associated with a mainnet.
    Testnet,
    /// A local development network.
    Localnet,
}

impl ChainKind {
    /// Returns the kind name as used in descriptor schemas.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Localnet => "localnet",
        }
    }

    /// Returns true for mainnet chains.
    #[must_use]
    pub const fn is_mainnet(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    /// Returns true for testnet chains.
    #[must_use]
    pub const fn is_testnet(&self) -> bool {
        matches!(self, Self::Testnet)
    }

    /// Returns true for localnet chains.
    #[must_use]
    pub const fn is_localnet(&self) -> bool {
        matches!(self, Self::Localnet)
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Native currency metadata for a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Full currency name, e.g. `"Ether"`.
    pub name: String,
    /// Ticker symbol, e.g. `"ETH"`.
    pub symbol: String,
    /// Number of decimal places of the base unit.
    pub decimals: u8,
}

impl Currency {
    /// Creates currency metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Resolved endpoint URLs for a chain, at most one per transport.
///
/// At least one of the two slots is populated for every registered chain;
/// a descriptor resolving to neither URL is never registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointUrls {
    http: Option<String>,
    ws: Option<String>,
}

impl EndpointUrls {
    pub(crate) fn new(http: Option<String>, ws: Option<String>) -> Self {
        Self { http, ws }
    }

    /// Returns the resolved HTTP URL, if any.
    #[must_use]
    pub fn http(&self) -> Option<&str> {
        self.http.as_deref()
    }

    /// Returns the resolved WebSocket URL, if any.
    #[must_use]
    pub fn ws(&self) -> Option<&str> {
        self.ws.as_deref()
    }

    /// Returns the resolved URL for `transport`, if any.
    #[must_use]
    pub fn url(&self, transport: Transport) -> Option<&str> {
        match transport {
            Transport::Http => self.http(),
            Transport::WebSocket => self.ws(),
        }
    }

    /// Returns true if neither transport resolved to a URL.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.ws.is_none()
    }
}

/// Lookup key accepted by registry operations.
///
/// Both key forms map to the same [`Chain`] instance in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChainKey {
    /// String identifier, e.g. `"ethereum-mainnet"`.
    Id(String),
    /// Numeric chain id, e.g. `1`.
    Number(u64),
}

impl From<&str> for ChainKey {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

impl From<String> for ChainKey {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<u64> for ChainKey {
    fn from(chain_id: u64) -> Self {
        Self::Number(chain_id)
    }
}

impl From<&Chain> for ChainKey {
    fn from(chain: &Chain) -> Self {
        Self::Number(chain.chain_id())
    }
}

impl From<&Arc<Chain>> for ChainKey {
    fn from(chain: &Arc<Chain>) -> Self {
        Self::Number(chain.chain_id())
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Number(chain_id) => write!(f, "{}", chain_id),
        }
    }
}

/// Association edges wired during the registry's second construction pass.
///
/// The mainnet back-edge is `Weak` because the owning mainnet holds a strong
/// reference to each of its testnets.
#[derive(Debug, Default)]
struct ChainLinks {
    testnets: OnceLock<Vec<Arc<Chain>>>,
    localnets: OnceLock<Vec<Arc<Chain>>>,
    mainnet: OnceLock<Weak<Chain>>,
}

/// A resolved, usable blockchain network.
///
/// Exists in a registry only if at least one transport URL resolved to a
/// non-empty value. Looked up by either its string identifier or its numeric
/// chain id; both keys yield the same instance.
#[derive(Debug)]
pub struct Chain {
    id: String,
    chain_id: u64,
    kind: ChainKind,
    currency: Currency,
    url: EndpointUrls,
    mainnet_ref: Option<String>,
    links: ChainLinks,
}

impl Chain {
    pub(crate) fn from_descriptor(descriptor: ChainDescriptor, url: EndpointUrls) -> Self {
        Self {
            id: descriptor.id,
            chain_id: descriptor.chain_id,
            kind: descriptor.kind,
            currency: descriptor.currency,
            url,
            mainnet_ref: descriptor.mainnet,
            links: ChainLinks::default(),
        }
    }

    /// Returns the string identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the numeric chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Returns the chain category.
    #[must_use]
    pub const fn kind(&self) -> ChainKind {
        self.kind
    }

    /// Returns the native currency metadata.
    #[must_use]
    pub const fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Returns the resolved endpoint URLs.
    #[must_use]
    pub const fn url(&self) -> &EndpointUrls {
        &self.url
    }

    /// Returns the mainnet identifier recorded in the descriptor, if any.
    ///
    /// This is the raw join key; [`Chain::mainnet`] returns the resolved
    /// chain it points at.
    #[must_use]
    pub fn mainnet_ref(&self) -> Option<&str> {
        self.mainnet_ref.as_deref()
    }

    /// Returns the resolved testnets of this mainnet.
    ///
    /// Empty for mainnets with no resolved testnets, and for chains of any
    /// other kind.
    #[must_use]
    pub fn testnets(&self) -> &[Arc<Chain>] {
        self.links.testnets.get().map_or(&[], Vec::as_slice)
    }

    /// Returns all resolved localnets, for mainnet chains.
    ///
    /// Empty for chains of any other kind.
    #[must_use]
    pub fn localnets(&self) -> &[Arc<Chain>] {
        self.links.localnets.get().map_or(&[], Vec::as_slice)
    }

    /// Returns the resolved mainnet of this testnet, if it survived
    /// resolution.
    #[must_use]
    pub fn mainnet(&self) -> Option<Arc<Chain>> {
        self.links.mainnet.get().and_then(Weak::upgrade)
    }

    pub(crate) fn link_testnets(&self, testnets: Vec<Arc<Chain>>) {
        let _ = self.links.testnets.set(testnets);
    }

    pub(crate) fn link_localnets(&self, localnets: Vec<Arc<Chain>>) {
        let _ = self.links.localnets.set(localnets);
    }

    pub(crate) fn link_mainnet(&self, mainnet: &Arc<Chain>) {
        let _ = self.links.mainnet.set(Arc::downgrade(mainnet));
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.chain_id)
    }
}
