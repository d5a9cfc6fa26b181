//! # Chain Registry
//!
//! Immutable catalogue of the chains a hub knows about.
//!
//! A [`ChainRegistry`] is built once from a list of
//! [`ChainDescriptor`]s. Endpoint references are resolved against the
//! environment at that moment; descriptors without a single resolved
//! endpoint are skipped without error, so one descriptor list serves every
//! deployment and the environment decides which chains exist. Registered
//! chains are indexed by string identifier and by numeric chain id, and
//! linked into a navigable network graph (mainnet to testnets, testnet to
//! mainnet, mainnet to localnets).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::chain::{Chain, ChainKey, ChainKind};
use crate::domain::descriptor::{ChainDescriptor, EnvSource};
use crate::domain::errors::{RegistryError, RegistryResult};

/// Lookup table and network graph over a fixed set of chains.
///
/// Both lookup keys of a chain resolve to the same shared [`Chain`]
/// instance. The registry is immutable after construction and cheap to
/// share behind an [`Arc`].
pub struct ChainRegistry {
    by_id: HashMap<String, Arc<Chain>>,
    by_number: HashMap<u64, Arc<Chain>>,
    chains: Vec<Arc<Chain>>,
}

impl ChainRegistry {
    /// Builds a registry, resolving endpoint references against the
    /// process environment.
    #[must_use]
    pub fn new(descriptors: Vec<ChainDescriptor>) -> Self {
        Self::with_env(descriptors, &EnvSource::Process)
    }

    /// Builds a registry, resolving endpoint references against `env`.
    ///
    /// Descriptors without any resolved endpoint are skipped. When two
    /// descriptors share an identifier or a numeric chain id, the first
    /// one wins and the duplicate is dropped with a warning.
    #[must_use]
    pub fn with_env(descriptors: Vec<ChainDescriptor>, env: &EnvSource) -> Self {
        let mut by_id = HashMap::new();
        let mut by_number = HashMap::new();
        let mut chains = Vec::new();

        for descriptor in descriptors {
            let url = descriptor.url.resolve_with(env);
            if url.is_empty() {
                tracing::debug!(chain = %descriptor.id, "skipping chain with no resolved endpoint");
                continue;
            }
            if by_id.contains_key(&descriptor.id) || by_number.contains_key(&descriptor.chain_id) {
                tracing::warn!(
                    chain = %descriptor.id,
                    chain_id = descriptor.chain_id,
                    "ignoring duplicate chain descriptor"
                );
                continue;
            }
            let chain = Arc::new(Chain::from_descriptor(descriptor, url));
            by_id.insert(chain.id().to_owned(), Arc::clone(&chain));
            by_number.insert(chain.chain_id(), Arc::clone(&chain));
            chains.push(chain);
        }

        link_networks(&chains, &by_id);
        tracing::debug!(chains = chains.len(), "chain registry constructed");

        Self {
            by_id,
            by_number,
            chains,
        }
    }

    /// Looks up a chain by string identifier or numeric chain id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no registered chain
    /// matches `key`.
    pub fn get_chain(&self, key: impl Into<ChainKey>) -> RegistryResult<Arc<Chain>> {
        let key = key.into();
        let chain = match &key {
            ChainKey::Id(id) => self.by_id.get(id.as_str()),
            ChainKey::Number(number) => self.by_number.get(number),
        };
        chain.cloned().ok_or(RegistryError::NotFound(key))
    }

    /// Returns all registered chains of `kind`, in registration order.
    #[must_use]
    pub fn chains_of_kind(&self, kind: ChainKind) -> Vec<Arc<Chain>> {
        self.chains
            .iter()
            .filter(|chain| chain.kind() == kind)
            .cloned()
            .collect()
    }

    /// Returns `true` when a chain matching `key` is registered.
    #[must_use]
    pub fn contains(&self, key: impl Into<ChainKey>) -> bool {
        match key.into() {
            ChainKey::Id(id) => self.by_id.contains_key(&id),
            ChainKey::Number(number) => self.by_number.contains_key(&number),
        }
    }

    /// Returns the number of registered chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` when no chain is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Returns all registered chains in registration order.
    #[must_use]
    pub fn chains(&self) -> &[Arc<Chain>] {
        &self.chains
    }
}

impl fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.chains.iter().map(|chain| chain.id()).collect();
        f.debug_struct("ChainRegistry").field("chains", &ids).finish()
    }
}

/// Wires the network graph between registered chains.
///
/// A testnet joins its mainnet through the recorded `mainnet` identifier,
/// in both directions: the mainnet lists exactly the testnets that name
/// it, and each of those testnets holds a weak reference back. Localnets
/// are environment-wide and attach to every mainnet. References that name
/// an unregistered chain, or a chain that is not a mainnet, stay unlinked.
fn link_networks(chains: &[Arc<Chain>], by_id: &HashMap<String, Arc<Chain>>) {
    let localnets: Vec<Arc<Chain>> = chains
        .iter()
        .filter(|chain| chain.kind().is_localnet())
        .cloned()
        .collect();

    for chain in chains {
        match chain.kind() {
            ChainKind::Mainnet => {
                let testnets = chains
                    .iter()
                    .filter(|candidate| {
                        candidate.kind().is_testnet()
                            && candidate.mainnet_ref() == Some(chain.id())
                    })
                    .cloned()
                    .collect();
                chain.link_testnets(testnets);
                chain.link_localnets(localnets.clone());
            }
            ChainKind::Testnet => {
                let mainnet = chain
                    .mainnet_ref()
                    .and_then(|id| by_id.get(id))
                    .filter(|mainnet| mainnet.kind().is_mainnet());
                if let Some(mainnet) = mainnet {
                    chain.link_mainnet(mainnet);
                }
            }
            ChainKind::Localnet => {}
        }
    }
}
