//! # Default Chain List
//!
//! The descriptor set a hub starts from when none is supplied.
//!
//! Every endpoint is an `env:` reference, so the list is inert until the
//! deployment environment provides URLs; a developer exporting only
//! [`WEB3_LOCAL_URL`] gets a registry containing exactly the local chain.

use crate::domain::chain::{ChainKind, Currency};
use crate::domain::descriptor::{ChainDescriptor, EndpointSpec};

/// Environment variable holding the Ethereum mainnet HTTP endpoint.
pub const WEB3_ETHEREUM_MAINNET_URL: &str = "WEB3_ETHEREUM_MAINNET_URL";
/// Environment variable holding the Ethereum mainnet WebSocket endpoint.
pub const WEB3_ETHEREUM_MAINNET_WS_URL: &str = "WEB3_ETHEREUM_MAINNET_WS_URL";
/// Environment variable holding the Ethereum Sepolia endpoint.
pub const WEB3_ETHEREUM_SEPOLIA_URL: &str = "WEB3_ETHEREUM_SEPOLIA_URL";
/// Environment variable holding the Polygon mainnet endpoint.
pub const WEB3_POLYGON_MAINNET_URL: &str = "WEB3_POLYGON_MAINNET_URL";
/// Environment variable holding the Polygon Amoy endpoint.
pub const WEB3_POLYGON_AMOY_URL: &str = "WEB3_POLYGON_AMOY_URL";
/// Environment variable holding the local development chain endpoint.
pub const WEB3_LOCAL_URL: &str = "WEB3_LOCAL_URL";

fn env_ref(name: &str) -> String {
    format!("env:{name}")
}

/// Returns the built-in descriptor list.
///
/// Two mainnets with their canonical testnets, plus a local development
/// chain. All URLs resolve from the environment.
#[must_use]
pub fn default_descriptors() -> Vec<ChainDescriptor> {
    vec![
        ChainDescriptor::new(
            "ethereum-mainnet",
            1,
            ChainKind::Mainnet,
            EndpointSpec::split(
                env_ref(WEB3_ETHEREUM_MAINNET_URL),
                env_ref(WEB3_ETHEREUM_MAINNET_WS_URL),
            ),
            Currency::new("Ether", "ETH", 18),
        ),
        ChainDescriptor::new(
            "ethereum-sepolia",
            11_155_111,
            ChainKind::Testnet,
            EndpointSpec::single(env_ref(WEB3_ETHEREUM_SEPOLIA_URL)),
            Currency::new("Sepolia Ether", "ETH", 18),
        )
        .with_mainnet("ethereum-mainnet"),
        ChainDescriptor::new(
            "polygon-mainnet",
            137,
            ChainKind::Mainnet,
            EndpointSpec::single(env_ref(WEB3_POLYGON_MAINNET_URL)),
            Currency::new("Pol", "POL", 18),
        ),
        ChainDescriptor::new(
            "polygon-amoy",
            80_002,
            ChainKind::Testnet,
            EndpointSpec::single(env_ref(WEB3_POLYGON_AMOY_URL)),
            Currency::new("Pol", "POL", 18),
        )
        .with_mainnet("polygon-mainnet"),
        ChainDescriptor::new(
            "local",
            1337,
            ChainKind::Localnet,
            EndpointSpec::single(env_ref(WEB3_LOCAL_URL)),
            Currency::new("Ether", "ETH", 18),
        ),
    ]
}

/// Parses a descriptor list from its JSON representation.
///
/// # Errors
///
/// Returns the underlying deserialization error when `json` does not
/// match the descriptor schema.
pub fn descriptors_from_json(json: &str) -> serde_json::Result<Vec<ChainDescriptor>> {
    serde_json::from_str(json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::registry::ChainRegistry;
    use crate::domain::descriptor::{EnvSource, ENV_URL_PREFIX};
    use std::collections::HashMap;
    use std::collections::HashSet;

    #[test]
    fn default_list_covers_the_expected_networks() {
        let descriptors = default_descriptors();
        let ids: Vec<&str> = descriptors.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "ethereum-mainnet",
                "ethereum-sepolia",
                "polygon-mainnet",
                "polygon-amoy",
                "local"
            ]
        );
        let numbers: Vec<u64> = descriptors.iter().map(|d| d.chain_id).collect();
        assert_eq!(numbers, vec![1, 11_155_111, 137, 80_002, 1337]);
    }

    #[test]
    fn identifiers_and_chain_ids_are_unique() {
        let descriptors = default_descriptors();
        let ids: HashSet<&str> = descriptors.iter().map(|d| d.id.as_str()).collect();
        let numbers: HashSet<u64> = descriptors.iter().map(|d| d.chain_id).collect();
        assert_eq!(ids.len(), descriptors.len());
        assert_eq!(numbers.len(), descriptors.len());
    }

    #[test]
    fn testnets_reference_mainnets_within_the_list() {
        let descriptors = default_descriptors();
        for descriptor in &descriptors {
            let Some(mainnet_id) = &descriptor.mainnet else {
                continue;
            };
            let mainnet = descriptors.iter().find(|d| &d.id == mainnet_id).unwrap();
            assert!(mainnet.kind.is_mainnet());
            assert!(descriptor.kind.is_testnet());
        }
    }

    #[test]
    fn every_url_is_resolved_from_the_environment() {
        for descriptor in default_descriptors() {
            match &descriptor.url {
                EndpointSpec::Single(url) => {
                    assert!(url.starts_with(ENV_URL_PREFIX), "{url}");
                    assert!(url.contains("WEB3_"));
                }
                EndpointSpec::Split { http, ws } => {
                    for url in [http, ws].into_iter().flatten() {
                        assert!(url.starts_with(ENV_URL_PREFIX), "{url}");
                    }
                }
            }
        }
    }

    #[test]
    fn default_list_is_inert_without_environment() {
        let registry =
            ChainRegistry::with_env(default_descriptors(), &EnvSource::from(HashMap::new()));
        assert!(registry.is_empty());
    }

    #[test]
    fn localnet_only_environment_yields_just_the_local_chain() {
        let env = EnvSource::from(HashMap::from([(
            WEB3_LOCAL_URL.to_owned(),
            "http://localhost:8545".to_owned(),
        )]));
        let registry = ChainRegistry::with_env(default_descriptors(), &env);

        assert!(registry.chains_of_kind(ChainKind::Mainnet).is_empty());
        let local = registry.get_chain("local").unwrap();
        assert_eq!(local.url().http(), Some("http://localhost:8545"));
    }

    #[test]
    fn descriptor_json_schema_round_trips() {
        let json = r#"[
            {
                "id": "base-mainnet",
                "chainId": 8453,
                "type": "mainnet",
                "url": { "http": "env:BASE_URL" },
                "currency": { "name": "Ether", "symbol": "ETH", "decimals": 18 }
            },
            {
                "id": "base-sepolia",
                "chainId": 84532,
                "type": "testnet",
                "url": "https://sepolia.base.example",
                "currency": { "name": "Ether", "symbol": "ETH", "decimals": 18 },
                "mainnet": "base-mainnet"
            }
        ]"#;

        let descriptors = descriptors_from_json(json).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].chain_id, 8453);
        assert_eq!(descriptors[1].mainnet.as_deref(), Some("base-mainnet"));

        assert!(descriptors_from_json("{ not json").is_err());
    }
}
