//! The deployment manifest: per-network settings and the versioned
//! parameters a deployment is built from
//!
//! A single manifest replaces one hand-edited script per network. Each
//! network entry carries its own [`DeployConfig`], so two networks may
//! deploy the same contract with entirely different parameters.

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::{Address, U256};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};

use crate::{
    constants::{ADDRESS_HEX_LEN, DEFAULT_INITIALIZER},
    errors::DeployError,
};

// ------------
// | Manifest |
// ------------

/// The top-level deployment manifest, as read from disk
#[derive(Clone, Debug, Deserialize)]
pub struct DeployManifest {
    /// The logical name of the contract, used as the ledger key
    pub contract: String,
    /// Path to the compiled artifact of the logic contract
    pub artifact: PathBuf,
    /// Path to the compiled artifact of the ERC1967 proxy
    pub proxy_artifact: PathBuf,
    /// The function invoked through the proxy when it is first deployed
    #[serde(default = "default_initializer")]
    pub initializer: String,
    /// The per-network configuration, keyed by network name
    pub networks: BTreeMap<String, NetworkEntry>,
}

/// The configuration for a single network in the manifest
#[derive(Clone, Debug, Deserialize)]
pub struct NetworkEntry {
    /// The chain id the RPC node is expected to report
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// A fixed gas price, in wei, for every transaction on this network
    #[serde(default)]
    pub gas_price: Option<u64>,
    /// The deploy parameters for this network
    pub deploy: DeployConfig,
}

/// Used by serde when the manifest omits `initializer`
fn default_initializer() -> String {
    DEFAULT_INITIALIZER.to_string()
}

impl DeployManifest {
    /// Read and parse the manifest at the given path.
    ///
    /// Relative artifact paths are resolved against the manifest's directory.
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            DeployError::Configuration(format!("could not read {}: {}", path.display(), e))
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json(&contents, base_dir)
    }

    /// Parse a manifest from its JSON representation
    pub fn from_json(contents: &str, base_dir: &Path) -> Result<Self, DeployError> {
        let mut manifest: DeployManifest = serde_json::from_str(contents)
            .map_err(|e| DeployError::Configuration(e.to_string()))?;

        manifest.artifact = base_dir.join(&manifest.artifact);
        manifest.proxy_artifact = base_dir.join(&manifest.proxy_artifact);
        Ok(manifest)
    }

    /// Select the configuration for the given network
    pub fn network(&self, name: &str) -> Result<(NetworkConfig, DeployConfig), DeployError> {
        let entry = self.networks.get(name).ok_or_else(|| {
            DeployError::Configuration(format!(
                "network `{}` is not configured for {}",
                name, self.contract
            ))
        })?;

        let network = NetworkConfig {
            name: name.to_string(),
            chain_id: entry.chain_id,
            gas_price: entry.gas_price.map(u128::from),
        };

        Ok((network, entry.deploy.clone()))
    }
}

// -----------------
// | Configuration |
// -----------------

/// The network an invocation targets.
///
/// Built once from the manifest and passed down explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    /// The network name, which also scopes the ledger
    pub name: String,
    /// The chain id the RPC node is expected to report
    pub chain_id: Option<u64>,
    /// A fixed gas price, in wei, for every transaction
    pub gas_price: Option<u128>,
}

impl NetworkConfig {
    /// Check the chain id reported by the node against the configured one
    pub fn verify_chain_id(&self, reported: u64) -> Result<(), DeployError> {
        match self.chain_id {
            Some(expected) if expected != reported => Err(DeployError::Configuration(format!(
                "network `{}` expects chain id {}, but the node reports {}",
                self.name, expected, reported
            ))),
            _ => Ok(()),
        }
    }
}

/// The versioned parameters for one deployment of the contract
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DeployConfig {
    /// An already-deployed proxy. When present the contract is upgraded
    /// in place, otherwise a new proxy is deployed.
    #[serde(default)]
    pub target_proxy: Option<Address>,
    /// The first tuple handed to the initializer
    #[serde(default)]
    pub constructor_args: Vec<InitArg>,
    /// The second tuple handed to the initializer
    #[serde(default)]
    pub extra_init_args: Vec<InitArg>,
    /// The number of reward tokens
    #[serde(default)]
    pub reward_token_count: usize,
    /// The reward token addresses
    #[serde(default)]
    pub reward_tokens: Vec<Address>,
    /// The static reward amounts, positionally paired with `reward_tokens`
    #[serde(default)]
    pub static_rewards: Vec<Amount>,
}

// ----------------------
// | Argument Encodings |
// ----------------------

/// A scalar argument in one of the initializer's argument tuples
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitArg {
    /// A 20-byte address
    Address(Address),
    /// An unsigned integer: a count, a timestamp, a duration or an amount
    Uint(U256),
}

impl FromStr for InitArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            if s.len() != ADDRESS_HEX_LEN {
                return Err(format!("`{}` is not a 20-byte hex address", s));
            }

            return Address::from_str(s)
                .map(InitArg::Address)
                .map_err(|e| format!("`{}` is not a valid address: {}", s, e));
        }

        parse_decimal(s).map(InitArg::Uint)
    }
}

impl<'de> Deserialize<'de> for InitArg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        /// Accepts JSON unsigned integers and strings, nothing else
        struct InitArgVisitor;

        impl Visitor<'_> for InitArgVisitor {
            type Value = InitArg;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer, a decimal string or a 0x-prefixed address")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<InitArg, E> {
                Ok(InitArg::Uint(U256::from(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<InitArg, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(InitArgVisitor)
    }
}

/// A token amount in base units (18-decimal fixed point on the receiving side).
///
/// Held as a 256-bit integer; amounts beyond `u64` must be written as
/// decimal strings in the manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(pub U256);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        /// Accepts JSON unsigned integers and decimal strings
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(U256::from(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                parse_decimal(v).map(Amount).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a base-10 string into a 256-bit unsigned integer
fn parse_decimal(s: &str) -> Result<U256, String> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("`{}` is not a decimal integer", s));
    }

    U256::from_str_radix(s, 10).map_err(|e| format!("`{}` does not fit in 256 bits: {}", s, e))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use alloy::primitives::{address, U256};

    use super::{Amount, DeployManifest, InitArg};

    /// A manifest with a deploy network and an upgrade network
    const MANIFEST: &str = r#"{
        "contract": "Staking",
        "artifact": "artifacts/Staking.json",
        "proxy_artifact": "artifacts/ERC1967Proxy.json",
        "networks": {
            "local": {
                "chain_id": 1337,
                "deploy": {
                    "constructor_args": [50, "0xeF6c0f160E18dE53f347498A75265C942ce3b035"],
                    "extra_init_args": [1697860800, "250000000000000000000000"],
                    "reward_token_count": 1,
                    "reward_tokens": ["0x36E43065e977bC72CB86Dbd8405fae7057CDC7fD"],
                    "static_rewards": ["125000000000000000000000000000"]
                }
            },
            "polygon": {
                "chain_id": 137,
                "gas_price": 100000000000,
                "deploy": {
                    "target_proxy": "0xB1c5f44b6473EE2fdd22e5B65B971A8455442112"
                }
            }
        }
    }"#;

    #[test]
    fn test_manifest_network_selection() {
        let manifest = DeployManifest::from_json(MANIFEST, Path::new("/work")).unwrap();
        assert_eq!(manifest.initializer, "initialize");
        assert_eq!(manifest.artifact, Path::new("/work/artifacts/Staking.json"));

        let (network, deploy) = manifest.network("polygon").unwrap();
        assert_eq!(network.chain_id, Some(137));
        assert_eq!(network.gas_price, Some(100_000_000_000));
        assert_eq!(
            deploy.target_proxy,
            Some(address!("0xB1c5f44b6473EE2fdd22e5B65B971A8455442112"))
        );
        assert!(deploy.reward_tokens.is_empty());

        assert!(manifest.network("mainnet").is_err());
    }

    #[test]
    fn test_chain_id_mismatch() {
        let manifest = DeployManifest::from_json(MANIFEST, Path::new("")).unwrap();
        let (network, _) = manifest.network("polygon").unwrap();

        assert!(network.verify_chain_id(137).is_ok());
        assert!(network.verify_chain_id(80001).is_err());
    }

    #[test]
    fn test_large_amounts_keep_precision() {
        let manifest = DeployManifest::from_json(MANIFEST, Path::new("")).unwrap();
        let (_, deploy) = manifest.network("local").unwrap();

        let expected: U256 = "125000000000000000000000000000".parse().unwrap();
        assert_eq!(deploy.static_rewards, vec![Amount(expected)]);
        assert_eq!(
            deploy.extra_init_args[1],
            InitArg::Uint(U256::from(250_000_000_000_000_000_000_000_u128))
        );
        assert_eq!(
            deploy.constructor_args[1],
            InitArg::Address(address!("0xeF6c0f160E18dE53f347498A75265C942ce3b035"))
        );
    }

    #[test]
    fn test_float_arguments_rejected() {
        let res = serde_json::from_str::<Vec<InitArg>>("[1.5e30]");
        assert!(res.is_err());

        let res = serde_json::from_str::<Vec<Amount>>("[-1]");
        assert!(res.is_err());
    }

    #[test]
    fn test_malformed_address_argument() {
        assert!("0x1234".parse::<InitArg>().is_err());
        assert!("0xZZ6c0f160E18dE53f347498A75265C942ce3b035"
            .parse::<InitArg>()
            .is_err());
        assert!("12ab".parse::<InitArg>().is_err());
        assert_eq!("42".parse::<InitArg>(), Ok(InitArg::Uint(U256::from(42))));
    }
}
