//! Configuration management for the Stellar swap adapter
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::ledger::{AccountId, AssetDescriptor, MIN_BASE_FEE};
use crate::registry::{AssetRegistry, TokenConfig};
use crate::swap::ChainId;
use crate::tx::DEFAULT_TX_TIMEOUT_SECS;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub adapter: AdapterConfig,
    pub horizon: HorizonConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub signers: Vec<SignerConfig>,
    #[serde(default)]
    pub multichain_tokens: Vec<MultichainTokenConfig>,
    #[serde(default)]
    pub chains: Vec<ChainTokensConfig>,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

/// Destination-ledger settings injected into the build pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    pub chain_id: ChainId,
    pub network_passphrase: String,
    /// Skip the destination chain id check
    #[serde(default)]
    pub test_mode: bool,
    /// Base fee offered per operation, in stroops
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,
    #[serde(default = "default_base_fee")]
    pub min_base_fee: u32,
    /// Reserve per ledger entry, in stroops
    #[serde(default = "default_base_reserve")]
    pub base_reserve: i64,
    #[serde(default = "default_tx_timeout_secs")]
    pub tx_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HorizonConfig {
    pub urls: Vec<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_build_timeout_ms")]
    pub build_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Authorized signer for a token on a chain
#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    pub token_id: String,
    pub chain_id: ChainId,
    pub address: String,
    pub public_key: Option<String>,
}

/// Canonical token id → chain-local token address
#[derive(Debug, Clone, Deserialize)]
pub struct MultichainTokenConfig {
    pub token_id: String,
    pub chain_id: ChainId,
    pub address: String,
}

/// Token configurations of one chain
#[derive(Debug, Clone, Deserialize)]
pub struct ChainTokensConfig {
    pub chain_id: ChainId,
    pub name: String,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

/// Ledger asset for a destination token contract
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    pub contract_address: String,
    pub asset: String,
}

fn default_base_fee() -> u32 {
    MIN_BASE_FEE
}

fn default_base_reserve() -> i64 {
    5_000_000
}

fn default_tx_timeout_secs() -> u64 {
    DEFAULT_TX_TIMEOUT_SECS
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_build_timeout_ms() -> u64 {
    10_000
}

impl Settings {
    /// Load settings from the configured file
    pub fn load() -> Result<Self> {
        let config_path = env::var("STELLAR_ADAPTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(raw);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.adapter.network_passphrase.trim().is_empty() {
            anyhow::bail!("adapter.network_passphrase must not be empty");
        }
        if self.adapter.min_base_fee < MIN_BASE_FEE {
            anyhow::bail!(
                "adapter.min_base_fee {} is below the ledger minimum {}",
                self.adapter.min_base_fee,
                MIN_BASE_FEE
            );
        }
        if self.adapter.tx_timeout_secs == 0 {
            anyhow::bail!("adapter.tx_timeout_secs must be positive");
        }
        if self.horizon.urls.is_empty() {
            anyhow::bail!("At least one Horizon URL must be configured");
        }
        if self.adapter.test_mode {
            tracing::warn!("Test mode enabled - destination chain id is not enforced");
        }

        for signer in &self.signers {
            if signer.chain_id == self.adapter.chain_id {
                signer.address.parse::<AccountId>().with_context(|| {
                    format!("Signer for token {} has an invalid address", signer.token_id)
                })?;
            }
        }

        self.asset_registry()?;

        Ok(())
    }

    /// Build the asset registry from the `[[assets]]` table
    pub fn asset_registry(&self) -> Result<AssetRegistry> {
        let entries = self
            .assets
            .iter()
            .map(|entry| -> Result<(String, AssetDescriptor)> {
                let asset: AssetDescriptor = entry.asset.parse().with_context(|| {
                    format!("Invalid asset for contract {}", entry.contract_address)
                })?;
                Ok((entry.contract_address.clone(), asset))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AssetRegistry::new(entries))
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE: &str = r#"
[adapter]
chain_id = "1000005788240"
network_passphrase = "Test SDF Network ; September 2015"
base_fee = 200

[horizon]
urls = ["https://horizon-testnet.stellar.org"]

[api]
host = "127.0.0.1"
port = 8080

[metrics]
enabled = false
port = 9090

[[signers]]
token_id = "USDC"
chain_id = "1000005788240"
address = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H"
public_key = "04deadbeef"

[[multichain_tokens]]
token_id = "USDC"
chain_id = "1000005788240"
address = "USDC:GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"

[[chains]]
chain_id = "1"
name = "ethereum"
tokens = [{ contract_address = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", decimals = 6 }]

[[chains]]
chain_id = "1000005788240"
name = "stellar"
tokens = [{ contract_address = "USDC:GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ", decimals = 7 }]

[[assets]]
contract_address = "USDC:GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"
asset = "USDC:GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"
"#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_parse_sample_with_defaults() {
        let settings = Settings::from_toml_str(SAMPLE).unwrap();
        assert_eq!(settings.adapter.base_fee, 200);
        assert_eq!(settings.adapter.min_base_fee, MIN_BASE_FEE);
        assert_eq!(settings.adapter.tx_timeout_secs, 300);
        assert_eq!(settings.adapter.base_reserve, 5_000_000);
        assert!(!settings.adapter.test_mode);
        assert_eq!(settings.asset_registry().unwrap().len(), 1);
        assert_eq!(settings.chains[0].chain_id, ChainId::from(1u64));
        assert_eq!(settings.chains[0].tokens[0].decimals, 6);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.adapter.chain_id.as_str(), "1000005788240");
    }

    #[test]
    fn test_reject_invalid_asset() {
        let raw = SAMPLE.replace(
            "asset = \"USDC:GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ\"",
            "asset = \"USDC\"",
        );
        assert!(Settings::from_toml_str(&raw).is_err());
    }

    #[test]
    fn test_reject_invalid_signer() {
        let raw = SAMPLE.replace(
            "address = \"GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H\"",
            "address = \"0x1234\"",
        );
        assert!(Settings::from_toml_str(&raw).is_err());
    }

    #[test]
    fn test_reject_low_min_fee() {
        let raw = SAMPLE.replace("base_fee = 200", "base_fee = 200\nmin_base_fee = 10");
        assert!(Settings::from_toml_str(&raw).is_err());
    }
}
