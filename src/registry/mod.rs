//! Registries the adapter consults before building
//!
//! - Signer registry: who may sign for a (token, chain) pair
//! - Token registry: chain-local token configuration
//! - Asset registry: token contract → ledger asset descriptor
//! - Value converter: origin amount → destination amount

pub mod assets;
pub mod config_backed;

pub use assets::AssetRegistry;
pub use config_backed::{DecimalRescaleConverter, StaticSignerRegistry, StaticTokenRegistry};

use crate::error::ProviderError;
use crate::swap::ChainId;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Chain-local token configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub contract_address: String,
    pub decimals: u8,
}

/// Maps (token, chain) to the signer allowed to move its funds
pub trait SignerRegistry: Send + Sync {
    fn signer_address(&self, token_id: &str, chain_id: &ChainId) -> Result<String, ProviderError>;

    /// Public key on file for a signer, if any
    fn public_key(&self, address: &str) -> Option<String>;
}

/// Multichain token registry
pub trait TokenRegistry: Send + Sync {
    /// Chain-local token address for a canonical token id
    fn multichain_token(&self, token_id: &str, chain_id: &ChainId) -> Option<String>;

    fn token_config(&self, chain_id: &ChainId, address: &str) -> Option<TokenConfig>;

    /// Whether any adapter is known for the chain
    fn has_chain(&self, chain_id: &ChainId) -> bool;
}

/// Everything the value conversion may depend on
#[derive(Debug, Clone)]
pub struct ConversionRequest<'a> {
    pub token_id: &'a str,
    pub from_chain_id: &'a ChainId,
    pub to_chain_id: &'a ChainId,
    pub origin_value: &'a BigUint,
    pub from_decimals: u8,
    pub to_decimals: u8,
    pub origin_from: &'a str,
    pub origin_tx_to: &'a str,
}

/// Converts an origin-chain amount into destination smallest units
pub trait ValueConverter: Send + Sync {
    fn convert(&self, request: &ConversionRequest<'_>) -> BigUint;
}
