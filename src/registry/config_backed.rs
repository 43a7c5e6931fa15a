//! Registries backed by the static configuration file

use super::{ConversionRequest, SignerRegistry, TokenConfig, TokenRegistry, ValueConverter};
use crate::config::Settings;
use crate::error::ProviderError;
use crate::swap::ChainId;

use num_bigint::BigUint;
use num_traits::pow;
use std::collections::HashMap;

/// Signer registry loaded from `[[signers]]`
#[derive(Debug, Default)]
pub struct StaticSignerRegistry {
    /// (token id, chain id) -> signer address
    signers: HashMap<(String, ChainId), String>,
    /// lowercased signer address -> public key
    public_keys: HashMap<String, String>,
}

impl StaticSignerRegistry {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut registry = Self::default();
        for signer in &settings.signers {
            registry.insert(
                &signer.token_id,
                signer.chain_id.clone(),
                &signer.address,
                signer.public_key.as_deref(),
            );
        }
        registry
    }

    pub fn insert(
        &mut self,
        token_id: &str,
        chain_id: ChainId,
        address: &str,
        public_key: Option<&str>,
    ) {
        self.signers
            .insert((token_id.to_string(), chain_id), address.to_string());
        if let Some(key) = public_key {
            self.public_keys
                .insert(address.to_lowercase(), key.to_string());
        }
    }
}

impl SignerRegistry for StaticSignerRegistry {
    fn signer_address(&self, token_id: &str, chain_id: &ChainId) -> Result<String, ProviderError> {
        self.signers
            .get(&(token_id.to_string(), chain_id.clone()))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("signer for {token_id} on {chain_id}")))
    }

    fn public_key(&self, address: &str) -> Option<String> {
        self.public_keys
            .get(&address.to_lowercase())
            .filter(|key| !key.is_empty())
            .cloned()
    }
}

/// Token registry loaded from `[[multichain_tokens]]` and `[[chains]]`
#[derive(Debug, Default)]
pub struct StaticTokenRegistry {
    multichain: HashMap<(String, ChainId), String>,
    /// chain id -> lowercased contract address -> config
    chains: HashMap<ChainId, HashMap<String, TokenConfig>>,
}

impl StaticTokenRegistry {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut registry = Self::default();
        for chain in &settings.chains {
            registry.add_chain(chain.chain_id.clone(), chain.tokens.iter().cloned());
        }
        for token in &settings.multichain_tokens {
            registry.map_token(&token.token_id, token.chain_id.clone(), &token.address);
        }
        registry
    }

    pub fn add_chain(&mut self, chain_id: ChainId, tokens: impl IntoIterator<Item = TokenConfig>) {
        let entry = self.chains.entry(chain_id).or_default();
        for token in tokens {
            entry.insert(token.contract_address.to_lowercase(), token);
        }
    }

    pub fn map_token(&mut self, token_id: &str, chain_id: ChainId, address: &str) {
        self.multichain
            .insert((token_id.to_string(), chain_id), address.to_string());
    }
}

impl TokenRegistry for StaticTokenRegistry {
    fn multichain_token(&self, token_id: &str, chain_id: &ChainId) -> Option<String> {
        self.multichain
            .get(&(token_id.to_string(), chain_id.clone()))
            .cloned()
    }

    fn token_config(&self, chain_id: &ChainId, address: &str) -> Option<TokenConfig> {
        self.chains
            .get(chain_id)?
            .get(&address.to_lowercase())
            .cloned()
    }

    fn has_chain(&self, chain_id: &ChainId) -> bool {
        self.chains.contains_key(chain_id)
    }
}

/// Plain decimal rescale between origin and destination precision
///
/// Truncates when the destination has fewer decimals. Swap fees, if any,
/// belong to the router in front of this adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecimalRescaleConverter;

impl ValueConverter for DecimalRescaleConverter {
    fn convert(&self, request: &ConversionRequest<'_>) -> BigUint {
        let from = request.from_decimals as usize;
        let to = request.to_decimals as usize;
        if to >= from {
            request.origin_value * pow(BigUint::from(10u32), to - from)
        } else {
            request.origin_value / pow(BigUint::from(10u32), from - to)
        }
    }
}
