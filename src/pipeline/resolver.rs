//! Canonical token id → destination ledger asset

use crate::error::{BuildError, BuildResult};
use crate::ledger::AssetDescriptor;
use crate::registry::{AssetRegistry, TokenConfig, TokenRegistry};
use crate::swap::ChainId;

use std::sync::Arc;
use tracing::warn;

/// Destination-side view of the token being paid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Chain-local address of the multichain token
    pub multichain_token: String,
    pub config: TokenConfig,
    pub asset: AssetDescriptor,
}

/// Fails closed: an unmapped token never falls back to a default asset
pub struct AssetResolver {
    chain_id: ChainId,
    tokens: Arc<dyn TokenRegistry>,
    assets: Arc<AssetRegistry>,
}

impl AssetResolver {
    pub fn new(chain_id: ChainId, tokens: Arc<dyn TokenRegistry>, assets: Arc<AssetRegistry>) -> Self {
        Self {
            chain_id,
            tokens,
            assets,
        }
    }

    pub fn resolve(&self, token_id: &str, to_chain_id: &ChainId) -> BuildResult<ResolvedAsset> {
        let unmapped = || BuildError::UnmappedDestinationToken {
            token_id: token_id.to_string(),
            chain_id: to_chain_id.clone(),
        };

        let multichain_token = self
            .tokens
            .multichain_token(token_id, to_chain_id)
            .ok_or_else(|| {
                warn!(token_id, chain_id = %to_chain_id, "Get multichain token failed");
                unmapped()
            })?;

        let config = self
            .tokens
            .token_config(&self.chain_id, &multichain_token)
            .ok_or_else(unmapped)?;

        let asset = self
            .assets
            .get(&config.contract_address)
            .cloned()
            .ok_or_else(|| BuildError::UnmappedLocalAsset(config.contract_address.clone()))?;

        Ok(ResolvedAsset {
            multichain_token,
            config,
            asset,
        })
    }
}
