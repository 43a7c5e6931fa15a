//! Identity and configuration checks run before any value is touched

use crate::error::{BuildError, BuildResult};
use crate::registry::SignerRegistry;
use crate::swap::{ChainId, SwapInstruction, SwapKind};

use std::sync::Arc;
use tracing::error;

/// The signer a transaction will be built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedSigner {
    /// Canonical address as registered, not as the instruction spelled it
    pub address: String,
    pub public_key: String,
}

pub struct IdentityGate {
    chain_id: ChainId,
    test_mode: bool,
    signers: Arc<dyn SignerRegistry>,
}

impl IdentityGate {
    pub fn new(chain_id: ChainId, test_mode: bool, signers: Arc<dyn SignerRegistry>) -> Self {
        Self {
            chain_id,
            test_mode,
            signers,
        }
    }

    /// Only ERC-20 style swaps map onto a single payment
    fn is_supported(kind: SwapKind) -> bool {
        matches!(kind, SwapKind::Erc20Swap)
    }

    /// Run the checks in order and stop at the first failure
    pub fn check(&self, instruction: &SwapInstruction) -> BuildResult<AuthorizedSigner> {
        if !self.test_mode && instruction.to_chain_id() != &self.chain_id {
            return Err(BuildError::ChainMismatch {
                expected: self.chain_id.clone(),
                actual: instruction.to_chain_id().clone(),
            });
        }

        let sender = instruction.sender();
        if sender.is_empty() {
            return Err(BuildError::EmptySender);
        }

        if !Self::is_supported(instruction.swap_kind()) {
            return Err(BuildError::UnsupportedSwapKind(instruction.swap_kind()));
        }

        let signer = self
            .signers
            .signer_address(instruction.token_id(), &self.chain_id)
            .map_err(BuildError::SignerRegistry)?;
        if !sender.eq_ignore_ascii_case(&signer) {
            error!(have = %sender, want = %signer, "Build tx signer mismatch");
            return Err(BuildError::SenderNotAuthorizedSigner {
                have: sender.to_string(),
                want: signer,
            });
        }

        let public_key = self
            .signers
            .public_key(&signer)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| BuildError::MissingSignerPublicKey(signer.clone()))?;

        Ok(AuthorizedSigner {
            address: signer,
            public_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::registry::StaticSignerRegistry;

    const CHAIN: &str = "1000005788240";
    const SIGNER: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";
    const OTHER: &str = "GABAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEJXA";

    fn gate(test_mode: bool, public_key: Option<&str>) -> IdentityGate {
        let mut signers = StaticSignerRegistry::default();
        signers.insert("USDC", ChainId::from(CHAIN), SIGNER, public_key);
        IdentityGate::new(ChainId::from(CHAIN), test_mode, Arc::new(signers))
    }

    fn instruction(to_chain: &str, sender: &str, kind: SwapKind) -> SwapInstruction {
        SwapInstruction::builder()
            .route("1", to_chain)
            .token("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
            .sender(sender)
            .swap_kind(kind)
            .build()
    }

    #[test]
    fn test_accepts_authorized_signer() {
        let signer = gate(false, Some("04ab"))
            .check(&instruction(CHAIN, SIGNER, SwapKind::Erc20Swap))
            .unwrap();
        assert_eq!(signer.address, SIGNER);
        assert_eq!(signer.public_key, "04ab");
    }

    #[test]
    fn test_signer_match_ignores_case() {
        let lower = SIGNER.to_lowercase();
        let signer = gate(false, Some("04ab"))
            .check(&instruction(CHAIN, &lower, SwapKind::Erc20Swap))
            .unwrap();
        assert_eq!(signer.address, SIGNER);
    }

    #[test]
    fn test_rejects_other_sender() {
        let err = gate(false, Some("04ab"))
            .check(&instruction(CHAIN, OTHER, SwapKind::Erc20Swap))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::SenderNotAuthorizedSigner { ref have, ref want } if have == OTHER && want == SIGNER
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_chain_mismatch_unless_test_mode() {
        let err = gate(false, Some("04ab"))
            .check(&instruction("56", SIGNER, SwapKind::Erc20Swap))
            .unwrap_err();
        assert!(matches!(err, BuildError::ChainMismatch { .. }));

        assert!(gate(true, Some("04ab"))
            .check(&instruction("56", SIGNER, SwapKind::Erc20Swap))
            .is_ok());
    }

    #[test]
    fn test_check_order() {
        // empty sender wins over an unsupported kind
        let err = gate(false, Some("04ab"))
            .check(&instruction(CHAIN, "", SwapKind::NftSwap))
            .unwrap_err();
        assert!(matches!(err, BuildError::EmptySender));

        // unsupported kind wins over a signer mismatch
        let err = gate(false, Some("04ab"))
            .check(&instruction(CHAIN, OTHER, SwapKind::AnyCallSwap))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnsupportedSwapKind(SwapKind::AnyCallSwap)
        ));
    }

    #[test]
    fn test_missing_public_key() {
        for key in [None, Some("")] {
            let err = gate(false, key)
                .check(&instruction(CHAIN, SIGNER, SwapKind::Erc20Swap))
                .unwrap_err();
            assert!(matches!(err, BuildError::MissingSignerPublicKey(_)));
        }
    }

    #[test]
    fn test_unknown_token_surfaces_registry_error() {
        let instruction = SwapInstruction::builder()
            .route("1", CHAIN)
            .token("DAI", "0x6b17")
            .sender(SIGNER)
            .swap_kind(SwapKind::Erc20Swap)
            .build();
        let err = gate(false, Some("04ab")).check(&instruction).unwrap_err();
        assert!(matches!(
            err,
            BuildError::SignerRegistry(ProviderError::NotFound(_))
        ));
    }
}
