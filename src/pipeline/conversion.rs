//! Receiver validation and origin → destination amount conversion

use crate::error::{BuildError, BuildResult};
use crate::ledger::AccountId;
use crate::registry::{ConversionRequest, TokenConfig, TokenRegistry, ValueConverter};
use crate::swap::{ChainId, SwapInstruction};
use crate::tx::ScaledAmount;

use std::sync::Arc;
use tracing::warn;

/// Receiver and payable amount of one swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutAmount {
    pub receiver: AccountId,
    pub amount: ScaledAmount,
}

pub struct AmountConverter {
    chain_id: ChainId,
    tokens: Arc<dyn TokenRegistry>,
    converter: Arc<dyn ValueConverter>,
}

impl AmountConverter {
    pub fn new(
        chain_id: ChainId,
        tokens: Arc<dyn TokenRegistry>,
        converter: Arc<dyn ValueConverter>,
    ) -> Self {
        Self {
            chain_id,
            tokens,
            converter,
        }
    }

    /// Validate the receiver, convert the origin value and render it with
    /// the destination token's precision
    pub fn compute(
        &self,
        instruction: &SwapInstruction,
        destination: &TokenConfig,
    ) -> BuildResult<PayoutAmount> {
        let receiver: AccountId = instruction.receiver().parse().map_err(|_| {
            warn!(receiver = %instruction.receiver(), "Swapout to wrong receiver");
            BuildError::InvalidOrEmptyReceiver(instruction.receiver().to_string())
        })?;

        let from_chain_id = instruction.from_chain_id();
        if !self.tokens.has_chain(from_chain_id) {
            return Err(BuildError::NoAdapterForOriginChain(from_chain_id.clone()));
        }

        let origin = self
            .tokens
            .token_config(from_chain_id, instruction.origin_token())
            .ok_or_else(|| {
                warn!(
                    chain_id = %from_chain_id,
                    token = %instruction.origin_token(),
                    "Get origin token config failed"
                );
                BuildError::UnmappedOriginToken {
                    chain_id: from_chain_id.clone(),
                    token: instruction.origin_token().to_string(),
                }
            })?;

        let value = self.converter.convert(&ConversionRequest {
            token_id: instruction.token_id(),
            from_chain_id,
            to_chain_id: &self.chain_id,
            origin_value: instruction.origin_value(),
            from_decimals: origin.decimals,
            to_decimals: destination.decimals,
            origin_from: instruction.origin_from(),
            origin_tx_to: instruction.origin_tx_to(),
        });

        let amount = ScaledAmount::from_units(&value, destination.decimals)?;

        Ok(PayoutAmount { receiver, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DecimalRescaleConverter, StaticTokenRegistry};
    use num_bigint::BigUint;

    const CHAIN: &str = "1000005788240";
    const RECEIVER: &str = "GABAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEJXA";
    const ETH_USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn destination() -> TokenConfig {
        TokenConfig {
            contract_address: "USDC:GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"
                .to_string(),
            decimals: 7,
        }
    }

    fn converter() -> AmountConverter {
        let mut tokens = StaticTokenRegistry::default();
        tokens.add_chain(
            ChainId::from(1u64),
            [TokenConfig {
                contract_address: ETH_USDC.to_string(),
                decimals: 6,
            }],
        );
        AmountConverter::new(
            ChainId::from(CHAIN),
            Arc::new(tokens),
            Arc::new(DecimalRescaleConverter),
        )
    }

    fn instruction(from_chain: &str, origin_token: &str, receiver: &str) -> SwapInstruction {
        SwapInstruction::builder()
            .route(from_chain, CHAIN)
            .token("USDC", origin_token)
            .origin_value(10_000_000u64)
            .receiver(receiver)
            .build()
    }

    #[test]
    fn test_rescales_to_destination_precision() {
        let payout = converter()
            .compute(&instruction("1", &ETH_USDC.to_uppercase(), RECEIVER), &destination())
            .unwrap();
        assert_eq!(payout.amount.to_string(), "10.0000000");
        assert_eq!(payout.receiver.to_string(), RECEIVER);
    }

    #[test]
    fn test_invalid_receiver() {
        for receiver in ["", "0x1234", &RECEIVER[1..]] {
            let err = converter()
                .compute(&instruction("1", ETH_USDC, receiver), &destination())
                .unwrap_err();
            assert!(matches!(err, BuildError::InvalidOrEmptyReceiver(_)));
        }
    }

    #[test]
    fn test_unknown_origin() {
        let err = converter()
            .compute(&instruction("56", ETH_USDC, RECEIVER), &destination())
            .unwrap_err();
        assert!(matches!(err, BuildError::NoAdapterForOriginChain(_)));

        let err = converter()
            .compute(&instruction("1", "0xdead", RECEIVER), &destination())
            .unwrap_err();
        assert!(matches!(err, BuildError::UnmappedOriginToken { .. }));
    }

    #[test]
    fn test_overflow_fails() {
        let instruction = SwapInstruction::builder()
            .route("1", CHAIN)
            .token("USDC", ETH_USDC)
            .origin_value(BigUint::from(u64::MAX) * BigUint::from(1_000u32))
            .receiver(RECEIVER)
            .build();
        let err = converter().compute(&instruction, &destination()).unwrap_err();
        assert!(matches!(err, BuildError::AmountOverflow(_)));
    }
}
