//! Default fee and sequence for instructions that do not pin them

use super::fee::FeePolicy;
use super::sequence::SequenceStrategy;
use crate::chain::AccountState;
use crate::error::BuildResult;
use crate::swap::{SwapExtras, SwapInstruction};

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Sequence and fee a transaction is built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeSequencePair {
    /// Account sequence the transaction builds on
    pub sequence: u64,
    /// Base fee in stroops, decimal string
    pub fee: String,
}

/// Fee and sequence for one build, plus what is needed to undo the defaulting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExtras {
    pub pair: FeeSequencePair,
    /// Account state read while allocating; `None` when the sequence was pinned
    pub account: Option<AccountState>,
    previous: Option<SwapExtras>,
}

impl ResolvedExtras {
    /// Whether this call allocated the sequence rather than reusing one
    pub fn allocated(&self) -> bool {
        self.account.is_some()
    }
}

/// Fills in fee/sequence and caches them on the instruction
pub struct FeeSequenceProvider {
    strategy: Arc<dyn SequenceStrategy>,
    fee_policy: FeePolicy,
}

impl FeeSequenceProvider {
    pub fn new(strategy: Arc<dyn SequenceStrategy>, fee_policy: FeePolicy) -> Self {
        Self {
            strategy,
            fee_policy,
        }
    }

    pub fn fee_policy(&self) -> &FeePolicy {
        &self.fee_policy
    }

    /// Resolve fee and sequence for `account`, reusing whatever the
    /// instruction already carries
    ///
    /// Missing values are defaulted and written back, so rebuilding the same
    /// instruction reuses them instead of allocating a new sequence.
    pub async fn resolve(
        &self,
        instruction: &mut SwapInstruction,
        account: &str,
    ) -> BuildResult<ResolvedExtras> {
        let previous = instruction.extras().cloned();
        let cached = previous.clone().unwrap_or_default();
        if let (Some(sequence), Some(fee)) = (cached.sequence, cached.fee.clone()) {
            debug!(
                "Reusing extras for swap {}: sequence {}, fee {}",
                instruction.swap_id(),
                sequence,
                fee
            );
            return Ok(ResolvedExtras {
                pair: FeeSequencePair { sequence, fee },
                account: None,
                previous,
            });
        }

        let (sequence, state) = match cached.sequence {
            Some(sequence) => (sequence, None),
            None => {
                let allocation = self.strategy.next_sequence(account).await?;
                (allocation.sequence, Some(allocation.account))
            }
        };
        let fee = cached.fee.unwrap_or_else(|| self.fee_policy.fee());

        instruction.set_extras(SwapExtras {
            sequence: Some(sequence),
            fee: Some(fee.clone()),
        });
        debug!(
            "Defaulted extras for swap {} via {}: sequence {}, fee {}",
            instruction.swap_id(),
            self.strategy.name(),
            sequence,
            fee
        );

        Ok(ResolvedExtras {
            pair: FeeSequencePair { sequence, fee },
            account: state,
            previous,
        })
    }

    /// Undo `resolve` after a later stage failed
    ///
    /// Releases a sequence this build allocated and restores the extras the
    /// instruction carried before, so a retry starts from scratch.
    pub async fn rollback(
        &self,
        instruction: &mut SwapInstruction,
        account: &str,
        resolved: ResolvedExtras,
    ) {
        if resolved.allocated() {
            self.strategy.release(account, resolved.pair.sequence).await;
        }
        match resolved.previous {
            Some(extras) => instruction.set_extras(extras),
            None => instruction.reset_extras(),
        }
        debug!("Rolled back extras for swap {}", instruction.swap_id());
    }
}
