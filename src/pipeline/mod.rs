//! Build pipeline for unsigned destination payments
//!
//! Stages run strictly in order and the first failure ends the build:
//! 1. Identity gate: destination chain, sender, swap kind, signer, public key
//! 2. Asset resolution through the token and asset registries
//! 3. Receiver check and amount conversion
//! 4. Fee and sequence, defaulted only when the instruction does not pin them
//! 5. Reserve check against the signer's native balance
//! 6. Memo encoding and transaction assembly

pub mod conversion;
pub mod engine;
pub mod gate;
pub mod resolver;

pub use conversion::{AmountConverter, PayoutAmount};
pub use engine::{BuildPipeline, Collaborators};
pub use gate::{AuthorizedSigner, IdentityGate};
pub use resolver::{AssetResolver, ResolvedAsset};

use serde::Serialize;
use std::fmt;

/// Completed stage of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Validated,
    AssetResolved,
    AmountComputed,
    FeeSequenceResolved,
    BalanceChecked,
    MemoEncoded,
    Assembled,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Validated => "validated",
            BuildStage::AssetResolved => "asset_resolved",
            BuildStage::AmountComputed => "amount_computed",
            BuildStage::FeeSequenceResolved => "fee_sequence_resolved",
            BuildStage::BalanceChecked => "balance_checked",
            BuildStage::MemoEncoded => "memo_encoded",
            BuildStage::Assembled => "assembled",
        };
        f.write_str(name)
    }
}
