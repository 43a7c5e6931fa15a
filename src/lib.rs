//! Stellar swap adapter
//!
//! Turns validated cross-chain swap instructions into unsigned Stellar
//! payment transactions, ready for an external signer.

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod swap;
pub mod tx;

pub use error::{BuildError, BuildResult, LedgerError, ProviderError};
pub use pipeline::{BuildPipeline, BuildStage, Collaborators};
pub use swap::{ChainId, SwapExtras, SwapInstruction, SwapKind};
pub use tx::BuiltTransaction;
