//! Error types for the Stellar swap adapter

use crate::swap::{ChainId, SwapKind};

use thiserror::Error;

/// Terminal failure of a transaction build.
///
/// Every gate in the build pipeline fails closed with exactly one of these.
/// None of them are retried inside the adapter; see [`BuildError::is_retryable`]
/// for the kinds a caller may retry from scratch.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Destination chain mismatch: adapter serves {expected}, swap targets {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },

    #[error("Forbid empty sender")]
    EmptySender,

    #[error("Sender {have} is not the authorized signer {want}")]
    SenderNotAuthorizedSigner { have: String, want: String },

    #[error("Swap kind {0} is not supported")]
    UnsupportedSwapKind(SwapKind),

    #[error("Missing public key for signer {0}")]
    MissingSignerPublicKey(String),

    #[error("Token {token_id} has no configuration on chain {chain_id}")]
    UnmappedDestinationToken { token_id: String, chain_id: ChainId },

    #[error("Non exist asset {0}")]
    UnmappedLocalAsset(String),

    #[error("Can not swapout to empty or invalid receiver '{0}'")]
    InvalidOrEmptyReceiver(String),

    #[error("No adapter for origin chain {0}")]
    NoAdapterForOriginChain(ChainId),

    #[error("Origin token {token} has no configuration on chain {chain_id}")]
    UnmappedOriginToken { chain_id: ChainId, token: String },

    #[error("Insufficient reserve balance for {account}: have {have}, need {need} stroops")]
    InsufficientReserveBalance {
        account: String,
        have: i64,
        need: i64,
    },

    #[error("Sequence fetch failed for {account}: {source}")]
    SequenceFetchFailed {
        account: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    AssemblyFailed(#[from] LedgerError),

    #[error("Amount {0} is outside the ledger amount range")]
    AmountOverflow(String),

    #[error("Signer registry lookup failed: {0}")]
    SignerRegistry(#[source] ProviderError),

    #[error("Account state unavailable for {account}: {source}")]
    AccountState {
        account: String,
        #[source]
        source: ProviderError,
    },
}

impl BuildError {
    /// Check if the caller may rebuild the same instruction from scratch
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BuildError::SequenceFetchFailed { .. }
                | BuildError::InsufficientReserveBalance { .. }
                | BuildError::AccountState { .. }
        )
    }

    /// Check if error should trigger an alert
    pub fn should_alert(&self) -> bool {
        matches!(
            self,
            BuildError::InsufficientReserveBalance { .. }
                | BuildError::SenderNotAuthorizedSigner { .. }
                | BuildError::MissingSignerPublicKey(_)
        )
    }

    /// Stable label for swap-status tracking and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::ChainMismatch { .. } => "chain_mismatch",
            BuildError::EmptySender => "empty_sender",
            BuildError::SenderNotAuthorizedSigner { .. } => "sender_not_authorized_signer",
            BuildError::UnsupportedSwapKind(_) => "unsupported_swap_kind",
            BuildError::MissingSignerPublicKey(_) => "missing_signer_public_key",
            BuildError::UnmappedDestinationToken { .. } => "unmapped_destination_token",
            BuildError::UnmappedLocalAsset(_) => "unmapped_local_asset",
            BuildError::InvalidOrEmptyReceiver(_) => "invalid_or_empty_receiver",
            BuildError::NoAdapterForOriginChain(_) => "no_adapter_for_origin_chain",
            BuildError::UnmappedOriginToken { .. } => "unmapped_origin_token",
            BuildError::InsufficientReserveBalance { .. } => "insufficient_reserve_balance",
            BuildError::SequenceFetchFailed { .. } => "sequence_fetch_failed",
            BuildError::AssemblyFailed(_) => "assembly_failed",
            BuildError::AmountOverflow(_) => "amount_overflow",
            BuildError::SignerRegistry(_) => "signer_registry",
            BuildError::AccountState { .. } => "account_state",
        }
    }
}

/// Ledger-level construction errors, surfaced verbatim by the assembler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid account id '{0}'")]
    InvalidAccountId(String),

    #[error("invalid asset code '{0}'")]
    InvalidAssetCode(String),

    #[error("invalid asset '{0}': expected 'native' or 'CODE:ISSUER'")]
    InvalidAsset(String),

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("amount must be positive, got '{0}'")]
    NonPositiveAmount(String),

    #[error("invalid fee '{0}'")]
    InvalidFee(String),

    #[error("sequence number {0} cannot be incremented")]
    SequenceOverflow(u64),

    #[error("transaction must have between 1 and {max} operations, got {got}")]
    OperationCount { got: usize, max: usize },
}

/// Failures reported by external collaborators
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("all {0} providers failed")]
    AllProvidersFailed(usize),
}

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;
