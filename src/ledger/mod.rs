//! Destination ledger primitives
//!
//! The subset of the Stellar wire model the adapter produces:
//! - Account ids in strkey form
//! - Native and issued assets
//! - Seven-digit fixed-point amounts
//! - Unsigned payment transactions, their XDR envelope and signing hash

pub mod amount;
pub mod asset;
pub mod strkey;
pub mod transaction;
pub mod xdr;

pub use amount::{format_stroops, parse_stroops, AMOUNT_DECIMALS, STROOPS_PER_UNIT};
pub use asset::AssetDescriptor;
pub use strkey::AccountId;
pub use transaction::{
    AccountSnapshot, MemoHash, Operation, Payment, TimeBounds, Transaction, TransactionParams,
    MIN_BASE_FEE,
};
pub use xdr::WriteXdr;
