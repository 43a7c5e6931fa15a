//! Chain module - live account state on the destination ledger
//!
//! This module provides:
//! - The account-state port the build pipeline reads sequence and balance from
//! - A Horizon HTTP implementation with multi-URL failover

pub mod provider;

pub use provider::HorizonProvider;

use crate::error::ProviderError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Account state as reported by the destination ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: String,
    /// Last sequence number consumed by the account
    pub sequence: u64,
    /// Native balance, in stroops
    pub native_balance: i64,
    /// Trustlines, offers, signers and data entries held by the account
    pub subentry_count: u32,
}

/// Source of live account state
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStateProvider: Send + Sync {
    async fn account(&self, address: &str) -> Result<AccountState, ProviderError>;
}
