//! Fee and reserve policy for the destination ledger

use crate::config::AdapterConfig;
use crate::ledger::MIN_BASE_FEE;

/// Local fee oracle and reserve requirements
#[derive(Debug, Clone)]
pub struct FeePolicy {
    /// Offered base fee per operation, in stroops
    base_fee: u32,
    /// Floor under any offered or pinned fee
    min_base_fee: u32,
    /// Reserve per ledger entry, in stroops
    base_reserve: i64,
}

impl FeePolicy {
    /// Create a new fee policy
    pub fn new(base_fee: u32, min_base_fee: u32, base_reserve: i64) -> Self {
        let min_base_fee = min_base_fee.max(MIN_BASE_FEE);
        Self {
            base_fee: base_fee.max(min_base_fee),
            min_base_fee,
            base_reserve,
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(config.base_fee, config.min_base_fee, config.base_reserve)
    }

    /// Fee offered when the instruction does not pin one
    pub fn fee(&self) -> String {
        self.base_fee.to_string()
    }

    pub fn min_base_fee(&self) -> u32 {
        self.min_base_fee
    }

    /// Balance an account must keep: two base entries plus its subentries
    pub fn minimum_balance(&self, subentry_count: u32) -> i64 {
        (2 + subentry_count as i64).saturating_mul(self.base_reserve)
    }

    /// Native holdings needed to submit a transaction without dipping below
    /// the reserve
    pub fn required_balance(&self, subentry_count: u32, total_fee: u32, native_spend: i64) -> i64 {
        self.minimum_balance(subentry_count)
            .saturating_add(total_fee as i64)
            .saturating_add(native_spend)
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::new(MIN_BASE_FEE, MIN_BASE_FEE, 5_000_000)
    }
}
