//! Exact rendering of destination-unit amounts in ledger text form

use crate::error::{BuildError, BuildResult};
use crate::ledger::{format_stroops, AMOUNT_DECIMALS};

use num_bigint::BigUint;
use num_traits::{pow, ToPrimitive};
use std::fmt;

/// A payable quantity in stroops, rendered with seven fraction digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScaledAmount {
    stroops: i64,
}

impl ScaledAmount {
    /// Rescale `amount`, given in units with `decimals` fraction digits, to stroops
    ///
    /// Integer arithmetic throughout. Precision beyond seven digits is
    /// truncated, never rounded up. Amounts that do not fit a signed 64-bit
    /// integer, before or after scaling, fail with `AmountOverflow`.
    pub fn from_units(amount: &BigUint, decimals: u8) -> BuildResult<Self> {
        let overflow = || BuildError::AmountOverflow(amount.to_string());

        if amount.to_i64().is_none() {
            return Err(overflow());
        }

        let decimals = decimals as u32;
        let scaled = if decimals <= AMOUNT_DECIMALS {
            amount * pow(BigUint::from(10u32), (AMOUNT_DECIMALS - decimals) as usize)
        } else {
            amount / pow(BigUint::from(10u32), (decimals - AMOUNT_DECIMALS) as usize)
        };

        let stroops = scaled.to_i64().ok_or_else(overflow)?;
        Ok(Self { stroops })
    }

    pub fn stroops(&self) -> i64 {
        self.stroops
    }

    pub fn is_zero(&self) -> bool {
        self.stroops == 0
    }
}

impl fmt::Display for ScaledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_stroops(self.stroops))
    }
}
