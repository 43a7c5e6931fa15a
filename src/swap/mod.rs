//! Swap instruction types handed to the adapter by the swap-detection side
//!
//! A [`SwapInstruction`] is immutable once constructed, with one exception:
//! the fee/sequence [`SwapExtras`] are written back by the build pipeline the
//! first time they are defaulted, so a retry of the same instruction reuses
//! them.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain identifier as carried by the router (decimal string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Kind of cross-chain swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapKind {
    Erc20Swap,
    NftSwap,
    AnyCallSwap,
}

impl fmt::Display for SwapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapKind::Erc20Swap => "erc20_swap",
            SwapKind::NftSwap => "nft_swap",
            SwapKind::AnyCallSwap => "anycall_swap",
        };
        f.write_str(name)
    }
}

/// Caller-pinned or previously defaulted fee and sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapExtras {
    /// Account sequence the transaction builds on (it consumes `sequence + 1`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// Base fee in stroops, decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
}

/// A detected cross-chain swap, ready to be paid out on the destination ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInstruction {
    from_chain_id: ChainId,
    to_chain_id: ChainId,
    swap_id: String,
    #[serde(default)]
    log_index: u32,
    token_id: String,
    origin_token: String,
    #[serde(with = "decimal_string")]
    origin_value: BigUint,
    sender: String,
    receiver: String,
    #[serde(default)]
    origin_from: String,
    #[serde(default)]
    origin_tx_to: String,
    swap_kind: SwapKind,
    #[serde(default)]
    extras: Option<SwapExtras>,
}

impl SwapInstruction {
    pub fn builder() -> SwapInstructionBuilder {
        SwapInstructionBuilder::default()
    }

    pub fn from_chain_id(&self) -> &ChainId {
        &self.from_chain_id
    }

    pub fn to_chain_id(&self) -> &ChainId {
        &self.to_chain_id
    }

    /// Cross-chain correlation id, usually the origin transaction hash in hex
    pub fn swap_id(&self) -> &str {
        &self.swap_id
    }

    pub fn log_index(&self) -> u32 {
        self.log_index
    }

    /// Canonical multichain token id
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    /// Token contract on the origin chain
    pub fn origin_token(&self) -> &str {
        &self.origin_token
    }

    /// Amount in origin-chain smallest units
    pub fn origin_value(&self) -> &BigUint {
        &self.origin_value
    }

    /// Declared destination-chain sender
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Destination-chain receiver the payment goes to
    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn origin_from(&self) -> &str {
        &self.origin_from
    }

    pub fn origin_tx_to(&self) -> &str {
        &self.origin_tx_to
    }

    pub fn swap_kind(&self) -> SwapKind {
        self.swap_kind
    }

    pub fn extras(&self) -> Option<&SwapExtras> {
        self.extras.as_ref()
    }

    /// Drop cached fee/sequence so the next build resolves them afresh
    pub fn reset_extras(&mut self) {
        self.extras = None;
    }

    pub(crate) fn set_extras(&mut self, extras: SwapExtras) {
        self.extras = Some(extras);
    }
}

/// Builder for [`SwapInstruction`]
#[derive(Debug, Default)]
pub struct SwapInstructionBuilder {
    from_chain_id: Option<ChainId>,
    to_chain_id: Option<ChainId>,
    swap_id: String,
    log_index: u32,
    token_id: String,
    origin_token: String,
    origin_value: BigUint,
    sender: String,
    receiver: String,
    origin_from: String,
    origin_tx_to: String,
    swap_kind: Option<SwapKind>,
    extras: Option<SwapExtras>,
}

impl SwapInstructionBuilder {
    pub fn route(mut self, from: impl Into<ChainId>, to: impl Into<ChainId>) -> Self {
        self.from_chain_id = Some(from.into());
        self.to_chain_id = Some(to.into());
        self
    }

    pub fn swap_id(mut self, swap_id: impl Into<String>, log_index: u32) -> Self {
        self.swap_id = swap_id.into();
        self.log_index = log_index;
        self
    }

    pub fn token(mut self, token_id: impl Into<String>, origin_token: impl Into<String>) -> Self {
        self.token_id = token_id.into();
        self.origin_token = origin_token.into();
        self
    }

    pub fn origin_value(mut self, value: impl Into<BigUint>) -> Self {
        self.origin_value = value.into();
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = receiver.into();
        self
    }

    pub fn origin_tx(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.origin_from = from.into();
        self.origin_tx_to = to.into();
        self
    }

    pub fn swap_kind(mut self, kind: SwapKind) -> Self {
        self.swap_kind = Some(kind);
        self
    }

    pub fn extras(mut self, extras: SwapExtras) -> Self {
        self.extras = Some(extras);
        self
    }

    pub fn build(self) -> SwapInstruction {
        SwapInstruction {
            from_chain_id: self.from_chain_id.unwrap_or_else(|| ChainId::new("")),
            to_chain_id: self.to_chain_id.unwrap_or_else(|| ChainId::new("")),
            swap_id: self.swap_id,
            log_index: self.log_index,
            token_id: self.token_id,
            origin_token: self.origin_token,
            origin_value: self.origin_value,
            sender: self.sender,
            receiver: self.receiver,
            origin_from: self.origin_from,
            origin_tx_to: self.origin_tx_to,
            swap_kind: self.swap_kind.unwrap_or(SwapKind::Erc20Swap),
            extras: self.extras,
        }
    }
}

/// Serde adapter carrying big integers as decimal strings
mod decimal_string {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BigUint::from_str(raw.trim()).map_err(de::Error::custom)
    }
}
