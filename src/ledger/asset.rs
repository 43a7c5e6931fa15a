//! Payable assets on the destination ledger

use super::strkey::AccountId;
use super::xdr::{WriteXdr, XdrWriter};
use crate::error::LedgerError;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const ASSET_TYPE_NATIVE: u32 = 0;
const ASSET_TYPE_CREDIT_ALPHANUM4: u32 = 1;
const ASSET_TYPE_CREDIT_ALPHANUM12: u32 = 2;

/// Ledger-local identifier for a payable currency
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetDescriptor {
    /// The ledger's native currency
    Native,
    /// Issued asset with a 1-4 character code
    CreditAlphanum4 { code: String, issuer: AccountId },
    /// Issued asset with a 5-12 character code
    CreditAlphanum12 { code: String, issuer: AccountId },
}

impl AssetDescriptor {
    /// Build an issued asset, picking the code width from its length
    pub fn credit(code: &str, issuer: AccountId) -> Result<Self, LedgerError> {
        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(LedgerError::InvalidAssetCode(code.to_string()));
        }
        match code.len() {
            1..=4 => Ok(Self::CreditAlphanum4 {
                code: code.to_string(),
                issuer,
            }),
            5..=12 => Ok(Self::CreditAlphanum12 {
                code: code.to_string(),
                issuer,
            }),
            _ => Err(LedgerError::InvalidAssetCode(code.to_string())),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl FromStr for AssetDescriptor {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(Self::Native);
        }
        let (code, issuer) = s
            .split_once(':')
            .ok_or_else(|| LedgerError::InvalidAsset(s.to_string()))?;
        Self::credit(code, issuer.parse()?)
    }
}

impl fmt::Display for AssetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::CreditAlphanum4 { code, issuer } | Self::CreditAlphanum12 { code, issuer } => {
                write!(f, "{}:{}", code, issuer)
            }
        }
    }
}

impl Serialize for AssetDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl WriteXdr for AccountId {
    /// PublicKey union, ed25519 arm
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_u32(0);
        w.write_opaque_fixed(self.as_bytes());
    }
}

impl WriteXdr for AssetDescriptor {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Native => w.write_u32(ASSET_TYPE_NATIVE),
            Self::CreditAlphanum4 { code, issuer } => {
                w.write_u32(ASSET_TYPE_CREDIT_ALPHANUM4);
                w.write_opaque_fixed(&padded_code::<4>(code));
                issuer.write_xdr(w);
            }
            Self::CreditAlphanum12 { code, issuer } => {
                w.write_u32(ASSET_TYPE_CREDIT_ALPHANUM12);
                w.write_opaque_fixed(&padded_code::<12>(code));
                issuer.write_xdr(w);
            }
        }
    }
}

fn padded_code<const N: usize>(code: &str) -> [u8; N] {
    let mut out = [0u8; N];
    for (slot, byte) in out.iter_mut().zip(code.bytes()) {
        *slot = byte;
    }
    out
}
