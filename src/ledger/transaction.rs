//! Unsigned payment transactions and their signing hash

use super::amount::{format_stroops, parse_stroops};
use super::asset::AssetDescriptor;
use super::strkey::AccountId;
use super::xdr::{WriteXdr, XdrWriter};
use crate::error::LedgerError;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Minimum base fee per operation, in stroops
pub const MIN_BASE_FEE: u32 = 100;

/// Maximum operations in one transaction
pub const MAX_OPERATIONS: usize = 100;

const ENVELOPE_TYPE_TX: u32 = 2;
const PRECOND_TIME: u32 = 1;
const MEMO_HASH: u32 = 3;
const OPERATION_PAYMENT: u32 = 1;

/// Source account as seen when the transaction was built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    /// Current sequence number of the account
    pub sequence: u64,
}

/// Validity window in unix seconds, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    pub fn with_timeout(now: u64, timeout_secs: u64) -> Self {
        Self {
            min_time: now,
            max_time: now.saturating_add(timeout_secs),
        }
    }
}

/// 32-byte memo hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoHash(pub [u8; 32]);

impl MemoHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for MemoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for MemoHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Payment operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    destination: AccountId,
    asset: AssetDescriptor,
    amount: i64,
}

impl Payment {
    pub fn new(destination: &str, amount: &str, asset: AssetDescriptor) -> Result<Self, LedgerError> {
        let destination = destination.parse()?;
        let stroops = parse_stroops(amount)?;
        if stroops <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount.to_string()));
        }
        Ok(Self {
            destination,
            asset,
            amount: stroops,
        })
    }

    pub fn destination(&self) -> &AccountId {
        &self.destination
    }

    pub fn asset(&self) -> &AssetDescriptor {
        &self.asset
    }

    /// Amount in stroops
    pub fn stroops(&self) -> i64 {
        self.amount
    }

    /// Amount in the ledger's seven-digit text form
    pub fn amount(&self) -> String {
        format_stroops(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Payment(Payment),
}

impl WriteXdr for Operation {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // no per-operation source account
        w.write_bool(false);
        match self {
            Operation::Payment(payment) => {
                w.write_u32(OPERATION_PAYMENT);
                payment.destination.write_xdr(w);
                payment.asset.write_xdr(w);
                w.write_i64(payment.amount);
            }
        }
    }
}

/// Inputs for [`Transaction::new`]
#[derive(Debug, Clone)]
pub struct TransactionParams {
    pub source_account: AccountSnapshot,
    /// Consume `source_account.sequence + 1` rather than the sequence itself
    pub increment_sequence_num: bool,
    /// Fee per operation, in stroops
    pub base_fee: u32,
    pub time_bounds: TimeBounds,
    pub memo: MemoHash,
    pub operations: Vec<Operation>,
}

/// A validated, unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    source_account: AccountId,
    seq_num: i64,
    base_fee: u32,
    fee: u32,
    time_bounds: TimeBounds,
    memo: MemoHash,
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(params: TransactionParams) -> Result<Self, LedgerError> {
        let source_account: AccountId = params.source_account.account_id.parse()?;

        let sequence = params.source_account.sequence;
        let seq_num = if params.increment_sequence_num {
            sequence.checked_add(1)
        } else {
            Some(sequence)
        }
        .and_then(|s| i64::try_from(s).ok())
        .ok_or(LedgerError::SequenceOverflow(sequence))?;

        let count = params.operations.len();
        if count == 0 || count > MAX_OPERATIONS {
            return Err(LedgerError::OperationCount {
                got: count,
                max: MAX_OPERATIONS,
            });
        }

        if params.base_fee < MIN_BASE_FEE {
            return Err(LedgerError::InvalidFee(params.base_fee.to_string()));
        }
        let fee = params
            .base_fee
            .checked_mul(count as u32)
            .ok_or_else(|| LedgerError::InvalidFee(params.base_fee.to_string()))?;

        Ok(Self {
            source_account,
            seq_num,
            base_fee: params.base_fee,
            fee,
            time_bounds: params.time_bounds,
            memo: params.memo,
            operations: params.operations,
        })
    }

    pub fn source_account(&self) -> &AccountId {
        &self.source_account
    }

    /// Sequence number this transaction consumes
    pub fn sequence_number(&self) -> i64 {
        self.seq_num
    }

    pub fn base_fee(&self) -> u32 {
        self.base_fee
    }

    /// Total fee: base fee times operation count
    pub fn fee(&self) -> u32 {
        self.fee
    }

    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    pub fn memo(&self) -> &MemoHash {
        &self.memo
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Unsigned `TransactionEnvelope` (v1, no signatures)
    pub fn envelope_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.write_u32(ENVELOPE_TYPE_TX);
        self.write_xdr(&mut w);
        w.write_u32(0);
        w.into_bytes()
    }

    pub fn envelope_xdr_base64(&self) -> String {
        BASE64.encode(self.envelope_xdr())
    }

    /// Signing hash bound to a network passphrase
    pub fn hash(&self, network_passphrase: &str) -> [u8; 32] {
        let network_id = Sha256::digest(network_passphrase.as_bytes());

        let mut w = XdrWriter::new();
        w.write_opaque_fixed(&network_id);
        w.write_u32(ENVELOPE_TYPE_TX);
        self.write_xdr(&mut w);

        Sha256::digest(w.into_bytes()).into()
    }
}

impl WriteXdr for Transaction {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // MuxedAccount, ed25519 arm: same layout as a plain public key
        self.source_account.write_xdr(w);
        w.write_u32(self.fee);
        w.write_i64(self.seq_num);

        w.write_u32(PRECOND_TIME);
        w.write_u64(self.time_bounds.min_time);
        w.write_u64(self.time_bounds.max_time);

        w.write_u32(MEMO_HASH);
        w.write_opaque_fixed(self.memo.as_bytes());

        w.write_u32(self.operations.len() as u32);
        for op in &self.operations {
            op.write_xdr(w);
        }

        // ext
        w.write_u32(0);
    }
}
