//! Unsigned payment transaction assembly

use crate::error::LedgerError;
use crate::ledger::{
    AccountSnapshot, AssetDescriptor, MemoHash, Operation, Payment, TimeBounds, Transaction,
    TransactionParams,
};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

/// Default validity window of a built transaction, in seconds
pub const DEFAULT_TX_TIMEOUT_SECS: u64 = 300;

/// Everything needed to assemble one payment
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Source account with the sequence the transaction builds on
    pub source: AccountSnapshot,
    pub destination: String,
    /// Amount in seven-digit text form
    pub amount: String,
    /// Base fee in stroops, decimal string
    pub fee: String,
    pub memo: MemoHash,
    pub asset: AssetDescriptor,
}

/// An unsigned transaction together with the hash its signer must sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub transaction: Transaction,
    pub signing_hash: [u8; 32],
}

impl BuiltTransaction {
    pub fn signing_hash_hex(&self) -> String {
        hex::encode(self.signing_hash)
    }

    /// Base64 XDR of the unsigned envelope
    pub fn envelope_xdr_base64(&self) -> String {
        self.transaction.envelope_xdr_base64()
    }

    /// First payment of the transaction
    pub fn payment(&self) -> Option<&Payment> {
        self.transaction
            .operations()
            .first()
            .map(|op| match op {
                Operation::Payment(payment) => payment,
            })
    }
}

/// Serialized form handed to signers
#[derive(Debug, Clone, Serialize)]
pub struct BuiltTransactionView {
    pub envelope_xdr: String,
    pub signing_hash: String,
    pub source: String,
    pub sequence: i64,
    pub fee: u32,
    pub memo: MemoHash,
}

impl From<&BuiltTransaction> for BuiltTransactionView {
    fn from(built: &BuiltTransaction) -> Self {
        Self {
            envelope_xdr: built.envelope_xdr_base64(),
            signing_hash: built.signing_hash_hex(),
            source: built.transaction.source_account().to_string(),
            sequence: built.transaction.sequence_number(),
            fee: built.transaction.fee(),
            memo: *built.transaction.memo(),
        }
    }
}

/// Builds single-payment transactions for one network
#[derive(Debug, Clone)]
pub struct TransactionAssembler {
    network_passphrase: String,
    min_base_fee: u32,
    timeout_secs: u64,
}

impl TransactionAssembler {
    pub fn new(network_passphrase: impl Into<String>, min_base_fee: u32, timeout_secs: u64) -> Self {
        Self {
            network_passphrase: network_passphrase.into(),
            min_base_fee,
            timeout_secs,
        }
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// Assemble with the current wall clock as the lower time bound
    pub fn assemble(&self, request: PaymentRequest) -> Result<BuiltTransaction, LedgerError> {
        let now = Utc::now().timestamp().max(0) as u64;
        self.assemble_at(request, now)
    }

    /// Assemble a transaction valid from `now` for the configured window
    ///
    /// The transaction consumes `source.sequence + 1`. The offered fee is
    /// raised to the configured minimum when below it.
    pub fn assemble_at(
        &self,
        request: PaymentRequest,
        now: u64,
    ) -> Result<BuiltTransaction, LedgerError> {
        let offered: u32 = request
            .fee
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidFee(request.fee.clone()))?;
        let base_fee = offered.max(self.min_base_fee);

        let payment = Payment::new(&request.destination, &request.amount, request.asset)?;

        let transaction = Transaction::new(TransactionParams {
            source_account: request.source,
            increment_sequence_num: true,
            base_fee,
            time_bounds: TimeBounds::with_timeout(now, self.timeout_secs),
            memo: request.memo,
            operations: vec![Operation::Payment(payment)],
        })?;

        let signing_hash = transaction.hash(&self.network_passphrase);

        info!(
            destination = %request.destination,
            amount = %request.amount,
            memo = %request.memo,
            fee = base_fee,
            signing_hash = %hex::encode(signing_hash),
            "Build unsigned payment tx success"
        );

        Ok(BuiltTransaction {
            transaction,
            signing_hash,
        })
    }
}
