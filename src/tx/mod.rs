//! Transaction building with sequence management and fee policy

mod amount;
mod assembler;
mod extras;
mod fee;
mod memo;
mod sequence;

pub use amount::ScaledAmount;
pub use assembler::{
    BuiltTransaction, BuiltTransactionView, PaymentRequest, TransactionAssembler,
    DEFAULT_TX_TIMEOUT_SECS,
};
pub use extras::{FeeSequencePair, FeeSequenceProvider, ResolvedExtras};
pub use fee::FeePolicy;
pub use memo::encode_memo;
pub use sequence::{AdjustedPoolNonce, SequenceAllocation, SequenceStrategy};
