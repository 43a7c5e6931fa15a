//! Build pipeline: swap instruction → unsigned payment transaction

use super::conversion::{AmountConverter, PayoutAmount};
use super::gate::IdentityGate;
use super::resolver::{AssetResolver, ResolvedAsset};
use super::BuildStage;
use crate::chain::{AccountState, AccountStateProvider};
use crate::config::{AdapterConfig, Settings};
use crate::error::{BuildError, BuildResult, LedgerError};
use crate::ledger::AccountSnapshot;
use crate::registry::{
    AssetRegistry, DecimalRescaleConverter, SignerRegistry, StaticSignerRegistry,
    StaticTokenRegistry, TokenRegistry, ValueConverter,
};
use crate::swap::{ChainId, SwapInstruction};
use crate::tx::{
    encode_memo, AdjustedPoolNonce, BuiltTransaction, FeePolicy, FeeSequencePair,
    FeeSequenceProvider, PaymentRequest, SequenceStrategy, TransactionAssembler,
};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// External services the pipeline consults
pub struct Collaborators {
    pub signers: Arc<dyn SignerRegistry>,
    pub tokens: Arc<dyn TokenRegistry>,
    pub assets: Arc<AssetRegistry>,
    pub converter: Arc<dyn ValueConverter>,
    pub accounts: Arc<dyn AccountStateProvider>,
    pub sequences: Arc<dyn SequenceStrategy>,
}

/// Turns swap instructions into unsigned payment transactions
///
/// Every call is independent. The only shared mutable state is the sequence
/// tracker inside the strategy.
pub struct BuildPipeline {
    chain_id: ChainId,
    gate: IdentityGate,
    resolver: AssetResolver,
    amounts: AmountConverter,
    extras: FeeSequenceProvider,
    accounts: Arc<dyn AccountStateProvider>,
    assembler: TransactionAssembler,
}

impl BuildPipeline {
    /// Create a new build pipeline
    pub fn new(config: &AdapterConfig, collaborators: Collaborators) -> Self {
        let chain_id = config.chain_id.clone();
        let fee_policy = FeePolicy::from_config(config);
        let assembler = TransactionAssembler::new(
            config.network_passphrase.clone(),
            fee_policy.min_base_fee(),
            config.tx_timeout_secs,
        );

        Self {
            gate: IdentityGate::new(chain_id.clone(), config.test_mode, collaborators.signers),
            resolver: AssetResolver::new(
                chain_id.clone(),
                collaborators.tokens.clone(),
                collaborators.assets,
            ),
            amounts: AmountConverter::new(
                chain_id.clone(),
                collaborators.tokens,
                collaborators.converter,
            ),
            extras: FeeSequenceProvider::new(collaborators.sequences, fee_policy),
            accounts: collaborators.accounts,
            assembler,
            chain_id,
        }
    }

    /// Wire the pipeline from static configuration and a live account source
    pub fn from_settings(
        settings: &Settings,
        accounts: Arc<dyn AccountStateProvider>,
    ) -> anyhow::Result<Self> {
        let collaborators = Collaborators {
            signers: Arc::new(StaticSignerRegistry::from_settings(settings)),
            tokens: Arc::new(StaticTokenRegistry::from_settings(settings)),
            assets: Arc::new(settings.asset_registry()?),
            converter: Arc::new(DecimalRescaleConverter),
            sequences: Arc::new(AdjustedPoolNonce::new(accounts.clone())),
            accounts,
        };
        Ok(Self::new(&settings.adapter, collaborators))
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn network_passphrase(&self) -> &str {
        self.assembler.network_passphrase()
    }

    /// Build the unsigned payment for `instruction`
    ///
    /// Defaulted fee and sequence are written back onto the instruction so a
    /// retry of the same instruction reuses them.
    pub async fn build(&self, instruction: &mut SwapInstruction) -> BuildResult<BuiltTransaction> {
        let started = Instant::now();
        let result = self.run(instruction).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => {
                if e.should_alert() {
                    error!(swap_id = %instruction.swap_id(), kind = e.kind(), "Build failed: {}", e);
                } else {
                    warn!(swap_id = %instruction.swap_id(), kind = e.kind(), "Build failed: {}", e);
                }
                e.kind()
            }
        };
        crate::metrics::record_build(
            self.chain_id.as_str(),
            outcome,
            started.elapsed().as_secs_f64(),
        );

        result
    }

    async fn run(&self, instruction: &mut SwapInstruction) -> BuildResult<BuiltTransaction> {
        let swap_id = instruction.swap_id().to_string();
        let stage = |done: BuildStage| debug!(swap_id = %swap_id, "Stage {} complete", done);

        let signer = self.gate.check(instruction)?;
        stage(BuildStage::Validated);

        let resolved = self
            .resolver
            .resolve(instruction.token_id(), instruction.to_chain_id())?;
        stage(BuildStage::AssetResolved);

        let payout = self.amounts.compute(instruction, &resolved.config)?;
        stage(BuildStage::AmountComputed);

        let extras = self.extras.resolve(instruction, &signer.address).await?;
        stage(BuildStage::FeeSequenceResolved);

        let finished = self
            .finish(
                instruction,
                signer.address.clone(),
                &resolved,
                payout,
                extras.pair.clone(),
                extras.account.as_ref(),
            )
            .await;
        if finished.is_err() {
            // no partial work: the allocation and defaulted extras are undone
            self.extras
                .rollback(instruction, &signer.address, extras)
                .await;
        }
        finished
    }

    /// Stages after fee and sequence are fixed
    async fn finish(
        &self,
        instruction: &SwapInstruction,
        source: String,
        resolved: &ResolvedAsset,
        payout: PayoutAmount,
        pair: FeeSequencePair,
        fetched: Option<&AccountState>,
    ) -> BuildResult<BuiltTransaction> {
        let swap_id = instruction.swap_id();
        let stage = |done: BuildStage| debug!(swap_id = %swap_id, "Stage {} complete", done);

        let base_fee = pair
            .fee
            .trim()
            .parse::<u32>()
            .map_err(|_| LedgerError::InvalidFee(pair.fee.clone()))?
            .max(self.extras.fee_policy().min_base_fee());
        self.check_reserve(&source, base_fee, resolved, payout.amount.stroops(), fetched)
            .await?;
        stage(BuildStage::BalanceChecked);

        let memo = encode_memo(instruction.swap_id(), instruction.log_index());
        stage(BuildStage::MemoEncoded);

        let built = self.assembler.assemble(PaymentRequest {
            source: AccountSnapshot {
                account_id: source,
                sequence: pair.sequence,
            },
            destination: payout.receiver.to_string(),
            amount: payout.amount.to_string(),
            fee: pair.fee,
            memo,
            asset: resolved.asset.clone(),
        })?;
        stage(BuildStage::Assembled);

        Ok(built)
    }

    /// Fail before assembly if the source could not cover reserve plus fee
    ///
    /// Reuses the state read during sequence allocation when there was one.
    async fn check_reserve(
        &self,
        account: &str,
        fee: u32,
        resolved: &ResolvedAsset,
        stroops: i64,
        fetched: Option<&AccountState>,
    ) -> BuildResult<()> {
        let state = match fetched {
            Some(state) => state.clone(),
            None => self
                .accounts
                .account(account)
                .await
                .map_err(|source| BuildError::AccountState {
                    account: account.to_string(),
                    source,
                })?,
        };

        let native_spend = if resolved.asset.is_native() { stroops } else { 0 };
        let need = self
            .extras
            .fee_policy()
            .required_balance(state.subentry_count, fee, native_spend);

        if state.native_balance < need {
            return Err(BuildError::InsufficientReserveBalance {
                account: account.to_string(),
                have: state.native_balance,
                need,
            });
        }
        Ok(())
    }
}
