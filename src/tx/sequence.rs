//! Sequence management for reliable transaction building
//!
//! Handles:
//! - Local tracking of the highest sequence issued per account
//! - Serializing allocation for one account across concurrent builds
//! - Releasing a sequence whose transaction will never be broadcast

use crate::chain::{AccountState, AccountStateProvider};
use crate::error::{BuildError, BuildResult};

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Sequence handed out for one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceAllocation {
    /// Account sequence the transaction builds on; it consumes the value plus one
    pub sequence: u64,
    /// Live account state the allocation was read from
    pub account: AccountState,
}

/// Policy deciding which sequence a new transaction builds on
#[async_trait]
pub trait SequenceStrategy: Send + Sync {
    /// Allocate the sequence the next transaction for `address` builds on
    async fn next_sequence(&self, address: &str) -> BuildResult<SequenceAllocation>;

    /// Give back `sequence` when its transaction will never be broadcast
    async fn release(&self, address: &str, sequence: u64);

    fn name(&self) -> &'static str;
}

/// Allocation state for one account
#[derive(Debug, Default)]
struct Tracker {
    /// Highest sequence consumed by an issued transaction
    issued: Option<u64>,
    /// Released sequences below `issued`, handed out again before new ones
    released: BTreeSet<u64>,
}

/// Live account sequence, adjusted so this process never reuses or regresses
/// below a sequence it already handed out
pub struct AdjustedPoolNonce {
    accounts: Arc<dyn AccountStateProvider>,
    trackers: DashMap<String, Arc<Mutex<Tracker>>>,
}

impl AdjustedPoolNonce {
    /// Create a new allocator
    pub fn new(accounts: Arc<dyn AccountStateProvider>) -> Self {
        Self {
            accounts,
            trackers: DashMap::new(),
        }
    }

    fn slot(&self, address: &str) -> Arc<Mutex<Tracker>> {
        self.trackers
            .entry(address.to_ascii_uppercase())
            .or_default()
            .clone()
    }

    #[cfg(test)]
    async fn issued(&self, address: &str) -> Option<u64> {
        self.slot(address).lock().await.issued
    }
}

#[async_trait]
impl SequenceStrategy for AdjustedPoolNonce {
    async fn next_sequence(&self, address: &str) -> BuildResult<SequenceAllocation> {
        let slot = self.slot(address);
        // Held across the fetch: builds for one account allocate one at a time
        let mut tracker = slot.lock().await;

        let account = self
            .accounts
            .account(address)
            .await
            .map_err(|source| BuildError::SequenceFetchFailed {
                account: address.to_string(),
                source,
            })?;
        let live = account.sequence;

        // Released sequences the chain has already passed are gone for good
        tracker.released = tracker.released.split_off(&live);
        if let Some(sequence) = tracker.released.pop_first() {
            crate::metrics::record_sequence_allocated(self.name());
            debug!("Reallocated released sequence {} for {}", sequence, address);
            return Ok(SequenceAllocation { sequence, account });
        }

        let sequence = match tracker.issued {
            Some(last) if last > live => {
                debug!(
                    "Adjusted sequence for {}: chain reports {}, already issued up to {}",
                    address, live, last
                );
                last
            }
            _ => live,
        };
        tracker.issued = Some(sequence.saturating_add(1));

        crate::metrics::record_sequence_allocated(self.name());
        debug!("Allocated sequence {} for {}", sequence, address);
        Ok(SequenceAllocation { sequence, account })
    }

    /// The latest allocation rewinds the tracker; an older one is kept for
    /// the next build so no gap is left behind
    async fn release(&self, address: &str, sequence: u64) {
        let slot = self.slot(address);
        let mut tracker = slot.lock().await;
        let Some(issued) = tracker.issued else {
            warn!("Release of sequence {} for {} with nothing issued", sequence, address);
            return;
        };

        if issued == sequence.saturating_add(1) {
            let mut top = sequence;
            while top > 0 && tracker.released.remove(&(top - 1)) {
                top -= 1;
            }
            tracker.issued = Some(top);
        } else if sequence < issued {
            tracker.released.insert(sequence);
        } else {
            warn!("Sequence {} for {} was never allocated", sequence, address);
            return;
        }
        debug!("Released sequence {} for {}", sequence, address);
    }

    fn name(&self) -> &'static str {
        "adjusted_pool_nonce"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{AccountState, MockAccountStateProvider};
    use crate::error::ProviderError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    const ACCOUNT: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";

    fn state(sequence: u64) -> AccountState {
        AccountState {
            account_id: ACCOUNT.to_string(),
            sequence,
            native_balance: 100_000_000,
            subentry_count: 0,
        }
    }

    /// Chain whose sequence only moves when the test says so
    struct SlowChain {
        sequence: AtomicU64,
    }

    #[async_trait]
    impl AccountStateProvider for SlowChain {
        async fn account(&self, _address: &str) -> Result<AccountState, ProviderError> {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(state(self.sequence.load(Ordering::SeqCst)))
        }
    }

    #[tokio::test]
    async fn test_never_reuses_issued_sequence() {
        let mut accounts = MockAccountStateProvider::new();
        accounts
            .expect_account()
            .times(2)
            .returning(|_| Ok(state(100)));
        let strategy = AdjustedPoolNonce::new(Arc::new(accounts));

        let first = strategy.next_sequence(ACCOUNT).await.unwrap();
        assert_eq!(first.sequence, 100);
        assert_eq!(first.account, state(100));
        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 101);
        assert_eq!(strategy.issued(ACCOUNT).await, Some(102));
    }

    #[tokio::test]
    async fn test_follows_chain_when_ahead() {
        let chain = Arc::new(SlowChain {
            sequence: AtomicU64::new(10),
        });
        let strategy = AdjustedPoolNonce::new(chain.clone());

        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 10);
        chain.sequence.store(50, Ordering::SeqCst);
        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 50);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let mut accounts = MockAccountStateProvider::new();
        accounts
            .expect_account()
            .returning(|_| Err(ProviderError::AllProvidersFailed(2)));
        let strategy = AdjustedPoolNonce::new(Arc::new(accounts));

        let err = strategy.next_sequence(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, BuildError::SequenceFetchFailed { .. }));
        assert!(err.is_retryable());
        assert_eq!(strategy.issued(ACCOUNT).await, None);
    }

    #[tokio::test]
    async fn test_release_latest_rewinds() {
        let chain = Arc::new(SlowChain {
            sequence: AtomicU64::new(7),
        });
        let strategy = AdjustedPoolNonce::new(chain);

        let first = strategy.next_sequence(ACCOUNT).await.unwrap().sequence;
        let second = strategy.next_sequence(ACCOUNT).await.unwrap().sequence;
        assert_eq!((first, second), (7, 8));

        strategy.release(ACCOUNT, second).await;
        assert_eq!(strategy.issued(ACCOUNT).await, Some(8));
        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 8);
    }

    #[tokio::test]
    async fn test_release_older_is_reused_first() {
        let chain = Arc::new(SlowChain {
            sequence: AtomicU64::new(7),
        });
        let strategy = AdjustedPoolNonce::new(chain);

        for expected in 7..10 {
            assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, expected);
        }

        strategy.release(ACCOUNT, 7).await;
        assert_eq!(strategy.issued(ACCOUNT).await, Some(10));
        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 7);
        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 10);
    }

    #[tokio::test]
    async fn test_release_collapses_trailing_gaps() {
        let chain = Arc::new(SlowChain {
            sequence: AtomicU64::new(7),
        });
        let strategy = AdjustedPoolNonce::new(chain);

        for _ in 0..3 {
            strategy.next_sequence(ACCOUNT).await.unwrap();
        }

        // 8 is held back until 9 goes, then both rewind together
        strategy.release(ACCOUNT, 8).await;
        strategy.release(ACCOUNT, 9).await;
        assert_eq!(strategy.issued(ACCOUNT).await, Some(8));
        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 8);
    }

    #[tokio::test]
    async fn test_released_below_chain_is_dropped() {
        let chain = Arc::new(SlowChain {
            sequence: AtomicU64::new(7),
        });
        let strategy = AdjustedPoolNonce::new(chain.clone());

        strategy.next_sequence(ACCOUNT).await.unwrap();
        strategy.next_sequence(ACCOUNT).await.unwrap();
        strategy.release(ACCOUNT, 7).await;

        chain.sequence.store(20, Ordering::SeqCst);
        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 20);
    }

    #[tokio::test]
    async fn test_address_case_shares_slot() {
        let chain = Arc::new(SlowChain {
            sequence: AtomicU64::new(1),
        });
        let strategy = AdjustedPoolNonce::new(chain);

        assert_eq!(strategy.next_sequence(ACCOUNT).await.unwrap().sequence, 1);
        assert_eq!(
            strategy
                .next_sequence(&ACCOUNT.to_lowercase())
                .await
                .unwrap()
                .sequence,
            2
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocations_are_unique() {
        let chain = Arc::new(SlowChain {
            sequence: AtomicU64::new(1_000),
        });
        let strategy = Arc::new(AdjustedPoolNonce::new(chain));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let strategy = strategy.clone();
                tokio::spawn(async move { strategy.next_sequence(ACCOUNT).await.unwrap().sequence })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
        assert_eq!(seen, (1_000..1_020).collect::<HashSet<_>>());
    }
}
