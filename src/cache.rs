// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

//! TTL-gated cache of the user and bin indexes.
//!
//! The two indexes only make sense as a pair from the same refresh cycle, so
//! they live inside one [`CacheState`] behind an `Arc` that is swapped in a
//! single write. Readers grab a snapshot and keep working on it even while a
//! newer state lands; they can observe the old pair or the new pair, never a
//! mix. A mutex serializes refreshes so a manual `/refresh` and a staleness
//! trigger cannot rebuild concurrently.

use crate::index::{self, BinIndex, UserIndex};
use crate::nemo::RecordSource;
use crate::nemo::error::NemoError;
use crate::time::SimpleTime;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// One complete refresh cycle's worth of data.
pub struct CacheState {
    pub users: UserIndex,
    pub bins: BinIndex,
    /// Completion time of the refresh that produced this state. Measuring the
    /// TTL from completion rather than start keeps a slow refresh from
    /// immediately re-triggering itself.
    pub last_refresh: SimpleTime,
}

impl CacheState {
    /// The state before the first load. `last_refresh` at the epoch makes it
    /// permanently stale.
    fn empty() -> Self {
        Self {
            users: UserIndex::default(),
            bins: BinIndex::default(),
            last_refresh: SimpleTime::UNIX_EPOCH,
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.last_refresh.elapsed() > ttl
    }
}

/// Key counts reported after a successful rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub users: usize,
    pub bins: usize,
}

/// A rebuild whose fetch phase failed outright: zero records plus a
/// fetch-level error for the named collection. Partial (degraded) fetches do
/// not produce this; they rebuild with what they got.
#[derive(Debug)]
pub enum RefreshError {
    Users(NemoError),
    Bins(NemoError),
}

impl Display for RefreshError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshError::Users(error) => write!(f, "user fetch failed: {error}"),
            RefreshError::Bins(error) => write!(f, "bin fetch failed: {error}"),
        }
    }
}

impl std::error::Error for RefreshError {}

pub struct CacheManager<S> {
    source: S,
    ttl: Duration,
    state: RwLock<Arc<CacheState>>,
    /// Mutual exclusion for rebuilds, manual and staleness-triggered alike
    refresh_gate: Mutex<()>,
}

impl<S: RecordSource> CacheManager<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: RwLock::new(Arc::new(CacheState::empty())),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current state with no staleness check. Never touches the upstream; this
    /// is what `/health` reads.
    pub async fn snapshot(&self) -> Arc<CacheState> {
        Arc::clone(&*self.state.read().await)
    }

    /// Return a state no older than the TTL if the upstream cooperates.
    ///
    /// The rebuild runs on the caller's critical path: the first lookup after
    /// expiry pays the refresh latency. If the rebuild fails the previous
    /// state is served and `last_refresh` stays put, so the next lookup tries
    /// again. After the mandatory startup load this never leaves a caller
    /// without a usable state.
    pub async fn ensure_fresh(&self) -> Arc<CacheState> {
        {
            let state = self.state.read().await;
            if !state.is_stale(self.ttl) {
                return Arc::clone(&*state);
            }
        }
        let gate = self.refresh_gate.lock().await;
        // another lookup may have rebuilt while we waited on the gate
        {
            let state = self.state.read().await;
            if !state.is_stale(self.ttl) {
                return Arc::clone(&*state);
            }
        }
        if let Err(error) = self.rebuild().await {
            warn!("cache refresh failed, serving previous data: {error}");
        }
        drop(gate);
        self.snapshot().await
    }

    /// Unconditional rebuild, regardless of TTL. Shares the gate with
    /// staleness-triggered refreshes, so at most one rebuild runs at a time.
    pub async fn refresh(&self) -> Result<RefreshSummary, RefreshError> {
        let _gate = self.refresh_gate.lock().await;
        self.rebuild().await
    }

    /// Fetch both collections, build both indexes, swap the pair in one write.
    /// Callers must hold `refresh_gate`.
    async fn rebuild(&self) -> Result<RefreshSummary, RefreshError> {
        let started = SimpleTime::now();
        let (user_records, user_degraded) = self
            .source
            .fetch_users()
            .await
            .into_usable()
            .map_err(RefreshError::Users)?;
        let (bin_records, bin_degraded) = self
            .source
            .fetch_bins()
            .await
            .into_usable()
            .map_err(RefreshError::Bins)?;
        if let Some(error) = user_degraded {
            warn!(
                "user fetch degraded, continuing with {} records: {error}",
                user_records.len()
            );
        }
        if let Some(error) = bin_degraded {
            warn!(
                "bin fetch degraded, continuing with {} records: {error}",
                bin_records.len()
            );
        }
        let users = index::index_users(user_records);
        let bins = index::index_bins(bin_records);
        let summary = RefreshSummary {
            users: users.len(),
            bins: bins.len(),
        };
        let last_refresh = SimpleTime::now();
        *self.state.write().await = Arc::new(CacheState {
            users,
            bins,
            last_refresh,
        });
        info!(
            "cache refresh complete in {:.2?}: {} users, {} bins",
            last_refresh.duration_since(started),
            summary.users,
            summary.bins
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nemo::FetchOutcome;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts refresh attempts and can be flipped into total failure.
    struct FakeSource {
        fetches: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
    }

    impl FakeSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: Duration::ZERO,
            })
        }

        fn slow() -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: Duration::from_millis(50),
            })
        }

        fn refresh_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn upstream_error() -> NemoError {
            NemoError::from_status(
                "https://nemo.example/api/users/".to_string(),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }

    impl RecordSource for Arc<FakeSource> {
        fn fetch_users(&self) -> impl Future<Output = FetchOutcome> + Send {
            // one user fetch per rebuild, so this counts rebuild attempts
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail.load(Ordering::SeqCst);
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                if fail {
                    FetchOutcome::degraded(Vec::new(), FakeSource::upstream_error())
                } else {
                    FetchOutcome::complete(vec![json!({
                        "id": 447,
                        "username": "ghopper",
                        "first_name": "Grace",
                        "last_name": "Hopper",
                    })])
                }
            }
        }

        fn fetch_bins(&self) -> impl Future<Output = FetchOutcome> + Send {
            let fail = self.fail.load(Ordering::SeqCst);
            async move {
                if fail {
                    FetchOutcome::degraded(Vec::new(), FakeSource::upstream_error())
                } else {
                    FetchOutcome::complete(vec![json!({
                        "id": 317,
                        "name": "Bin E01",
                        "customer": 447,
                    })])
                }
            }
        }
    }

    #[test]
    fn test_staleness_boundary() {
        let ttl = Duration::from_secs(60);
        let now = SimpleTime::now().as_epoch_millis();
        let just_inside = CacheState {
            last_refresh: SimpleTime::from_unix_millis(now - 59_000),
            ..CacheState::empty()
        };
        let just_past = CacheState {
            last_refresh: SimpleTime::from_unix_millis(now - 61_000),
            ..CacheState::empty()
        };
        assert!(!just_inside.is_stale(ttl));
        assert!(just_past.is_stale(ttl));
        assert!(CacheState::empty().is_stale(ttl), "pre-load state is always stale");
    }

    #[tokio::test]
    async fn test_first_lookup_loads_then_serves_from_cache() {
        let source = FakeSource::new();
        let manager = CacheManager::new(Arc::clone(&source), Duration::from_secs(3600));

        let state = manager.ensure_fresh().await;
        assert_eq!(source.refresh_count(), 1);
        assert!(state.bins.contains_key("317"));

        let state = manager.ensure_fresh().await;
        assert_eq!(source.refresh_count(), 1, "fresh state must not re-fetch");
        assert_eq!(state.users.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_stale_lookups_share_one_refresh() {
        let source = FakeSource::slow();
        let manager = CacheManager::new(Arc::clone(&source), Duration::from_secs(3600));

        let (a, b, c) = tokio::join!(
            manager.ensure_fresh(),
            manager.ensure_fresh(),
            manager.ensure_fresh()
        );
        assert_eq!(source.refresh_count(), 1, "the gate must collapse concurrent refreshes");
        for state in [a, b, c] {
            assert!(state.bins.contains_key("317"));
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_retains_previous_state() {
        let source = FakeSource::new();
        let manager = CacheManager::new(Arc::clone(&source), Duration::from_secs(3600));
        manager.refresh().await.expect("initial refresh should succeed");
        let before = manager.snapshot().await;

        source.fail.store(true, Ordering::SeqCst);
        let result = manager.refresh().await;
        assert!(matches!(result, Err(RefreshError::Users(_))));

        let after = manager.snapshot().await;
        assert_eq!(after.last_refresh, before.last_refresh, "failed refresh must not touch the clock");
        assert!(after.bins.contains_key("317"), "old data must keep serving");
        assert!(after.bins.contains_key("Bin E01"));
    }

    #[tokio::test]
    async fn test_failed_refresh_still_serves_lookups() {
        let source = FakeSource::new();
        let manager = CacheManager::new(Arc::clone(&source), Duration::from_secs(3600));
        manager.refresh().await.expect("initial refresh should succeed");

        source.fail.store(true, Ordering::SeqCst);
        // ensure_fresh on a fresh cache does not refresh, and a forced failure
        // leaves the snapshot intact either way
        let state = manager.ensure_fresh().await;
        assert!(state.bins.contains_key("317"));
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent_against_unchanged_upstream() {
        let source = FakeSource::new();
        let manager = CacheManager::new(Arc::clone(&source), Duration::from_secs(3600));

        let first = manager.refresh().await.expect("first refresh should succeed");
        let first_state = manager.snapshot().await;
        let second = manager.refresh().await.expect("second refresh should succeed");
        let second_state = manager.snapshot().await;

        assert_eq!(first, second);
        assert_eq!(first_state.users, second_state.users);
        assert_eq!(first_state.bins, second_state.bins);
    }

    #[tokio::test]
    async fn test_refresh_counts_keys_not_records() {
        let source = FakeSource::new();
        let manager = CacheManager::new(Arc::clone(&source), Duration::from_secs(3600));
        let summary = manager.refresh().await.expect("refresh should succeed");
        assert_eq!(summary.users, 1);
        // one bin record, reachable under both "317" and "Bin E01"
        assert_eq!(summary.bins, 2);
    }
}
