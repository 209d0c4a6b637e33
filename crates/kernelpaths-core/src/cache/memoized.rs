//! Keyed memoization of asynchronous computations.
//!
//! Each key moves through `Empty -> Pending -> Resolved(at)`:
//!
//! - a query on a Pending key joins the in-flight computation (coalescing)
//! - a query on a fresh Resolved key returns the stored value
//! - a failed computation clears the key so the next query retries
//! - a Resolved record older than the TTL counts as Empty (lazy expiry)
//! - a record whose cancellation token fired counts as Empty
//!
//! The internal lock is never held across an await.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum RecordState<V, E> {
    Pending(SharedResult<V, E>),
    Resolved { value: V, at: Instant },
}

struct Record<V, E> {
    /// Distinguishes this record from later ones stored under the same key.
    generation: u64,
    cancel: Option<CancellationToken>,
    state: RecordState<V, E>,
}

impl<V, E> Record<V, E> {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

struct Entries<K, V, E> {
    records: HashMap<K, Record<V, E>>,
    next_generation: u64,
}

/// Memoizes one asynchronous computation per key.
pub struct MemoizedAsyncCache<K, V, E> {
    entries: Mutex<Entries<K, V, E>>,
    ttl: Option<Duration>,
}

impl<K, V, E> MemoizedAsyncCache<K, V, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// A cache whose values live until invalidated.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                records: HashMap::new(),
                next_generation: 0,
            }),
            ttl: None,
        }
    }

    /// A cache whose resolved values expire `ttl` after they settle.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new()
        }
    }

    pub const fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Return the cached value for `key`, computing it if needed.
    pub async fn get<F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.get_with_cancellation(key, None, compute).await
    }

    /// Like [`get`](Self::get), but attaches `cancel` to a newly created record.
    ///
    /// Once the token fires, later queries treat that record as empty and
    /// compute afresh. Callers already waiting on it still receive whatever
    /// the computation produces. A query that joins an existing record does
    /// not attach its token.
    pub async fn get_with_cancellation<F, Fut>(
        &self,
        key: K,
        cancel: Option<CancellationToken>,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (shared, generation) = {
            let mut entries = self.lock();
            match self.usable_record(&mut entries, &key) {
                Some(Record {
                    state: RecordState::Resolved { value, .. },
                    ..
                }) => return Ok(value.clone()),
                Some(Record {
                    state: RecordState::Pending(shared),
                    generation,
                    ..
                }) => (shared.clone(), *generation),
                None => {
                    let generation = entries.next_generation;
                    entries.next_generation += 1;
                    let shared = compute().boxed().shared();
                    entries.records.insert(
                        key.clone(),
                        Record {
                            generation,
                            cancel,
                            state: RecordState::Pending(shared.clone()),
                        },
                    );
                    (shared, generation)
                }
            }
        };

        let result = shared.await;
        self.settle(&key, generation, &result);
        result
    }

    /// A fresh resolved value, without computing anything.
    pub fn peek(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        match self.usable_record(&mut entries, key) {
            Some(Record {
                state: RecordState::Resolved { value, .. },
                ..
            }) => Some(value.clone()),
            _ => None,
        }
    }

    /// Whether a computation for `key` is currently in flight.
    pub fn is_pending(&self, key: &K) -> bool {
        let mut entries = self.lock();
        matches!(
            self.usable_record(&mut entries, key),
            Some(Record {
                state: RecordState::Pending(_),
                ..
            })
        )
    }

    /// Force `key` back to empty, whatever its state.
    pub fn invalidate(&self, key: &K) {
        if self.lock().records.remove(key).is_some() {
            trace!("Invalidated cache record");
        }
    }

    /// Force every key back to empty.
    pub fn invalidate_all(&self) {
        self.lock().records.clear();
    }

    /// Number of records currently held, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Entries<K, V, E>> {
        // A panic while holding the lock cannot leave a record half-written,
        // so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// The record for `key` if it may be reused; stale records are evicted.
    fn usable_record<'a>(
        &self,
        entries: &'a mut Entries<K, V, E>,
        key: &K,
    ) -> Option<&'a Record<V, E>> {
        let stale = entries.records.get(key).is_some_and(|record| {
            record.is_cancelled()
                || matches!(record.state, RecordState::Resolved { at, .. } if self.is_expired(at))
        });
        if stale {
            entries.records.remove(key);
            trace!("Evicted stale cache record");
            return None;
        }
        entries.records.get(key)
    }

    fn is_expired(&self, at: Instant) -> bool {
        self.ttl.is_some_and(|ttl| at.elapsed() > ttl)
    }

    /// Move the record created as `generation` out of Pending.
    ///
    /// Records that were invalidated or replaced in the meantime are left
    /// alone.
    fn settle(&self, key: &K, generation: u64, result: &Result<V, E>) {
        let mut entries = self.lock();
        let Some(record) = entries.records.get_mut(key) else {
            return;
        };
        if record.generation != generation || !matches!(record.state, RecordState::Pending(_)) {
            return;
        }
        match result {
            Ok(value) if !record.is_cancelled() => {
                record.state = RecordState::Resolved {
                    value: value.clone(),
                    at: Instant::now(),
                };
            }
            _ => {
                entries.records.remove(key);
            }
        }
    }
}

impl<K, V, E> Default for MemoizedAsyncCache<K, V, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    type TestCache = MemoizedAsyncCache<&'static str, usize, String>;

    fn counting(
        counter: &Arc<AtomicUsize>,
    ) -> impl Future<Output = Result<usize, String>> + Send + 'static {
        let counter = Arc::clone(counter);
        async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
    }

    #[tokio::test]
    async fn test_second_get_reuses_resolved_value() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.get("k", || counting(&calls)).await, Ok(1));
        assert_eq!(cache.get("k", || counting(&calls)).await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.peek(&"k"), Some(1));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.get("a", || counting(&calls)).await, Ok(1));
        assert_eq!(cache.get("b", || counting(&calls)).await, Ok(2));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_computation() {
        let cache = Arc::new(TestCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let make = |calls: Arc<AtomicUsize>, gate: Arc<Notify>| {
            move || async move {
                gate.notified().await;
                Ok(calls.fetch_add(1, Ordering::SeqCst) + 10)
            }
        };

        let first = {
            let cache = Arc::clone(&cache);
            let f = make(Arc::clone(&calls), Arc::clone(&gate));
            tokio::spawn(async move { cache.get("k", f).await })
        };
        let second = {
            let cache = Arc::clone(&cache);
            let f = make(Arc::clone(&calls), Arc::clone(&gate));
            tokio::spawn(async move { cache.get("k", f).await })
        };

        while !cache.is_pending(&"k") {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
        gate.notify_one();

        assert_eq!(first.await.unwrap(), Ok(10));
        assert_eq!(second.await.unwrap(), Ok(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_clears_record_so_next_call_retries() {
        let cache = TestCache::new();
        let failed = cache.get("k", || async { Err("boom".to_string()) }).await;
        assert_eq!(failed, Err("boom".to_string()));
        assert!(cache.is_empty());

        let retried = cache.get("k", || async { Ok(7) }).await;
        assert_eq!(retried, Ok(7));
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get("k", || counting(&calls)).await.unwrap();
        cache.invalidate(&"k");
        assert_eq!(cache.get("k", || counting(&calls)).await, Ok(2));

        cache.invalidate_all();
        assert_eq!(cache.peek(&"k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_is_lazy() {
        let cache = TestCache::with_ttl(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get("k", || counting(&calls)).await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k", || counting(&calls)).await, Ok(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.peek(&"k"), None);
        assert_eq!(cache.get("k", || counting(&calls)).await, Ok(2));
    }

    #[tokio::test]
    async fn test_cancelled_record_is_recomputed_but_first_caller_keeps_result() {
        let cache = Arc::new(TestCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let token = CancellationToken::new();

        let first = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            let token = token.clone();
            tokio::spawn(async move {
                cache
                    .get_with_cancellation("k", Some(token), move || async move {
                        gate.notified().await;
                        Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
                    })
                    .await
            })
        };
        while !cache.is_pending(&"k") {
            tokio::task::yield_now().await;
        }

        token.cancel();
        gate.notify_one();
        assert_eq!(first.await.unwrap(), Ok(1));

        assert_eq!(cache.get("k", || counting(&calls)).await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_after_resolution_evicts_record() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        cache
            .get_with_cancellation("k", Some(token.clone()), || counting(&calls))
            .await
            .unwrap();
        assert_eq!(cache.peek(&"k"), Some(1));

        token.cancel();
        assert_eq!(cache.peek(&"k"), None);
    }
}
