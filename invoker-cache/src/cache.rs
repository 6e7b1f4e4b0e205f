//! Time-to-live cache in front of an operation invoker.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use invoker_core::error::Result;
use invoker_core::traits::OperationInvoker;
use invoker_core::types::ParameterSet;

use crate::config::{
    invalid_time_to_live, millis_for_log, time_to_live_from_millis, CacheConfig, KeyPolicy,
};

/// Cached response with its creation time.
struct CacheEntry<T> {
    response: T,
    created_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(response: T) -> Self {
        Self {
            response,
            created_at: Instant::now(),
        }
    }

    fn is_valid(&self, time_to_live: Duration) -> bool {
        self.created_at.elapsed() < time_to_live
    }
}

/// Memoizes the responses of an [`OperationInvoker`] for a fixed time-to-live.
///
/// Responses are keyed on the structural value of the [`ParameterSet`]. Within
/// the time-to-live, repeated sequential calls with an equal parameter set
/// reach the target once and return clones of the same stored response (the
/// same instance when the response is an `Arc`). Expired entries are only
/// noticed, and overwritten, on the next call with the same key.
///
/// Failures of the target are returned as-is and never cached.
///
/// # Thread Safety
///
/// Entries live in a sharded concurrent map. No lock is held while the target
/// runs, so concurrent misses on the same key may each invoke the target; the
/// last response stored wins.
pub struct CachingInvoker<I: OperationInvoker> {
    target: I,
    time_to_live: Duration,
    key_policy: KeyPolicy,
    entries: DashMap<ParameterSet, CacheEntry<I::Output>>,
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
}

impl<I: OperationInvoker> CachingInvoker<I> {
    /// Wraps `target` with a time-to-live given in milliseconds.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `time_to_live_ms` is zero or negative.
    pub fn new(target: I, time_to_live_ms: i64) -> Result<Self> {
        let time_to_live = time_to_live_from_millis(time_to_live_ms)?;
        Ok(Self::build(target, time_to_live, KeyPolicy::default()))
    }

    /// Wraps `target` with the given time-to-live.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `time_to_live` is zero.
    pub fn with_time_to_live(target: I, time_to_live: Duration) -> Result<Self> {
        if time_to_live.is_zero() {
            return Err(invalid_time_to_live(format!("{time_to_live:?}")));
        }
        Ok(Self::build(target, time_to_live, KeyPolicy::default()))
    }

    /// Wraps `target` using a [`CacheConfig`].
    pub fn from_config(target: I, config: &CacheConfig) -> Result<Self> {
        let time_to_live = config.time_to_live()?;
        Ok(Self::build(target, time_to_live, config.key_policy))
    }

    fn build(target: I, time_to_live: Duration, key_policy: KeyPolicy) -> Self {
        Self {
            target,
            time_to_live,
            key_policy,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            bypassed: AtomicU64::new(0),
        }
    }

    /// Sets which invocations are eligible for caching.
    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Returns the time-to-live of cached responses.
    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    /// Returns the active key policy.
    pub fn key_policy(&self) -> KeyPolicy {
        self.key_policy
    }

    /// Returns the wrapped invoker.
    pub fn target(&self) -> &I {
        &self.target
    }

    /// Returns the stored response for `parameters` if it is still live.
    fn lookup(&self, parameters: &ParameterSet) -> Option<I::Output> {
        let entry = self.entries.get(parameters)?;
        if entry.is_valid(self.time_to_live) {
            Some(entry.response.clone())
        } else {
            None
        }
    }

    /// Drops the entry for `parameters`. Returns true if one was stored.
    pub fn invalidate(&self, parameters: &ParameterSet) -> bool {
        self.entries.remove(parameters).is_some()
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes all expired entries, returning how many were dropped.
    ///
    /// Never called implicitly; expired entries are otherwise kept until
    /// their key is invoked again.
    pub fn cleanup_expired(&self) -> usize {
        let mut purged = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.is_valid(self.time_to_live);
            if !keep {
                purged += 1;
            }
            keep
        });
        debug!(purged, "Removed expired cache entries");
        purged
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl<I> OperationInvoker for CachingInvoker<I>
where
    I: OperationInvoker,
    I::Output: Send + Sync,
{
    type Output = I::Output;
    type Error = I::Error;

    fn invoke(&self, parameters: &ParameterSet) -> std::result::Result<I::Output, I::Error> {
        if self.key_policy == KeyPolicy::NoInputOnly && parameters.has_input() {
            self.bypassed.fetch_add(1, Ordering::Relaxed);
            debug!(parameters = parameters.len(), "Invocation carries input, bypassing cache");
            return self.target.invoke(parameters);
        }

        if let Some(response) = self.lookup(parameters) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(parameters = parameters.len(), "Cache hit");
            return Ok(response);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let response = self.target.invoke(parameters)?;
        self.entries
            .insert(parameters.clone(), CacheEntry::new(response.clone()));
        debug!(
            parameters = parameters.len(),
            ttl_ms = millis_for_log(self.time_to_live),
            "Cache miss, stored fresh response"
        );
        Ok(response)
    }
}

impl<I: OperationInvoker> fmt::Debug for CachingInvoker<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingInvoker")
            .field("time_to_live", &self.time_to_live)
            .field("key_policy", &self.key_policy)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls answered from a live entry
    pub hits: u64,
    /// Calls that reached the target and were eligible for caching
    pub misses: u64,
    /// Calls that skipped the cache because of the key policy
    pub bypassed: u64,
    /// Stored entries, expired ones included
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of eligible calls answered from the cache, 0.0 when none.
    pub fn hit_ratio(&self) -> f64 {
        let eligible = self.hits + self.misses;
        if eligible == 0 {
            0.0
        } else {
            self.hits as f64 / eligible as f64
        }
    }
}
