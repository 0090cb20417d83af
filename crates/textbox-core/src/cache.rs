//! Dirty-flag memoization with optional debounce.
//!
//! Every derived structure of the editing core (line strings, colors, wrap cutoffs, sub-lines,
//! the tokenizer pass, rows, row selection) is held in a [`Cache`]. A cache is recomputed only
//! when it has been marked dirty and its debounce window has elapsed.
//!
//! The update function is supplied at the access site (`get_with`) rather than stored in the
//! cache, so the closure can borrow sibling fields of the owner while the cache itself is
//! borrowed mutably.

use std::fmt;
use std::time::{Duration, Instant};

/// Counters collected by a [`Cache`], reported by `TextBox::debug_report`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of reads.
    pub gets: u64,
    /// Number of invalidations.
    pub set_dirty: u64,
    /// Number of recomputations.
    pub updates: u64,
    /// Cumulative time spent recomputing.
    pub update_time: Duration,
}

impl CacheStats {
    /// Accumulate another set of counters into this one.
    pub fn merge(&mut self, other: &CacheStats) {
        self.gets += other.gets;
        self.set_dirty += other.set_dirty;
        self.updates += other.updates;
        self.update_time += other.update_time;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Get {}, SetDirty {}, Update {}, UpdateTime {}ms",
            self.gets,
            self.set_dirty,
            self.updates,
            self.update_time.as_millis()
        )
    }
}

/// A lazily recomputed value.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    name: &'static str,
    value: T,
    dirty: bool,
    ready_at: Instant,
    debounce: Duration,
    stats: CacheStats,
}

impl<T: Default> Cache<T> {
    /// Create a dirty cache without debounce.
    pub fn new(name: &'static str) -> Self {
        Self::with_debounce(name, Duration::ZERO)
    }

    /// Create a dirty cache that waits at least `debounce` after each invalidation before
    /// recomputing.
    pub fn with_debounce(name: &'static str, debounce: Duration) -> Self {
        Self {
            name,
            value: T::default(),
            dirty: true,
            ready_at: Instant::now(),
            debounce,
            stats: CacheStats::default(),
        }
    }

    /// Return the value, recomputing it first if dirty and due at `now`.
    pub fn get_with(&mut self, now: Instant, update: impl FnOnce(T) -> T) -> &T {
        if self.is_due(now) {
            self.update(update);
        }
        self.stats.gets += 1;
        &self.value
    }

    /// Return the value, recomputing it if dirty regardless of the debounce window.
    pub fn force_with(&mut self, update: impl FnOnce(T) -> T) -> &T {
        if self.dirty {
            self.update(update);
        }
        self.stats.gets += 1;
        &self.value
    }

    fn update(&mut self, update: impl FnOnce(T) -> T) {
        let started = Instant::now();
        let previous = std::mem::take(&mut self.value);
        self.value = update(previous);
        self.dirty = false;
        self.stats.updates += 1;
        self.stats.update_time += started.elapsed();
        tracing::trace!(cache = self.name, "cache updated");
    }
}

impl<T> Cache<T> {
    /// Mark the value for recomputation.
    pub fn set_dirty(&mut self) {
        self.set_dirty_at(Instant::now());
    }

    /// Mark the value for recomputation, scheduling the earliest update relative to `now`.
    pub fn set_dirty_at(&mut self, now: Instant) {
        self.stats.set_dirty += 1;
        self.dirty = true;
        self.ready_at = now + self.debounce;
    }

    /// Whether the value is dirty.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the value is dirty and the debounce window has elapsed at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty && now >= self.ready_at
    }

    /// Current value without recomputing.
    pub fn peek(&self) -> &T {
        &self.value
    }

    /// Mutable access to the current value without recomputing or clearing the dirty flag.
    pub fn peek_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Change the debounce window used by later invalidations.
    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    /// Name used in debug reports.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Collected counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recomputes_only_when_dirty() {
        let mut cache: Cache<u32> = Cache::new("Counter");
        let now = Instant::now();
        let mut calls = 0;

        assert_eq!(
            *cache.get_with(now, |v| {
                calls += 1;
                v + 1
            }),
            1
        );
        assert_eq!(
            *cache.get_with(now, |v| {
                calls += 1;
                v + 1
            }),
            1
        );
        assert_eq!(calls, 1);

        cache.set_dirty_at(now);
        assert_eq!(*cache.get_with(now, |v| v + 1), 2);
        assert_eq!(cache.stats().updates, 2);
        assert_eq!(cache.stats().gets, 3);
    }

    #[test]
    fn test_debounce_delays_update() {
        let mut cache: Cache<u32> = Cache::with_debounce("Debounced", Duration::from_millis(100));
        let start = Instant::now();
        cache.force_with(|_| 7);

        cache.set_dirty_at(start);
        assert!(cache.is_dirty());
        assert!(!cache.is_due(start + Duration::from_millis(50)));
        assert_eq!(
            *cache.get_with(start + Duration::from_millis(50), |_| 8),
            7
        );
        assert_eq!(
            *cache.get_with(start + Duration::from_millis(100), |_| 8),
            8
        );
        assert!(!cache.is_dirty());
    }

    #[test]
    fn test_force_ignores_debounce() {
        let mut cache: Cache<String> = Cache::with_debounce("Text", Duration::from_secs(60));
        cache.set_dirty();
        assert_eq!(cache.force_with(|mut s| {
            s.push('x');
            s
        }), "x");
    }
}
