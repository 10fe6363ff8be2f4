//! # Fetch Layer
//!
//! Upstream API clients and the trait seam that lets the domain layer work
//! against stub data sources in tests.
//!
//! Failure policy: every client converts network errors, timeouts, and
//! unexpected response shapes into an empty result at this boundary. Callers
//! treat empty as "no data" and cannot (and must not) distinguish it from a
//! failed fetch. Errors are logged at warn level and swallowed here; nothing
//! propagates.
//!
//! Results are memoized by their input key for the process lifetime, so
//! repeated renders do not re-issue identical network calls.

pub mod air_client;
pub mod meal_client;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use shared::DailyMealRecord;

/// Error raised inside a client before being swallowed at the fetch boundary
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// Process-lifetime memo map keyed by request arguments.
///
/// Single-threaded request handling in practice; the mutex only guards the
/// occasional concurrent render.
pub struct Memo<K, V> {
    map: Mutex<HashMap<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> Memo<K, V> {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.lock().expect("memo lock poisoned").get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        self.map.lock().expect("memo lock poisoned").insert(key, value);
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for Memo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of daily meal records.
///
/// Implementations never fail: a fetch problem is logged and surfaces as an
/// empty vec, exactly like a date with no meal service.
#[async_trait]
pub trait MealSource: Send + Sync {
    async fn fetch_day(&self, date: NaiveDate) -> Vec<DailyMealRecord>;
}

/// Per-date caching wrapper around any [`MealSource`].
///
/// A second call for the same date returns the cached records without
/// re-issuing the request - including a cached empty result.
pub struct CachedMealSource {
    inner: Arc<dyn MealSource>,
    cache: Memo<NaiveDate, Vec<DailyMealRecord>>,
}

impl CachedMealSource {
    pub fn new(inner: Arc<dyn MealSource>) -> Self {
        Self {
            inner,
            cache: Memo::new(),
        }
    }
}

#[async_trait]
impl MealSource for CachedMealSource {
    async fn fetch_day(&self, date: NaiveDate) -> Vec<DailyMealRecord> {
        if let Some(cached) = self.cache.get(&date) {
            return cached;
        }
        let records = self.inner.fetch_day(date).await;
        self.cache.put(date, records.clone());
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MealSource for CountingSource {
        async fn fetch_day(&self, date: NaiveDate) -> Vec<DailyMealRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![DailyMealRecord {
                date,
                meal_name: "중식".to_string(),
                dish_listing: "밥".to_string(),
                nutrition_annotation: None,
            }]
        }
    }

    #[tokio::test]
    async fn cached_source_fetches_each_date_once() {
        let counting = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let source = CachedMealSource::new(counting.clone());
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        let first = source.fetch_day(date).await;
        let second = source.fetch_day(date).await;

        assert_eq!(first, second);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        // A different date is a cache miss
        source
            .fetch_day(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
            .await;
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn memo_round_trips_values() {
        let memo: Memo<(i32, u32), Vec<u32>> = Memo::new();
        assert!(memo.get(&(2024, 3)).is_none());
        memo.put((2024, 3), vec![1, 2, 3]);
        assert_eq!(memo.get(&(2024, 3)), Some(vec![1, 2, 3]));
    }
}
