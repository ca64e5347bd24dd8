//! Get-cached-or-fetch policy on top of [`TtlStore`]

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, info, warn};

use super::TtlStore;

impl TtlStore {
    /// Returns fresh cached data for `key`, or runs `operation` to produce it.
    ///
    /// - A fresh hit returns immediately and `operation` is never invoked,
    ///   unless `force_refresh` is set.
    /// - A successful result (including an empty one) is written back before it
    ///   is returned. A failed write is logged and otherwise ignored.
    /// - When `operation` fails and `force_refresh` is not set, an expired entry
    ///   for `key` is returned instead. Otherwise the operation's error is returned.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        operation: F,
        force_refresh: bool,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !force_refresh {
            if let Some(cached) = self.get::<T>(key).await {
                debug!(key, "cache hit");
                return Ok(cached);
            }
        }

        match operation().await {
            Ok(fresh) => {
                if !self.put(key, &fresh).await {
                    warn!(key, "fetched data could not be cached");
                }
                Ok(fresh)
            }
            Err(e) => {
                if !force_refresh {
                    if let Some(stale) = self.get_stale::<T>(key).await {
                        info!(key, error = %e, "fetch failed, serving stale cache entry");
                        return Ok(stale);
                    }
                }
                warn!(key, error = %e, "fetch failed and no cached data is available");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn create_test_store() -> (TtlStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = TtlStore::new(temp_dir.path().join("cache.json"));
        (store, temp_dir)
    }

    /// Returns an operation that counts its invocations and yields `result`
    fn counted<'a>(
        calls: &'a AtomicUsize,
        result: Result<Vec<String>, String>,
    ) -> impl FnOnce() -> std::future::Ready<Result<Vec<String>, String>> + 'a {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(result)
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fresh_hit_never_invokes_operation() {
        let (store, _temp_dir) = create_test_store();
        store.put("search:soup", &names(&["Leek Soup"])).await;
        let calls = AtomicUsize::new(0);

        let result = store
            .get_or_fetch("search:soup", counted(&calls, Ok(names(&["Other"]))), false)
            .await;

        assert_eq!(result, Ok(names(&["Leek Soup"])));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_miss_invokes_once_and_persists_result() {
        let (store, _temp_dir) = create_test_store();
        let calls = AtomicUsize::new(0);

        let first = store
            .get_or_fetch("search:pie", counted(&calls, Ok(names(&["Apple Pie"]))), false)
            .await;
        let second = store
            .get_or_fetch("search:pie", counted(&calls, Ok(names(&["Changed"]))), false)
            .await;

        assert_eq!(first, Ok(names(&["Apple Pie"])));
        assert_eq!(second, Ok(names(&["Apple Pie"])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_success_is_cached_as_is() {
        let (store, _temp_dir) = create_test_store();
        let calls = AtomicUsize::new(0);

        let result = store
            .get_or_fetch("search:zzz", counted(&calls, Ok(Vec::new())), false)
            .await;

        assert_eq!(result, Ok(Vec::new()));
        assert_eq!(store.get::<Vec<String>>("search:zzz").await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_stale_entry() {
        let (store, _temp_dir) = create_test_store();
        let old = Utc::now() - Duration::hours(48);
        store.put_at("search:stew", &names(&["Old Stew"]), old).await;
        let calls = AtomicUsize::new(0);

        let result = store
            .get_or_fetch("search:stew", counted(&calls, Err("offline".into())), false)
            .await;

        assert_eq!(result, Ok(names(&["Old Stew"])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_without_any_entry_returns_error() {
        let (store, _temp_dir) = create_test_store();
        let calls = AtomicUsize::new(0);

        let result = store
            .get_or_fetch("search:none", counted(&calls, Err("offline".into())), false)
            .await;

        assert_eq!(result, Err("offline".to_string()));
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_fresh_hit() {
        let (store, _temp_dir) = create_test_store();
        store.put("recipe:1", &names(&["Cached"])).await;
        let calls = AtomicUsize::new(0);

        let result = store
            .get_or_fetch("recipe:1", counted(&calls, Ok(names(&["Fresh"]))), true)
            .await;

        assert_eq!(result, Ok(names(&["Fresh"])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get("recipe:1").await, Some(names(&["Fresh"])));
    }

    #[tokio::test]
    async fn test_force_refresh_failure_does_not_serve_stale() {
        let (store, _temp_dir) = create_test_store();
        store
            .put_at("recipe:2", &names(&["Stale"]), Utc::now() - Duration::hours(48))
            .await;
        let calls = AtomicUsize::new(0);

        let result = store
            .get_or_fetch("recipe:2", counted(&calls, Err("offline".into())), true)
            .await;

        assert_eq!(result, Err("offline".to_string()));
    }
}
