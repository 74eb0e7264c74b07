//! Process-wide authenticated client cache.
//!
//! The client is built lazily on the first request and reused for the life
//! of the process. Concurrent first requests build it exactly once; a failed
//! build leaves the cache empty so the next request retries.

use std::future::Future;
use std::sync::Arc;

use sheetsproxy_auth::AuthenticatedClient;
use tokio::sync::RwLock;
use tracing::debug;

/// Holds at most one [`AuthenticatedClient`].
#[derive(Debug, Default)]
pub struct ClientCache {
    client: RwLock<Option<Arc<AuthenticatedClient>>>,
}

impl ClientCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached client, if any.
    pub async fn get(&self) -> Option<Arc<AuthenticatedClient>> {
        self.client.read().await.clone()
    }

    /// Returns true once a client has been stored.
    pub async fn is_initialized(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Returns the cached client, building it with `build` if the cache is
    /// empty.
    pub async fn get_or_try_init<F, Fut, E>(&self, build: F) -> Result<Arc<AuthenticatedClient>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AuthenticatedClient, E>>,
    {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut slot = self.client.write().await;
        // Another request may have built it while we waited for the lock.
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        debug!("building authenticated client");
        let client = Arc::new(build().await?);
        *slot = Some(client.clone());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsproxy_auth::{ClientOrigin, StaticTokenSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client() -> AuthenticatedClient {
        AuthenticatedClient::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenSource::new("t")),
            ClientOrigin::ServiceAccount,
        )
    }

    #[tokio::test]
    async fn starts_empty() {
        let cache = ClientCache::new();
        assert!(!cache.is_initialized().await);
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn builds_once() {
        let cache = ClientCache::new();
        let builds = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_try_init(|| async {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(client())
                })
                .await
                .unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(cache.is_initialized().await);
    }

    #[tokio::test]
    async fn failed_build_leaves_cache_empty() {
        let cache = ClientCache::new();
        let result = cache.get_or_try_init(|| async { Err::<AuthenticatedClient, _>("nope") }).await;
        assert_eq!(result.unwrap_err(), "nope");
        assert!(!cache.is_initialized().await);

        // the next attempt retries
        cache
            .get_or_try_init(|| async { Ok::<_, &str>(client()) })
            .await
            .unwrap();
        assert!(cache.is_initialized().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_requests_build_once() {
        let cache = Arc::new(ClientCache::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let builds = builds.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_init(|| async move {
                        builds.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, ()>(client())
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
