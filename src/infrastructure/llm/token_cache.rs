//! Bearer token cache for the LLM gateway

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::domain::DomainError;

/// Tokens are refreshed this long before the gateway says they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(10);

/// Lifetime assumed when the token response omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Expiry instant for a token issued at `now`; out-of-range lifetimes fall
/// back to the default
fn expiry(now: Instant, expires_in: Option<u64>) -> Instant {
    let default = now + Duration::from_secs(DEFAULT_EXPIRES_IN_SECS);

    match expires_in {
        Some(secs) => now.checked_add(Duration::from_secs(secs)).unwrap_or(default),
        None => default,
    }
}

/// Single cached token behind one mutex.
///
/// The lock is held across a refresh, so concurrent callers wait for the
/// one in-flight fetch instead of each requesting a token.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, fetching a new one when it is missing or
    /// about to expire. `fetch` yields the token and its `expires_in` seconds.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<String, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, Option<u64>), DomainError>>,
    {
        let mut guard = self.inner.lock().await;

        if let Some(ref cached) = *guard {
            if cached.is_valid(Instant::now()) {
                return Ok(cached.token.clone());
            }
        }

        let (token, expires_in) = fetch().await?;
        let expires_at = expiry(Instant::now(), expires_in);

        tracing::debug!(?expires_in, "Fetched gateway token");

        *guard = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });

        Ok(token)
    }

    /// Drop the cached token so the next call fetches a fresh one
    pub async fn invalidate(&self) {
        *self.inner.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_expiry_falls_back_on_overflow() {
        let now = Instant::now();
        let default = now + Duration::from_secs(DEFAULT_EXPIRES_IN_SECS);

        assert_eq!(expiry(now, Some(u64::MAX)), default);
        assert_eq!(expiry(now, None), default);
        assert_eq!(expiry(now, Some(60)), now + Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_huge_expires_in_is_cached() {
        let cache = TokenCache::new();

        let token = cache
            .get_or_fetch(|| async { Ok(("abc".to_string(), Some(u64::MAX))) })
            .await
            .unwrap();
        let again = cache
            .get_or_fetch(|| async { Err(DomainError::credential("should not refetch")) })
            .await
            .unwrap();

        assert_eq!(token, "abc");
        assert_eq!(again, "abc");
    }

    #[tokio::test]
    async fn test_token_is_reused_while_valid() {
        let cache = TokenCache::new();
        let fetches = AtomicU32::new(0);

        for _ in 0..3 {
            let token = cache
                .get_or_fetch(|| async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(("abc".to_string(), Some(3600)))
                })
                .await
                .unwrap();
            assert_eq!(token, "abc");
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_refetched() {
        let cache = TokenCache::new();
        let fetches = AtomicU32::new(0);

        for _ in 0..2 {
            cache
                .get_or_fetch(|| async {
                    let n = fetches.fetch_add(1, Ordering::SeqCst);
                    Ok((format!("token-{}", n), Some(5)))
                })
                .await
                .unwrap();
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let cache = TokenCache::new();

        let err = cache
            .get_or_fetch(|| async { Err(DomainError::credential("bad client secret")) })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Credential { .. }));

        let token = cache
            .get_or_fetch(|| async { Ok(("fresh".to_string(), None)) })
            .await
            .unwrap();
        assert_eq!(token, "fresh");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = TokenCache::new();
        cache
            .get_or_fetch(|| async { Ok(("old".to_string(), None)) })
            .await
            .unwrap();

        cache.invalidate().await;

        let token = cache
            .get_or_fetch(|| async { Ok(("new".to_string(), None)) })
            .await
            .unwrap();
        assert_eq!(token, "new");
    }
}
