// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-app cache of scoped transaction tokens
//!
//! Tokens are fetched lazily on first use of an app's transaction endpoints and
//! reused afterwards. Without a TTL an entry lives as long as the client, which
//! matches the one-year duration requested from the token endpoint.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, trace};

/// OAuth scope granting access to one app's transaction data
pub fn transaction_scope(app_id: &str) -> String {
    format!("app/{app_id}/transactions")
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    issued_at: Instant,
}

impl CachedToken {
    fn is_valid(&self, ttl: Option<Duration>) -> bool {
        ttl.is_none_or(|ttl| self.issued_at.elapsed() < ttl)
    }
}

/// Scoped bearer tokens keyed by app id
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: DashMap<String, CachedToken>,
    ttl: Option<Duration>,
}

impl TokenCache {
    /// Create a cache; `ttl` of `None` never expires entries
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Cached token for `app_id`, dropping it if expired
    pub fn get(&self, app_id: &str) -> Option<String> {
        if let Some(cached) = self.tokens.get(app_id) {
            if cached.is_valid(self.ttl) {
                trace!(app_id, "scoped token cache hit");
                return Some(cached.token.clone());
            }
            drop(cached);
            self.evict_if_expired(app_id);
        }
        None
    }

    // Re-checks under the write lock: another task may have stored a fresh token
    // between releasing the read guard and getting here.
    fn evict_if_expired(&self, app_id: &str) {
        if self
            .tokens
            .remove_if(app_id, |_, cached| !cached.is_valid(self.ttl))
            .is_some()
        {
            debug!(app_id, "scoped token expired");
        }
    }

    /// Store a freshly issued token for `app_id`
    pub fn insert(&self, app_id: &str, token: String) {
        self.tokens.insert(
            app_id.to_string(),
            CachedToken {
                token,
                issued_at: Instant::now(),
            },
        );
    }

    /// Number of cached tokens, expired ones included
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token has been cached yet
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_format() {
        assert_eq!(transaction_scope("abc123"), "app/abc123/transactions");
    }

    #[test]
    fn tokens_are_cached_per_app() {
        let cache = TokenCache::new(None);
        assert!(cache.get("app-1").is_none());

        cache.insert("app-1", "token-1".to_string());
        cache.insert("app-2", "token-2".to_string());

        assert_eq!(cache.get("app-1").as_deref(), Some("token-1"));
        assert_eq!(cache.get("app-2").as_deref(), Some("token-2"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn eviction_spares_a_token_refreshed_after_the_expiry_check() {
        let cache = TokenCache::new(Some(Duration::from_secs(3600)));
        cache.insert("app-1", "refreshed".to_string());

        cache.evict_if_expired("app-1");

        assert_eq!(cache.get("app-1").as_deref(), Some("refreshed"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_tokens_are_evicted() {
        let cache = TokenCache::new(Some(Duration::ZERO));
        cache.insert("app-1", "token-1".to_string());

        assert!(cache.get("app-1").is_none());
        assert!(cache.is_empty());
    }
}
