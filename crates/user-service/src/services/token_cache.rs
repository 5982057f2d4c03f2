//! Token resolution cache.
//!
//! Memoizes successful verifications keyed by the exact token string for a
//! fixed window. A cached entry is served without re-verifying, so a token
//! that expires mid-window keeps resolving until its entry ages out. The
//! token's own expiry bounds the worst case.
//!
//! Failures are never cached.

use crate::crypto::TokenCodec;
use crate::models::IdentitySummary;
use crate::observability::metrics::{record_token_cache_lookup, set_token_cache_entries};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::instrument;

/// The token did not resolve to an identity.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("token not found")]
    NotFound,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    identity: IdentitySummary,
    expires_at: Instant,
}

pub struct TokenResolutionCache {
    codec: Arc<TokenCodec>,
    ttl: Duration,
    capacity: usize,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TokenResolutionCache {
    pub fn new(codec: Arc<TokenCodec>, ttl: Duration, capacity: usize) -> Self {
        Self {
            codec,
            ttl,
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve `token` to the identity it was minted for.
    ///
    /// Concurrent misses on the same token may both verify and insert; the
    /// entries are identical so the last write wins harmlessly.
    #[instrument(skip_all)]
    pub async fn resolve(&self, token: &str) -> Result<IdentitySummary, ResolveError> {
        let now = Instant::now();

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(token) {
                if entry.expires_at > now {
                    record_token_cache_lookup("hit");
                    return Ok(entry.identity.clone());
                }
            }
        }

        record_token_cache_lookup("miss");

        match self.codec.verify(token) {
            Ok(identity) => {
                self.insert(token, identity.clone(), now).await;
                Ok(identity)
            }
            Err(e) => {
                tracing::debug!(target: "user.services.token_cache", error = %e, "Token did not resolve");
                // Drop any aged-out entry for this token
                self.entries.write().await.remove(token);
                Err(ResolveError::NotFound)
            }
        }
    }

    /// Forget `token`. Returns whether an entry was present.
    pub async fn invalidate(&self, token: &str) -> bool {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(token).is_some();
        set_token_cache_entries(entries.len());
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn insert(&self, token: &str, identity: IdentitySummary, now: Instant) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.capacity && !entries.contains_key(token) {
            entries.retain(|_, entry| entry.expires_at > now);

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            token.to_string(),
            CacheEntry {
                identity,
                expires_at: now + self.ttl,
            },
        );
        set_token_cache_entries(entries.len());
    }
}
