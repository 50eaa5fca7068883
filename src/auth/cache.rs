//! Short-lived cache of successful authentications.
//!
//! Flow Overview:
//! 1) A successful remote verification calls [`CredentialCache::remember`], which stores the
//!    salted fingerprint of the password under the case-folded username with an expiry.
//! 2) When the identity provider is unreachable, [`CredentialCache::validate`] compares the
//!    supplied password against the stored fingerprint.
//! 3) Expired entries are treated as absent and dropped lazily on lookup. An optional sweep
//!    task purges whatever lookups never touched.
//!
//! The store sits behind [`CredentialStore`] so a shared backend can replace the in-memory
//! [`MemoryStore`] without touching the orchestration.

use super::fingerprint::{Fingerprint, FingerprintHasher};
use dashmap::DashMap;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Longest TTL honored. Larger values are clamped so the expiry instant stays representable.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Cached fingerprint with its absolute expiry.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub expires_at: Instant,
}

impl CacheEntry {
    /// An entry is expired at its expiry instant, not only after it.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Key/value store holding cache entries. Operations on one key must be linearizable.
pub trait CredentialStore: Send + Sync {
    /// Insert or overwrite the entry for `key`.
    fn put(&self, key: String, entry: CacheEntry);

    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Remove the entry for `key` only if it is still expired at `now`.
    fn remove_expired(&self, key: &str, now: Instant);

    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&self, now: Instant) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. `DashMap` shards its locks, so distinct usernames rarely contend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn put(&self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn remove_expired(&self, key: &str, now: Instant) {
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
    }

    fn purge_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub struct CredentialCache {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    hasher: FingerprintHasher,
}

impl CredentialCache {
    /// In-memory cache on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_parts(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            hasher: FingerprintHasher::new(),
        }
    }

    /// Store the fingerprint of `password` for `username`, replacing any previous entry.
    pub fn remember(&self, username: &str, password: &SecretString, ttl: Duration) {
        let now = self.clock.now();
        let ttl = ttl.min(MAX_TTL);
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        let entry = CacheEntry {
            fingerprint: self.hasher.fingerprint(password),
            expires_at,
        };

        self.store.put(cache_key(username), entry);

        info!(
            username,
            ttl_minutes = ttl.as_secs() / 60,
            "cached user credentials"
        );
    }

    /// True iff a live entry exists for `username` and `password` matches it.
    /// Missing and expired entries are indistinguishable to the caller.
    pub fn validate(&self, username: &str, password: &SecretString) -> bool {
        let key = cache_key(username);
        let now = self.clock.now();

        let Some(entry) = self.store.get(&key) else {
            info!(username, "user not found in cache");
            return false;
        };

        if entry.is_expired(now) {
            self.store.remove_expired(&key, now);
            info!(username, "cached credentials expired");
            return false;
        }

        let is_valid = entry.fingerprint.matches(&self.hasher.fingerprint(password));

        if is_valid {
            info!(username, "user validated from cache");
        } else {
            warn!(username, "user found in cache but password mismatch");
        }

        is_valid
    }

    /// Purge expired entries now.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired(self.clock.now())
    }

    /// Number of physically stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("entries", &self.store.len())
            .finish_non_exhaustive()
    }
}

/// Spawn a task that purges expired entries every `period`.
pub fn spawn_sweeper(cache: Arc<CredentialCache>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let removed = cache.purge_expired();
            if removed > 0 {
                debug!(removed, "purged expired cache entries");
            }
        }
    })
}

fn cache_key(username: &str) -> String {
    format!("user:{}", username.to_lowercase())
}
