//! In-memory TTL cache used for per-user follows lookups.
//!
//! Entries expire lazily: reads treat an entry as absent once `now >= expires_at` but never
//! delete it. Expired entries are only reclaimed by [`TtlCache::sweep`], which the host is
//! expected to call periodically.

// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	helix::{FollowsResponse, UserId},
};

/// Cache of followed-channel listings keyed by upstream user id.
pub type FollowsCache = TtlCache<UserId, FollowsResponse>;
impl FollowsCache {
	/// Creates an empty follows cache whose lifetime is [`RelayConfig::follows_ttl`].
	pub fn from_config(config: &RelayConfig) -> Self {
		Self::with_ttl(config.follows_ttl)
	}
}

/// Cached value with its insertion and expiry instants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V> {
	/// Cached payload.
	pub data: V,
	/// Instant the entry was inserted.
	pub cached_at: OffsetDateTime,
	/// Instant the entry stops being served (`cached_at + ttl`).
	pub expires_at: OffsetDateTime,
}
impl<V> CacheEntry<V> {
	/// Returns `true` when the entry is no longer servable at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

/// Thread-safe key/value store with a fixed per-entry lifetime.
#[derive(Debug)]
pub struct TtlCache<K, V> {
	entries: RwLock<HashMap<K, CacheEntry<V>>>,
	ttl: Duration,
}
impl<K, V> TtlCache<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	/// Default entry lifetime.
	pub const DEFAULT_TTL: Duration = Duration::minutes(5);

	/// Creates an empty cache with the default lifetime.
	pub fn new() -> Self {
		Self::with_ttl(Self::DEFAULT_TTL)
	}

	/// Creates an empty cache with a custom lifetime.
	pub fn with_ttl(ttl: Duration) -> Self {
		Self { entries: RwLock::new(HashMap::new()), ttl }
	}

	/// Lifetime applied to new entries.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the cached value when present and unexpired.
	pub fn get<Q>(&self, key: &Q) -> Option<V>
	where
		K: std::borrow::Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		self.get_at(key, OffsetDateTime::now_utc())
	}

	/// Same as [`get`](Self::get) evaluated at `now`.
	pub fn get_at<Q>(&self, key: &Q, now: OffsetDateTime) -> Option<V>
	where
		K: std::borrow::Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		self.get_entry_at(key, now).map(|entry| entry.data)
	}

	/// Returns the full entry when present and unexpired.
	pub fn get_entry<Q>(&self, key: &Q) -> Option<CacheEntry<V>>
	where
		K: std::borrow::Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		self.get_entry_at(key, OffsetDateTime::now_utc())
	}

	/// Same as [`get_entry`](Self::get_entry) evaluated at `now`.
	pub fn get_entry_at<Q>(&self, key: &Q, now: OffsetDateTime) -> Option<CacheEntry<V>>
	where
		K: std::borrow::Borrow<Q>,
		Q: ?Sized + Eq + Hash,
	{
		self.entries.read().get(key).filter(|entry| !entry.is_expired_at(now)).cloned()
	}

	/// Inserts or replaces the value for `key`.
	pub fn set(&self, key: K, data: V) {
		self.set_at(key, data, OffsetDateTime::now_utc());
	}

	/// Same as [`set`](Self::set) stamped at `now`; returns the stored entry's expiry.
	pub fn set_at(&self, key: K, data: V, now: OffsetDateTime) -> OffsetDateTime {
		let expires_at = now + self.ttl;

		self.entries.write().insert(key, CacheEntry { data, cached_at: now, expires_at });

		expires_at
	}

	/// Removes every expired entry and returns how many were removed.
	pub fn sweep(&self) -> usize {
		self.sweep_at(OffsetDateTime::now_utc())
	}

	/// Same as [`sweep`](Self::sweep) evaluated at `now`.
	pub fn sweep_at(&self, now: OffsetDateTime) -> usize {
		let mut entries = self.entries.write();
		let before = entries.len();

		entries.retain(|_, entry| !entry.is_expired_at(now));

		let removed = before - entries.len();

		if removed > 0 {
			tracing::debug!(removed, remaining = entries.len(), "swept expired cache entries");
		}

		removed
	}

	/// Number of stored entries, expired ones included until swept.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}
impl<K, V> Default for TtlCache<K, V>
where
	K: Eq + Hash,
	V: Clone,
{
	fn default() -> Self {
		Self::new()
	}
}
