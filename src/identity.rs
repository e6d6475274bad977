//! Identity bridge between the host's identity provider and the upstream platform.
//!
//! The host authenticates its own caller, then hands the caller's metadata record (and the
//! optional [`USER_TOKEN_HEADER`] value) to [`FollowsService::resolve_identity`]. The resolved
//! [`Identity`] drives the cache-aside follows lookup in [`FollowsService::followed_channels`].

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	cache::FollowsCache,
	error::ValidationError,
	helix::{FollowsResponse, HelixApi, UserId},
	obs::{self, Operation, Outcome},
};

/// Request header carrying the caller's upstream token when metadata has none.
pub const USER_TOKEN_HEADER: &str = "X-Twitch-Token";

/// Identity-provider metadata record attached to the authenticated caller.
pub type UserMetadata = serde_json::Map<String, Value>;

const TOKEN_PATHS: [&[&str]; 2] = [&["twitch", "access_token"], &["twitch_access_token"]];
const USER_ID_PATHS: [&[&str]; 3] = [&["twitch", "user_id"], &["twitch_user_id"], &["sub"]];

/// Where the user bearer credential was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenOrigin {
	/// Identity-provider metadata.
	Metadata,
	/// [`USER_TOKEN_HEADER`] request header.
	Header,
}

/// Where the upstream user id was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserIdOrigin {
	/// Identity-provider metadata.
	Metadata,
	/// Profile lookup with the user token.
	Api,
}

/// Caller's upstream identity and bearer credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
	/// Upstream user id.
	pub user_id: UserId,
	/// User bearer credential.
	pub token: TokenSecret,
	/// Source of `token`.
	pub token_origin: TokenOrigin,
	/// Source of `user_id`.
	pub user_id_origin: UserIdOrigin,
}

/// Result of a cache-aside follows lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowsOutcome {
	/// Followed channels.
	pub follows: FollowsResponse,
	/// `true` when served from the cache.
	pub cached: bool,
	/// Instant the listing was fetched from upstream.
	pub cached_at: OffsetDateTime,
}

/// Orchestrates identity resolution and cached follows lookups.
#[derive(Clone)]
pub struct FollowsService {
	api: Arc<dyn HelixApi>,
	cache: Arc<FollowsCache>,
}
impl FollowsService {
	/// Creates a service over the provided upstream client and cache.
	pub fn new(api: Arc<dyn HelixApi>, cache: Arc<FollowsCache>) -> Self {
		Self { api, cache }
	}

	/// Cache shared with the host's sweep scheduler.
	pub fn cache(&self) -> &Arc<FollowsCache> {
		&self.cache
	}

	/// Resolves the caller's upstream identity.
	///
	/// The credential comes from metadata (`twitch.access_token`, then `twitch_access_token`) or
	/// else `header_token`. The user id comes from metadata (`twitch.user_id`, `twitch_user_id`,
	/// then `sub`) or else a profile lookup with the resolved credential.
	pub async fn resolve_identity(
		&self,
		metadata: &UserMetadata,
		header_token: Option<&str>,
	) -> Result<Identity> {
		let (token, token_origin) = match metadata_string(metadata, &TOKEN_PATHS) {
			Some(token) => (TokenSecret::new(token), TokenOrigin::Metadata),
			None => match header_token.map(str::trim).filter(|token| !token.is_empty()) {
				Some(token) => (TokenSecret::new(token), TokenOrigin::Header),
				None => {
					tracing::warn!(
						keys = ?metadata.keys().collect::<Vec<_>>(),
						"no user token in metadata or headers"
					);

					return Err(ValidationError::MissingUserToken.into());
				},
			},
		};
		let (user_id, user_id_origin) = match metadata_string(metadata, &USER_ID_PATHS) {
			Some(user_id) => (user_id.to_owned(), UserIdOrigin::Metadata),
			None => (self.api.user_info(&token).await?.id, UserIdOrigin::Api),
		};
		let user_id = UserId::new(user_id).map_err(ValidationError::from)?;

		tracing::debug!(
			user_id = %user_id,
			?token_origin,
			?user_id_origin,
			fingerprint = %token.fingerprint(),
			"resolved upstream identity"
		);

		Ok(Identity { user_id, token, token_origin, user_id_origin })
	}

	/// Returns the caller's followed channels, serving from the cache while the entry is live.
	///
	/// Only successful upstream fetches are cached.
	pub async fn followed_channels(&self, identity: &Identity) -> Result<FollowsOutcome> {
		if let Some(entry) = self.cache.get_entry(&identity.user_id) {
			obs::record_call_outcome(Operation::FollowsLookup, Outcome::CacheHit);
			tracing::debug!(
				user_id = %identity.user_id,
				cached_at = %entry.cached_at,
				"follows cache hit"
			);

			return Ok(FollowsOutcome { follows: entry.data, cached: true, cached_at: entry.cached_at });
		}

		obs::observe(Operation::FollowsLookup, "followed_channels", async {
			let follows = self.api.user_follows(&identity.user_id, &identity.token).await?;
			let cached_at = OffsetDateTime::now_utc();

			self.cache.set_at(identity.user_id.clone(), follows.clone(), cached_at);

			tracing::info!(
				user_id = %identity.user_id,
				follows_count = follows.data.len(),
				total = follows.total,
				"cached follows"
			);

			Ok(FollowsOutcome { follows, cached: false, cached_at })
		})
		.await
	}
}
impl Debug for FollowsService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FollowsService").field("cached_entries", &self.cache.len()).finish()
	}
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively and the value must have exactly two parts.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
	let mut parts = header.split_whitespace();
	let (scheme, token) = (parts.next()?, parts.next()?);

	if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
		return None;
	}

	Some(token)
}

fn metadata_string<'a>(metadata: &'a UserMetadata, paths: &[&[&str]]) -> Option<&'a str> {
	paths.iter().find_map(|path| {
		let (first, rest) = path.split_first()?;
		let mut value = metadata.get(*first)?;

		for key in rest {
			value = value.as_object()?.get(*key)?;
		}

		value.as_str().filter(|s| !s.is_empty())
	})
}
