//! Immutable application access token and its freshness rules.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::CredentialError};

/// Lifecycle status for an [`AppToken`] evaluated against a safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppTokenStatus {
	/// Token can be reused as-is.
	Fresh,
	/// Token is inside the safety margin (or past expiry) and must be replaced.
	Stale,
}

/// Client-credentials access token shared by every app-authenticated request.
///
/// Values are never mutated; a refresh replaces the whole token.
#[derive(Clone)]
pub struct AppToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type reported by the authorization server (usually `bearer`).
	pub token_type: String,
	/// Declared lifetime.
	pub expires_in: Duration,
	/// Local instant at which the token was received.
	pub acquired_at: OffsetDateTime,
}
impl AppToken {
	/// Creates a token after rejecting an empty access token or a lifetime that cannot be
	/// represented as an expiry instant.
	pub fn new(
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		expires_in: Duration,
		acquired_at: OffsetDateTime,
	) -> Result<Self, CredentialError> {
		let access_token = TokenSecret::new(access_token);

		if access_token.is_empty() {
			return Err(CredentialError::EmptyAccessToken);
		}
		if acquired_at.checked_add(expires_in).is_none() {
			return Err(CredentialError::ExpiresInOutOfRange);
		}

		Ok(Self { access_token, token_type: token_type.into(), expires_in, acquired_at })
	}

	/// Absolute expiry instant declared by the authorization server.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.acquired_at.saturating_add(self.expires_in)
	}

	/// Computes the status at `instant`, treating the last `margin` of the lifetime as stale.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> AppTokenStatus {
		let fresh_until = self
			.expires_in
			.checked_sub(margin)
			.and_then(|lifetime| self.acquired_at.checked_add(lifetime));

		match fresh_until {
			Some(fresh_until) if instant < fresh_until => AppTokenStatus::Fresh,
			_ => AppTokenStatus::Stale,
		}
	}

	/// Returns `true` when the token can be reused at `instant`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), AppTokenStatus::Fresh)
	}
}
impl Debug for AppToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("acquired_at", &self.acquired_at)
			.finish()
	}
}
