//! Observability helpers for relay operations.
//!
//! - Every operation runs inside a `helix_relay.call` span carrying the `operation` and `stage`
//!   fields.
//! - Enable the `metrics` feature to increment the `helix_relay_call_total` counter for every
//!   attempt, success, failure, or cache hit, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Client-credentials token refresh.
	TokenRefresh,
	/// Top live streams listing.
	TopStreams,
	/// Filtered streams listing.
	Streams,
	/// Top categories listing.
	Categories,
	/// Followed channels for a user.
	UserFollows,
	/// Profile lookup for a user token.
	UserInfo,
	/// Authorization code exchange.
	ExchangeCode,
	/// User token validation.
	ValidateToken,
	/// Cache-aside follows lookup.
	FollowsLookup,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::TokenRefresh => "token_refresh",
			Operation::TopStreams => "top_streams",
			Operation::Streams => "streams",
			Operation::Categories => "categories",
			Operation::UserFollows => "user_follows",
			Operation::UserInfo => "user_info",
			Operation::ExchangeCode => "exchange_code",
			Operation::ValidateToken => "validate_token",
			Operation::FollowsLookup => "follows_lookup",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Request answered from a cache without upstream I/O.
	CacheHit,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
			Outcome::CacheHit => "cache_hit",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a call span, recording attempt and result outcomes around it.
pub(crate) async fn observe<T, Fut>(
	operation: Operation,
	stage: &'static str,
	fut: Fut,
) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = CallSpan::new(operation, stage);

	record_call_outcome(operation, Outcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_call_outcome(operation, Outcome::Success),
		Err(e) => {
			let _guard = span.entered();

			::tracing::warn!(error = %e, "{operation} failed");
			record_call_outcome(operation, Outcome::Failure);
		},
	}

	result
}
