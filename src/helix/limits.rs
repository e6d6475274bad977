//! Numeric limit policies for list endpoints.
//!
//! Two policies coexist: the top-streams and categories listings silently clamp out-of-range
//! values, while the flexible streams query rejects them.

// self
use crate::error::ValidationError;

/// Lenient policy: non-positive or absent values use the default, large values clamp to `max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClampPolicy {
	/// Value used when the caller supplies nothing usable.
	pub default: u32,
	/// Largest value forwarded upstream.
	pub max: u32,
}
impl ClampPolicy {
	/// Resolves the effective limit for `requested`.
	pub fn apply(&self, requested: Option<i64>) -> u32 {
		match requested {
			Some(limit) if limit > 0 => u32::try_from(limit).unwrap_or(u32::MAX).min(self.max),
			_ => self.default,
		}
	}
}

/// Strict policy: absent values use the default, anything outside `[min, max]` is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangePolicy {
	/// Smallest accepted value.
	pub min: u32,
	/// Largest accepted value.
	pub max: u32,
	/// Value used when the caller supplies none.
	pub default: u32,
}
impl RangePolicy {
	/// Resolves the effective limit for `requested` or explains why it is rejected.
	pub fn check(&self, requested: Option<i64>) -> Result<u32, ValidationError> {
		let Some(limit) = requested else {
			return Ok(self.default);
		};

		match u32::try_from(limit) {
			Ok(value) if (self.min..=self.max).contains(&value) => Ok(value),
			_ => Err(ValidationError::LimitOutOfRange { limit, min: self.min, max: self.max }),
		}
	}
}

/// Limit policies for every list endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
	/// Top live streams listing.
	pub top_streams: ClampPolicy,
	/// Flexible streams query.
	pub streams: RangePolicy,
	/// Top categories listing.
	pub categories: ClampPolicy,
}
impl Default for Limits {
	fn default() -> Self {
		Self {
			top_streams: ClampPolicy { default: 100, max: 1000 },
			streams: RangePolicy { min: 1, max: 100, default: 20 },
			categories: ClampPolicy { default: 20, max: 100 },
		}
	}
}
