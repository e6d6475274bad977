//! Secure token secret wrapper that redacts sensitive material.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const FINGERPRINT_LEN: usize = 12;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret carries no characters.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Short, non-reversible identifier safe to emit in logs.
	///
	/// The value is the first characters of the base64 (URL-safe, no padding) SHA-256 digest,
	/// so two log lines can be correlated without leaking the token.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut encoded = URL_SAFE_NO_PAD.encode(digest);

		encoded.truncate(FINGERPRINT_LEN);

		encoded
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
