//! User-scoped token payloads returned by the code exchange and validation endpoints.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Token issued to an end user through the authorization-code grant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserToken {
	/// User access token.
	pub access_token: TokenSecret,
	/// Refresh token, when issued.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the authorization server.
	#[serde(default)]
	pub token_type: String,
	/// Lifetime in seconds.
	#[serde(default)]
	pub expires_in: i64,
	/// Granted scopes.
	#[serde(default)]
	pub scope: Vec<String>,
}

/// Result of validating a user token against the authorization server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidation {
	/// Application the token was issued to.
	#[serde(default)]
	pub client_id: String,
	/// Login name of the token owner.
	#[serde(default)]
	pub login: String,
	/// Scopes granted to the token.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Upstream user identifier of the token owner.
	#[serde(default)]
	pub user_id: String,
	/// Remaining lifetime in seconds.
	#[serde(default)]
	pub expires_in: i64,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_token_decodes_scope_array() {
		let token: UserToken = serde_json::from_str(
			r#"{"access_token":"u-tok","refresh_token":"r-tok","token_type":"bearer","expires_in":14400,"scope":["user:read:email","user:read:follows"]}"#,
		)
		.expect("User token payload should decode.");

		assert_eq!(token.access_token.expose(), "u-tok");
		assert_eq!(token.scope, vec!["user:read:email", "user:read:follows"]);
		assert!(!format!("{token:?}").contains("r-tok"));
	}

	#[test]
	fn validation_tolerates_missing_fields() {
		let validation: TokenValidation =
			serde_json::from_str(r#"{"user_id":"42","login":"kit"}"#)
				.expect("Partial validation payload should decode.");

		assert_eq!(validation.user_id, "42");
		assert!(validation.scopes.is_empty());
		assert_eq!(validation.expires_in, 0);
	}
}
