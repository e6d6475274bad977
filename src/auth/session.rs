//! User login handshake: authorize URL construction and state round-trip checks.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, auth::ScopeSet, error::ValidationError};

const STATE_LEN: usize = 32;

/// Authorization-code login metadata returned by [`HelixApi::authorization_session`].
///
/// [`HelixApi::authorization_session`]: crate::helix::HelixApi::authorization_session
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Requested scope set.
	pub scope: ScopeSet,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL that callers should send end users to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Builds a session; a random state is generated when none is supplied.
	pub fn new(
		authorize_endpoint: &Url,
		client_id: &str,
		redirect_uri: Url,
		scope: ScopeSet,
		state: Option<String>,
	) -> Self {
		let state = state.filter(|value| !value.is_empty()).unwrap_or_else(random_state);
		let mut authorize_url = authorize_endpoint.clone();

		authorize_url
			.query_pairs_mut()
			.append_pair("client_id", client_id)
			.append_pair("redirect_uri", redirect_uri.as_str())
			.append_pair("response_type", "code")
			.append_pair("scope", &scope.normalized())
			.append_pair("state", &state);

		Self { scope, state, redirect_uri, authorize_url }
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<(), ValidationError> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(ValidationError::StateMismatch)
		}
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session(state: Option<String>) -> AuthorizationSession {
		AuthorizationSession::new(
			&Url::parse("https://id.twitch.tv/oauth2/authorize")
				.expect("Authorize URL fixture should parse."),
			"client-123",
			Url::parse("https://app.example.com/callback").expect("Redirect fixture should parse."),
			ScopeSet::user_defaults(),
			state,
		)
	}

	#[test]
	fn authorize_url_carries_all_parameters() {
		let session = session(Some("xyz".into()));
		let pairs = session.authorize_url.query_pairs().into_owned().collect::<HashMap<_, _>>();

		assert_eq!(pairs["client_id"], "client-123");
		assert_eq!(pairs["redirect_uri"], "https://app.example.com/callback");
		assert_eq!(pairs["response_type"], "code");
		assert_eq!(pairs["scope"], "user:read:email user:read:follows");
		assert_eq!(pairs["state"], "xyz");
	}

	#[test]
	fn state_is_generated_and_checked() {
		let session = session(None);

		assert_eq!(session.state.len(), STATE_LEN);
		assert!(session.validate_state(&session.state.clone()).is_ok());
		assert_eq!(session.validate_state("other"), Err(ValidationError::StateMismatch));
	}
}
