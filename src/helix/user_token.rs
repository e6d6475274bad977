//! User login flow against the authorization server: authorize URL, code exchange, validation.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationSession, ScopeSet, TokenSecret, TokenValidation, UserToken},
	error::ValidationError,
	helix::{
		HelixClient,
		request::{self, credential_rejection},
	},
	oauth::TokenSource,
	obs::{self, Operation},
};

impl<T> HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	/// Builds the login URL for the authorization-code flow.
	///
	/// Empty `scopes` fall back to [`ScopeSet::user_defaults`]; a missing `state` is generated.
	pub fn authorization_session(
		&self,
		redirect_uri: &str,
		scopes: &[&str],
		state: Option<&str>,
	) -> Result<AuthorizationSession> {
		let redirect_uri = Url::parse(redirect_uri)
			.map_err(|e| ValidationError::InvalidRedirect { reason: e.to_string() })?;
		let scope = if scopes.is_empty() {
			ScopeSet::user_defaults()
		} else {
			ScopeSet::new(scopes.iter().copied()).map_err(ValidationError::from)?
		};

		Ok(AuthorizationSession::new(
			&self.config.endpoints.authorize,
			&self.config.client_id,
			redirect_uri,
			scope,
			state.map(str::to_owned),
		))
	}

	/// Exchanges an authorization code for a user token.
	///
	/// Non-success statuses surface as [`CredentialError::Rejected`](crate::error::CredentialError::Rejected).
	pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<UserToken> {
		obs::observe(Operation::ExchangeCode, "exchange_code", async {
			if code.is_empty() {
				return Err(ValidationError::MissingParameter { name: "code" }.into());
			}
			if redirect_uri.is_empty() {
				return Err(ValidationError::MissingParameter { name: "redirect_uri" }.into());
			}

			let form = [
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.as_str()),
				("code", code),
				("grant_type", "authorization_code"),
				("redirect_uri", redirect_uri),
			];
			let request = self.http.post(self.config.endpoints.token.clone()).form(&form);
			let body = request::send(request).await.map_err(credential_rejection)?;
			let token: UserToken = request::decode(&body)?;

			tracing::info!(
				fingerprint = %token.access_token.fingerprint(),
				expires_in = token.expires_in,
				"exchanged authorization code"
			);

			Ok(token)
		})
		.await
	}

	/// Validates a user token with the authorization server.
	pub async fn validate_token(&self, user_token: &TokenSecret) -> Result<TokenValidation> {
		obs::observe(Operation::ValidateToken, "validate_token", async {
			if user_token.is_empty() {
				return Err(ValidationError::MissingParameter { name: "user_token" }.into());
			}

			let request = self
				.http
				.get(self.config.endpoints.validate.clone())
				.header(reqwest::header::AUTHORIZATION, format!("OAuth {}", user_token.expose()));
			let body = request::send(request).await.map_err(credential_rejection)?;
			let validation: TokenValidation = request::decode(&body)?;

			tracing::debug!(
				user_id = %validation.user_id,
				login = %validation.login,
				expires_in = validation.expires_in,
				"validated user token"
			);

			Ok(validation)
		})
		.await
	}
}
