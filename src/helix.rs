//! Upstream resource client.
//!
//! [`HelixApi`] is the capability surface consumed by handlers; [`HelixClient`] is its only
//! implementation. Every operation validates input before any I/O, obtains an application token
//! from its [`TokenSource`] when the endpoint is app-authenticated, and classifies failures into
//! the relay [`Error`] taxonomy.

pub mod categories;
pub mod id;
pub mod limits;
pub mod streams;
pub mod user_token;
pub mod users;

mod request;

pub use categories::*;
pub use id::*;
pub use limits::*;
pub use streams::*;
pub use users::*;

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationSession, TokenSecret, TokenValidation, UserToken},
	config::RelayConfig,
	http::ReqwestHttpClient,
	oauth::{OAuthManager, TokenSource},
};

/// Boxed future returned by [`HelixApi`] operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capability trait over the upstream platform.
pub trait HelixApi
where
	Self: 'static + Send + Sync,
{
	/// Top live streams; the limit is clamped (absent or non-positive → default).
	fn top_streams(&self, limit: Option<i64>) -> ApiFuture<'_, StreamsResponse>;

	/// Streams filtered by category and ordered by viewers or recency; bad limits are rejected.
	fn streams(&self, query: StreamsQuery) -> ApiFuture<'_, StreamsResponse>;

	/// Top categories; the limit is clamped and only the `top` sort key is accepted.
	fn categories(&self, query: CategoriesQuery) -> ApiFuture<'_, CategoriesResponse>;

	/// Channels followed by `user_id`, authenticated with the user's own token.
	fn user_follows<'a>(
		&'a self,
		user_id: &'a str,
		user_token: &'a TokenSecret,
	) -> ApiFuture<'a, FollowsResponse>;

	/// Profile of the user owning `user_token`.
	fn user_info<'a>(&'a self, user_token: &'a TokenSecret) -> ApiFuture<'a, User>;

	/// Exchanges an authorization code for a user token.
	fn exchange_code<'a>(&'a self, code: &'a str, redirect_uri: &'a str)
	-> ApiFuture<'a, UserToken>;

	/// Validates a user token with the authorization server.
	fn validate_token<'a>(&'a self, user_token: &'a TokenSecret) -> ApiFuture<'a, TokenValidation>;

	/// Builds the login URL for the authorization-code flow. Performs no I/O.
	fn authorization_session(
		&self,
		redirect_uri: &str,
		scopes: &[&str],
		state: Option<&str>,
	) -> Result<AuthorizationSession>;
}

/// Concrete [`HelixApi`] implementation backed by reqwest.
pub struct HelixClient<T = OAuthManager>
where
	T: ?Sized + TokenSource,
{
	config: RelayConfig,
	http: ReqwestHttpClient,
	tokens: Arc<T>,
}
impl<T> HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	/// Creates a client whose transport honors the configured timeout.
	pub fn new(config: RelayConfig, tokens: Arc<T>) -> Result<Self> {
		let http = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Ok(Self::with_http_client(config, tokens, http))
	}

	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(config: RelayConfig, tokens: Arc<T>, http: ReqwestHttpClient) -> Self {
		Self { config, http, tokens }
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &RelayConfig {
		&self.config
	}

	/// Token source used for app-authenticated calls.
	pub fn tokens(&self) -> &Arc<T> {
		&self.tokens
	}
}
impl HelixClient<OAuthManager> {
	/// Builds a client and its own token manager from one configuration.
	pub fn from_config(config: RelayConfig) -> Result<Self> {
		let manager = Arc::new(OAuthManager::from_config(&config)?);

		Self::new(config, manager)
	}
}
impl<T> Clone for HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone(), http: self.http.clone(), tokens: self.tokens.clone() }
	}
}
impl<T> Debug for HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HelixClient")
			.field("config", &self.config)
			.field("token_valid", &self.tokens.is_token_valid())
			.finish()
	}
}
impl<T> HelixApi for HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	fn top_streams(&self, limit: Option<i64>) -> ApiFuture<'_, StreamsResponse> {
		Box::pin(HelixClient::top_streams(self, limit))
	}

	fn streams(&self, query: StreamsQuery) -> ApiFuture<'_, StreamsResponse> {
		Box::pin(HelixClient::streams(self, query))
	}

	fn categories(&self, query: CategoriesQuery) -> ApiFuture<'_, CategoriesResponse> {
		Box::pin(HelixClient::categories(self, query))
	}

	fn user_follows<'a>(
		&'a self,
		user_id: &'a str,
		user_token: &'a TokenSecret,
	) -> ApiFuture<'a, FollowsResponse> {
		Box::pin(HelixClient::user_follows(self, user_id, user_token))
	}

	fn user_info<'a>(&'a self, user_token: &'a TokenSecret) -> ApiFuture<'a, User> {
		Box::pin(HelixClient::user_info(self, user_token))
	}

	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		redirect_uri: &'a str,
	) -> ApiFuture<'a, UserToken> {
		Box::pin(HelixClient::exchange_code(self, code, redirect_uri))
	}

	fn validate_token<'a>(&'a self, user_token: &'a TokenSecret) -> ApiFuture<'a, TokenValidation> {
		Box::pin(HelixClient::validate_token(self, user_token))
	}

	fn authorization_session(
		&self,
		redirect_uri: &str,
		scopes: &[&str],
		state: Option<&str>,
	) -> Result<AuthorizationSession> {
		HelixClient::authorization_session(self, redirect_uri, scopes, state)
	}
}
