//! Application-credential token manager.
//!
//! [`OAuthManager`] owns at most one [`AppToken`] and hands out its access token to every
//! app-authenticated upstream call. A token is reused while it is outside the refresh safety
//! margin; otherwise the manager performs a client-credentials exchange. Concurrent callers that
//! find the token stale share a single exchange through an async guard, and a failed exchange
//! leaves the previously held token untouched.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{AppToken, TokenSecret},
	config::RelayConfig,
	error::{ConfigError, CredentialError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	obs::{self, Operation},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Boxed future resolving to an application access token.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenSecret>> + 'a + Send>>;

/// Source of application access tokens consumed by the upstream client.
///
/// [`OAuthManager`] is the production implementation; tests substitute fixed or failing
/// sources to isolate the client from the token endpoint.
pub trait TokenSource
where
	Self: 'static + Send + Sync,
{
	/// Returns a currently valid access token, refreshing it first when needed.
	fn access_token(&self) -> TokenFuture<'_>;

	/// Returns `true` when a held token can be reused without a network call.
	fn is_token_valid(&self) -> bool;
}

/// Client-credentials token manager shared by every outbound call.
pub struct OAuthManager<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	client_id: String,
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	token: RwLock<Option<AppToken>>,
	refresh_guard: AsyncMutex<()>,
	refresh_margin: Duration,
}
impl OAuthManager<ReqwestHttpClient> {
	/// Creates a manager that provisions its own reqwest transport with the configured timeout.
	pub fn from_config(config: &RelayConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Self::with_http_client(config, http_client)
	}
}
impl<C> OAuthManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a manager that reuses the caller-provided transport.
	pub fn with_http_client(config: &RelayConfig, http_client: impl Into<Arc<C>>) -> Result<Self> {
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			client_id: config.client_id.clone(),
			oauth_client,
			http_client: http_client.into(),
			token: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			refresh_margin: config.refresh_margin,
		})
	}

	/// Seeds the manager with a token acquired elsewhere.
	pub fn with_token(self, token: AppToken) -> Self {
		*self.token.write() = Some(token);

		self
	}

	/// Overrides the refresh safety margin; negative values clamp to zero.
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Snapshot of the currently held token, if any.
	pub fn current(&self) -> Option<AppToken> {
		self.token.read().clone()
	}

	/// Drops the held token so the next [`get_token`](Self::get_token) refreshes.
	pub fn invalidate(&self) {
		if self.token.write().take().is_some() {
			tracing::debug!(client_id = %self.client_id, "application token invalidated");
		}
	}

	/// Returns `true` when a held token is still outside the safety margin at `now`.
	pub fn is_token_valid_at(&self, now: OffsetDateTime) -> bool {
		self.fresh_token_at(now).is_some()
	}

	/// Returns `true` when a held token is still outside the safety margin.
	pub fn is_token_valid(&self) -> bool {
		self.is_token_valid_at(OffsetDateTime::now_utc())
	}

	/// Returns a valid access token, refreshing it when missing or stale.
	///
	/// A held fresh token is returned without any network call. Refresh failures surface as
	/// [`Error::Credential`] and keep the previously held token in place.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		if let Some(token) = self.fresh_token_at(OffsetDateTime::now_utc()) {
			return Ok(token.access_token);
		}

		let _singleflight = self.refresh_guard.lock().await;

		if let Some(token) = self.fresh_token_at(OffsetDateTime::now_utc()) {
			tracing::debug!(
				fingerprint = %token.access_token.fingerprint(),
				"reusing token refreshed by a concurrent caller"
			);

			return Ok(token.access_token);
		}

		let token = self.refresh().await?;
		let secret = token.access_token.clone();

		*self.token.write() = Some(token);

		Ok(secret)
	}

	fn fresh_token_at(&self, now: OffsetDateTime) -> Option<AppToken> {
		self.token
			.read()
			.as_ref()
			.filter(|token| token.is_fresh_at(now, self.refresh_margin))
			.cloned()
	}

	async fn refresh(&self) -> Result<AppToken> {
		obs::observe(Operation::TokenRefresh, "client_credentials", async {
			let meta = ResponseMetadataSlot::default();
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response = self
				.oauth_client
				.exchange_client_credentials()
				.request_async(&instrumented)
				.await
				.map_err(|e| self.map_request_error(meta.take(), e))?;
			let expires_in = match response.expires_in() {
				Some(lifetime) => i64::try_from(lifetime.as_secs())
					.map_err(|_| CredentialError::ExpiresInOutOfRange)?,
				None => 0,
			};
			let token_type: &str = response.token_type().as_ref();
			let token = AppToken::new(
				response.access_token().secret().to_owned(),
				token_type,
				Duration::seconds(expires_in),
				OffsetDateTime::now_utc(),
			)?;

			tracing::info!(
				client_id = %self.client_id,
				fingerprint = %token.access_token.fingerprint(),
				expires_in,
				"acquired application token"
			);

			Ok(token)
		})
		.await
	}

	fn map_request_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
	) -> Error {
		let status = meta.and_then(|value| value.status).filter(|status| *status != 200);
		let error = match err {
			RequestTokenError::ServerResponse(response) => CredentialError::Rejected {
				status: status.unwrap_or(400),
				body: serde_json::to_string(&response).unwrap_or_else(|_| response.to_string()),
			},
			RequestTokenError::Parse(source, body) => match status {
				Some(status) =>
					CredentialError::Rejected { status, body: String::from_utf8_lossy(&body).into() },
				None => CredentialError::MalformedResponse { source },
			},
			RequestTokenError::Request(error) => match error {
				HttpClientError::Reqwest(inner) =>
					CredentialError::Transport(self.http_client.map_transport_error(*inner)),
				HttpClientError::Io(inner) => CredentialError::Transport(TransportError::Io(inner)),
				HttpClientError::Http(inner) => return ConfigError::from(inner).into(),
				HttpClientError::Other(message) => CredentialError::Unexpected { message },
				_ => CredentialError::Unexpected {
					message: "HTTP client error occurred while calling the token endpoint".into(),
				},
			},
			RequestTokenError::Other(message) => match status {
				Some(status) => CredentialError::Rejected { status, body: String::new() },
				None => CredentialError::Unexpected { message },
			},
		};

		error.into()
	}
}
impl<C> TokenSource for OAuthManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn access_token(&self) -> TokenFuture<'_> {
		Box::pin(self.get_token())
	}

	fn is_token_valid(&self) -> bool {
		OAuthManager::is_token_valid(self)
	}
}
impl<C> Debug for OAuthManager<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthManager")
			.field("client_id", &self.client_id)
			.field("token", &self.token.read().as_ref())
			.field("refresh_margin", &self.refresh_margin)
			.finish()
	}
}
