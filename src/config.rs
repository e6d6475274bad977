//! Relay configuration: credentials, endpoint set, and numeric tunables.
//!
//! [`RelayConfig`] can be assembled explicitly or loaded from the process environment via
//! [`RelayConfig::from_env`]. Every tunable defaults to the upstream platform's documented limits.

pub mod endpoints;

pub use endpoints::*;

// self
use crate::{_prelude::*, error::ConfigError, helix::Limits};

/// Environment variable holding the application client identifier.
pub const ENV_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
/// Environment variable holding the application client secret.
pub const ENV_CLIENT_SECRET: &str = "TWITCH_CLIENT_SECRET";
/// Optional override for the resource API base URL.
pub const ENV_API_BASE_URL: &str = "HELIX_API_BASE_URL";
/// Optional override for the token endpoint.
pub const ENV_TOKEN_URL: &str = "TWITCH_OAUTH_TOKEN_URL";
/// Optional override for the authorize endpoint.
pub const ENV_AUTHORIZE_URL: &str = "TWITCH_OAUTH_AUTHORIZE_URL";
/// Optional override for the validate endpoint.
pub const ENV_VALIDATE_URL: &str = "TWITCH_OAUTH_VALIDATE_URL";
/// Optional override for the outbound HTTP timeout, in whole seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HELIX_HTTP_TIMEOUT_SECS";

/// Complete configuration shared by the token manager and the upstream client.
#[derive(Clone)]
pub struct RelayConfig {
	/// Application client identifier, sent as `Client-Id` on every resource call.
	pub client_id: String,
	/// Application client secret used for client-credentials and code exchanges.
	pub client_secret: String,
	/// Upstream endpoint set.
	pub endpoints: Endpoints,
	/// Timeout applied to every outbound HTTP request.
	pub http_timeout: Duration,
	/// Safety margin subtracted from the token lifetime before it is considered stale.
	pub refresh_margin: Duration,
	/// Lifetime of cached follows entries.
	pub follows_ttl: Duration,
	/// Numeric limit policies for list endpoints.
	pub limits: Limits,
}
impl RelayConfig {
	/// Default outbound HTTP timeout.
	pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::seconds(10);
	/// Default token refresh safety margin.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(30);
	/// Default follows cache lifetime.
	pub const DEFAULT_FOLLOWS_TTL: Duration = Duration::minutes(5);

	/// Creates a configuration for the production endpoints with default tunables.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			endpoints: Endpoints::default(),
			http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
			refresh_margin: Self::DEFAULT_REFRESH_MARGIN,
			follows_ttl: Self::DEFAULT_FOLLOWS_TTL,
			limits: Limits::default(),
		}
	}

	/// Loads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads the configuration through a custom variable lookup.
	///
	/// Empty values are treated as absent.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let client_id = read(ENV_CLIENT_ID).ok_or(ConfigError::MissingEnv { name: ENV_CLIENT_ID })?;
		let client_secret =
			read(ENV_CLIENT_SECRET).ok_or(ConfigError::MissingEnv { name: ENV_CLIENT_SECRET })?;
		let mut builder = Endpoints::builder();

		if let Some(raw) = read(ENV_TOKEN_URL) {
			builder = builder.token(parse_env_url(ENV_TOKEN_URL, &raw)?);
		}
		if let Some(raw) = read(ENV_AUTHORIZE_URL) {
			builder = builder.authorize(parse_env_url(ENV_AUTHORIZE_URL, &raw)?);
		}
		if let Some(raw) = read(ENV_VALIDATE_URL) {
			builder = builder.validate(parse_env_url(ENV_VALIDATE_URL, &raw)?);
		}
		if let Some(raw) = read(ENV_API_BASE_URL) {
			builder = builder.api_base(parse_env_url(ENV_API_BASE_URL, &raw)?);
		}

		let mut config = Self::new(client_id, client_secret).with_endpoints(builder.build()?);

		if let Some(raw) = read(ENV_HTTP_TIMEOUT_SECS) {
			let secs = raw.trim().parse::<u32>().map_err(|e| ConfigError::InvalidEnv {
				name: ENV_HTTP_TIMEOUT_SECS,
				reason: e.to_string(),
			})?;

			if secs == 0 {
				return Err(ConfigError::InvalidEnv {
					name: ENV_HTTP_TIMEOUT_SECS,
					reason: "timeout must be positive".into(),
				});
			}

			config.http_timeout = Duration::seconds(secs.into());
		}

		Ok(config)
	}

	/// Replaces the endpoint set.
	pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the outbound HTTP timeout; non-positive values fall back to the default.
	pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
		self.http_timeout =
			if timeout.is_positive() { timeout } else { Self::DEFAULT_HTTP_TIMEOUT };

		self
	}

	/// Overrides the token refresh safety margin; negative values clamp to zero.
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Overrides the follows cache lifetime.
	pub fn with_follows_ttl(mut self, ttl: Duration) -> Self {
		self.follows_ttl = ttl;

		self
	}

	/// Overrides the list endpoint limit policies.
	pub fn with_limits(mut self, limits: Limits) -> Self {
		self.limits = limits;

		self
	}
}
impl Debug for RelayConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RelayConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("endpoints", &self.endpoints)
			.field("http_timeout", &self.http_timeout)
			.field("refresh_margin", &self.refresh_margin)
			.field("follows_ttl", &self.follows_ttl)
			.field("limits", &self.limits)
			.finish()
	}
}

fn parse_env_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnv { name, reason: e.to_string() })
}
