//! Upstream endpoint set with HTTPS validation.

// std
use std::net::IpAddr;
// self
use crate::_prelude::*;

/// Production token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
/// Production authorize endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://id.twitch.tv/oauth2/authorize";
/// Production token validation endpoint.
pub const DEFAULT_VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";
/// Production resource API base.
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Errors raised while validating an endpoint set.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum EndpointsError {
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Endpoints used by the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	/// OAuth token endpoint (client credentials and code exchange).
	pub token: Url,
	/// OAuth authorize endpoint used to build login URLs.
	pub authorize: Url,
	/// OAuth token validation endpoint.
	pub validate: Url,
	/// Resource API base; resource paths are appended as segments.
	pub api_base: Url,
}
impl Endpoints {
	/// Returns a builder seeded with the production endpoints.
	pub fn builder() -> EndpointsBuilder {
		EndpointsBuilder::default()
	}

	/// Builds a resource URL by appending `segments` to the API base.
	pub fn resource(&self, segments: &[&str]) -> Url {
		let mut url = self.api_base.clone();

		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}

	fn validate(&self) -> Result<(), EndpointsError> {
		validate_endpoint("token", &self.token)?;
		validate_endpoint("authorize", &self.authorize)?;
		validate_endpoint("validate", &self.validate)?;
		validate_endpoint("api_base", &self.api_base)
	}
}
impl Default for Endpoints {
	fn default() -> Self {
		let defaults = EndpointsBuilder::default();

		Self {
			token: defaults.token,
			authorize: defaults.authorize,
			validate: defaults.validate,
			api_base: defaults.api_base,
		}
	}
}

/// Builder for [`Endpoints`] values.
#[derive(Debug)]
pub struct EndpointsBuilder {
	token: Url,
	authorize: Url,
	validate: Url,
	api_base: Url,
}
impl EndpointsBuilder {
	/// Overrides the token endpoint.
	pub fn token(mut self, url: Url) -> Self {
		self.token = url;

		self
	}

	/// Overrides the authorize endpoint.
	pub fn authorize(mut self, url: Url) -> Self {
		self.authorize = url;

		self
	}

	/// Overrides the validate endpoint.
	pub fn validate(mut self, url: Url) -> Self {
		self.validate = url;

		self
	}

	/// Overrides the resource API base.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = url;

		self
	}

	/// Consumes the builder and validates the resulting endpoint set.
	pub fn build(self) -> Result<Endpoints, EndpointsError> {
		let endpoints = Endpoints {
			token: self.token,
			authorize: self.authorize,
			validate: self.validate,
			api_base: self.api_base,
		};

		endpoints.validate()?;

		Ok(endpoints)
	}
}
impl Default for EndpointsBuilder {
	fn default() -> Self {
		Self {
			token: default_url(DEFAULT_TOKEN_URL),
			authorize: default_url(DEFAULT_AUTHORIZE_URL),
			validate: default_url(DEFAULT_VALIDATE_URL),
			api_base: default_url(DEFAULT_API_BASE_URL),
		}
	}
}

fn default_url(raw: &str) -> Url {
	Url::parse(raw).expect("Built-in endpoint constants are valid URLs.")
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), EndpointsError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(EndpointsError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}
