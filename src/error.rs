//! Relay-level error taxonomy shared by the token manager, the upstream client, and the cache
//! orchestration.
//!
//! Every failure falls into one of five caller-classifiable kinds (validation, credential,
//! upstream status, decode, network) plus local configuration problems. See
//! [`classify`](crate::classify) for the transport-status mapping.

// self
use crate::{
	_prelude::*,
	auth::ScopeValidationError,
	config::EndpointsError,
	helix::IdentifierError,
};

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller input was rejected before any network I/O.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Application or user token acquisition failed.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Upstream API answered with a non-success status.
	#[error("Upstream API returned error status {status}: {body}")]
	Upstream {
		/// HTTP status code returned by the upstream API.
		status: u16,
		/// Raw response body.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Upstream answered successfully but the payload had an unexpected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Network(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the upstream HTTP status carried by the error, when there is one.
	pub fn upstream_status(&self) -> Option<u16> {
		match self {
			Self::Upstream { status, .. } => Some(*status),
			Self::Credential(CredentialError::Rejected { status, .. }) => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` when the failure happened before any request was sent.
	pub fn is_validation(&self) -> bool {
		matches!(self, Self::Validation(_))
	}
}

/// Caller input failures detected before any request is issued.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Limit outside the accepted inclusive range.
	#[error("limit must be between {min} and {max}, got {limit}")]
	LimitOutOfRange {
		/// Rejected value.
		limit: i64,
		/// Smallest accepted value.
		min: u32,
		/// Largest accepted value.
		max: u32,
	},
	/// Sort key not supported by the operation.
	#[error("invalid sort parameter: {value}, expected one of: {allowed}")]
	UnsupportedSort {
		/// Rejected value.
		value: String,
		/// Human-readable list of accepted values.
		allowed: &'static str,
	},
	/// Identifier failed validation (e.g., non-numeric game id).
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// Required parameter was empty or absent.
	#[error("{name} is required")]
	MissingParameter {
		/// Parameter name.
		name: &'static str,
	},
	/// Redirect URI cannot be parsed.
	#[error("redirect_uri is invalid: {reason}")]
	InvalidRedirect {
		/// Parser failure description.
		reason: String,
	},
	/// Requested OAuth scopes cannot be normalized.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
	/// Authorization redirect returned a different `state` than the session issued.
	#[error("authorization state mismatch")]
	StateMismatch,
	/// No user bearer credential was found in metadata or headers.
	#[error("upstream authentication required: no user token in metadata or headers")]
	MissingUserToken,
}

/// Token acquisition failures for both the application token and user-token exchanges.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// Authorization server answered with a non-success status.
	#[error("Failed to acquire OAuth token: status {status}: {body}")]
	Rejected {
		/// HTTP status code returned by the authorization server.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Token envelope could not be decoded.
	#[error("Failed to acquire OAuth token: malformed token response")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// Token envelope decoded but carried an empty access token.
	#[error("Failed to acquire OAuth token: received empty access token")]
	EmptyAccessToken,
	/// Token envelope carried an unusable lifetime.
	#[error("Failed to acquire OAuth token: expires_in is out of range")]
	ExpiresInOutOfRange,
	/// Network failure while calling the authorization server.
	#[error("Failed to acquire OAuth token: {0}")]
	Transport(#[source] TransportError),
	/// The OAuth client reported an unexpected failure.
	#[error("Failed to acquire OAuth token: {message}")]
	Unexpected {
		/// Failure summary.
		message: String,
	},
}

/// Payload decoding failures for successful upstream responses.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body was not valid JSON for the expected shape.
	#[error("Failed to parse JSON response at `{}`: {}", .source.path(), .source.inner())]
	Json {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: JsonPathError,
	},
	/// Envelope decoded but the `data` array was unexpectedly empty.
	#[error("Failed to parse JSON response: no {resource} data returned")]
	EmptyData {
		/// Resource label (e.g., `user`).
		resource: &'static str,
	},
}
impl From<JsonPathError> for DecodeError {
	fn from(source: JsonPathError) -> Self {
		Self::Json { source }
	}
}

/// Configuration and construction failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Endpoint set failed validation.
	#[error(transparent)]
	Endpoints(#[from] EndpointsError),
	/// An endpoint URL was rejected by the OAuth client.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Required environment variable is absent or empty.
	#[error("{name} environment variable is required.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable is present but cannot be parsed.
	#[error("{name} environment variable is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Parser failure description.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the client-side timeout.
	#[error("Request timeout while calling the upstream API.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
