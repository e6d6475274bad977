//! Mapping from relay errors to transport-facing status classes and correlated failure bodies.
//!
//! Typed errors are classified by variant. Errors that only survive as text (for example after
//! crossing a task or process boundary) go through [`classify_message`], which applies the phrase
//! rules in a fixed order.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const CORRELATION_ID_LEN: usize = 16;
const UPSTREAM_STATUS_MARKER: &str = "returned error status ";

/// Transport status class assigned to a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
	/// Caller input was invalid (400).
	BadRequest,
	/// Upstream resource does not exist (404).
	NotFound,
	/// Caller or relay is being rate limited (429).
	TooManyRequests,
	/// Upstream failed or answered with garbage (502).
	BadGateway,
	/// Relay cannot serve the request right now (503).
	ServiceUnavailable,
}
impl ErrorClass {
	/// HTTP status code for this class.
	pub const fn status(self) -> u16 {
		match self {
			Self::BadRequest => 400,
			Self::NotFound => 404,
			Self::TooManyRequests => 429,
			Self::BadGateway => 502,
			Self::ServiceUnavailable => 503,
		}
	}

	fn from_upstream_status(status: u16) -> Option<Self> {
		match status {
			400 => Some(Self::BadRequest),
			401 | 403 => Some(Self::ServiceUnavailable),
			404 => Some(Self::NotFound),
			429 => Some(Self::TooManyRequests),
			500..=599 => Some(Self::BadGateway),
			_ => None,
		}
	}
}
impl Display for ErrorClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.status())
	}
}

/// Classifies a typed relay error.
pub fn classify(error: &Error) -> ErrorClass {
	match error {
		Error::Validation(_) => ErrorClass::BadRequest,
		Error::Credential(_) => ErrorClass::ServiceUnavailable,
		Error::Upstream { status, body, .. } =>
			ErrorClass::from_upstream_status(*status).unwrap_or_else(|| classify_message(body)),
		Error::Decode(_) | Error::Network(_) => ErrorClass::BadGateway,
		Error::Config(_) => ErrorClass::ServiceUnavailable,
	}
}

/// Classifies an error that is only available as a message.
pub fn classify_message(message: &str) -> ErrorClass {
	let message = message.to_lowercase();
	let mentions = |needles: &[&str]| needles.iter().any(|needle| message.contains(needle));

	if mentions(&["auth", "token", "unauthorized"]) {
		return ErrorClass::ServiceUnavailable;
	}
	if mentions(&["rate limit", "too many requests"]) {
		return ErrorClass::TooManyRequests;
	}
	if let Some(class) = embedded_upstream_status(&message) {
		return class;
	}
	if mentions(&["connection", "timeout", "network"]) {
		return ErrorClass::BadGateway;
	}
	if mentions(&["json", "parse"]) {
		return ErrorClass::BadGateway;
	}

	ErrorClass::ServiceUnavailable
}

fn embedded_upstream_status(message: &str) -> Option<ErrorClass> {
	let (_, rest) = message.split_once(UPSTREAM_STATUS_MARKER)?;
	let digits = rest.get(..3)?;

	ErrorClass::from_upstream_status(digits.parse().ok()?)
}

/// Opaque identifier tying a failure response to server-side logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);
impl CorrelationId {
	/// Wraps a host-provided identifier (for example a request id).
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Generates a random alphanumeric identifier.
	pub fn generate() -> Self {
		Self(
			rand::rng()
				.sample_iter(Alphanumeric)
				.take(CORRELATION_ID_LEN)
				.map(char::from)
				.collect(),
		)
	}

	/// Borrows the identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CorrelationId({})", self.0)
	}
}
impl Display for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Serializable failure payload returned to callers.
///
/// Carries the error's display string only; sources and credentials stay in server-side logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Identifier shared with the server-side log line.
	pub correlation_id: CorrelationId,
	/// Transport status code.
	pub status: u16,
	/// Human-readable error.
	pub error: String,
}
impl ErrorBody {
	/// Classifies `error`, logs it with `correlation_id`, and builds the caller-facing body.
	pub fn from_error(error: &Error, correlation_id: CorrelationId) -> Self {
		let class = classify(error);

		tracing::error!(
			correlation_id = %correlation_id,
			status = class.status(),
			upstream_status = ?error.upstream_status(),
			error = ?error,
			"request failed"
		);

		Self { correlation_id, status: class.status(), error: error.to_string() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{CredentialError, DecodeError, TransportError, ValidationError};

	fn upstream(status: u16, body: &str) -> Error {
		Error::Upstream { status, body: body.into(), retry_after: None }
	}

	#[test]
	fn upstream_statuses_follow_the_table() {
		assert_eq!(classify(&upstream(400, "")), ErrorClass::BadRequest);
		assert_eq!(classify(&upstream(401, "")), ErrorClass::ServiceUnavailable);
		assert_eq!(classify(&upstream(403, "")), ErrorClass::ServiceUnavailable);
		assert_eq!(classify(&upstream(404, "")), ErrorClass::NotFound);
		assert_eq!(
			classify(&upstream(429, r#"{"error":"token expired"}"#)),
			ErrorClass::TooManyRequests
		);
		assert_eq!(classify(&upstream(500, "")), ErrorClass::BadGateway);
		assert_eq!(classify(&upstream(503, "")), ErrorClass::BadGateway);
	}

	#[test]
	fn unmapped_upstream_statuses_fall_back_to_the_body() {
		assert_eq!(classify(&upstream(409, "connection reset")), ErrorClass::BadGateway);
		assert_eq!(classify(&upstream(418, "teapot")), ErrorClass::ServiceUnavailable);
	}

	#[test]
	fn variants_map_to_fixed_classes() {
		let validation = Error::from(ValidationError::MissingParameter { name: "code" });
		let credential = Error::from(CredentialError::EmptyAccessToken);
		let decode = Error::from(DecodeError::EmptyData { resource: "user" });
		let network = Error::from(TransportError::timeout(std::io::Error::new(
			std::io::ErrorKind::TimedOut,
			"deadline elapsed",
		)));

		assert_eq!(classify(&validation), ErrorClass::BadRequest);
		assert_eq!(classify(&credential), ErrorClass::ServiceUnavailable);
		assert_eq!(classify(&decode), ErrorClass::BadGateway);
		assert_eq!(classify(&network), ErrorClass::BadGateway);
	}

	#[test]
	fn message_rules_apply_in_order() {
		assert_eq!(classify_message("Failed to get OAuth token"), ErrorClass::ServiceUnavailable);
		assert_eq!(classify_message("rate limit exceeded"), ErrorClass::TooManyRequests);
		assert_eq!(
			classify_message("Twitch API returned error status 429: Too Many Requests"),
			ErrorClass::TooManyRequests
		);
		assert_eq!(
			classify_message("API returned error status 404: not found"),
			ErrorClass::NotFound
		);
		assert_eq!(classify_message("API returned error status 502: bad"), ErrorClass::BadGateway);
		assert_eq!(classify_message("API returned error status 400: bad"), ErrorClass::BadRequest);
		assert_eq!(classify_message("connection refused"), ErrorClass::BadGateway);
		assert_eq!(classify_message("request timeout"), ErrorClass::BadGateway);
		assert_eq!(classify_message("failed to parse response"), ErrorClass::BadGateway);
		assert_eq!(classify_message("invalid JSON"), ErrorClass::BadGateway);
		assert_eq!(classify_message("something odd"), ErrorClass::ServiceUnavailable);
	}

	#[test]
	fn auth_phrases_win_over_status() {
		assert_eq!(
			classify_message("API returned error status 404: token not found"),
			ErrorClass::ServiceUnavailable
		);
	}

	#[test]
	fn body_carries_display_string_only() {
		let id = CorrelationId::new("req-1");
		let body = ErrorBody::from_error(&upstream(404, "missing"), id.clone());

		assert_eq!(body.status, 404);
		assert_eq!(body.correlation_id, id);
		assert_eq!(body.error, "Upstream API returned error status 404: missing");

		let json = serde_json::to_value(&body).expect("Error body should serialize.");

		assert_eq!(json["correlation_id"], "req-1");
		assert_eq!(json["status"], 404);
	}

	#[test]
	fn generated_ids_are_alphanumeric() {
		let a = CorrelationId::generate();
		let b = CorrelationId::generate();

		assert_eq!(a.as_str().len(), 16);
		assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(a, b);
	}
}
