//! Request plumbing shared by every upstream operation.

// crates.io
use reqwest::{RequestBuilder, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, CredentialError, DecodeError, TransportError},
	helix::HelixClient,
	http::parse_retry_after,
	oauth::TokenSource,
};

/// Credential attached to a resource request.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Bearer<'a> {
	/// Application token from the token source.
	App,
	/// Caller-supplied user token.
	User(&'a TokenSecret),
}

impl<T> HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	/// Issues an authenticated `GET` against the resource API and decodes the JSON body.
	pub(crate) async fn get_json<R>(&self, url: Url, bearer: Bearer<'_>) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let token = match bearer {
			Bearer::App => self.tokens.access_token().await?,
			Bearer::User(token) => token.clone(),
		};

		tracing::debug!(%url, "calling upstream API");

		let request = self
			.http
			.get(url)
			.bearer_auth(token.expose())
			.header("Client-Id", &self.config.client_id)
			.header(CONTENT_TYPE, "application/json");

		decode(&send(request).await?)
	}
}

/// Sends `request` and returns the body of a successful response.
pub(crate) async fn send(request: RequestBuilder) -> Result<Vec<u8>> {
	let response = request.send().await.map_err(map_send_error)?;
	let status = response.status();
	let retry_after = parse_retry_after(response.headers());
	let body = response.bytes().await.map_err(map_send_error)?;

	if !status.is_success() {
		let body = String::from_utf8_lossy(&body).into_owned();

		tracing::error!(
			status = status.as_u16(),
			response_body = %body,
			"upstream API returned error status"
		);

		return Err(Error::Upstream { status: status.as_u16(), body, retry_after });
	}

	Ok(body.to_vec())
}

/// Decodes a JSON body, keeping the failing path for diagnostics.
pub(crate) fn decode<R>(body: &[u8]) -> Result<R>
where
	R: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|e| {
		let err = DecodeError::from(e);

		tracing::error!(error = %err, "failed to parse upstream response");

		err.into()
	})
}

/// Reclassifies non-success statuses from the user-token endpoints as credential failures.
pub(crate) fn credential_rejection(err: Error) -> Error {
	match err {
		Error::Upstream { status, body, .. } => CredentialError::Rejected { status, body }.into(),
		other => other,
	}
}

fn map_send_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	let err = TransportError::from(err);

	tracing::error!(error = %err, "failed to reach upstream API");

	err.into()
}
