//! Helix API relay core: one injectable client-credentials token manager shared by every outbound
//! call, typed upstream operations with a stable error taxonomy, and a TTL cache for per-user
//! follows lookups.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod helix;
pub mod http;
pub mod identity;
pub mod oauth;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AppToken, TokenSecret},
		config::{Endpoints, RelayConfig},
		error::CredentialError,
		helix::HelixClient,
		http::ReqwestHttpClient,
		oauth::{OAuthManager, TokenFuture, TokenSource},
	};

	/// Client type alias used by integration tests that exercise the real token manager.
	pub type ReqwestTestClient = HelixClient<OAuthManager<ReqwestHttpClient>>;

	/// Builds endpoints that route every upstream call to the provided mock server base URL.
	pub fn mock_endpoints(base: &str) -> Endpoints {
		let base = base.trim_end_matches('/');

		Endpoints::builder()
			.token(
				Url::parse(&format!("{base}/oauth2/token")).expect("Failed to parse mock token URL."),
			)
			.authorize(
				Url::parse(&format!("{base}/oauth2/authorize"))
					.expect("Failed to parse mock authorize URL."),
			)
			.validate(
				Url::parse(&format!("{base}/oauth2/validate"))
					.expect("Failed to parse mock validate URL."),
			)
			.api_base(Url::parse(&format!("{base}/helix")).expect("Failed to parse mock API URL."))
			.build()
			.expect("Mock endpoints should pass validation.")
	}

	/// Builds a relay configuration pointed at the provided mock server base URL.
	pub fn mock_config(base: &str, client_id: &str, client_secret: &str) -> RelayConfig {
		RelayConfig::new(client_id, client_secret).with_endpoints(mock_endpoints(base))
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs an [`OAuthManager`] for the mock server over [`test_reqwest_http_client`].
	pub fn build_reqwest_test_manager(config: &RelayConfig) -> OAuthManager<ReqwestHttpClient> {
		OAuthManager::with_http_client(config, test_reqwest_http_client())
			.expect("Token manager should build for tests.")
	}

	/// Constructs a [`HelixClient`] backed by a real [`OAuthManager`] for the mock server.
	pub fn build_reqwest_test_client(
		base: &str,
		client_id: &str,
		client_secret: &str,
	) -> (ReqwestTestClient, Arc<OAuthManager<ReqwestHttpClient>>) {
		let config = mock_config(base, client_id, client_secret);
		let manager = Arc::new(build_reqwest_test_manager(&config));
		let client =
			HelixClient::with_http_client(config, manager.clone(), test_reqwest_http_client());

		(client, manager)
	}

	/// Constructs a [`HelixClient`] for the mock server around any [`TokenSource`].
	pub fn build_test_client<T>(base: &str, tokens: Arc<T>) -> HelixClient<T>
	where
		T: ?Sized + TokenSource,
	{
		HelixClient::with_http_client(
			mock_config(base, "relay-client", "relay-secret"),
			tokens,
			test_reqwest_http_client(),
		)
	}

	/// Fixed-token [`TokenSource`] used to isolate client tests from the token endpoint.
	#[derive(Clone, Debug)]
	pub struct StaticTokenSource {
		token: Option<AppToken>,
		calls: Arc<Mutex<usize>>,
	}
	impl StaticTokenSource {
		/// Source that always yields the provided access token.
		pub fn new(access_token: &str) -> Self {
			let token = AppToken::new(
				access_token,
				"bearer",
				Duration::hours(1),
				OffsetDateTime::now_utc(),
			)
			.expect("Static token fixture should be valid.");

			Self { token: Some(token), calls: Default::default() }
		}

		/// Source whose every request fails as if the token endpoint were down.
		pub fn failing() -> Self {
			Self { token: None, calls: Default::default() }
		}

		/// Number of times a token was requested.
		pub fn calls(&self) -> usize {
			*self.calls.lock()
		}
	}
	impl TokenSource for StaticTokenSource {
		fn access_token(&self) -> TokenFuture<'_> {
			*self.calls.lock() += 1;

			let token = self.token.clone();

			Box::pin(async move {
				match token {
					Some(token) => Ok(token.access_token),
					None => Err(CredentialError::Rejected {
						status: 503,
						body: "token endpoint unavailable".into(),
					}
					.into()),
				}
			})
		}

		fn is_token_valid(&self) -> bool {
			self.token.is_some()
		}
	}

	/// Wraps a literal secret for assertions.
	pub fn secret(value: &str) -> TokenSecret {
		TokenSecret::new(value)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _, tracing_subscriber as _};
