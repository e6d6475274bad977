// crates.io
use httpmock::prelude::*;
// self
use helix_relay::{
	_preludet::*,
	auth::AppToken,
	config::RelayConfig,
	error::CredentialError,
	oauth::OAuthManager,
};

const CLIENT_ID: &str = "relay-client";
const CLIENT_SECRET: &str = "relay-secret";

fn build_manager(server: &MockServer) -> OAuthManager {
	build_reqwest_test_manager(&mock_config(&server.base_url(), CLIENT_ID, CLIENT_SECRET))
}

fn stale_token() -> AppToken {
	AppToken::new(
		"previous-token",
		"bearer",
		Duration::seconds(60),
		OffsetDateTime::now_utc() - Duration::minutes(5),
	)
	.expect("Stale token fixture should be valid.")
}

#[tokio::test]
async fn get_token_acquires_and_reuses() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "client_credentials")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"app-token\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let first = manager.get_token().await.expect("Initial token request should succeed.");
	let second = manager.get_token().await.expect("Cached token request should succeed.");

	assert_eq!(first.expose(), "app-token");
	assert_eq!(second.expose(), "app-token");
	assert!(manager.is_token_valid());

	mock.assert_calls_async(1).await;

	let held = manager.current().expect("Token should be held after refresh.");

	assert_eq!(held.expires_in, Duration::hours(1));
	assert_eq!(held.token_type, "bearer");
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
	let server = MockServer::start_async().await;
	let manager = Arc::new(build_manager(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(50))
				.body("{\"access_token\":\"shared\",\"token_type\":\"bearer\",\"expires_in\":900}");
		})
		.await;
	let (a, b, c) = tokio::join!(manager.get_token(), manager.get_token(), manager.get_token());

	for token in [a, b, c] {
		assert_eq!(token.expect("Concurrent call should succeed.").expose(), "shared");
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_success_status_is_rejected_with_body() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"status\":400,\"message\":\"invalid client secret\"}");
		})
		.await;
	let err = manager.get_token().await.expect_err("HTTP 400 should fail the refresh.");

	match err {
		Error::Credential(CredentialError::Rejected { status, body }) => {
			assert_eq!(status, 400);
			assert!(body.contains("invalid client secret"), "{body}");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
	assert!(manager.current().is_none());

	mock.assert_async().await;
}

#[tokio::test]
async fn malformed_body_is_a_credential_error() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body("{\"invalid\": json}");
		})
		.await;
	let err = manager.get_token().await.expect_err("Malformed JSON should fail the refresh.");

	assert!(
		matches!(err, Error::Credential(CredentialError::MalformedResponse { .. })),
		"Unexpected error variant: {err:?}."
	);
}

#[tokio::test]
async fn empty_access_token_is_rejected() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let err = manager.get_token().await.expect_err("An empty access token should be rejected.");

	assert!(matches!(err, Error::Credential(CredentialError::EmptyAccessToken)), "{err:?}");
	assert!(manager.current().is_none());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_token() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server).with_token(stale_token());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(500).body("upstream exploded");
		})
		.await;

	assert!(!manager.is_token_valid());

	let err = manager.get_token().await.expect_err("HTTP 500 should fail the refresh.");

	assert_eq!(err.upstream_status(), Some(500));

	let held = manager.current().expect("Previous token should survive a failed refresh.");

	assert_eq!(held.access_token.expose(), "previous-token");

	mock.assert_async().await;
}

#[tokio::test]
async fn stale_token_is_replaced_on_refresh() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server).with_token(stale_token());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"replacement\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let token = manager.get_token().await.expect("Stale token should be refreshed.");

	assert_eq!(token.expose(), "replacement");
	assert_eq!(
		manager.current().map(|held| held.access_token.expose().to_owned()).as_deref(),
		Some("replacement")
	);

	mock.assert_async().await;
}

#[tokio::test]
async fn unrepresentable_lifetime_is_a_credential_error() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"t\",\"token_type\":\"bearer\",\"expires_in\":1000000000000}",
			);
		})
		.await;

	for _ in 0..2 {
		let err = manager.get_token().await.expect_err("An unusable lifetime should be rejected.");

		assert!(matches!(err, Error::Credential(CredentialError::ExpiresInOutOfRange)), "{err:?}");
	}

	assert!(manager.current().is_none());
	assert!(!manager.is_token_valid());

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
	let config = RelayConfig::new(CLIENT_ID, CLIENT_SECRET)
		.with_endpoints(mock_endpoints("http://127.0.0.1:9"))
		.with_http_timeout(Duration::seconds(2));
	let manager = OAuthManager::from_config(&config).expect("Token manager should build.");
	let err = manager.get_token().await.expect_err("A closed port should fail the refresh.");

	assert!(
		matches!(err, Error::Credential(CredentialError::Transport(_))),
		"Unexpected error variant: {err:?}."
	);
}
