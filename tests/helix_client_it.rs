// crates.io
use httpmock::prelude::*;
// self
use helix_relay::{
	_preludet::*,
	classify::{ErrorClass, classify},
	error::{CredentialError, DecodeError, ValidationError},
	helix::{CategoriesQuery, HelixApi, HelixClient, StreamsQuery},
};

const CLIENT_ID: &str = "relay-client";
const CLIENT_SECRET: &str = "relay-secret";
const STREAMS_BODY: &str = r#"{"data":[
	{"id":"s1","user_login":"early","started_at":"2025-01-01T10:00:00Z","viewer_count":30},
	{"id":"s2","user_login":"late","started_at":"2025-01-01T12:00:00Z","viewer_count":20},
	{"id":"s3","user_login":"middle","started_at":"2025-01-01T11:00:00Z","viewer_count":10}
]}"#;

fn static_client(server: &MockServer) -> HelixClient<StaticTokenSource> {
	build_test_client(&server.base_url(), Arc::new(StaticTokenSource::new("static-token")))
}

#[tokio::test]
async fn top_streams_authenticates_with_the_managed_token() {
	let server = MockServer::start_async().await;
	let (client, manager) = build_reqwest_test_client(&server.base_url(), CLIENT_ID, CLIENT_SECRET);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"app-token\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let streams_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/helix/streams")
				.query_param("first", "100")
				.header("authorization", "Bearer app-token")
				.header("client-id", CLIENT_ID);
			then.status(200).header("content-type", "application/json").body(STREAMS_BODY);
		})
		.await;
	let first = client.top_streams(None).await.expect("Top streams request should succeed.");
	let second = client.top_streams(Some(0)).await.expect("Second request should succeed.");

	assert_eq!(first.data.len(), 3);
	assert_eq!(first.data[0].user_login, "early");
	assert_eq!(second, first);
	assert!(manager.is_token_valid());

	token_mock.assert_calls_async(1).await;
	streams_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn top_streams_clamps_limits() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let capped = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/streams").query_param("first", "1000");
			then.status(200).body("{\"data\":[]}");
		})
		.await;
	let passthrough = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/streams").query_param("first", "250");
			then.status(200).body("{\"data\":[]}");
		})
		.await;
	let defaulted = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/streams").query_param("first", "100");
			then.status(200).body("{\"data\":[]}");
		})
		.await;

	client.top_streams(Some(5_000)).await.expect("Oversized limit should be capped.");
	client.top_streams(Some(250)).await.expect("In-range limit should pass through.");
	client.top_streams(Some(-3)).await.expect("Negative limit should fall back.");
	client.top_streams(None).await.expect("Absent limit should fall back.");

	capped.assert_calls_async(1).await;
	passthrough.assert_calls_async(1).await;
	defaulted.assert_calls_async(2).await;
}

#[tokio::test]
async fn streams_rejects_bad_input_before_any_io() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let catch_all = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200).body("{\"data\":[]}");
		})
		.await;
	let cases = [
		(StreamsQuery::new().limit(0), "limit must be between 1 and 100, got 0"),
		(StreamsQuery::new().limit(101), "limit must be between 1 and 100, got 101"),
		(StreamsQuery::new().game_id("abc"), "game_id must be a numeric string, got abc"),
		(
			StreamsQuery::new().sort("shuffle"),
			"invalid sort parameter: shuffle, expected one of: viewers, recent",
		),
	];

	for (query, message) in cases {
		let err = client.streams(query).await.expect_err("Invalid query must be rejected.");

		assert!(err.is_validation(), "{err:?}");
		assert_eq!(err.to_string(), message);
		assert_eq!(classify(&err), ErrorClass::BadRequest);
	}

	assert_eq!(client.tokens().calls(), 0, "Validation failures must not request a token.");

	catch_all.assert_calls_async(0).await;
}

#[tokio::test]
async fn streams_sorts_by_recent_locally() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/helix/streams")
				.query_param("first", "3")
				.query_param("game_id", "509658")
				.header("authorization", "Bearer static-token");
			then.status(200).header("content-type", "application/json").body(STREAMS_BODY);
		})
		.await;
	let response = client
		.streams(StreamsQuery::new().limit(3).game_id("509658").sort("recent"))
		.await
		.expect("Recent streams request should succeed.");
	let started = response.data.iter().map(|stream| stream.started_at.as_str()).collect::<Vec<_>>();

	assert_eq!(started, ["2025-01-01T12:00:00Z", "2025-01-01T11:00:00Z", "2025-01-01T10:00:00Z"]);

	mock.assert_async().await;
}

#[tokio::test]
async fn streams_default_limit_is_twenty() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/streams").query_param("first", "20");
			then.status(200).body(STREAMS_BODY);
		})
		.await;
	let response =
		client.streams(StreamsQuery::new().game_id("")).await.expect("Default query should work.");

	assert_eq!(response.data[0].id, "s1", "Viewer ordering keeps upstream order.");

	mock.assert_async().await;
}

#[tokio::test]
async fn upstream_rate_limit_is_surfaced_with_retry_hint() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/streams");
			then.status(429)
				.header("retry-after", "7")
				.body("{\"error\":\"Too Many Requests\",\"status\":429}");
		})
		.await;
	let err = client.top_streams(None).await.expect_err("HTTP 429 should fail the call.");

	match &err {
		Error::Upstream { status, body, retry_after } => {
			assert_eq!(*status, 429);
			assert!(body.contains("Too Many Requests"));
			assert_eq!(*retry_after, Some(Duration::seconds(7)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
	assert_eq!(classify(&err), ErrorClass::TooManyRequests);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/games/top");
			then.status(200).body("{\"invalid\": json}");
		})
		.await;
	let err = client
		.categories(CategoriesQuery::default())
		.await
		.expect_err("Malformed JSON should fail the call.");

	assert!(matches!(err, Error::Decode(DecodeError::Json { .. })), "{err:?}");
	assert_eq!(classify(&err), ErrorClass::BadGateway);
}

#[tokio::test]
async fn categories_clamp_limit_and_reject_unknown_sort() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/games/top").query_param("first", "20");
			then.status(200).body(
				"{\"data\":[{\"id\":\"509658\",\"name\":\"Just Chatting\",\"box_art_url\":\"x\"}]}",
			);
		})
		.await;
	let err = client
		.categories(CategoriesQuery::new(Some(5), Some("shuffle")))
		.await
		.expect_err("Unknown sort must be rejected.");

	assert!(matches!(err, Error::Validation(ValidationError::UnsupportedSort { .. })));
	assert_eq!(client.tokens().calls(), 0);

	let response = client
		.categories(CategoriesQuery::new(Some(0), Some("top")))
		.await
		.expect("Top categories should succeed.");

	assert_eq!(response.data[0].name, "Just Chatting");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn categories_shuffle_sort_sends_no_request() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200).body("{\"data\":[]}");
		})
		.await;
	let err = client
		.categories(CategoriesQuery::new(None, Some("shuffle")))
		.await
		.expect_err("A shuffle sort should be rejected.");

	assert!(matches!(err, Error::Validation(ValidationError::UnsupportedSort { .. })), "{err:?}");
	assert_eq!(classify(&err), ErrorClass::BadRequest);
	assert_eq!(client.tokens().calls(), 0);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn failing_token_source_blocks_app_calls() {
	let server = MockServer::start_async().await;
	let client = build_test_client(&server.base_url(), Arc::new(StaticTokenSource::failing()));
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200).body("{\"data\":[]}");
		})
		.await;
	let err = client.top_streams(None).await.expect_err("Missing app token should fail.");

	assert!(matches!(err, Error::Credential(CredentialError::Rejected { status: 503, .. })));
	assert_eq!(classify(&err), ErrorClass::ServiceUnavailable);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn user_calls_use_the_user_token() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/users").header("authorization", "Bearer user-token");
			then.status(200).body("{\"data\":[{\"id\":\"42\",\"login\":\"kit\"}]}");
		})
		.await;
	let follows_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/helix/channels/followed")
				.query_param("user_id", "42")
				.header("authorization", "Bearer user-token")
				.header("client-id", CLIENT_ID);
			then.status(200).body(
				"{\"data\":[{\"broadcaster_id\":\"7\",\"broadcaster_login\":\"seven\"}],\"total\":1,\"pagination\":{\"cursor\":\"c1\"}}",
			);
		})
		.await;
	let token = secret("user-token");
	let user = client.user_info(&token).await.expect("User lookup should succeed.");
	let follows = client.user_follows(&user.id, &token).await.expect("Follows should succeed.");

	assert_eq!(user.login, "kit");
	assert_eq!(follows.total, 1);
	assert_eq!(follows.data[0].broadcaster_login, "seven");
	assert_eq!(follows.pagination.cursor.as_deref(), Some("c1"));
	assert_eq!(client.tokens().calls(), 0, "User calls must not touch the app token.");

	user_mock.assert_async().await;
	follows_mock.assert_async().await;
}

#[tokio::test]
async fn user_info_with_no_rows_is_a_decode_error() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/users");
			then.status(200).body("{\"data\":[]}");
		})
		.await;
	let err =
		client.user_info(&secret("user-token")).await.expect_err("Empty data should fail.");

	assert!(matches!(err, Error::Decode(DecodeError::EmptyData { resource: "user" })));
}

#[tokio::test]
async fn user_follows_requires_id_and_token() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let missing_id =
		client.user_follows("", &secret("t")).await.expect_err("Empty user id must fail.");
	let missing_token =
		client.user_follows("42", &secret("")).await.expect_err("Empty token must fail.");

	assert_eq!(missing_id.to_string(), "user_id is required");
	assert_eq!(missing_token.to_string(), "user_token is required");
}

#[tokio::test]
async fn exchange_code_posts_form_and_decodes_scope_array() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "auth-code")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET)
				.form_urlencoded_tuple("redirect_uri", "https://app.example/callback");
			then.status(200).body(
				"{\"access_token\":\"u-tok\",\"refresh_token\":\"r-tok\",\"token_type\":\"bearer\",\"expires_in\":14400,\"scope\":[\"user:read:follows\"]}",
			);
		})
		.await;
	let token = client
		.exchange_code("auth-code", "https://app.example/callback")
		.await
		.expect("Code exchange should succeed.");

	assert_eq!(token.access_token.expose(), "u-tok");
	assert_eq!(token.scope, ["user:read:follows"]);

	mock.assert_async().await;
}

#[tokio::test]
async fn rejected_user_token_calls_are_credential_errors() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let _exchange = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400).body("{\"status\":400,\"message\":\"Invalid authorization code\"}");
		})
		.await;
	let _validate = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth2/validate").header("authorization", "OAuth expired");
			then.status(401).body("{\"status\":401,\"message\":\"invalid access token\"}");
		})
		.await;
	let exchange = client
		.exchange_code("bad-code", "https://app.example/callback")
		.await
		.expect_err("Rejected exchange should fail.");
	let validate =
		client.validate_token(&secret("expired")).await.expect_err("Expired token should fail.");

	assert!(matches!(exchange, Error::Credential(CredentialError::Rejected { status: 400, .. })));
	assert!(matches!(validate, Error::Credential(CredentialError::Rejected { status: 401, .. })));
	assert_eq!(classify(&validate), ErrorClass::ServiceUnavailable);
}

#[tokio::test]
async fn validate_token_decodes_owner() {
	let server = MockServer::start_async().await;
	let client = static_client(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth2/validate").header("authorization", "OAuth user-token");
			then.status(200).body(
				"{\"client_id\":\"relay-client\",\"login\":\"kit\",\"scopes\":[\"user:read:follows\"],\"user_id\":\"42\",\"expires_in\":5000}",
			);
		})
		.await;
	let validation =
		client.validate_token(&secret("user-token")).await.expect("Validation should succeed.");

	assert_eq!(validation.user_id, "42");
	assert_eq!(validation.scopes, ["user:read:follows"]);
}

#[tokio::test]
async fn trait_object_dispatch_reaches_the_client() {
	let server = MockServer::start_async().await;
	let api: Arc<dyn HelixApi> = Arc::new(static_client(&server));
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/streams");
			then.status(200).body(STREAMS_BODY);
		})
		.await;
	let response = api.top_streams(Some(3)).await.expect("Dynamic dispatch should succeed.");
	let session = api
		.authorization_session("https://app.example/callback", &[], Some("fixed-state"))
		.expect("Authorization session should build.");
	let query = session.authorize_url.query_pairs().collect::<Vec<_>>();

	assert_eq!(response.data.len(), 3);
	assert_eq!(session.state, "fixed-state");
	assert!(session.authorize_url.as_str().starts_with(&server.url("/oauth2/authorize")));
	assert!(query.iter().any(|(k, v)| k == "scope" && v == "user:read:email user:read:follows"));
	assert!(query.iter().any(|(k, v)| k == "response_type" && v == "code"));
	assert!(session.validate_state("other").is_err());
}
