//! Demonstrates the relay end to end against a local mock of the upstream platform.
//!
//! 1. Load [`RelayConfig`] through the same variables `from_env` reads, pointed at the mock.
//! 2. Share one token manager between app-authenticated calls.
//! 3. Resolve a caller identity from identity-provider metadata and serve their follows through
//!    the TTL cache, then turn a failure into a correlated error body.

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;
// self
use helix_relay::{
	cache::FollowsCache,
	classify::{CorrelationId, ErrorBody},
	config::{
		ENV_API_BASE_URL, ENV_AUTHORIZE_URL, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_TOKEN_URL,
		ENV_VALIDATE_URL, RelayConfig,
	},
	helix::{HelixApi, HelixClient, StreamsQuery},
	http::ReqwestHttpClient,
	identity::{FollowsService, UserMetadata, extract_bearer_token},
	oauth::OAuthManager,
	reqwest,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("helix_relay=debug")),
		)
		.init();

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-app-token\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let _streams_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/streams");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":[
					{"id":"1","user_login":"early","started_at":"2025-01-01T10:00:00Z"},
					{"id":"2","user_login":"late","started_at":"2025-01-01T12:00:00Z"}
				]}"#,
			);
		})
		.await;
	let follows_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/channels/followed").query_param("user_id", "4242");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":[{"broadcaster_id":"7","broadcaster_login":"seven"}],"total":1,"pagination":{}}"#,
			);
		})
		.await;
	let _games_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/helix/games/top");
			then.status(503).body("upstream maintenance");
		})
		.await;
	let env = HashMap::from([
		(ENV_CLIENT_ID, "demo-client".to_owned()),
		(ENV_CLIENT_SECRET, "demo-secret".to_owned()),
		(ENV_TOKEN_URL, server.url("/oauth2/token")),
		(ENV_AUTHORIZE_URL, server.url("/oauth2/authorize")),
		(ENV_VALIDATE_URL, server.url("/oauth2/validate")),
		(ENV_API_BASE_URL, server.url("/helix")),
	]);
	let config = RelayConfig::from_lookup(|name| env.get(name).cloned())?;
	let cache = Arc::new(FollowsCache::from_config(&config));
	// The mock server presents a self-signed certificate.
	let http_client = ReqwestHttpClient::with_client(
		reqwest::Client::builder()
			.timeout(config.http_timeout.unsigned_abs())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let manager =
		Arc::new(OAuthManager::<ReqwestHttpClient>::with_http_client(&config, http_client.clone())?);
	let client = HelixClient::with_http_client(config, manager, http_client);
	let api: Arc<dyn HelixApi> = Arc::new(client.clone());
	let streams = client.streams(StreamsQuery::new().limit(2).sort("recent")).await?;

	println!(
		"Most recent stream: {}.",
		streams.data.first().map(|stream| stream.user_login.as_str()).unwrap_or("none")
	);

	let service = FollowsService::new(api, cache);
	let metadata: UserMetadata =
		serde_json::from_value(json!({ "twitch": { "user_id": "4242" } }))?;
	let header_token = extract_bearer_token("Bearer demo-user-token");
	let identity = service.resolve_identity(&metadata, header_token).await?;
	let first = service.followed_channels(&identity).await?;
	let second = service.followed_channels(&identity).await?;

	println!("Follows: {} (cached on second lookup: {}).", first.follows.total, second.cached);

	if let Err(e) = client.categories(Default::default()).await {
		let body = ErrorBody::from_error(&e, CorrelationId::generate());

		println!("Error body: {}.", serde_json::to_string(&body)?);
	}

	token_mock.assert_calls_async(1).await;
	follows_mock.assert_calls_async(1).await;

	Ok(())
}
