//! Live stream listings.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	error::ValidationError,
	helix::{GameId, HelixClient, RangePolicy, request::Bearer},
	oauth::TokenSource,
	obs::{self, Operation},
};

/// Live stream as reported by the resource API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
	/// Stream identifier.
	pub id: String,
	/// Broadcaster user identifier.
	pub user_id: String,
	/// Broadcaster login name.
	pub user_login: String,
	/// Broadcaster display name.
	pub user_name: String,
	/// Category identifier.
	pub game_id: String,
	/// Category name.
	pub game_name: String,
	/// Stream type (e.g., `live`).
	#[serde(rename = "type")]
	pub kind: String,
	/// Stream title.
	pub title: String,
	/// Current viewer count.
	pub viewer_count: u64,
	/// RFC 3339 start timestamp, kept verbatim.
	pub started_at: String,
	/// Broadcast language.
	pub language: String,
	/// Thumbnail URL template.
	pub thumbnail_url: String,
	/// Free-form tags.
	pub tags: Vec<String>,
}

/// Envelope returned by the streams endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamsResponse {
	/// Streams in upstream order (or re-sorted, see [`StreamSort::Recent`]).
	pub data: Vec<Stream>,
}

/// Ordering applied to a streams query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamSort {
	/// Upstream order (by viewer count).
	#[default]
	Viewers,
	/// Most recently started first, sorted locally.
	Recent,
}
impl StreamSort {
	const ALLOWED: &'static str = "viewers, recent";

	/// Parses an optional sort key; absent or empty keys mean [`StreamSort::Viewers`].
	pub fn parse(value: Option<&str>) -> Result<Self, ValidationError> {
		match value.unwrap_or_default() {
			"" | "viewers" => Ok(Self::Viewers),
			"recent" => Ok(Self::Recent),
			other => Err(ValidationError::UnsupportedSort {
				value: other.to_owned(),
				allowed: Self::ALLOWED,
			}),
		}
	}

	/// Returns the query label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Viewers => "viewers",
			Self::Recent => "recent",
		}
	}
}

/// Caller-facing parameters for the flexible streams query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamsQuery {
	/// Page size; absent means the policy default.
	pub limit: Option<i64>,
	/// Category filter; empty strings are treated as absent.
	pub game_id: Option<String>,
	/// Sort key (`viewers` or `recent`).
	pub sort: Option<String>,
}
impl StreamsQuery {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the page size.
	pub fn limit(mut self, limit: i64) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Sets the category filter.
	pub fn game_id(mut self, game_id: impl Into<String>) -> Self {
		self.game_id = Some(game_id.into());

		self
	}

	/// Sets the sort key.
	pub fn sort(mut self, sort: impl Into<String>) -> Self {
		self.sort = Some(sort.into());

		self
	}

	/// Validates the query against `policy`; checks run limit, then game id, then sort.
	pub fn validate(&self, policy: &RangePolicy) -> Result<ValidatedStreamsQuery, ValidationError> {
		let first = policy.check(self.limit)?;
		let game_id = match self.game_id.as_deref() {
			None | Some("") => None,
			Some(raw) => Some(GameId::new(raw)?),
		};
		let sort = StreamSort::parse(self.sort.as_deref())?;

		Ok(ValidatedStreamsQuery { first, game_id, sort })
	}
}

/// Streams query that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedStreamsQuery {
	/// Page size sent as `first`.
	pub first: u32,
	/// Optional category filter.
	pub game_id: Option<GameId>,
	/// Ordering to apply to the result.
	pub sort: StreamSort,
}

impl<T> HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	/// Lists the top live streams; `limit` is clamped rather than rejected.
	pub async fn top_streams(&self, limit: Option<i64>) -> Result<StreamsResponse> {
		obs::observe(Operation::TopStreams, "top_streams", async {
			let first = self.config.limits.top_streams.apply(limit);
			let mut url = self.config.endpoints.resource(&["streams"]);

			url.query_pairs_mut().append_pair("first", &first.to_string());

			let response: StreamsResponse = self.get_json(url, Bearer::App).await?;

			tracing::debug!(
				stream_count = response.data.len(),
				requested_limit = first,
				"fetched top streams"
			);

			Ok(response)
		})
		.await
	}

	/// Lists streams with validated paging, category filter, and ordering.
	pub async fn streams(&self, query: StreamsQuery) -> Result<StreamsResponse> {
		obs::observe(Operation::Streams, "streams", async {
			let query = query.validate(&self.config.limits.streams)?;
			let mut url = self.config.endpoints.resource(&["streams"]);

			{
				let mut pairs = url.query_pairs_mut();

				pairs.append_pair("first", &query.first.to_string());

				if let Some(game_id) = &query.game_id {
					pairs.append_pair("game_id", game_id);
				}
			}

			let mut response: StreamsResponse = self.get_json(url, Bearer::App).await?;

			if query.sort == StreamSort::Recent {
				sort_by_recent(&mut response.data);
			}

			tracing::debug!(
				stream_count = response.data.len(),
				sort = query.sort.as_str(),
				"fetched streams"
			);

			Ok(response)
		})
		.await
	}
}

/// Reorders `streams` so the most recently started come first.
///
/// A stream whose `started_at` is not RFC 3339 keeps its original index; the remaining streams
/// are stable-sorted newest first into the other slots. Nothing fails.
pub fn sort_by_recent(streams: &mut [Stream]) {
	let mut slots = Vec::with_capacity(streams.len());
	let mut parsed = Vec::with_capacity(streams.len());

	for (idx, stream) in streams.iter().enumerate() {
		if let Ok(started) = OffsetDateTime::parse(&stream.started_at, &Rfc3339) {
			slots.push(idx);
			parsed.push((started, stream.clone()));
		}
	}

	parsed.sort_by(|(lhs, _), (rhs, _)| rhs.cmp(lhs));

	for (slot, (_, stream)) in slots.into_iter().zip(parsed) {
		streams[slot] = stream;
	}
}
