//! User-token authenticated resources: profile lookup and followed channels.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{DecodeError, ValidationError},
	helix::{HelixClient, UserId, request::Bearer},
	oauth::TokenSource,
	obs::{self, Operation},
};

/// Upstream user profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
	/// User identifier.
	pub id: String,
	/// Login name.
	pub login: String,
	/// Display name.
	pub display_name: String,
	/// Staff/admin marker.
	#[serde(rename = "type")]
	pub kind: String,
	/// Partner/affiliate marker.
	pub broadcaster_type: String,
	/// Channel description.
	pub description: String,
	/// Profile image URL.
	pub profile_image_url: String,
	/// Offline banner URL.
	pub offline_image_url: String,
	/// Email address; present only with the `user:read:email` scope.
	pub email: String,
	/// RFC 3339 account creation timestamp.
	pub created_at: String,
}

/// Envelope returned by the users endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersResponse {
	/// Matching users.
	pub data: Vec<User>,
}

/// Channel followed by a user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Follow {
	/// Followed broadcaster identifier.
	pub broadcaster_id: String,
	/// Followed broadcaster login name.
	pub broadcaster_login: String,
	/// Followed broadcaster display name.
	pub broadcaster_name: String,
	/// RFC 3339 follow timestamp.
	pub followed_at: String,
}

/// Cursor for the next page of a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
	/// Opaque cursor; absent on the last page.
	pub cursor: Option<String>,
}

/// Envelope returned by the followed channels endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowsResponse {
	/// Followed channels in upstream order.
	pub data: Vec<Follow>,
	/// Total number of followed channels.
	pub total: u64,
	/// Paging cursor.
	pub pagination: Pagination,
}

impl<T> HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	/// Fetches the profile that owns `user_token`.
	///
	/// An empty `data` array is reported as [`DecodeError::EmptyData`].
	pub async fn user_info(&self, user_token: &TokenSecret) -> Result<User> {
		obs::observe(Operation::UserInfo, "user_info", async {
			if user_token.is_empty() {
				return Err(ValidationError::MissingParameter { name: "user_token" }.into());
			}

			let url = self.config.endpoints.resource(&["users"]);
			let response: UsersResponse = self.get_json(url, Bearer::User(user_token)).await?;
			let user = response
				.data
				.into_iter()
				.next()
				.ok_or(DecodeError::EmptyData { resource: "user" })?;

			tracing::debug!(user_id = %user.id, login = %user.login, "fetched user info");

			Ok(user)
		})
		.await
	}

	/// Lists the channels followed by `user_id`, authenticated with that user's token.
	pub async fn user_follows(
		&self,
		user_id: &str,
		user_token: &TokenSecret,
	) -> Result<FollowsResponse> {
		obs::observe(Operation::UserFollows, "user_follows", async {
			if user_id.is_empty() {
				return Err(ValidationError::MissingParameter { name: "user_id" }.into());
			}
			if user_token.is_empty() {
				return Err(ValidationError::MissingParameter { name: "user_token" }.into());
			}

			let user_id = UserId::new(user_id).map_err(ValidationError::from)?;
			let mut url = self.config.endpoints.resource(&["channels", "followed"]);

			url.query_pairs_mut().append_pair("user_id", &user_id);

			let response: FollowsResponse = self.get_json(url, Bearer::User(user_token)).await?;

			tracing::debug!(
				user_id = %user_id,
				follows_count = response.data.len(),
				total = response.total,
				"fetched user follows"
			);

			Ok(response)
		})
		.await
	}
}
