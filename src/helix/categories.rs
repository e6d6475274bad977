//! Top categories (games) listing.

// self
use crate::{
	_prelude::*,
	error::ValidationError,
	helix::{HelixClient, request::Bearer},
	oauth::TokenSource,
	obs::{self, Operation},
};

/// Category as reported by the resource API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
	/// Category identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Box art URL template.
	pub box_art_url: String,
	/// IGDB identifier, when known.
	pub igdb_id: String,
}

/// Envelope returned by the top categories endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesResponse {
	/// Categories in upstream order.
	pub data: Vec<Category>,
}

/// Caller-facing parameters for the categories listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesQuery {
	/// Page size; clamped rather than rejected.
	pub limit: Option<i64>,
	/// Sort key; only `top` is supported.
	pub sort: Option<String>,
}
impl CategoriesQuery {
	const ALLOWED_SORT: &'static str = "top";

	/// Creates a query with the provided limit and sort key.
	pub fn new(limit: Option<i64>, sort: Option<&str>) -> Self {
		Self { limit, sort: sort.map(str::to_owned) }
	}

	fn check_sort(&self) -> Result<(), ValidationError> {
		match self.sort.as_deref() {
			None | Some("") | Some(Self::ALLOWED_SORT) => Ok(()),
			Some(other) => Err(ValidationError::UnsupportedSort {
				value: other.to_owned(),
				allowed: Self::ALLOWED_SORT,
			}),
		}
	}
}

impl<T> HelixClient<T>
where
	T: ?Sized + TokenSource,
{
	/// Lists the top categories; the limit is clamped and the sort key must be `top` or absent.
	pub async fn categories(&self, query: CategoriesQuery) -> Result<CategoriesResponse> {
		obs::observe(Operation::Categories, "categories", async {
			let first = self.config.limits.categories.apply(query.limit);

			query.check_sort()?;

			let mut url = self.config.endpoints.resource(&["games", "top"]);

			url.query_pairs_mut().append_pair("first", &first.to_string());

			let response: CategoriesResponse = self.get_json(url, Bearer::App).await?;

			tracing::debug!(
				category_count = response.data.len(),
				requested_limit = first,
				"fetched categories"
			);

			Ok(response)
		})
		.await
	}
}
