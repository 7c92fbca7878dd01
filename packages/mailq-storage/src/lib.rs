pub mod qdrant;

mod error;

pub use error::Error;

use std::{fmt, future::Future, pin::Pin, str::FromStr};

use mailq_domain::{FilterPredicate, RawHit};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-only view of a vector store. Every call is a single request; retries belong to callers.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>>>;

	fn collection_info<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<CollectionInfo>>;

	/// Returns points in the store's own stable order, skipping `offset` matches.
	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		request: &'a ScrollRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>>;

	/// Returns the nearest points first; every hit carries a score.
	fn search<'a>(
		&'a self,
		collection: &'a str,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>>;

	fn get_point<'a>(
		&'a self,
		collection: &'a str,
		id: &'a PointRef,
		with_vector: bool,
	) -> BoxFuture<'a, Result<Option<RawHit>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
	pub name: String,
	pub points_count: u64,
	pub vector_size: Option<u64>,
	pub distance: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollRequest {
	pub predicate: FilterPredicate,
	pub limit: u64,
	pub offset: u64,
	pub with_vectors: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
	pub vector: Vec<f32>,
	pub limit: u64,
}

/// A point id as accepted by the store: an unsigned integer or a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointRef {
	Num(u64),
	Uuid(uuid::Uuid),
}
impl fmt::Display for PointRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Num(id) => write!(f, "{id}"),
			Self::Uuid(id) => write!(f, "{}", id.hyphenated()),
		}
	}
}
impl FromStr for PointRef {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let raw = s.trim();

		if let Ok(id) = raw.parse::<u64>() {
			return Ok(Self::Num(id));
		}

		uuid::Uuid::parse_str(raw).map(Self::Uuid).map_err(|_| {
			Error::InvalidArgument(format!(
				"Point id '{s}' must be an unsigned integer or a UUID."
			))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_numeric_and_uuid_point_ids() {
		assert_eq!("42".parse::<PointRef>().expect("Numeric id."), PointRef::Num(42));

		let uuid = "936DA01F-9ABD-4D9D-80C7-02AF85C822A8"
			.parse::<PointRef>()
			.expect("Uuid id.");

		assert_eq!(uuid.to_string(), "936da01f-9abd-4d9d-80c7-02af85c822a8");
	}

	#[test]
	fn rejects_other_point_ids() {
		for raw in ["-1", "abc", "", "18aa1d5e"] {
			let err = raw.parse::<PointRef>().expect_err("Expected invalid point id.");

			assert!(matches!(err, Error::InvalidArgument(_)));
		}
	}
}
