use std::{fmt::Display, future::Future, time::Duration};

use mailq_config::EmbeddingProviderConfig;
use mailq_domain::{FilterPredicate, RawHit};
use mailq_storage::{CollectionInfo, PointRef, ScrollRequest, SearchRequest, VectorStore};

use crate::{EmbeddingProvider, Error, Result};

/// The resolved intent of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySpec {
	Enumerate { predicate: FilterPredicate, limit: u32, offset: u64 },
	SimilaritySearch { query: String, limit: u32 },
}
impl QuerySpec {
	pub fn enumerate(predicate: FilterPredicate, limit: u32, offset: u64) -> Result<Self> {
		check_limit(limit)?;

		Ok(Self::Enumerate { predicate, limit, offset })
	}

	/// Similarity search never takes a predicate.
	pub fn similarity(query: impl Into<String>, limit: u32) -> Result<Self> {
		let query = query.into();

		check_limit(limit)?;

		if query.trim().is_empty() {
			return Err(Error::config("Search query must be non-empty."));
		}

		Ok(Self::SimilaritySearch { query, limit })
	}

	pub fn limit(&self) -> u32 {
		match self {
			Self::Enumerate { limit, .. } | Self::SimilaritySearch { limit, .. } => *limit,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
	pub hits: Vec<RawHit>,
	/// Set when the store returned more than `limit` results.
	pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub backoff: Duration,
}
impl RetryPolicy {
	pub fn no_backoff(max_attempts: u32) -> Self {
		Self { max_attempts, backoff: Duration::ZERO }
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		mailq_config::Retry::default().into()
	}
}
impl From<mailq_config::Retry> for RetryPolicy {
	fn from(cfg: mailq_config::Retry) -> Self {
		Self { max_attempts: cfg.max_attempts, backoff: Duration::from_millis(cfg.backoff_ms) }
	}
}

/// Errors that may succeed when the same call is repeated.
pub trait Retryable {
	fn is_transient(&self) -> bool;
}
impl Retryable for mailq_storage::Error {
	fn is_transient(&self) -> bool {
		mailq_storage::Error::is_transient(self)
	}
}
impl Retryable for mailq_providers::Error {
	fn is_transient(&self) -> bool {
		mailq_providers::Error::is_transient(self)
	}
}

pub struct QueryExecutor<'a> {
	store: &'a dyn VectorStore,
	embedder: &'a dyn EmbeddingProvider,
	embedding: &'a EmbeddingProviderConfig,
	collection: &'a str,
	retry: RetryPolicy,
}
impl<'a> QueryExecutor<'a> {
	pub fn new(
		store: &'a dyn VectorStore,
		embedder: &'a dyn EmbeddingProvider,
		embedding: &'a EmbeddingProviderConfig,
		collection: &'a str,
		retry: RetryPolicy,
	) -> Self {
		Self { store, embedder, embedding, collection, retry }
	}

	pub async fn execute(&self, spec: QuerySpec) -> Result<QueryOutcome> {
		match spec {
			QuerySpec::Enumerate { predicate, limit, offset } => {
				self.enumerate(predicate, limit, offset).await
			},
			QuerySpec::SimilaritySearch { query, limit } => self.similarity(query, limit).await,
		}
	}

	pub async fn list_collections(&self) -> Result<Vec<String>> {
		with_retry(&self.retry, "list_collections", || self.store.list_collections()).await
	}

	pub async fn collection_info(&self) -> Result<CollectionInfo> {
		with_retry(&self.retry, "collection_info", || self.store.collection_info(self.collection))
			.await
	}

	pub async fn get_point(&self, id: &PointRef, with_vector: bool) -> Result<Option<RawHit>> {
		with_retry(&self.retry, "get_point", || {
			self.store.get_point(self.collection, id, with_vector)
		})
		.await
	}

	async fn enumerate(
		&self,
		predicate: FilterPredicate,
		limit: u32,
		offset: u64,
	) -> Result<QueryOutcome> {
		let request =
			ScrollRequest { predicate, limit: u64::from(limit) + 1, offset, with_vectors: false };

		tracing::debug!(
			collection = self.collection,
			limit,
			offset,
			conditions = request.predicate.conditions().len(),
			"Enumerating points."
		);

		let hits =
			with_retry(&self.retry, "scroll", || self.store.scroll(self.collection, &request))
				.await?;

		Ok(trim_to_limit(hits, limit))
	}

	async fn similarity(&self, query: String, limit: u32) -> Result<QueryOutcome> {
		let texts = [query];
		let mut vectors =
			with_retry(&self.retry, "embed", || self.embedder.embed(self.embedding, &texts))
				.await?;

		if vectors.len() != 1 {
			return Err(Error::Embedding {
				message: format!("Expected one query vector, got {}.", vectors.len()),
			});
		}

		let vector = vectors.remove(0);

		if vector.len() != self.embedding.dimensions as usize {
			return Err(Error::Embedding {
				message: format!(
					"Embedding vector dimension mismatch: expected {}, got {}.",
					self.embedding.dimensions,
					vector.len()
				),
			});
		}

		tracing::debug!(collection = self.collection, limit, "Searching nearest points.");

		let request = SearchRequest { vector, limit: u64::from(limit) + 1 };
		let hits =
			with_retry(&self.retry, "search", || self.store.search(self.collection, &request))
				.await?;

		Ok(trim_to_limit(hits, limit))
	}
}

/// Runs `call` until it succeeds, fails terminally, or `policy.max_attempts` is reached. Attempt
/// `n` is followed by a `n * backoff` pause before the next one.
pub async fn with_retry<T, E, F, Fut>(
	policy: &RetryPolicy,
	operation: &str,
	mut call: F,
) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = std::result::Result<T, E>>,
	E: Retryable + Display + Into<Error>,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		attempt += 1;

		match call().await {
			Ok(value) => return Ok(value),
			Err(err) if !err.is_transient() => return Err(err.into()),
			Err(err) if attempt >= max_attempts => {
				tracing::error!(operation, attempt, error = %err, "Retries exhausted.");

				return Err(Error::RetriesExhausted { attempts: attempt, message: err.to_string() });
			},
			Err(err) => {
				tracing::warn!(
					operation,
					attempt,
					max_attempts,
					error = %err,
					"Transient failure, retrying."
				);

				let pause = policy.backoff * attempt;

				if !pause.is_zero() {
					tokio::time::sleep(pause).await;
				}
			},
		}
	}
}

fn trim_to_limit(mut hits: Vec<RawHit>, limit: u32) -> QueryOutcome {
	let limit = limit as usize;
	let has_more = hits.len() > limit;

	hits.truncate(limit);

	QueryOutcome { hits, has_more }
}

fn check_limit(limit: u32) -> Result<()> {
	if limit == 0 {
		return Err(Error::config("Limit must be greater than zero."));
	}

	Ok(())
}
