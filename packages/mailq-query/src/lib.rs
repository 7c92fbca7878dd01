pub mod executor;
pub mod filter;
pub mod normalize;
pub mod render;

mod error;

pub use error::{Error, Result};
pub use executor::{QueryExecutor, QueryOutcome, QuerySpec, RetryPolicy, Retryable, with_retry};
pub use filter::{FILTER_OPTIONS, FilterBuilder, FilterOptions, parse_filter_arg};
pub use mailq_storage::BoxFuture;
pub use normalize::{Anomaly, Cell, Column, NormalizedBatch, NormalizedRow, normalize_batch};
pub use render::{OutputFormat, RenderOptions, render};

use mailq_config::EmbeddingProviderConfig;
use mailq_providers::embedding;

/// Text-to-vector function used by similarity search. Implementations must be deterministic for
/// identical input.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mailq_providers::Result<Vec<Vec<f32>>>>;
}

/// Calls the configured OpenAI-compatible embeddings endpoint.
pub struct HttpEmbedding;
impl EmbeddingProvider for HttpEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mailq_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
