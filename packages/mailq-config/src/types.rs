use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_COLLECTION: &str = "gmail_embeddings_full";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub output: Output,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Qdrant {
	pub host: String,
	/// gRPC port. The REST port (6333) is not spoken by the client.
	pub port: u16,
	pub collection: String,
	pub timeout_ms: u64,
	pub api_key: Option<String>,
	pub retry: Retry,
}
impl Qdrant {
	pub fn url(&self) -> String {
		format!("http://{}:{}", self.host, self.port)
	}
}
impl Default for Qdrant {
	fn default() -> Self {
		Self {
			host: "localhost".to_string(),
			port: 6334,
			collection: DEFAULT_COLLECTION.to_string(),
			timeout_ms: 10_000,
			api_key: None,
			retry: Retry::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_attempts: u32,
	/// Linear backoff step; attempt `n` waits `n * backoff_ms` before retrying.
	pub backoff_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_attempts: 3, backoff_ms: 200 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Empty means the endpoint is called without an `Authorization` header.
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}
impl Default for EmbeddingProviderConfig {
	fn default() -> Self {
		Self {
			provider_id: "local".to_string(),
			api_base: "http://localhost:8080".to_string(),
			api_key: String::new(),
			path: "/v1/embeddings".to_string(),
			model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
			dimensions: 384,
			timeout_ms: 30_000,
			default_headers: Map::new(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Output {
	/// Table cells wider than this many graphemes are cut and end with `...`.
	pub max_cell_width: usize,
}
impl Default for Output {
	fn default() -> Self {
		Self { max_cell_width: 40 }
	}
}
