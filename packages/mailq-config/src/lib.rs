mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, DEFAULT_COLLECTION, EmbeddingProviderConfig, Output, Providers, Qdrant, Retry, Service,
	Storage,
};

use std::{fs, path::Path};

pub const MIN_CELL_WIDTH: usize = 4;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	let qdrant = &cfg.storage.qdrant;

	if qdrant.host.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.host must be non-empty.".to_string(),
		});
	}
	if qdrant.port == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.port must be greater than zero.".to_string(),
		});
	}
	if qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if qdrant.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if qdrant.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.retry.max_attempts must be greater than zero.".to_string(),
		});
	}

	let embedding = &cfg.providers.embedding;

	if embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if embedding.api_base.trim().is_empty() || embedding.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_base and providers.embedding.model must be non-empty."
				.to_string(),
		});
	}
	if embedding.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.embedding.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.output.max_cell_width < MIN_CELL_WIDTH {
		return Err(Error::Validation {
			message: format!("output.max_cell_width must be at least {MIN_CELL_WIDTH}."),
		});
	}

	Ok(())
}

/// Applies command line overrides on top of the loaded file, then re-validates.
pub fn apply_overrides(
	cfg: &mut Config,
	host: Option<String>,
	port: Option<u16>,
	collection: Option<String>,
) -> Result<()> {
	if let Some(host) = host {
		cfg.storage.qdrant.host = host;
	}
	if let Some(port) = port {
		cfg.storage.qdrant.port = port;
	}
	if let Some(collection) = collection {
		cfg.storage.qdrant.collection = collection;
	}

	normalize(cfg);

	validate(cfg)
}

fn normalize(cfg: &mut Config) {
	let qdrant = &mut cfg.storage.qdrant;

	qdrant.host = qdrant.host.trim().to_string();
	qdrant.collection = qdrant.collection.trim().to_string();

	if qdrant.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		qdrant.api_key = None;
	}

	let embedding = &mut cfg.providers.embedding;

	embedding.api_key = embedding.api_key.trim().to_string();
	embedding.api_base = embedding.api_base.trim_end_matches('/').to_string();
}
