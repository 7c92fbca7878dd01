use std::sync::atomic::{AtomicUsize, Ordering};

use mailq_config::EmbeddingProviderConfig;
use mailq_query::{BoxFuture, EmbeddingProvider};

/// Bag-of-words embedding: each lowercase alphanumeric token adds +1 or -1 to a bucket chosen by
/// its blake3 hash, and the result is scaled to unit length.
#[derive(Debug, Default)]
pub struct HashEmbedder {
	calls: AtomicUsize,
}
impl HashEmbedder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn vector(text: &str, dimensions: usize) -> Vec<f32> {
		let dimensions = dimensions.max(1);
		let mut vector = vec![0.0_f32; dimensions];
		let lowered = text.to_lowercase();

		for token in lowered.split(|ch: char| !ch.is_alphanumeric()).filter(|t| !t.is_empty()) {
			let hash = blake3::hash(token.as_bytes());
			let bytes = hash.as_bytes();
			let mut bucket = [0_u8; 8];

			bucket.copy_from_slice(&bytes[..8]);

			let idx = (u64::from_le_bytes(bucket) % dimensions as u64) as usize;
			let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

			vector[idx] += sign;
		}

		let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

		if norm > 0.0 {
			vector.iter_mut().for_each(|value| *value /= norm);
		}

		vector
	}
}
impl EmbeddingProvider for HashEmbedder {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mailq_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let dimensions = cfg.dimensions as usize;
		let vectors = texts.iter().map(|text| Self::vector(text, dimensions)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}
