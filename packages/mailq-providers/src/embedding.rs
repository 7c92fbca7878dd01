use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

pub async fn embed(
	cfg: &mailq_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vectors = parse_embedding_response(json)?;

	if vectors.len() != texts.len() {
		return Err(invalid(format!(
			"Embedding response returned {} vectors for {} inputs.",
			vectors.len(),
			texts.len()
		)));
	}

	Ok(vectors)
}

/// Places each `data[].embedding` at its `index`. Items without an index keep their position.
/// Every slot must be filled exactly once.
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let Some(data) = json.get("data").and_then(Value::as_array) else {
		return Err(invalid("Embedding response is missing data array."));
	};
	let mut slots: Vec<Option<Vec<f32>>> = vec![None; data.len()];

	for (position, item) in data.iter().enumerate() {
		let index = match item.get("index") {
			None => position,
			Some(raw) => raw
				.as_u64()
				.and_then(|index| usize::try_from(index).ok())
				.ok_or_else(|| invalid("Embedding index must be a non-negative integer."))?,
		};
		let Some(slot) = slots.get_mut(index) else {
			return Err(invalid(format!(
				"Embedding index {index} is out of range for {} items.",
				data.len()
			)));
		};

		if slot.is_some() {
			return Err(invalid(format!("Embedding index {index} appears more than once.")));
		}

		let Some(values) = item.get("embedding").and_then(Value::as_array) else {
			return Err(invalid("Embedding item missing embedding array."));
		};
		let vector = values
			.iter()
			.map(|value| value.as_f64().map(|number| number as f32))
			.collect::<Option<Vec<f32>>>()
			.ok_or_else(|| invalid("Embedding value must be numeric."))?;

		*slot = Some(vector);
	}

	// Every index is in range and distinct, so each slot is filled.
	Ok(slots.into_iter().flatten().collect())
}

fn invalid(message: impl Into<String>) -> Error {
	Error::InvalidResponse { message: message.into() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json).expect("Parse failed.");

		assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "index": 0, "embedding": ["x"] }] });
		let err = parse_embedding_response(json).expect_err("Expected invalid response.");

		assert!(matches!(err, Error::InvalidResponse { .. }));
		assert!(!err.is_transient());
	}

	#[test]
	fn rejects_missing_data() {
		let err = parse_embedding_response(serde_json::json!({ "object": "list" }))
			.expect_err("Expected invalid response.");

		assert_eq!(err.to_string(), "Embedding response is missing data array.");
	}

	#[test]
	fn rejects_duplicate_and_out_of_range_indices() {
		let duplicate = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [1.0] },
				{ "index": 0, "embedding": [2.0] }
			]
		});
		let out_of_range = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [1.0] },
				{ "index": 2, "embedding": [2.0] }
			]
		});

		for json in [duplicate, out_of_range] {
			let err = parse_embedding_response(json).expect_err("Expected invalid response.");

			assert!(matches!(err, Error::InvalidResponse { .. }), "{err}");
		}
	}
}
