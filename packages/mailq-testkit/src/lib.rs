//! Test doubles for the read path: an in-memory vector store, a transport that fails a set
//! number of times before recovering, and a deterministic embedder.

mod embedder;
mod store;

pub use embedder::HashEmbedder;
pub use store::{FlakyStore, InMemoryStore};

use serde_json::{Map, Value};

/// Builds the payload the ingestion pipeline writes for one mail chunk.
pub fn mail_payload(subject: &str, sender: &str, text: &str) -> Map<String, Value> {
	let mut payload = Map::new();

	payload.insert("id".to_string(), Value::String(format!("msg-{}", short_hash(subject))));
	payload.insert("thread_id".to_string(), Value::String(format!("thr-{}", short_hash(sender))));
	payload.insert("subject".to_string(), Value::String(subject.to_string()));
	payload.insert("sender".to_string(), Value::String(sender.to_string()));
	payload.insert("to".to_string(), Value::String("me@example.com".to_string()));
	payload.insert("date".to_string(), Value::String("Mon, 6 Oct 2025 09:00:00 +0000".to_string()));
	payload.insert(
		"text".to_string(),
		Value::String(format!("Subject: {subject}\nFrom: {sender}\n\n{text}")),
	);

	payload
}

fn short_hash(raw: &str) -> String {
	blake3::hash(raw.as_bytes()).to_hex()[..8].to_string()
}
