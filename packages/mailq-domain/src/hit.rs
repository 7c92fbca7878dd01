use serde_json::{Map, Value};

/// A point as returned by the store, before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawHit {
	/// Decimal for numeric point ids, hyphenated for UUIDs.
	pub point_id: String,
	pub payload: Map<String, Value>,
	pub vector: Option<Vec<f32>>,
	/// Only set by similarity search.
	pub score: Option<f32>,
}
impl RawHit {
	pub fn new(point_id: impl Into<String>, payload: Map<String, Value>) -> Self {
		Self { point_id: point_id.into(), payload, vector: None, score: None }
	}

	pub fn with_score(mut self, score: f32) -> Self {
		self.score = Some(score);

		self
	}

	pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
		self.vector = Some(vector);

		self
	}
}
