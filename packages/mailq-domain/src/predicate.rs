use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::KnownField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOp {
	/// Case-sensitive substring test.
	Substring,
	/// Case-sensitive equality.
	Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
	pub field: KnownField,
	pub op: MatchOp,
	pub value: String,
}
impl Condition {
	pub fn substring(field: KnownField, value: impl Into<String>) -> Self {
		Self { field, op: MatchOp::Substring, value: value.into() }
	}

	pub fn exact(field: KnownField, value: impl Into<String>) -> Self {
		Self { field, op: MatchOp::Exact, value: value.into() }
	}

	/// Mirrors the store's keyword and un-indexed text matching: string payload values are
	/// tested directly, arrays match when any string element does, everything else never matches.
	pub fn matches(&self, payload: &Map<String, Value>) -> bool {
		match payload.get(self.field.as_str()) {
			Some(Value::String(actual)) => self.matches_str(actual),
			Some(Value::Array(items)) => items
				.iter()
				.any(|item| item.as_str().map(|actual| self.matches_str(actual)).unwrap_or(false)),
			_ => false,
		}
	}

	fn matches_str(&self, actual: &str) -> bool {
		match self.op {
			MatchOp::Substring => actual.contains(self.value.as_str()),
			MatchOp::Exact => actual == self.value,
		}
	}
}

/// Conjunction of conditions. The empty predicate matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
	conditions: Vec<Condition>,
}
impl FilterPredicate {
	pub fn all() -> Self {
		Self::default()
	}

	pub fn new(conditions: Vec<Condition>) -> Self {
		Self { conditions }
	}

	pub fn and(mut self, condition: Condition) -> Self {
		self.conditions.push(condition);

		self
	}

	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	pub fn matches(&self, payload: &Map<String, Value>) -> bool {
		self.conditions.iter().all(|condition| condition.matches(payload))
	}
}
