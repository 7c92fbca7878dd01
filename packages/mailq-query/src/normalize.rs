use std::{borrow::Cow, collections::HashSet};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use mailq_domain::{KnownField, RawHit};

pub const POINT_ID_COLUMN: &str = "point_id";
pub const SCORE_COLUMN: &str = "score";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
	PointId,
	Known(KnownField),
	Score,
	/// `name` differs from `key` only when the key collides with a synthetic column.
	Extra { key: String, name: String },
}
impl Column {
	pub fn name(&self) -> Cow<'_, str> {
		match self {
			Self::PointId => Cow::Borrowed(POINT_ID_COLUMN),
			Self::Known(field) => Cow::Borrowed(field.as_str()),
			Self::Score => Cow::Borrowed(SCORE_COLUMN),
			Self::Extra { name, .. } => Cow::Borrowed(name.as_str()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
	Missing,
	Text(String),
	/// A value whose shape did not fit the column, rendered as compact JSON.
	Coerced(String),
}
impl Cell {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Missing => None,
			Self::Text(text) | Self::Coerced(text) => Some(text.as_str()),
		}
	}

	pub fn is_coerced(&self) -> bool {
		matches!(self, Self::Coerced(_))
	}
}
impl Serialize for Cell {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self.as_text() {
			Some(text) => serializer.serialize_str(text),
			None => serializer.serialize_none(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
	point_id: String,
	cells: Vec<Cell>,
}
impl NormalizedRow {
	pub fn point_id(&self) -> &str {
		&self.point_id
	}

	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	pub fn to_json_map(&self, columns: &[Column]) -> Map<String, Value> {
		columns
			.iter()
			.zip(&self.cells)
			.map(|(column, cell)| {
				let value = cell.as_text().map(|text| Value::String(text.to_string()));

				(column.name().into_owned(), value.unwrap_or(Value::Null))
			})
			.collect()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
	pub point_id: String,
	pub column: String,
	pub value: String,
}

/// Rows sharing one column set; every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBatch {
	columns: Vec<Column>,
	rows: Vec<NormalizedRow>,
}
impl NormalizedBatch {
	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	pub fn column_names(&self) -> Vec<Cow<'_, str>> {
		self.columns.iter().map(Column::name).collect()
	}

	pub fn rows(&self) -> &[NormalizedRow] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn anomalies(&self) -> Vec<Anomaly> {
		let mut out = Vec::new();

		for row in &self.rows {
			for (column, cell) in self.columns.iter().zip(&row.cells) {
				if let Cell::Coerced(value) = cell {
					out.push(Anomaly {
						point_id: row.point_id.clone(),
						column: column.name().into_owned(),
						value: value.clone(),
					});
				}
			}
		}

		out
	}
}

/// Column order: `point_id`, the known fields, `score` when any hit has one, then extra payload
/// keys in first-seen order (keys within one payload are visited in sorted order). Column names
/// are unique within a batch.
pub fn normalize_batch(hits: Vec<RawHit>) -> NormalizedBatch {
	let has_score = hits.iter().any(|hit| hit.score.is_some());
	let mut extras: Vec<String> = Vec::new();
	let mut seen = HashSet::new();

	for hit in &hits {
		let mut keys: Vec<&String> =
			hit.payload.keys().filter(|key| KnownField::from_key(key).is_none()).collect();

		keys.sort();

		for key in keys {
			if seen.insert(key.as_str()) {
				extras.push(key.clone());
			}
		}
	}

	let mut columns = Vec::with_capacity(1 + KnownField::ALL.len() + 1 + extras.len());

	columns.push(Column::PointId);
	columns.extend(KnownField::ALL.into_iter().map(Column::Known));

	if has_score {
		columns.push(Column::Score);
	}

	columns.extend(extra_columns(extras));

	let rows = hits.iter().map(|hit| normalize_hit(hit, &columns)).collect();

	NormalizedBatch { columns, rows }
}

fn normalize_hit(hit: &RawHit, columns: &[Column]) -> NormalizedRow {
	let cells = columns
		.iter()
		.map(|column| match column {
			Column::PointId if hit.point_id.is_empty() => Cell::Missing,
			Column::PointId => Cell::Text(hit.point_id.clone()),
			Column::Known(field) => known_cell(hit.payload.get(field.as_str())),
			Column::Score => match hit.score {
				Some(score) => Cell::Text(format!("{score:.4}")),
				None => Cell::Missing,
			},
			Column::Extra { key, .. } => extra_cell(hit.payload.get(key)),
		})
		.collect();

	NormalizedRow { point_id: hit.point_id.clone(), cells }
}

/// Keys named like a synthetic column become `payload.<key>`, with a `_<n>` suffix while that
/// name is still taken by another key.
fn extra_columns(keys: Vec<String>) -> Vec<Column> {
	let mut taken: HashSet<String> = keys.iter().cloned().collect();

	taken.insert(POINT_ID_COLUMN.to_string());
	taken.insert(SCORE_COLUMN.to_string());

	keys.into_iter()
		.map(|key| {
			if key != POINT_ID_COLUMN && key != SCORE_COLUMN {
				return Column::Extra { name: key.clone(), key };
			}

			let base = format!("payload.{key}");
			let mut name = base.clone();
			let mut suffix = 2;

			while taken.contains(&name) {
				name = format!("{base}_{suffix}");
				suffix += 1;
			}

			taken.insert(name.clone());

			Column::Extra { key, name }
		})
		.collect()
}

fn known_cell(value: Option<&Value>) -> Cell {
	match value {
		None | Some(Value::Null) => Cell::Missing,
		Some(Value::String(text)) => Cell::Text(text.clone()),
		Some(other) => Cell::Coerced(other.to_string()),
	}
}

fn extra_cell(value: Option<&Value>) -> Cell {
	match value {
		None | Some(Value::Null) => Cell::Missing,
		Some(Value::String(text)) => Cell::Text(text.clone()),
		Some(Value::Number(number)) => Cell::Text(number.to_string()),
		Some(Value::Bool(flag)) => Cell::Text(flag.to_string()),
		Some(other) => Cell::Coerced(other.to_string()),
	}
}
