use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
	Error, Result,
	normalize::{Cell, Column, NormalizedBatch, NormalizedRow},
};

pub const MISSING_MARKER: &str = "-";
pub const COERCED_MARKER: &str = "!";
pub const ELLIPSIS: &str = "...";
pub const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
	#[default]
	Table,
	Json,
	Csv,
}
impl OutputFormat {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Table => "table",
			Self::Json => "json",
			Self::Csv => "csv",
		}
	}
}
impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for OutputFormat {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"table" => Ok(Self::Table),
			"json" => Ok(Self::Json),
			"csv" => Ok(Self::Csv),
			other => Err(Error::config(format!(
				"Unsupported output format '{other}'. Expected one of: table, json, csv."
			))),
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
	pub max_cell_width: usize,
}
impl Default for RenderOptions {
	fn default() -> Self {
		Self { max_cell_width: 40 }
	}
}
impl From<&mailq_config::Output> for RenderOptions {
	fn from(cfg: &mailq_config::Output) -> Self {
		Self { max_cell_width: cfg.max_cell_width }
	}
}

pub fn render(
	batch: &NormalizedBatch,
	format: OutputFormat,
	opts: &RenderOptions,
) -> Result<String> {
	match format {
		OutputFormat::Table => render_table(batch, opts),
		OutputFormat::Json => render_json(batch),
		OutputFormat::Csv => Ok(render_csv(batch)),
	}
}

/// Fixed-width text table. Cells are flattened to one line, cut to `max_cell_width` graphemes
/// (the last three replaced by `...`), missing cells print as `-` and coerced cells gain a `!`
/// prefix.
pub fn render_table(batch: &NormalizedBatch, opts: &RenderOptions) -> Result<String> {
	if opts.max_cell_width < mailq_config::MIN_CELL_WIDTH {
		return Err(Error::config(format!(
			"Table cell width must be at least {}.",
			mailq_config::MIN_CELL_WIDTH
		)));
	}

	let header: Vec<String> =
		batch.columns().iter().map(|column| table_cell(&column.name(), opts)).collect();
	let body: Vec<Vec<String>> = batch
		.rows()
		.iter()
		.map(|row| {
			row.cells()
				.iter()
				.map(|cell| match cell {
					Cell::Missing => MISSING_MARKER.to_string(),
					Cell::Text(text) => table_cell(text, opts),
					Cell::Coerced(text) => table_cell(&format!("{COERCED_MARKER}{text}"), opts),
				})
				.collect()
		})
		.collect();
	let mut widths: Vec<usize> = header.iter().map(|cell| grapheme_len(cell)).collect();

	for row in &body {
		for (width, cell) in widths.iter_mut().zip(row) {
			*width = (*width).max(grapheme_len(cell));
		}
	}

	let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
	let mut out = String::new();

	push_table_line(&mut out, &header, &widths);
	push_table_line(&mut out, &rule, &widths);

	for row in &body {
		push_table_line(&mut out, row, &widths);
	}

	Ok(out)
}

/// Pretty JSON array of objects keyed by column name, in column order. Missing cells are `null`.
pub fn render_json(batch: &NormalizedBatch) -> Result<String> {
	let mut out = serde_json::to_string_pretty(&JsonRows(batch))?;

	out.push('\n');

	Ok(out)
}

/// RFC 4180 style CSV with `\n` line endings. Missing cells are empty fields.
pub fn render_csv(batch: &NormalizedBatch) -> String {
	let mut out = String::new();
	let header: Vec<String> = batch.column_names().iter().map(|name| csv_field(name)).collect();

	out.push_str(&header.join(","));
	out.push('\n');

	for row in batch.rows() {
		let fields: Vec<String> =
			row.cells().iter().map(|cell| csv_field(cell.as_text().unwrap_or_default())).collect();

		out.push_str(&fields.join(","));
		out.push('\n');
	}

	out
}

pub fn csv_field(value: &str) -> String {
	let needs_quotes = value.contains([',', '"', '\r', '\n'])
		|| value.starts_with(' ')
		|| value.ends_with(' ');

	if needs_quotes {
		format!("\"{}\"", value.replace('"', "\"\""))
	} else {
		value.to_string()
	}
}

fn table_cell(raw: &str, opts: &RenderOptions) -> String {
	let flat: String =
		raw.chars().map(|ch| if matches!(ch, '\r' | '\n' | '\t') { ' ' } else { ch }).collect();

	if grapheme_len(&flat) <= opts.max_cell_width {
		return flat;
	}

	let keep = opts.max_cell_width - ELLIPSIS.len();
	let mut cut: String = flat.graphemes(true).take(keep).collect();

	cut.push_str(ELLIPSIS);

	cut
}

fn grapheme_len(text: &str) -> usize {
	text.graphemes(true).count()
}

fn push_table_line(out: &mut String, cells: &[String], widths: &[usize]) {
	let mut line = String::new();

	for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
		if idx > 0 {
			line.push_str(COLUMN_GAP);
		}

		line.push_str(cell);
		line.push_str(&" ".repeat(width.saturating_sub(grapheme_len(cell))));
	}

	out.push_str(line.trim_end());
	out.push('\n');
}

struct JsonRows<'a>(&'a NormalizedBatch);
impl Serialize for JsonRows<'_> {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let columns = self.0.columns();

		serializer.collect_seq(self.0.rows().iter().map(|row| JsonRow { columns, row }))
	}
}

struct JsonRow<'a> {
	columns: &'a [Column],
	row: &'a NormalizedRow,
}
impl Serialize for JsonRow<'_> {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_map(self.columns.iter().map(Column::name).zip(self.row.cells()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn csv_quotes_only_when_needed() {
		assert_eq!(csv_field("plain"), "plain");
		assert_eq!(csv_field("a,b"), "\"a,b\"");
		assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
		assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
		assert_eq!(csv_field(" padded"), "\" padded\"");
		assert_eq!(csv_field(""), "");
	}

	#[test]
	fn table_cells_are_flattened_and_cut() {
		let opts = RenderOptions { max_cell_width: 8 };

		assert_eq!(table_cell("a\tb\nc", &opts), "a b c");
		assert_eq!(table_cell("12345678", &opts), "12345678");
		assert_eq!(table_cell("123456789", &opts), "12345...");
		assert_eq!(table_cell("ééééééééé", &opts), "ééééé...");
	}

	#[test]
	fn unknown_format_is_config_error() {
		for raw in ["xml", "JSON", ""] {
			assert!(raw.parse::<OutputFormat>().expect_err("Expected config error.").is_config());
		}
	}
}
