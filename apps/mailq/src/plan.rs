use std::io::Write;

use serde_json::Value;

use mailq_config::Config;
use mailq_domain::RawHit;
use mailq_query::{
	EmbeddingProvider, FilterBuilder, FilterOptions, NormalizedBatch, OutputFormat, QueryExecutor,
	QuerySpec, RenderOptions, normalize_batch, parse_filter_arg, render,
};
use mailq_storage::{PointRef, VectorStore};

use crate::Command;

/// Payload key the vector is exposed under when `get-point --with-vector` is given.
pub const VECTOR_KEY: &str = "vector";

/// A fully validated command, ready to run against a store.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
	ListCollections,
	/// `hint` is set when no subcommand was given.
	CollectionInfo { hint: bool },
	Query { spec: QuerySpec, offset: u64, format: OutputFormat },
	GetPoint { id: PointRef, with_vector: bool, format: OutputFormat },
}
impl Plan {
	pub fn resolve(command: Option<Command>) -> mailq_query::Result<Self> {
		let Some(command) = command else {
			return Ok(Self::CollectionInfo { hint: true });
		};

		match command {
			Command::ListCollections => Ok(Self::ListCollections),
			Command::CollectionInfo => Ok(Self::CollectionInfo { hint: false }),
			Command::QueryAll(args) => {
				let mut builder = FilterBuilder::new().options(FilterOptions {
					subject: args.filter_subject,
					sender: args.filter_sender,
					url: args.filter_url,
					category: args.filter_category,
				})?;

				for raw in &args.filters {
					let (name, value) = parse_filter_arg(raw)?;

					builder = builder.option(&name, value)?;
				}

				let spec = QuerySpec::enumerate(builder.build(), args.limit, args.offset)?;

				Ok(Self::Query { spec, offset: args.offset, format: args.output_format })
			},
			Command::SearchSimilar(args) => {
				let spec = QuerySpec::similarity(args.query, args.limit)?;

				Ok(Self::Query { spec, offset: 0, format: args.output_format })
			},
			Command::GetPoint(args) => Ok(Self::GetPoint {
				id: args.id,
				with_vector: args.with_vector,
				format: args.output_format,
			}),
		}
	}
}

pub async fn execute(
	plan: Plan,
	config: &Config,
	store: &dyn VectorStore,
	embedder: &dyn EmbeddingProvider,
	out: &mut dyn Write,
) -> color_eyre::Result<()> {
	let qdrant = &config.storage.qdrant;
	let executor = QueryExecutor::new(
		store,
		embedder,
		&config.providers.embedding,
		&qdrant.collection,
		qdrant.retry.into(),
	);
	let render_opts = RenderOptions::from(&config.output);

	match plan {
		Plan::ListCollections => {
			let names = executor.list_collections().await?;

			writeln!(out, "Available collections:")?;

			for name in names {
				writeln!(out, "  - {name}")?;
			}
		},
		Plan::CollectionInfo { hint } => {
			let info = executor.collection_info().await?;
			let vector_size =
				info.vector_size.map(|size| size.to_string()).unwrap_or_else(|| "-".to_string());

			writeln!(out, "Collection: {}", info.name)?;
			writeln!(out, "  Points count: {}", info.points_count)?;
			writeln!(out, "  Vector size: {vector_size}")?;
			writeln!(out, "  Distance: {}", info.distance.as_deref().unwrap_or("-"))?;

			if hint {
				tracing::info!("Use --help for more options.");
			}
		},
		Plan::Query { spec, offset, format } => {
			let limit = spec.limit();
			let outcome = executor.execute(spec).await?;
			let batch = normalize_batch(outcome.hits);

			report_anomalies(&batch);

			tracing::info!(found = batch.len(), limit, offset, "Query finished.");

			if outcome.has_more {
				tracing::info!(
					next_offset = offset + u64::from(limit),
					"More results are available."
				);
			}

			out.write_all(render(&batch, format, &render_opts)?.as_bytes())?;
		},
		Plan::GetPoint { id, with_vector, format } => {
			let Some(hit) = executor.get_point(&id, with_vector).await? else {
				return Err(color_eyre::eyre::eyre!(
					"Point {id} was not found in collection {}.",
					qdrant.collection
				));
			};
			let batch = normalize_batch(vec![expose_vector(hit)]);

			report_anomalies(&batch);

			out.write_all(render(&batch, format, &render_opts)?.as_bytes())?;
		},
	}

	Ok(())
}

/// Moves the vector into the payload as compact JSON text so every renderer can show it. A payload
/// key of the same name wins.
fn expose_vector(mut hit: RawHit) -> RawHit {
	if let Some(vector) = hit.vector.take()
		&& !hit.payload.contains_key(VECTOR_KEY)
	{
		let text = Value::from(vector).to_string();

		hit.payload.insert(VECTOR_KEY.to_string(), Value::String(text));
	}

	hit
}

fn report_anomalies(batch: &NormalizedBatch) {
	let anomalies = batch.anomalies();

	for anomaly in &anomalies {
		tracing::warn!(
			point_id = %anomaly.point_id,
			column = %anomaly.column,
			"Payload value has an unexpected type and was rendered as JSON."
		);
	}

	if !anomalies.is_empty() {
		tracing::warn!(count = anomalies.len(), "Some payload values were coerced to JSON text.");
	}
}
