use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant, QdrantError,
	qdrant::{
		Condition, Distance, Filter, GetPointsBuilder, PointId, Query, QueryPointsBuilder,
		Value, VectorOutput, VectorsOutput, point_id::PointIdOptions, value::Kind,
		vector_output, vectors_config, vectors_output::VectorsOptions,
	},
};
use serde_json::{Map, Number};

use mailq_domain::{FilterPredicate, MatchOp, RawHit};

use crate::{
	BoxFuture, CollectionInfo, Error, PointRef, Result, ScrollRequest, SearchRequest, VectorStore,
};

// gRPC status codes worth retrying: cancelled, deadline exceeded, resource exhausted, aborted,
// unavailable.
const TRANSIENT_CODES: [i32; 5] = [1, 4, 8, 10, 14];
const INTERNAL_CODE: i32 = 13;
// The client reports a failed connect as `Internal` with this message prefix.
const CONNECT_FAILURE_PREFIX: &str = "Failed to connect";

pub struct QdrantStore {
	pub client: Qdrant,
}
impl QdrantStore {
	pub fn new(cfg: &mailq_config::Qdrant) -> Result<Self> {
		let mut builder = Qdrant::from_url(&cfg.url())
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.skip_compatibility_check();

		if let Some(api_key) = cfg.api_key.clone() {
			builder = builder.api_key(api_key);
		}

		let client = builder.build()?;

		Ok(Self { client })
	}
}
impl VectorStore for QdrantStore {
	fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(async move {
			let response = self.client.list_collections().await?;

			Ok(response.collections.into_iter().map(|collection| collection.name).collect())
		})
	}

	fn collection_info<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<CollectionInfo>> {
		Box::pin(async move {
			let response = self.client.collection_info(collection).await?;
			let Some(info) = response.result else {
				return Err(Error::Terminal {
					message: format!("Collection {collection} returned no info."),
				});
			};
			let params = info
				.config
				.and_then(|config| config.params)
				.and_then(|params| params.vectors_config)
				.and_then(|vectors| vectors.config);
			let (vector_size, distance) = match params {
				Some(vectors_config::Config::Params(params)) => {
					(Some(params.size), distance_name(params.distance))
				},
				Some(vectors_config::Config::ParamsMap(map)) => {
					// Named vectors: report the first name in sorted order.
					let mut names: Vec<&String> = map.map.keys().collect();

					names.sort();

					match names.first().and_then(|name| map.map.get(*name)) {
						Some(params) => (Some(params.size), distance_name(params.distance)),
						None => (None, None),
					}
				},
				None => (None, None),
			};

			Ok(CollectionInfo {
				name: collection.to_string(),
				points_count: info.points_count.unwrap_or(0),
				vector_size,
				distance,
			})
		})
	}

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		request: &'a ScrollRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>> {
		Box::pin(async move {
			// The query API without a query walks points in id order and takes a numeric offset,
			// which keeps limit/offset pages contiguous.
			let mut query = QueryPointsBuilder::new(collection)
				.limit(request.limit)
				.offset(request.offset)
				.with_payload(true)
				.with_vectors(request.with_vectors);

			if let Some(filter) = to_qdrant_filter(&request.predicate) {
				query = query.filter(filter);
			}

			let response = self.client.query(query).await?;

			Ok(response
				.result
				.into_iter()
				.map(|point| to_raw_hit(point.id, point.payload, point.vectors, None))
				.collect())
		})
	}

	fn search<'a>(
		&'a self,
		collection: &'a str,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>> {
		Box::pin(async move {
			let query = QueryPointsBuilder::new(collection)
				.query(Query::new_nearest(request.vector.clone()))
				.limit(request.limit)
				.with_payload(true)
				.with_vectors(false);
			let response = self.client.query(query).await?;

			Ok(response
				.result
				.into_iter()
				.map(|point| to_raw_hit(point.id, point.payload, point.vectors, Some(point.score)))
				.collect())
		})
	}

	fn get_point<'a>(
		&'a self,
		collection: &'a str,
		id: &'a PointRef,
		with_vector: bool,
	) -> BoxFuture<'a, Result<Option<RawHit>>> {
		Box::pin(async move {
			let request = GetPointsBuilder::new(collection, vec![to_point_id(id)])
				.with_payload(true)
				.with_vectors(with_vector);
			let response = self.client.get_points(request).await?;

			Ok(response
				.result
				.into_iter()
				.next()
				.map(|point| to_raw_hit(point.id, point.payload, point.vectors, None)))
		})
	}
}

/// Substring conditions become `MatchText`, which on a field without a full-text index is a
/// case-sensitive substring test. Exact conditions become keyword matches.
pub fn to_qdrant_filter(predicate: &FilterPredicate) -> Option<Filter> {
	if predicate.is_empty() {
		return None;
	}

	let conditions = predicate.conditions().iter().map(|condition| match condition.op {
		MatchOp::Substring => Condition::matches_text(condition.field.as_str(), &condition.value),
		MatchOp::Exact => Condition::matches(condition.field.as_str(), condition.value.clone()),
	});

	Some(Filter::must(conditions))
}

pub fn to_point_id(id: &PointRef) -> PointId {
	match id {
		PointRef::Num(id) => PointId::from(*id),
		PointRef::Uuid(id) => PointId::from(id.hyphenated().to_string()),
	}
}

pub(crate) fn is_transient(err: &QdrantError) -> bool {
	match err {
		QdrantError::ResponseError { status } => {
			let code = status.code() as i32;

			TRANSIENT_CODES.contains(&code)
				|| (code == INTERNAL_CODE && status.message().starts_with(CONNECT_FAILURE_PREFIX))
		},
		QdrantError::ResourceExhaustedError { .. } | QdrantError::Io(_) => true,
		_ => false,
	}
}

fn distance_name(raw: i32) -> Option<String> {
	Distance::try_from(raw).ok().map(|distance| distance.as_str_name().to_string())
}

fn to_raw_hit(
	id: Option<PointId>,
	payload: HashMap<String, Value>,
	vectors: Option<VectorsOutput>,
	score: Option<f32>,
) -> RawHit {
	let point_id = id.as_ref().map(point_id_to_string).unwrap_or_default();

	if point_id.is_empty() {
		tracing::warn!("Point returned without an id.");
	}

	RawHit {
		point_id,
		payload: payload.into_iter().map(|(key, value)| (key, to_json(value))).collect(),
		vector: vectors.and_then(dense_vector),
		score,
	}
}

fn point_id_to_string(id: &PointId) -> String {
	match &id.point_id_options {
		Some(PointIdOptions::Num(id)) => id.to_string(),
		Some(PointIdOptions::Uuid(id)) => id.clone(),
		None => String::new(),
	}
}

fn dense_vector(vectors: VectorsOutput) -> Option<Vec<f32>> {
	match vectors.vectors_options? {
		VectorsOptions::Vector(output) => dense_output(output),
		VectorsOptions::Vectors(named) => {
			let mut named: Vec<(String, VectorOutput)> = named.vectors.into_iter().collect();

			named.sort_by(|a, b| a.0.cmp(&b.0));

			named.into_iter().find_map(|(_, output)| dense_output(output))
		},
	}
}

#[allow(deprecated)]
fn dense_output(output: VectorOutput) -> Option<Vec<f32>> {
	match output.vector {
		Some(vector_output::Vector::Dense(dense)) => Some(dense.data),
		Some(_) => None,
		None if !output.data.is_empty() => Some(output.data),
		None => None,
	}
}

fn to_json(value: Value) -> serde_json::Value {
	match value.kind {
		Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
		Some(Kind::BoolValue(flag)) => serde_json::Value::Bool(flag),
		Some(Kind::IntegerValue(number)) => serde_json::Value::from(number),
		Some(Kind::DoubleValue(number)) => {
			Number::from_f64(number).map(serde_json::Value::Number).unwrap_or_default()
		},
		Some(Kind::StringValue(text)) => serde_json::Value::String(text),
		Some(Kind::ListValue(list)) => {
			serde_json::Value::Array(list.values.into_iter().map(to_json).collect())
		},
		Some(Kind::StructValue(object)) => {
			let fields: Map<String, serde_json::Value> =
				object.fields.into_iter().map(|(key, value)| (key, to_json(value))).collect();

			serde_json::Value::Object(fields)
		},
	}
}
