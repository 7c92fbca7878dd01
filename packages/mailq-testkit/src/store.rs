use std::sync::{
	Mutex,
	atomic::{AtomicU32, AtomicUsize, Ordering},
};

use serde_json::{Map, Value};

use mailq_domain::RawHit;
use mailq_storage::{
	BoxFuture, CollectionInfo, Error, PointRef, Result, ScrollRequest, SearchRequest, VectorStore,
};

struct MemoryPoint {
	id: u64,
	vector: Vec<f32>,
	payload: Map<String, Value>,
}

struct MemoryCollection {
	name: String,
	dimensions: usize,
	/// Kept sorted by id, the order the real store scrolls in.
	points: Vec<MemoryPoint>,
}

/// Cosine-distance store held in memory. Every trait call is counted.
#[derive(Default)]
pub struct InMemoryStore {
	collections: Mutex<Vec<MemoryCollection>>,
	calls: AtomicUsize,
}
impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_collection(self, name: &str, dimensions: usize) -> Self {
		self.create_collection(name, dimensions);

		self
	}

	pub fn create_collection(&self, name: &str, dimensions: usize) {
		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		if collections.iter().any(|collection| collection.name == name) {
			return;
		}

		collections.push(MemoryCollection {
			name: name.to_string(),
			dimensions,
			points: Vec::new(),
		});
	}

	/// Inserts or replaces a point. Panics when the collection is missing or the vector has the
	/// wrong length.
	pub fn upsert(&self, collection: &str, id: u64, vector: Vec<f32>, payload: Map<String, Value>) {
		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
		let Some(target) = collections.iter_mut().find(|c| c.name == collection) else {
			panic!("Collection {collection} was not created.");
		};

		assert_eq!(vector.len(), target.dimensions, "Vector length must match the collection.");

		let point = MemoryPoint { id, vector, payload };

		match target.points.binary_search_by_key(&id, |point| point.id) {
			Ok(idx) => target.points[idx] = point,
			Err(idx) => target.points.insert(idx, point),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn with_collection_ref<T>(
		&self,
		collection: &str,
		f: impl FnOnce(&MemoryCollection) -> Result<T>,
	) -> Result<T> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
		let Some(found) = collections.iter().find(|c| c.name == collection) else {
			return Err(Error::Terminal {
				message: format!("Not found: Collection `{collection}` doesn't exist!"),
			});
		};

		f(found)
	}
}
impl VectorStore for InMemoryStore {
	fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
		let names = collections.iter().map(|collection| collection.name.clone()).collect();

		Box::pin(async move { Ok(names) })
	}

	fn collection_info<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<CollectionInfo>> {
		let result = self.with_collection_ref(collection, |found| {
			Ok(CollectionInfo {
				name: found.name.clone(),
				points_count: found.points.len() as u64,
				vector_size: Some(found.dimensions as u64),
				distance: Some("Cosine".to_string()),
			})
		});

		Box::pin(async move { result })
	}

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		request: &'a ScrollRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>> {
		let result = self.with_collection_ref(collection, |found| {
			let hits = found
				.points
				.iter()
				.filter(|point| request.predicate.matches(&point.payload))
				.skip(request.offset as usize)
				.take(request.limit as usize)
				.map(|point| to_hit(point, request.with_vectors))
				.collect();

			Ok(hits)
		});

		Box::pin(async move { result })
	}

	fn search<'a>(
		&'a self,
		collection: &'a str,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>> {
		let result = self.with_collection_ref(collection, |found| {
			if request.vector.len() != found.dimensions {
				return Err(Error::Terminal {
					message: format!(
						"Wrong input: Vector dimension error: expected dim: {}, got {}",
						found.dimensions,
						request.vector.len()
					),
				});
			}

			let mut scored: Vec<(f32, &MemoryPoint)> = found
				.points
				.iter()
				.map(|point| (cosine(&request.vector, &point.vector), point))
				.collect();

			// Stable, so equal scores keep id order.
			scored.sort_by(|a, b| b.0.total_cmp(&a.0));

			let hits = scored
				.into_iter()
				.take(request.limit as usize)
				.map(|(score, point)| to_hit(point, false).with_score(score))
				.collect();

			Ok(hits)
		});

		Box::pin(async move { result })
	}

	fn get_point<'a>(
		&'a self,
		collection: &'a str,
		id: &'a PointRef,
		with_vector: bool,
	) -> BoxFuture<'a, Result<Option<RawHit>>> {
		let result = self.with_collection_ref(collection, |found| {
			let PointRef::Num(id) = id else {
				return Ok(None);
			};

			Ok(found.points.iter().find(|point| point.id == *id).map(|p| to_hit(p, with_vector)))
		});

		Box::pin(async move { result })
	}
}

/// Fails the first `failures` calls with a transient error, then delegates to `inner`.
pub struct FlakyStore<S> {
	inner: S,
	failures_left: AtomicU32,
	attempts: AtomicUsize,
}
impl<S> FlakyStore<S>
where
	S: VectorStore,
{
	pub fn new(inner: S, failures: u32) -> Self {
		Self { inner, failures_left: AtomicU32::new(failures), attempts: AtomicUsize::new(0) }
	}

	pub fn inner(&self) -> &S {
		&self.inner
	}

	/// Calls seen by this wrapper, failed ones included.
	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	fn fail(&self) -> Option<Error> {
		self.attempts.fetch_add(1, Ordering::SeqCst);

		self.failures_left
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
			.ok()
			.map(|_| Error::Transient { message: "Connection refused.".to_string() })
	}
}
impl<S> VectorStore for FlakyStore<S>
where
	S: VectorStore,
{
	fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		match self.fail() {
			Some(err) => Box::pin(async move { Err(err) }),
			None => self.inner.list_collections(),
		}
	}

	fn collection_info<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<CollectionInfo>> {
		match self.fail() {
			Some(err) => Box::pin(async move { Err(err) }),
			None => self.inner.collection_info(collection),
		}
	}

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		request: &'a ScrollRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>> {
		match self.fail() {
			Some(err) => Box::pin(async move { Err(err) }),
			None => self.inner.scroll(collection, request),
		}
	}

	fn search<'a>(
		&'a self,
		collection: &'a str,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<Vec<RawHit>>> {
		match self.fail() {
			Some(err) => Box::pin(async move { Err(err) }),
			None => self.inner.search(collection, request),
		}
	}

	fn get_point<'a>(
		&'a self,
		collection: &'a str,
		id: &'a PointRef,
		with_vector: bool,
	) -> BoxFuture<'a, Result<Option<RawHit>>> {
		match self.fail() {
			Some(err) => Box::pin(async move { Err(err) }),
			None => self.inner.get_point(collection, id, with_vector),
		}
	}
}

fn to_hit(point: &MemoryPoint, with_vector: bool) -> RawHit {
	let hit = RawHit::new(point.id.to_string(), point.payload.clone());

	if with_vector { hit.with_vector(point.vector.clone()) } else { hit }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a * norm_b)
}
