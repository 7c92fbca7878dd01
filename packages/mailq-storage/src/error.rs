#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Transient store failure: {message}")]
	Transient { message: String },
	#[error("Store error: {message}")]
	Terminal { message: String },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
impl Error {
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transient { .. })
	}
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		let message = err.to_string();

		if crate::qdrant::is_transient(&err) {
			Self::Transient { message }
		} else {
			Self::Terminal { message }
		}
	}
}
