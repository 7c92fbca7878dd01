pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Raised before any network call.
	#[error("Invalid configuration: {message}")]
	Config { message: String },
	#[error("Gave up after {attempts} attempts: {message}")]
	RetriesExhausted { attempts: u32, message: String },
	#[error("Store error: {message}")]
	Store { message: String },
	#[error("Embedding error: {message}")]
	Embedding { message: String },
	#[error("Render error: {message}")]
	Render { message: String },
}
impl Error {
	pub fn config(message: impl Into<String>) -> Self {
		Self::Config { message: message.into() }
	}

	pub fn is_config(&self) -> bool {
		matches!(self, Self::Config { .. })
	}
}
impl From<mailq_storage::Error> for Error {
	fn from(err: mailq_storage::Error) -> Self {
		match err {
			mailq_storage::Error::InvalidArgument(message) => Self::Config { message },
			mailq_storage::Error::Transient { message }
			| mailq_storage::Error::Terminal { message } => Self::Store { message },
		}
	}
}
impl From<mailq_providers::Error> for Error {
	fn from(err: mailq_providers::Error) -> Self {
		Self::Embedding { message: err.to_string() }
	}
}
impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Render { message: err.to_string() }
	}
}
