pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Connection failures, timeouts, throttling and server-side errors may succeed on retry.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Reqwest(err) => {
				if err.is_connect() || err.is_timeout() {
					return true;
				}

				err.status()
					.map(|status| status.is_server_error() || status.as_u16() == 429)
					.unwrap_or(false)
			},
			_ => false,
		}
	}
}
