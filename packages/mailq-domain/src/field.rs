use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Payload keys the ingestion pipeline writes for every mail chunk.
///
/// `Id` is the mail message id stored in the payload, not the point id; chunks of one message
/// share it. `Url` and `Category` are reserved and usually absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownField {
	Id,
	ThreadId,
	Subject,
	Sender,
	To,
	Date,
	Text,
	Url,
	Category,
}
impl KnownField {
	pub const ALL: [Self; 9] = [
		Self::Id,
		Self::ThreadId,
		Self::Subject,
		Self::Sender,
		Self::To,
		Self::Date,
		Self::Text,
		Self::Url,
		Self::Category,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Id => "id",
			Self::ThreadId => "thread_id",
			Self::Subject => "subject",
			Self::Sender => "sender",
			Self::To => "to",
			Self::Date => "date",
			Self::Text => "text",
			Self::Url => "url",
			Self::Category => "category",
		}
	}

	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|field| field.as_str() == key)
	}
}
impl fmt::Display for KnownField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for KnownField {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_key(s).ok_or_else(|| format!("unknown field '{s}'"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_round_trip_through_from_key() {
		for field in KnownField::ALL {
			assert_eq!(KnownField::from_key(field.as_str()), Some(field));
		}

		assert_eq!(KnownField::from_key("Subject"), None);
		assert_eq!(KnownField::from_key("labels"), None);
	}
}
