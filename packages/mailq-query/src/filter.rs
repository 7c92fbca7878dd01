use mailq_domain::{Condition, FilterPredicate, KnownField, MatchOp};

use crate::{Error, Result};

/// Recognized filter options, their payload field, and how they match.
pub const FILTER_OPTIONS: [(&str, KnownField, MatchOp); 4] = [
	("subject", KnownField::Subject, MatchOp::Substring),
	("sender", KnownField::Sender, MatchOp::Substring),
	("url", KnownField::Url, MatchOp::Substring),
	("category", KnownField::Category, MatchOp::Exact),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
	pub subject: Option<String>,
	pub sender: Option<String>,
	pub url: Option<String>,
	pub category: Option<String>,
}

/// Collects filter options into a conjunctive predicate, rejecting bad input as it arrives.
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
	conditions: Vec<Condition>,
}
impl FilterBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn option(mut self, name: &str, value: impl Into<String>) -> Result<Self> {
		let Some((_, field, op)) = FILTER_OPTIONS.iter().find(|(option, _, _)| *option == name)
		else {
			let known: Vec<&str> = FILTER_OPTIONS.iter().map(|(option, _, _)| *option).collect();

			return Err(Error::config(format!(
				"Unknown filter option '{name}'. Expected one of: {}.",
				known.join(", ")
			)));
		};
		let value = value.into();

		if value.trim().is_empty() {
			return Err(Error::config(format!("Filter option '{name}' must be non-empty.")));
		}
		if self.conditions.iter().any(|condition| condition.field == *field) {
			return Err(Error::config(format!("Filter option '{name}' was given more than once.")));
		}

		self.conditions.push(Condition { field: *field, op: *op, value });

		Ok(self)
	}

	pub fn options(self, options: FilterOptions) -> Result<Self> {
		let FilterOptions { subject, sender, url, category } = options;
		let mut builder = self;

		for (name, value) in
			[("subject", subject), ("sender", sender), ("url", url), ("category", category)]
		{
			if let Some(value) = value {
				builder = builder.option(name, value)?;
			}
		}

		Ok(builder)
	}

	pub fn build(self) -> FilterPredicate {
		FilterPredicate::new(self.conditions)
	}
}

/// Splits a `NAME=VALUE` argument. The value is kept verbatim and may itself contain `=`.
pub fn parse_filter_arg(raw: &str) -> Result<(String, String)> {
	let Some((name, value)) = raw.split_once('=') else {
		return Err(Error::config(format!("Filter '{raw}' must look like NAME=VALUE.")));
	};
	let name = name.trim();

	if name.is_empty() {
		return Err(Error::config(format!("Filter '{raw}' is missing an option name.")));
	}

	Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn typed_options_follow_declaration_order() {
		let predicate = FilterBuilder::new()
			.options(FilterOptions {
				category: Some("Updates".to_string()),
				subject: Some("meeting".to_string()),
				..Default::default()
			})
			.expect("Valid options.")
			.build();

		assert_eq!(
			predicate.conditions(),
			&[
				Condition::substring(KnownField::Subject, "meeting"),
				Condition::exact(KnownField::Category, "Updates"),
			]
		);
	}

	#[test]
	fn splits_on_first_equals_sign() {
		assert_eq!(
			parse_filter_arg("url=https://x.test/?a=b").expect("Valid filter."),
			("url".to_string(), "https://x.test/?a=b".to_string())
		);
		assert!(parse_filter_arg("subject").expect_err("Missing value.").is_config());
		assert!(parse_filter_arg("=meeting").expect_err("Missing name.").is_config());
	}
}
