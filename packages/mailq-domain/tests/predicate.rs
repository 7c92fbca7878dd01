use serde_json::{Map, Value};

use mailq_domain::{Condition, FilterPredicate, KnownField};

fn payload(value: Value) -> Map<String, Value> {
	value.as_object().cloned().expect("Payload fixture must be an object.")
}

fn mailbox() -> Vec<Map<String, Value>> {
	vec![
		payload(serde_json::json!({
			"subject": "Weekly meeting notes",
			"sender": "john@example.com",
			"category": "Updates",
		})),
		payload(serde_json::json!({
			"subject": "meeting moved",
			"sender": "jane@example.com",
			"category": "Primary",
		})),
		payload(serde_json::json!({
			"subject": "Invoice",
			"sender": "billing@example.com",
			"url": "https://mail.google.com/mail/u/0/#inbox/1",
		})),
		payload(serde_json::json!({
			"subject": 42,
			"sender": ["john@example.com", "cc@example.com"],
			"category": "updates",
		})),
	]
}

fn conditions() -> Vec<Condition> {
	vec![
		Condition::substring(KnownField::Subject, "meeting"),
		Condition::substring(KnownField::Sender, "john@"),
		Condition::substring(KnownField::Url, "mail.google.com"),
		Condition::exact(KnownField::Category, "Updates"),
	]
}

#[test]
fn empty_predicate_matches_everything() {
	let predicate = FilterPredicate::all();

	assert!(predicate.is_empty());
	assert!(mailbox().iter().all(|record| predicate.matches(record)));
	assert!(predicate.matches(&Map::new()));
}

#[test]
fn substring_is_case_sensitive() {
	let condition = Condition::substring(KnownField::Subject, "Meeting");
	let matched: Vec<bool> = mailbox().iter().map(|record| condition.matches(record)).collect();

	assert_eq!(matched, vec![false, false, false, false]);
}

#[test]
fn exact_requires_full_equality() {
	let condition = Condition::exact(KnownField::Category, "Updates");
	let matched: Vec<bool> = mailbox().iter().map(|record| condition.matches(record)).collect();

	assert_eq!(matched, vec![true, false, false, false]);
	assert!(!Condition::exact(KnownField::Category, "Update").matches(&mailbox()[0]));
}

#[test]
fn non_string_values_never_match() {
	let record = &mailbox()[3];

	assert!(!Condition::substring(KnownField::Subject, "4").matches(record));
	assert!(Condition::substring(KnownField::Sender, "cc@").matches(record));
	assert!(!Condition::substring(KnownField::ThreadId, "x").matches(record));
}

#[test]
fn conjunction_equals_intersection_of_single_conditions() {
	let records = mailbox();
	let all = conditions();

	for mask in 0_u32..(1 << all.len()) {
		let chosen: Vec<Condition> = all
			.iter()
			.enumerate()
			.filter(|(idx, _)| mask & (1 << idx) != 0)
			.map(|(_, condition)| condition.clone())
			.collect();
		let mut reversed = chosen.clone();

		reversed.reverse();

		let forward = FilterPredicate::new(chosen.clone());
		let backward = FilterPredicate::new(reversed);

		for record in &records {
			let expected = chosen.iter().all(|condition| condition.matches(record));

			assert_eq!(forward.matches(record), expected, "mask {mask:#06b}");
			assert_eq!(backward.matches(record), expected, "mask {mask:#06b}");
		}
	}
}

#[test]
fn chained_and_matches_only_records_meeting_every_condition() {
	let predicate = FilterPredicate::all()
		.and(Condition::substring(KnownField::Subject, "meeting"))
		.and(Condition::substring(KnownField::Sender, "john@example.com"));
	let matched: Vec<usize> = mailbox()
		.iter()
		.enumerate()
		.filter(|(_, record)| predicate.matches(record))
		.map(|(idx, _)| idx)
		.collect();

	assert_eq!(matched, vec![0]);
}
