use clap::Parser;
use serde_json::{Map, Value};

use mailq::{Args, plan::Plan};
use mailq_query::OutputFormat;
use mailq_storage::PointRef;
use mailq_testkit::{HashEmbedder, InMemoryStore, mail_payload};

const DIM: usize = 64;

fn parse(argv: &[&str]) -> Args {
	Args::try_parse_from(argv).expect("Arguments should parse.")
}

fn seeded_store() -> InMemoryStore {
	let store = InMemoryStore::new().with_collection("mail", DIM);

	for (id, (subject, sender)) in
		[("Weekly meeting", "john@example.com"), ("Invoice", "billing@example.com")]
			.into_iter()
			.enumerate()
	{
		let vector = HashEmbedder::vector(subject, DIM);

		store.upsert("mail", id as u64 + 1, vector, mail_payload(subject, sender, "Body"));
	}

	store
}

async fn run_against(store: &InMemoryStore, argv: &[&str]) -> String {
	let (mut config, plan) = mailq::prepare(parse(argv)).expect("Prepare should succeed.");
	let mut out = Vec::new();

	config.providers.embedding.dimensions = DIM as u32;

	mailq::plan::execute(plan, &config, store, &HashEmbedder::new(), &mut out)
		.await
		.expect("Command should succeed.");

	String::from_utf8(out).expect("Output should be UTF-8.")
}

#[test]
fn unknown_output_format_is_rejected_while_parsing() {
	let err = Args::try_parse_from(["mailq", "query-all", "--output-format", "xml"])
		.expect_err("Xml is not a format.");

	assert!(err.to_string().contains("xml"));
}

#[test]
fn malformed_point_id_is_rejected_while_parsing() {
	assert!(Args::try_parse_from(["mailq", "get-point", "not-an-id"]).is_err());
}

#[test]
fn no_subcommand_shows_collection_info_with_hint() {
	let (_, plan) = mailq::prepare(parse(&["mailq"])).expect("Prepare should succeed.");

	assert_eq!(plan, Plan::CollectionInfo { hint: true });
}

#[test]
fn overrides_replace_defaults() {
	let (config, plan) = mailq::prepare(parse(&[
		"mailq",
		"--host",
		"qdrant.internal",
		"--port",
		"7000",
		"get-point",
		"42",
		"--output-format",
		"csv",
	]))
	.expect("Prepare should succeed.");

	assert_eq!(config.storage.qdrant.url(), "http://qdrant.internal:7000");
	assert_eq!(
		plan,
		Plan::GetPoint { id: PointRef::Num(42), with_vector: false, format: OutputFormat::Csv }
	);
}

#[tokio::test]
async fn bad_filters_fail_before_the_store_is_used() {
	let store = seeded_store();

	for argv in [
		["mailq", "query-all", "--filter", "bogus=1"],
		["mailq", "query-all", "--filter", "subject"],
		["mailq", "query-all", "--filter-subject", ""],
		["mailq", "query-all", "--limit", "0"],
	] {
		let err = mailq::prepare(parse(&argv)).expect_err("Filters should be rejected.");
		let err = err.downcast_ref::<mailq_query::Error>().expect("Query error.");

		assert!(err.is_config(), "{err}");
	}

	assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn query_all_renders_filtered_json() {
	let store = seeded_store();
	let out = run_against(
		&store,
		&[
			"mailq",
			"--collection",
			"mail",
			"query-all",
			"--filter-sender",
			"john",
			"--output-format",
			"json",
		],
	)
	.await;
	let rows: Vec<Map<String, Value>> = serde_json::from_str(&out).expect("Valid json.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0]["point_id"], "1");
	assert_eq!(rows[0]["subject"], "Weekly meeting");
	assert_eq!(rows[0]["url"], Value::Null);
}

#[tokio::test]
async fn search_similar_puts_the_closest_mail_first() {
	let store = seeded_store();
	let out = run_against(
		&store,
		&["mailq", "--collection", "mail", "search-similar", "Invoice", "--output-format", "csv"],
	)
	.await;
	let mut lines = out.lines();
	let header = lines.next().expect("Header line.");

	assert!(header.ends_with(",score"));
	assert!(lines.next().expect("First row.").starts_with("2,"));
}

#[tokio::test]
async fn list_and_info_describe_the_collection() {
	let store = seeded_store();
	let listed = run_against(&store, &["mailq", "list-collections"]).await;
	let info = run_against(&store, &["mailq", "--collection", "mail", "collection-info"]).await;

	assert_eq!(listed, "Available collections:\n  - mail\n");
	assert!(info.contains("Points count: 2"));
	assert!(info.contains("Vector size: 64"));
	assert!(info.contains("Distance: Cosine"));
}

#[tokio::test]
async fn get_point_can_include_the_vector() {
	let store = seeded_store();
	let out = run_against(
		&store,
		&[
			"mailq",
			"--collection",
			"mail",
			"get-point",
			"2",
			"--with-vector",
			"--output-format",
			"json",
		],
	)
	.await;
	let rows: Vec<Map<String, Value>> = serde_json::from_str(&out).expect("Valid json.");
	let vector: Vec<f32> =
		serde_json::from_str(rows[0]["vector"].as_str().expect("Vector text.")).expect("Vector.");

	assert_eq!(rows[0]["sender"], "billing@example.com");
	assert_eq!(vector.len(), DIM);
}
