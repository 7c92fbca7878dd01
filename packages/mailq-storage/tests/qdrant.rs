use mailq_storage::{VectorStore, qdrant::QdrantStore};

#[tokio::test]
async fn refused_connection_is_transient() {
	let cfg = mailq_config::Qdrant {
		host: "127.0.0.1".to_string(),
		port: 9,
		timeout_ms: 500,
		..Default::default()
	};
	let store = QdrantStore::new(&cfg).expect("Failed to build client.");
	let err = store.list_collections().await.expect_err("Expected connection failure.");

	assert!(err.is_transient(), "{err}");
}
