//! End-to-end test over a real TCP socket.

use issue_tracker::apps::issues::{IssueRepository, url_patterns};
use issue_tracker::config::DatabaseSettings;
use issue_tracker::nosql::{self, MEMORY_URL};
use issue_tracker::server::{HttpServer, ShutdownCoordinator};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[rstest]
#[tokio::test]
async fn test_issue_lifecycle_over_http() {
	// Arrange
	let settings = DatabaseSettings {
		url: MEMORY_URL.to_string(),
		..DatabaseSettings::default()
	};
	let backend = nosql::connect(&settings).await.unwrap();
	let router = url_patterns(IssueRepository::new(backend)).unwrap();
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let base = format!("http://{}/api/issues/e2e", listener.local_addr().unwrap());
	let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
	let server = tokio::spawn(HttpServer::new(Arc::new(router)).serve(listener, coordinator.clone()));
	let client = reqwest::Client::new();

	// Act
	let created: Value = client
		.post(&base)
		.json(&json!({
			"issue_title": "Over the wire",
			"issue_text": "Sent with reqwest",
			"created_by": "Joe",
		}))
		.send()
		.await
		.unwrap()
		.json()
		.await
		.unwrap();
	let id = created["_id"].as_str().unwrap().to_string();

	let updated = client
		.put(&base)
		.form(&[("_id", id.as_str()), ("open", "false"), ("status_text", "")])
		.send()
		.await
		.unwrap();
	let updated_status = updated.status();
	let updated: Value = updated.json().await.unwrap();

	let closed: Value = client
		.get(format!("{}?open=false", base))
		.send()
		.await
		.unwrap()
		.json()
		.await
		.unwrap();

	let patch = client.patch(&base).send().await.unwrap();
	let missing = client
		.get(format!("{}/nested", base))
		.send()
		.await
		.unwrap();

	let deleted: Value = client
		.delete(&base)
		.json(&json!({"_id": id}))
		.send()
		.await
		.unwrap()
		.json()
		.await
		.unwrap();

	coordinator.shutdown();
	coordinator.wait_for_shutdown().await;

	// Assert
	assert_eq!(created["project"], "e2e");
	assert_eq!(updated_status, reqwest::StatusCode::OK);
	assert_eq!(updated, json!({"result": "successfully updated", "_id": id}));
	assert_eq!(closed.as_array().unwrap().len(), 1);
	assert_eq!(closed[0]["open"], false);
	assert_eq!(patch.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
	assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
	assert_eq!(deleted, json!({"result": "successfully deleted", "_id": id}));
	assert!(server.await.unwrap().is_ok());
}
