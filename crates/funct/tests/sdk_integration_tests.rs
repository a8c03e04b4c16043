// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end SDK tests against a mock collection endpoint.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use funct::{
	Entity, EventTarget, Functionary, IdentifyOptions, MemorySurface, Model, Properties,
	StateEvent, SurfaceDelegate,
};

async fn mock_collector() -> MockServer {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/identify"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/state"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;
	server
}

fn client_for(server: &MockServer) -> Functionary {
	Functionary::builder()
		.api_key("fn_test")
		.base_url(server.uri())
		.fire_on_instantiation(false)
		.build()
}

async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<wiremock::Request> {
	server
		.received_requests()
		.await
		.unwrap_or_default()
		.into_iter()
		.filter(|r| r.url.path() == endpoint)
		.collect()
}

#[tokio::test]
async fn identifies_go_one_per_request_states_in_bulk() {
	let server = mock_collector().await;
	let client = client_for(&server);

	client
		.identify(Entity::customer(vec!["a"]), IdentifyOptions::new())
		.await;
	client
		.identify(Entity::customer(vec!["b"]), IdentifyOptions::new())
		.await;
	client
		.event("viewed", Some(EventTarget::ByEntity(Entity::customer(vec!["a"]))))
		.await;
	client
		.event("viewed", Some(EventTarget::ByEntity(Entity::customer(vec!["b"]))))
		.await;
	client.flush().await;

	// two disjoint identify entries: one request each
	assert_eq!(requests_to(&server, "/identify").await.len(), 2);
	// states: a single bulk request carrying both entities
	let state_requests = requests_to(&server, "/state").await;
	assert_eq!(state_requests.len(), 1);

	let body: serde_json::Value = state_requests[0].body_json().unwrap();
	let batches = body.as_array().unwrap();
	assert_eq!(batches.len(), 2);
}

#[tokio::test]
async fn transport_sends_auth_and_tracing_headers() {
	let server = mock_collector().await;
	let client = client_for(&server);

	client
		.identify(
			Entity::customer(vec!["a"]),
			IdentifyOptions::new().display_name("Ada"),
		)
		.await;
	client.flush().await;

	let requests = requests_to(&server, "/identify").await;
	assert_eq!(requests.len(), 1);
	let headers = &requests[0].headers;

	assert_eq!(
		headers.get("authorization").unwrap().to_str().unwrap(),
		"Bearer fn_test"
	);
	assert_eq!(
		headers.get("content-type").unwrap().to_str().unwrap(),
		"application/json"
	);
	assert!(!headers
		.get("x-request-id")
		.unwrap()
		.to_str()
		.unwrap()
		.is_empty());
	assert!(headers
		.get("x-source")
		.unwrap()
		.to_str()
		.unwrap()
		.starts_with("funct-rust/"));
	let offset: i32 = headers
		.get("x-timezone-offset")
		.unwrap()
		.to_str()
		.unwrap()
		.parse()
		.unwrap();
	assert!((-14 * 60..=14 * 60).contains(&offset));

	let body: serde_json::Value = requests[0].body_json().unwrap();
	assert_eq!(body["model"], "customer");
	assert_eq!(body["ids"], serde_json::json!(["a"]));
	assert_eq!(body["displayName"], "Ada");
}

#[tokio::test]
async fn merged_identify_is_delivered_once_with_unioned_ids() {
	let server = mock_collector().await;
	let client = client_for(&server);

	client
		.identify(Entity::customer(vec!["a"]), IdentifyOptions::new())
		.await;
	client
		.identify(
			Entity::customer(vec!["a", "b"]),
			IdentifyOptions::new().properties(Properties::new().set("p", 1)),
		)
		.await;
	client.flush().await;

	let requests = requests_to(&server, "/identify").await;
	assert_eq!(requests.len(), 1);
	let body: serde_json::Value = requests[0].body_json().unwrap();
	assert_eq!(body["ids"], serde_json::json!(["a", "b"]));
	assert_eq!(body["properties"], serde_json::json!({"p": 1}));
}

#[tokio::test]
async fn state_body_carries_name_ts_and_properties() {
	let server = mock_collector().await;
	let client = client_for(&server);

	client
		.identify(
			Entity::customer(vec![7]),
			IdentifyOptions::new().set_to_context(true),
		)
		.await;
	client
		.event(
			StateEvent::new("upgraded").with_properties(Properties::new().set("plan", "scale")),
			None,
		)
		.await;
	client.flush().await;

	let requests = requests_to(&server, "/state").await;
	assert_eq!(requests.len(), 1);
	let body: serde_json::Value = requests[0].body_json().unwrap();
	let batch = &body.as_array().unwrap()[0];

	assert_eq!(batch["model"], "customer");
	assert_eq!(batch["ids"], serde_json::json!(["7"]));
	let state = &batch["states"].as_array().unwrap()[0];
	assert_eq!(state["name"], "upgraded");
	assert!(state["ts"].as_str().is_some());
	assert_eq!(state["properties"], serde_json::json!({"plan": "scale"}));
}

#[tokio::test]
async fn cap_triggers_delivery_without_manual_flush() {
	let server = mock_collector().await;
	let client = client_for(&server);
	let target = EventTarget::ByEntity(Entity::customer(vec!["1"]));

	for i in 0..300 {
		client
			.event(StateEvent::new(format!("e{i}")), Some(target.clone()))
			.await;
	}

	let requests = requests_to(&server, "/state").await;
	assert_eq!(requests.len(), 1);
	let body: serde_json::Value = requests[0].body_json().unwrap();
	assert_eq!(body[0]["states"].as_array().unwrap().len(), 300);
}

#[tokio::test]
async fn first_call_is_delivered_immediately() {
	let server = mock_collector().await;
	let client = Functionary::builder()
		.api_key("fn_test")
		.base_url(server.uri())
		.fire_on_instantiation(true)
		.build();

	client
		.identify(Entity::customer(vec!["a"]), IdentifyOptions::new())
		.await;

	// no manual flush, no timer wait
	assert_eq!(requests_to(&server, "/identify").await.len(), 1);
}

#[tokio::test]
async fn exit_hook_flushes_pending_batches() {
	let server = mock_collector().await;
	let surface = Arc::new(MemorySurface::new());
	let client = Functionary::builder()
		.api_key("fn_test")
		.base_url(server.uri())
		.fire_on_instantiation(false)
		.surface(Arc::clone(&surface) as Arc<dyn SurfaceDelegate>)
		.build();

	client
		.event("last_gasp", Some(EventTarget::ByEntity(Entity::customer(vec!["1"]))))
		.await;
	assert!(requests_to(&server, "/state").await.is_empty());

	// the host application's shutdown path
	surface.notify_exit();

	// the exit flush is spawned; give it a moment to land
	let mut delivered = false;
	for _ in 0..50 {
		if !requests_to(&server, "/state").await.is_empty() {
			delivered = true;
			break;
		}
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
	assert!(delivered, "exit hook did not deliver the pending batch");
}

#[tokio::test]
async fn failed_batches_are_terminal_not_retried() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/identify"))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;
	let client = client_for(&server);

	client
		.identify(Entity::customer(vec!["a"]), IdentifyOptions::new())
		.await;
	client.flush().await;
	assert_eq!(requests_to(&server, "/identify").await.len(), 1);

	// the failed batch is gone: another flush sends nothing
	client.flush().await;
	assert_eq!(requests_to(&server, "/identify").await.len(), 1);
}

#[tokio::test]
async fn rejection_with_body_does_not_break_later_delivery() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/identify"))
		.respond_with(
			ResponseTemplate::new(422).set_body_json(serde_json::json!({"error": "bad ids"})),
		)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/state"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;
	let client = client_for(&server);

	client
		.identify(Entity::customer(vec!["a"]), IdentifyOptions::new())
		.await;
	client
		.event("still_works", Some(EventTarget::ByEntity(Entity::customer(vec!["a"]))))
		.await;
	client.flush().await;

	// the rejected identify is dropped, the state batch still lands
	assert_eq!(requests_to(&server, "/identify").await.len(), 1);
	assert_eq!(requests_to(&server, "/state").await.len(), 1);
}

#[tokio::test]
async fn shutdown_delivers_everything_pending() {
	let server = mock_collector().await;
	let client = client_for(&server);

	client
		.identify(
			Entity::organization(vec!["org-1"]),
			IdentifyOptions::new().set_to_context(true),
		)
		.await;
	client
		.event("closing", Some(EventTarget::ByContext(Model::Organization)))
		.await;
	client.shutdown().await;

	assert_eq!(requests_to(&server, "/identify").await.len(), 1);
	assert_eq!(requests_to(&server, "/state").await.len(), 1);
}

#[tokio::test]
async fn disabled_client_performs_no_network_io() {
	let server = mock_collector().await;
	let client = Functionary::builder()
		.api_key("fn_test")
		.base_url(server.uri())
		.enabled(false)
		.fire_on_instantiation(true)
		.build();

	client
		.identify(Entity::customer(vec!["a"]), IdentifyOptions::new())
		.await;
	client
		.event("x", Some(EventTarget::ByEntity(Entity::customer(vec!["a"]))))
		.await;
	client.flush().await;
	client.shutdown().await;

	assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
