//! Blocking client against a real mock server.
//!
//! The mock server needs a runtime to start, but the blocking client must be
//! used outside of one, so each test owns a runtime only for server setup.

mod support;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use euroleague::api::{live, v2};
use euroleague::auth::MemoryTokenStore;
use euroleague::error::ApiError;
use euroleague::util::cancel::Cancellation;
use euroleague::BlockingEuroleagueClient;

use support::{config_for, expired_token, store_with, token_body, valid_token, TOKEN_PATH};

fn start_server() -> (Runtime, MockServer) {
    let runtime = Runtime::new().unwrap();
    let server = runtime.block_on(MockServer::start());
    (runtime, server)
}

#[test]
fn blocking_request_uses_query_and_bearer_header() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("GET"))
            .and(path("/v2/clubs"))
            .and(query_param("Limit", "5"))
            .and(query_param("search", "Olympiacos"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 1})))
            .expect(1)
            .mount(&server),
    );

    let client =
        BlockingEuroleagueClient::new(config_for(&server.uri()), store_with(valid_token("abc")))
            .unwrap();
    let query = v2::ClubsQuery::builder().limit(5).search("Olympiacos").build();
    let response = client.execute(&v2::clubs(&query)).unwrap();
    assert_eq!(response.body["total"], 1);
    client.close();

    runtime.block_on(server.verify());
}

#[test]
fn blocking_server_errors_stop_at_max_attempts() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server),
    );

    let client =
        BlockingEuroleagueClient::new(config_for(&server.uri()), store_with(valid_token("abc")))
            .unwrap();
    let err = client.execute(&live::play_by_play("E2025", 241)).unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 502, .. }));
    drop(client);

    runtime.block_on(server.verify());
}

#[test]
fn blocking_missing_token_makes_no_call() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server),
    );

    let client = BlockingEuroleagueClient::new(
        config_for(&server.uri()),
        Arc::new(MemoryTokenStore::new()),
    )
    .unwrap();
    let err = client.get("v1/games", &[("seasonCode", "E2024")]).unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
    drop(client);

    runtime.block_on(server.verify());
}

#[test]
fn blocking_concurrent_expired_requests_refresh_exactly_once() {
    let (runtime, server) = start_server();
    runtime.block_on(async {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("shared", None))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer shared"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(6)
            .mount(&server)
            .await;
    });

    let client = Arc::new(
        BlockingEuroleagueClient::new(
            config_for(&server.uri()),
            store_with(expired_token(Some("refresh-1"))),
        )
        .unwrap(),
    );
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let client = client.clone();
            thread::spawn(move || client.execute(&live::shots("E2025", 241)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    drop(client);

    runtime.block_on(server.verify());
}

#[test]
fn blocking_deadline_interrupts_slow_response() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server),
    );

    let client =
        BlockingEuroleagueClient::new(config_for(&server.uri()), store_with(valid_token("abc")))
            .unwrap();
    let started = std::time::Instant::now();
    let err = client
        .execute_with(
            &live::shots("E2025", 1),
            &Cancellation::new().with_timeout(Duration::from_millis(200)),
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled(_)));
    assert!(started.elapsed() < Duration::from_secs(2));
}
