// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP wrapper tests against the stub backend.
//!
//! These tests verify that:
//! 1. Every 2xx response becomes `Success` with the body unchanged
//! 2. Every other status becomes `Failure` with a readable message
//! 3. Transport failures are classified without an HTTP status
//! 4. The bearer token and caller headers are attached correctly

use second_innings_admin::models::{TicketFilters, TicketStatus};
use second_innings_admin::services::{ApiError, ApiResponse, RequestOptions, TicketsService};
use second_innings_admin::storage::keys;
use second_innings_admin::AdminContext;
use second_innings_admin::config::Config;
use second_innings_admin::storage::KeyValueStore;
use serde_json::{json, Value};
use std::time::Duration;

mod common;

use common::StubBackend;

#[tokio::test]
async fn test_success_grid_keeps_body() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();

    for status in [200u16, 201, 202] {
        let body = json!({ "message": "done", "data": { "status": status } });
        stub.respond("GET", &format!("/api/ok/{status}"), status, body.clone());

        let response = ctx
            .api
            .get(&format!("/ok/{status}"), RequestOptions::new())
            .await;
        assert_eq!(
            response,
            ApiResponse::Success {
                status,
                data: body,
                message: Some("done".to_string()),
            },
            "status {status}"
        );
    }

    stub.respond_raw("DELETE", "/api/ok/204", 204, "");
    let response = ctx.api.delete("/ok/204", RequestOptions::new()).await;
    assert_eq!(
        response,
        ApiResponse::Success {
            status: 204,
            data: Value::Null,
            message: None,
        }
    );
}

#[tokio::test]
async fn test_error_grid_default_messages() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();

    let cases = [
        (400u16, "Bad Request"),
        (401, "Unauthorized"),
        (403, "Forbidden"),
        (404, "Not Found"),
        (422, "Unprocessable Entity"),
        (500, "Internal Server Error"),
        (502, "Bad Gateway"),
        (503, "Service Unavailable"),
        (418, "Unknown error occurred"),
    ];

    for (status, expected) in cases {
        stub.respond_raw("GET", &format!("/api/fail/{status}"), status, "");
        let response = ctx
            .api
            .get(&format!("/fail/{status}"), RequestOptions::new())
            .await;

        assert!(!response.is_success(), "status {status}");
        assert_eq!(response.status(), status);
        assert_eq!(
            response.error(),
            Some(&ApiError::Http {
                status,
                message: expected.to_string(),
            })
        );
    }
}

#[tokio::test]
async fn test_error_body_message_wins() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();

    stub.respond(
        "GET",
        "/api/tickets/99",
        404,
        json!({ "message": "Ticket not found" }),
    );
    let response = ctx.api.get("/tickets/99", RequestOptions::new()).await;
    assert_eq!(response.error().unwrap().message(), "Ticket not found");
}

#[tokio::test]
async fn test_unreachable_backend_is_no_connection() {
    let ctx = AdminContext::with_storage(common::unreachable_config(), KeyValueStore::in_memory())
    .unwrap();

    let response = ctx.api.get("/tickets", RequestOptions::new()).await;
    assert_eq!(response, ApiResponse::Failure(ApiError::NoConnection));
    assert_eq!(response.status(), 0);
    assert_eq!(response.error().unwrap().message(), "No internet connection");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let stub = StubBackend::start().await;
    stub.respond_delayed(
        "GET",
        "/api/tickets",
        200,
        json!({ "data": { "tickets": [] } }),
        Duration::from_secs(2),
    );
    let config = Config {
        request_timeout: Duration::from_millis(100),
        ..stub.config()
    };
    let ctx = AdminContext::with_storage(config, KeyValueStore::in_memory()).unwrap();

    let response = ctx.api.get("/tickets", RequestOptions::new()).await;
    assert_eq!(response, ApiResponse::Failure(ApiError::Timeout));
    assert_eq!(response.status(), 0);
    assert_eq!(response.error().unwrap().message(), "Request timeout");

    // Stores surface the same message.
    let err = ctx.tickets.fetch_tickets().await.unwrap_err();
    assert_eq!(err, ApiError::Timeout);
    assert_eq!(ctx.tickets.snapshot().await.error.as_deref(), Some("Request timeout"));
}

#[tokio::test]
async fn test_bearer_token_from_test_token() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();
    stub.respond("GET", "/api/tickets", 200, json!({ "data": { "tickets": [] } }));

    // Without a token the request still goes out, unauthenticated.
    ctx.api.get("/tickets", RequestOptions::new()).await;
    ctx.storage
        .set(keys::TEST_TOKEN, "test_admin_token_001")
        .unwrap();
    ctx.api.get("/tickets", RequestOptions::new()).await;

    let requests = stub.requests_to("GET", "/api/tickets");
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].headers.contains_key("authorization"));
    assert_eq!(
        requests[1].headers.get("authorization").map(String::as_str),
        Some("Bearer test_admin_token_001")
    );
    assert_eq!(
        requests[1].headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(
        requests[1].headers.get("accept").map(String::as_str),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_caller_headers_override_defaults() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();
    ctx.storage
        .set(keys::TEST_TOKEN, "test_admin_token_001")
        .unwrap();
    stub.respond("GET", "/api/ping", 200, json!({}));

    ctx.api
        .get(
            "/ping",
            RequestOptions::new().header("Authorization", "Bearer other"),
        )
        .await;

    let request = &stub.requests_to("GET", "/api/ping")[0];
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer other")
    );
}

#[tokio::test]
async fn test_ticket_filters_become_query_params() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();
    stub.respond("GET", "/api/tickets", 200, json!({ "data": { "tickets": [] } }));

    let service = TicketsService::new(ctx.api.clone());
    service
        .list(&TicketFilters {
            status: Some(TicketStatus::InProgress),
            priority: None,
            assigned_to: Some("11".to_string()),
        })
        .await;

    let request = &stub.requests_to("GET", "/api/tickets")[0];
    let query = request.query.as_deref().unwrap_or_default();
    assert!(query.contains("status=in_progress"), "{query}");
    assert!(query.contains("assigned_to=11"), "{query}");
    assert!(!query.contains("priority"), "{query}");
}

#[tokio::test]
async fn test_validation_error_lists_fields() {
    let stub = StubBackend::start().await;
    let ctx = stub.context();
    stub.respond(
        "PUT",
        "/api/tickets/5",
        422,
        json!({ "detail": [{ "loc": ["body", "priority"], "msg": "invalid" }] }),
    );

    let response = ctx
        .api
        .put("/tickets/5", RequestOptions::new().body(json!({ "priority": "urgent" })))
        .await;
    let message = response.error().unwrap().message();
    assert!(message.contains("priority invalid"), "{message}");
    assert_eq!(response.status(), 422);
}
