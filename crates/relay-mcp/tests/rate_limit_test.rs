//! Rate-limit admission end to end: the third back-to-back tools/call in
//! a 2-per-minute window is denied with a retry hint.

mod common;

use chrono::TimeDelta;
use serde_json::json;

use common::{EchoTool, TestClient};
use relay_mcp::ratelimit::{RateLimitMode, RateLimitQuota, RateLimiterConfig};
use relay_mcp::server::McpServerBuilder;

#[tokio::test]
async fn third_call_rate_limited() {
    let server = McpServerBuilder::new()
        .with_tool(EchoTool)
        .with_rate_limit(
            RateLimiterConfig::default()
                .with_resource_quota("tools/call", RateLimitQuota::per_minute(2)),
        )
        .build()
        .expect("build failed");

    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    for id in [10, 11] {
        let response = client
            .request(
                id,
                "tools/call",
                Some(json!({"name": "echo", "arguments": {"message": "x"}})),
            )
            .await;
        assert!(response["result"].is_object(), "call {id} should pass");
    }

    let denied = client
        .request(
            12,
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"message": "x"}})),
        )
        .await;
    assert_eq!(denied["error"]["code"], -32005);
    assert!(denied["error"]["data"]["retryAfter"].as_i64().unwrap() > 0);

    // Other methods are not affected by the tools/call window.
    let response = client.request(13, "tools/list", None).await;
    assert!(response["result"].is_object());

    server.shutdown().await;
}

#[tokio::test]
async fn fixed_window_mode_buckets_by_window_start() {
    let server = McpServerBuilder::new()
        .with_tool(EchoTool)
        .with_rate_limit(RateLimiterConfig {
            mode: RateLimitMode::Fixed,
            default_quota: RateLimitQuota::new(2, TimeDelta::milliseconds(300)),
            ..Default::default()
        })
        .build()
        .expect("build failed");

    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    // Two calls fill the fixed window; the third is denied.
    for id in [2, 3] {
        let response = client
            .request(
                id,
                "tools/call",
                Some(json!({"name": "echo", "arguments": {"message": "x"}})),
            )
            .await;
        assert!(response["result"].is_object(), "call {id} should pass");
    }
    let denied = client
        .request(
            4,
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"message": "x"}})),
        )
        .await;
    assert_eq!(denied["error"]["code"], -32005);

    // The next window resets the counter.
    tokio::time::sleep(std::time::Duration::from_millis(350)).await;
    let response = client
        .request(
            5,
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"message": "x"}})),
        )
        .await;
    assert!(response["result"].is_object());

    server.shutdown().await;
}

#[tokio::test]
async fn allowlisted_identity_never_limited() {
    let server = McpServerBuilder::new()
        .with_tool(EchoTool)
        .with_rate_limit(
            RateLimiterConfig {
                default_quota: RateLimitQuota::new(1, TimeDelta::seconds(60)),
                ..Default::default()
            }
            .with_allowlisted("trusted"),
        )
        .build()
        .expect("build failed");

    let (mut client, connection) = TestClient::connect(&server).await;
    connection.set_principal(relay_mcp::session::Principal::new("trusted"));
    client.initialize("0.1.0").await;

    for id in 20..25 {
        let response = client
            .request(
                id,
                "tools/call",
                Some(json!({"name": "echo", "arguments": {"message": "x"}})),
            )
            .await;
        assert!(response["result"].is_object(), "call {id} should pass");
    }

    server.shutdown().await;
}
