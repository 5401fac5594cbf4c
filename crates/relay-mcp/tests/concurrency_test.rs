//! Concurrency behavior: out-of-order responses, per-connection
//! notification ordering, idle reaping and shutdown draining.

mod common;

use std::time::Duration;

use serde_json::json;

use common::{BlockingTool, EchoTool, MemoryResources, TestClient};
use relay_mcp::protocol::Uri;
use relay_mcp::server::{McpServerBuilder, ServerConfig};

#[tokio::test]
async fn slow_request_does_not_block_later_ones() {
    // Responses are not required to arrive in request order: a request
    // stuck on provider I/O must not stall the connection.
    let server = McpServerBuilder::new()
        .with_tool(BlockingTool)
        .with_tool(EchoTool)
        .build()
        .expect("build failed");
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .send(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "block", "arguments": {}},
            })
            .to_string(),
        )
        .await;
    client
        .send(
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "echo", "arguments": {"message": "fast"}},
            })
            .to_string(),
        )
        .await;

    // The fast request answers while the slow one is still in flight.
    let fast = client.response_for(&json!(2)).await;
    assert_eq!(fast["result"]["content"][0]["text"], "fast");

    client
        .send(json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {"id": 1}}).to_string())
        .await;
    let slow = client.response_for(&json!(1)).await;
    assert_eq!(slow["error"]["code"], -32800);

    server.shutdown().await;
}

#[tokio::test]
async fn notifications_delivered_in_emission_order() {
    let server = McpServerBuilder::new()
        .with_resource_provider(MemoryResources::new([("mem://a", "a")]))
        .build()
        .expect("build failed");
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    for (id, uri) in [(11, "mem://one"), (12, "mem://two"), (13, "mem://three")] {
        client
            .request(id, "resources/subscribe", Some(json!({"uri": uri})))
            .await;
    }

    let publisher = server.context().resources.change_publisher();
    for uri in ["mem://one", "mem://two", "mem://three"] {
        publisher.resource_changed(Uri::new_unchecked(uri));
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        let update = client
            .notification("notifications/resources/updated")
            .await
            .expect("missing update");
        seen.push(update["params"]["uri"].as_str().unwrap().to_string());
    }
    assert_eq!(seen, vec!["mem://one", "mem://two", "mem://three"]);

    server.shutdown().await;
}

#[tokio::test]
async fn idle_connections_are_reaped() {
    let mut config = ServerConfig::default();
    config.connection.idle_timeout = Some(chrono::TimeDelta::milliseconds(50));
    config.connection.reap_interval = Duration::from_millis(25);
    let server = McpServerBuilder::new()
        .config(config)
        .build()
        .expect("build failed");

    let (mut client, connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    // Go quiet and wait for the reaper.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(connection.close_reason().as_deref(), Some("idle"));
    assert_eq!(server.context().connections.count(), 0);

    server.shutdown().await;
}

#[tokio::test]
async fn active_connections_survive_the_reaper() {
    let mut config = ServerConfig::default();
    config.connection.idle_timeout = Some(chrono::TimeDelta::milliseconds(200));
    config.connection.reap_interval = Duration::from_millis(25);
    let server = McpServerBuilder::new()
        .config(config)
        .build()
        .expect("build failed");

    let (mut client, connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    // Keep pinging under the idle threshold.
    for id in 2..6 {
        tokio::time::sleep(Duration::from_millis(60)).await;
        let response = client.request(id, "ping", None).await;
        assert!(response["result"].is_object());
    }
    assert!(connection.close_reason().is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn shutdown_cancels_in_flight_and_closes_transport() {
    let server = McpServerBuilder::new()
        .with_tool(BlockingTool)
        .build()
        .expect("build failed");
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .send(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "block", "arguments": {}},
            })
            .to_string(),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.shutdown().await;
    assert!(server.context().cancellations.is_empty());
    assert_eq!(server.context().connections.count(), 0);

    // The outbound stream ends once the egress task finishes draining.
    let mut saw_close = false;
    for _ in 0..10 {
        if client.recv_json().await.is_none() {
            saw_close = true;
            break;
        }
    }
    assert!(saw_close, "transport did not close after shutdown");
}
