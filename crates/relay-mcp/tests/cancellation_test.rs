//! Cooperative cancellation: a request blocked on provider I/O is
//! answered with the cancelled error shortly after `$/cancelRequest`.

mod common;

use std::time::Duration;

use serde_json::json;

use common::{BlockingTool, EchoTool, TestClient};
use relay_mcp::server::McpServerBuilder;

fn server() -> relay_mcp::server::McpServer {
    McpServerBuilder::new()
        .with_tool(BlockingTool)
        .with_tool(EchoTool)
        .build()
        .expect("build failed")
}

#[tokio::test]
async fn cancel_blocked_request() {
    // Request id=7 blocks on provider I/O; $/cancelRequest ends it
    // promptly with the cancelled error.
    let server = server();
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .send(
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {"name": "block", "arguments": {}},
            })
            .to_string(),
        )
        .await;

    // Give the handler a moment to enter the blocking call.
    tokio::time::sleep(Duration::from_millis(50)).await;
    client
        .send(json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {"id": 7}}).to_string())
        .await;

    let response = tokio::time::timeout(
        Duration::from_secs(1),
        client.response_for(&json!(7)),
    )
    .await
    .expect("no response within the quiescence bound");

    assert_eq!(response["error"]["code"], -32800);
    assert_eq!(response["error"]["message"], "Operation was cancelled");
    assert!(server.context().cancellations.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn cancel_unknown_id_silently_ignored() {
    let server = server();
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .send(
            json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {"id": 404}})
                .to_string(),
        )
        .await;
    assert!(client.expect_silence(Duration::from_millis(100)).await);

    // The connection still works.
    let response = client
        .request(
            2,
            "tools/call",
            Some(json!({"name": "echo", "arguments": {"message": "alive"}})),
        )
        .await;
    assert_eq!(response["result"]["content"][0]["text"], "alive");

    server.shutdown().await;
}

#[tokio::test]
async fn string_id_does_not_cancel_numeric_request() {
    // Ids are compared verbatim: "7" must not cancel numeric 7.
    let server = server();
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .send(
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {"name": "block", "arguments": {}},
            })
            .to_string(),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    client
        .send(
            json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {"id": "7"}})
                .to_string(),
        )
        .await;
    assert!(client.expect_silence(Duration::from_millis(150)).await);

    // The verbatim id does cancel it.
    client
        .send(json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {"id": 7}}).to_string())
        .await;
    let response = tokio::time::timeout(
        Duration::from_secs(1),
        client.response_for(&json!(7)),
    )
    .await
    .expect("cancel with matching id type must end the request");
    assert_eq!(response["error"]["code"], -32800);

    server.shutdown().await;
}

#[tokio::test]
async fn duplicate_in_flight_id_rejected() {
    let server = server();
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .send(
            json!({
                "jsonrpc": "2.0",
                "id": 9,
                "method": "tools/call",
                "params": {"name": "block", "arguments": {}},
            })
            .to_string(),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Re-using the id while the first request is in flight is invalid.
    let duplicate = client
        .request(9, "tools/list", None)
        .await;
    assert_eq!(duplicate["error"]["code"], -32600);

    server.shutdown().await;
}
