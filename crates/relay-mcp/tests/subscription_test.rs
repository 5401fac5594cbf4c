//! Resource subscription fan-out: updates reach exactly the subscribed
//! connections, and unsubscribe stops delivery.

mod common;

use std::time::Duration;

use serde_json::json;

use common::{MemoryResources, TestClient};
use relay_mcp::protocol::Uri;
use relay_mcp::server::McpServerBuilder;

fn server() -> relay_mcp::server::McpServer {
    McpServerBuilder::new()
        .with_resource_provider(MemoryResources::new([
            ("file:///a/b.txt", "contents of b"),
            ("file:///a/c.txt", "contents of c"),
        ]))
        .build()
        .expect("build failed")
}

#[tokio::test]
async fn update_reaches_only_subscriber() {
    // Two connections, one subscribes; a provider change notifies
    // exactly the subscriber.
    let server = server();
    let (mut subscriber, _sub_conn) = TestClient::connect(&server).await;
    let (mut other, _other_conn) = TestClient::connect(&server).await;
    subscriber.initialize("0.1.0").await;
    other.initialize("0.1.0").await;

    let response = subscriber
        .request(
            2,
            "resources/subscribe",
            Some(json!({"uri": "file:///a/b.txt"})),
        )
        .await;
    assert!(response["result"].is_object());

    server
        .context()
        .resources
        .change_publisher()
        .resource_changed(Uri::new_unchecked("file:///a/b.txt"));

    let update = subscriber
        .notification("notifications/resources/updated")
        .await
        .expect("subscriber missed the update");
    assert_eq!(update["params"]["uri"], "file:///a/b.txt");

    assert!(other.expect_silence(Duration::from_millis(150)).await);

    server.shutdown().await;
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let server = server();
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .request(
            2,
            "resources/subscribe",
            Some(json!({"uri": "file:///a/b.txt"})),
        )
        .await;

    let publisher = server.context().resources.change_publisher();
    publisher.resource_changed(Uri::new_unchecked("file:///a/b.txt"));
    assert!(client
        .notification("notifications/resources/updated")
        .await
        .is_some());

    let response = client
        .request(
            3,
            "resources/unsubscribe",
            Some(json!({"uri": "file:///a/b.txt"})),
        )
        .await;
    assert!(response["result"].is_object());

    publisher.resource_changed(Uri::new_unchecked("file:///a/b.txt"));
    assert!(client.expect_silence(Duration::from_millis(150)).await);

    server.shutdown().await;
}

#[tokio::test]
async fn updates_scoped_to_the_affected_uri() {
    let server = server();
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    client
        .request(
            2,
            "resources/subscribe",
            Some(json!({"uri": "file:///a/b.txt"})),
        )
        .await;

    // A change to a different uri must not reach this subscription.
    server
        .context()
        .resources
        .change_publisher()
        .resource_changed(Uri::new_unchecked("file:///a/c.txt"));
    assert!(client.expect_silence(Duration::from_millis(150)).await);

    server.shutdown().await;
}

#[tokio::test]
async fn read_and_list_resources() {
    let server = server();
    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    let listed = client.request(2, "resources/list", None).await;
    assert_eq!(listed["result"]["resources"].as_array().unwrap().len(), 2);

    let read = client
        .request(3, "resources/read", Some(json!({"uri": "file:///a/b.txt"})))
        .await;
    assert_eq!(read["result"]["contents"][0]["text"], "contents of b");

    let missing = client
        .request(4, "resources/read", Some(json!({"uri": "file:///nope"})))
        .await;
    assert_eq!(missing["error"]["code"], -32002);

    server.shutdown().await;
}

#[tokio::test]
async fn root_boundary_blocks_reads_outside() {
    let server = McpServerBuilder::new()
        .with_resource_provider(MemoryResources::new([
            ("file:///workspace/ok.txt", "fine"),
            ("file:///etc/secret.txt", "nope"),
        ]))
        .with_root(relay_mcp::protocol::Root::new(
            Uri::new_unchecked("file:///workspace"),
            None,
        ))
        .build()
        .expect("build failed");

    let (mut client, _connection) = TestClient::connect(&server).await;
    client.initialize("0.1.0").await;

    let allowed = client
        .request(
            2,
            "resources/read",
            Some(json!({"uri": "file:///workspace/ok.txt"})),
        )
        .await;
    assert_eq!(allowed["result"]["contents"][0]["text"], "fine");

    let denied = client
        .request(
            3,
            "resources/read",
            Some(json!({"uri": "file:///etc/secret.txt"})),
        )
        .await;
    assert_eq!(denied["error"]["code"], -32001);
    assert_eq!(denied["error"]["data"]["type"], "resource_access_denied");

    let roots = client.request(4, "roots/list", None).await;
    assert_eq!(roots["result"]["roots"][0]["uri"], "file:///workspace");

    server.shutdown().await;
}
