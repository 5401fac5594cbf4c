//! Shared harness for the integration suites: an in-memory client over
//! `ChannelTransport` plus small provider fixtures.

// Not every suite uses every fixture.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use relay_mcp::connection::Connection;
use relay_mcp::error::{McpError, McpResult};
use relay_mcp::protocol::{
    CallToolResult, Content, PromptArgument, PromptDescriptor, PromptMessage,
    ResourceDescriptor, ToolDescriptor, Uri,
};
use relay_mcp::providers::{
    PromptProvider, ResourceChangePublisher, ResourceProvider, Tool, ToolContext,
};
use relay_mcp::server::McpServer;
use relay_mcp::transport::{ChannelTransport, ClientHandle};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// An in-memory client driving one server connection
pub struct TestClient {
    handle: ClientHandle,
    /// Notifications received while waiting for responses
    pub notifications: Vec<Value>,
    buffered_responses: Vec<Value>,
}

impl TestClient {
    /// Accept a fresh connection on the server
    pub async fn connect(server: &McpServer) -> (Self, Arc<Connection>) {
        let (transport, handle) = ChannelTransport::pair();
        let connection = server.accept(transport).await.expect("accept failed");
        (
            Self {
                handle,
                notifications: Vec::new(),
                buffered_responses: Vec::new(),
            },
            connection,
        )
    }

    /// Send a raw frame
    pub async fn send(&self, frame: impl Into<String>) {
        self.handle.send(frame).await.expect("send failed");
    }

    /// Receive the next frame as JSON, `None` on timeout/close
    pub async fn recv_json(&mut self) -> Option<Value> {
        let frame = self.handle.recv_timeout(RECV_TIMEOUT).await?;
        Some(serde_json::from_str(&frame).expect("server emitted invalid JSON"))
    }

    /// Await the response whose id equals `id`, buffering everything else
    pub async fn response_for(&mut self, id: &Value) -> Value {
        if let Some(position) = self
            .buffered_responses
            .iter()
            .position(|r| &r["id"] == id)
        {
            return self.buffered_responses.remove(position);
        }

        loop {
            let frame = self
                .recv_json()
                .await
                .unwrap_or_else(|| panic!("no response for id {id}"));
            if frame.get("method").is_some() {
                self.notifications.push(frame);
                continue;
            }
            if &frame["id"] == id {
                return frame;
            }
            self.buffered_responses.push(frame);
        }
    }

    /// Send a request and await its response
    pub async fn request(&mut self, id: i64, method: &str, params: Option<Value>) -> Value {
        let mut frame = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if let Some(params) = params {
            frame["params"] = params;
        }
        self.send(frame.to_string()).await;
        self.response_for(&json!(id)).await
    }

    /// Await the next notification with the given method
    pub async fn notification(&mut self, method: &str) -> Option<Value> {
        if let Some(position) = self
            .notifications
            .iter()
            .position(|n| n["method"] == method)
        {
            return Some(self.notifications.remove(position));
        }
        loop {
            let frame = self.recv_json().await?;
            if frame["method"] == method {
                return Some(frame);
            }
            if frame.get("method").is_some() {
                self.notifications.push(frame);
            } else {
                self.buffered_responses.push(frame);
            }
        }
    }

    /// Whether any frame arrives within a short window
    pub async fn expect_silence(&mut self, window: Duration) -> bool {
        self.handle.recv_timeout(window).await.is_none()
    }

    /// Run the full handshake: initialize + initialized
    pub async fn initialize(&mut self, protocol_version: &str) -> Value {
        let response = self
            .request(
                1,
                "initialize",
                Some(json!({
                    "protocolVersion": protocol_version,
                    "capabilities": {},
                    "clientInfo": {"name": "c", "version": "1"},
                })),
            )
            .await;
        self.send(json!({"jsonrpc": "2.0", "method": "initialized"}).to_string())
            .await;
        // Give the Ready transition a moment to land before further frames.
        tokio::time::sleep(Duration::from_millis(20)).await;
        response
    }
}

/// Echoes its `message` argument back as text content
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "echo".to_string(),
            description: Some("Echo a message back".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"],
                "additionalProperties": false,
            }),
        }
    }

    async fn execute(&self, arguments: Value, _ctx: ToolContext) -> McpResult<CallToolResult> {
        let message = arguments["message"].as_str().unwrap_or_default();
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }
}

/// Simulates a tool blocked on provider I/O; only cancellation ends it
pub struct BlockingTool;

#[async_trait]
impl Tool for BlockingTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "block".to_string(),
            description: Some("Blocks until cancelled".to_string()),
            input_schema: json!({"type": "object"}),
        }
    }

    async fn execute(&self, _arguments: Value, _ctx: ToolContext) -> McpResult<CallToolResult> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(CallToolResult::success(vec![]))
    }
}

/// Fixed in-memory resources with a change publisher
pub struct MemoryResources {
    entries: HashMap<String, &'static str>,
    publisher: std::sync::Mutex<Option<ResourceChangePublisher>>,
}

impl MemoryResources {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(uri, body)| (uri.to_string(), body))
                .collect(),
            publisher: std::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl ResourceProvider for MemoryResources {
    async fn list(&self) -> McpResult<Vec<ResourceDescriptor>> {
        Ok(self
            .entries
            .keys()
            .map(|uri| ResourceDescriptor {
                uri: Uri::new_unchecked(uri.clone()),
                name: None,
                description: None,
                mime_type: None,
            })
            .collect())
    }

    async fn read(&self, uri: &Uri) -> McpResult<Vec<Content>> {
        match self.entries.get(uri.as_str()) {
            Some(body) => Ok(vec![Content::text(*body)]),
            None => Err(McpError::resource_not_found(uri.as_str())),
        }
    }

    fn attach_change_publisher(&self, publisher: ResourceChangePublisher) {
        if let Ok(mut slot) = self.publisher.lock() {
            *slot = Some(publisher);
        }
    }

    async fn subscribe(&self, _uri: &Uri) -> McpResult<()> {
        Ok(())
    }

    async fn unsubscribe(&self, _uri: &Uri) -> McpResult<()> {
        Ok(())
    }
}

/// A single greeting prompt with two arguments
pub struct GreetingPrompts;

#[async_trait]
impl PromptProvider for GreetingPrompts {
    async fn list(&self) -> McpResult<Vec<PromptDescriptor>> {
        Ok(vec![PromptDescriptor {
            name: "greeting".to_string(),
            description: Some("Greets someone".to_string()),
            arguments: vec![
                PromptArgument::required("person", Some("Who to greet")),
                PromptArgument::optional("language", Some("Greeting language")),
            ],
        }])
    }

    async fn get(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> McpResult<(Option<String>, Vec<PromptMessage>)> {
        if name != "greeting" {
            return Err(McpError::prompt_not_found(name));
        }
        let person = arguments
            .get("person")
            .ok_or_else(|| McpError::invalid_params("missing argument 'person'"))?;
        Ok((
            Some("A greeting".to_string()),
            vec![PromptMessage::user(Content::text(format!("Hello {person}")))],
        ))
    }
}
