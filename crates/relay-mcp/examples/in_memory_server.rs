//! In-process server over the channel transport.
//!
//! Builds a server with one tool and one resource provider, drives a full
//! client handshake and a tool call over an in-memory connection, and
//! prints the raw frames. Run with:
//!
//! ```text
//! cargo run --example in_memory_server
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use relay_mcp::error::{McpError, McpResult};
use relay_mcp::protocol::{
    CallToolResult, Content, ResourceDescriptor, ToolDescriptor, Uri,
};
use relay_mcp::providers::{ResourceProvider, Tool, ToolContext};
use relay_mcp::server::McpServerBuilder;
use relay_mcp::transport::ChannelTransport;

struct UppercaseTool;

#[async_trait]
impl Tool for UppercaseTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "uppercase".to_string(),
            description: Some("Uppercase the given text".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"],
            }),
        }
    }

    async fn execute(&self, arguments: Value, _ctx: ToolContext) -> McpResult<CallToolResult> {
        let text = arguments["text"].as_str().unwrap_or_default();
        Ok(CallToolResult::success(vec![Content::text(
            text.to_uppercase(),
        )]))
    }
}

struct FixedResources {
    entries: HashMap<String, String>,
}

#[async_trait]
impl ResourceProvider for FixedResources {
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
            Some(body) => Ok(vec![Content::text(body.clone())]),
            None => Err(McpError::resource_not_found(uri.as_str())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("relay_mcp=debug")
        .init();

    let mut entries = HashMap::new();
    entries.insert(
        "mem://notes/hello.txt".to_string(),
        "hello from the resource plane".to_string(),
    );

    let server = McpServerBuilder::new()
        .server_info("in-memory-demo", env!("CARGO_PKG_VERSION"))
        .instructions("Demo server; try the uppercase tool.")
        .with_tool(UppercaseTool)
        .with_resource_provider(FixedResources { entries })
        .build()?;

    let (transport, mut client) = ChannelTransport::pair();
    server.accept(transport).await?;

    let frames = [
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "1.0.0",
                "capabilities": {},
                "clientInfo": {"name": "demo-client", "version": "0.1"},
            },
        }),
        json!({"jsonrpc": "2.0", "method": "initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "uppercase", "arguments": {"text": "hello mcp"}},
        }),
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "resources/read",
            "params": {"uri": "mem://notes/hello.txt"},
        }),
    ];

    for frame in frames {
        println!("--> {frame}");
        client.send(frame.to_string()).await?;
        // Responses arrive for requests only; give notifications a beat.
        if frame.get("id").is_some() {
            if let Some(reply) = client
                .recv_timeout(std::time::Duration::from_secs(1))
                .await
            {
                println!("<-- {reply}");
            }
        }
    }

    server.shutdown().await;
    Ok(())
}
