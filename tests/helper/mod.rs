//! Shared harness for end-to-end tests
//!
//! Runs the real serve loop over an in-memory pipe and speaks framed
//! JSON-RPC to it, the way an editor would over stdio.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use sitter_lsp::lsp::server::serve;
use sitter_lsp::lsp::transport::{MessageReader, MessageWriter};

const TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    writer: Option<WriteHalf<DuplexStream>>,
    reader: MessageReader<ReadHalf<DuplexStream>>,
    handle: JoinHandle<anyhow::Result<i32>>,
    notifications: VecDeque<Value>,
}

impl TestServer {
    pub fn start() -> Self {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (client_read, client_write) = tokio::io::split(client_side);

        let handle = tokio::spawn(serve(server_read, server_write));

        Self {
            writer: Some(client_write),
            reader: MessageReader::new(client_read),
            handle,
            notifications: VecDeque::new(),
        }
    }

    /// Starts a server and completes the initialize handshake
    pub async fn initialized() -> Self {
        let mut server = Self::start();
        let response = server.request(create_initialize_request(0)).await;
        assert!(response.get("result").is_some(), "{}", response);
        server.send(create_initialized_notification()).await;
        server
    }

    pub async fn send(&mut self, message: Value) {
        self.send_raw(&message.to_string()).await;
    }

    pub async fn send_raw(&mut self, body: &str) {
        self.send_bytes(body.as_bytes()).await;
    }

    /// Frames and sends `body` as is, valid UTF-8 or not
    pub async fn send_bytes(&mut self, body: &[u8]) {
        let input = self.writer.as_mut().expect("input already closed");
        MessageWriter::new(input).write_message(body).await.unwrap();
    }

    /// Writes `bytes` to the server's input with no framing added
    pub async fn send_unframed(&mut self, bytes: &[u8]) {
        let input = self.writer.as_mut().expect("input already closed");
        input.write_all(bytes).await.unwrap();
        input.flush().await.unwrap();
    }

    /// Next message from the server, whatever its kind
    pub async fn recv(&mut self) -> Option<Value> {
        let body = tokio::time::timeout(TIMEOUT, self.reader.read_message())
            .await
            .ok()?
            .ok()??;
        Some(serde_json::from_slice(&body).unwrap())
    }

    /// Sends a request and waits for its response, buffering any
    /// notifications that arrive first.
    pub async fn request(&mut self, request: Value) -> Value {
        let id = request["id"].clone();
        self.send(request).await;
        self.response_for(&id).await
    }

    pub async fn response_for(&mut self, id: &Value) -> Value {
        loop {
            let message = self.recv().await.expect("no response from server");
            if message.get("method").is_some() {
                self.notifications.push_back(message);
                continue;
            }
            assert_eq!(&message["id"], id, "response out of order: {}", message);
            return message;
        }
    }

    /// Next notification with `method`, skipping others
    pub async fn wait_for_notification(&mut self, method: &str) -> Option<Value> {
        if let Some(index) = self
            .notifications
            .iter()
            .position(|n| n["method"] == method)
        {
            return self.notifications.remove(index);
        }
        loop {
            let message = self.recv().await?;
            if message["method"] == method {
                return Some(message);
            }
            if message.get("method").is_some() {
                self.notifications.push_back(message);
            }
        }
    }

    /// Notifications received so far and not yet consumed
    pub fn buffered_notifications(&self, method: &str) -> Vec<&Value> {
        self.notifications
            .iter()
            .filter(|n| n["method"] == method)
            .collect()
    }

    /// Closes the server's input without sending `exit`
    pub async fn close_input(&mut self) {
        if let Some(mut input) = self.writer.take() {
            // the read half keeps the pipe alive, so dropping is not enough
            input.shutdown().await.unwrap();
        }
    }

    /// Waits for the serve loop to return its exit code
    pub async fn exit_code(mut self) -> i32 {
        self.close_input().await;
        tokio::time::timeout(TIMEOUT, self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap()
    }
}

pub fn create_initialize_request(id: i64) -> Value {
    create_initialize_request_with(id, json!({ "capabilities": {}, "rootUri": "file:///test" }))
}

pub fn create_initialize_request_with(id: i64, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": "initialize", "params": params })
}

pub fn create_initialized_notification() -> Value {
    json!({ "jsonrpc": "2.0", "method": "initialized", "params": {} })
}

pub fn create_request(id: i64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

pub fn create_notification(method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "method": method, "params": params })
}

pub fn create_did_open_notification(uri: &str, language_id: &str, text: &str) -> Value {
    create_notification(
        "textDocument/didOpen",
        json!({
            "textDocument": {
                "uri": uri,
                "languageId": language_id,
                "version": 1,
                "text": text
            }
        }),
    )
}

pub fn create_did_change_notification(uri: &str, version: i32, changes: Value) -> Value {
    create_notification(
        "textDocument/didChange",
        json!({
            "textDocument": { "uri": uri, "version": version },
            "contentChanges": changes
        }),
    )
}

pub fn create_did_close_notification(uri: &str) -> Value {
    create_notification(
        "textDocument/didClose",
        json!({ "textDocument": { "uri": uri } }),
    )
}

pub fn create_hover_request(id: i64, uri: &str, line: u32, character: u32) -> Value {
    create_request(
        id,
        "textDocument/hover",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character }
        }),
    )
}

pub fn create_folding_range_request(id: i64, uri: &str) -> Value {
    create_request(
        id,
        "textDocument/foldingRange",
        json!({ "textDocument": { "uri": uri } }),
    )
}

pub fn error_kind(response: &Value) -> &str {
    response["error"]["data"]["kind"]
        .as_str()
        .unwrap_or_else(|| panic!("expected an error response: {}", response))
}
