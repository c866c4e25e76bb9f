// tests/common/mod.rs
//! Stub transport shared by the integration tests.
#![allow(dead_code)]

use notion_recordmap::{ApiResponse, AppError, NotionClient, Transport};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One request as the client sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub body: Value,
}

/// Replays canned responses in order and records every request.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<(StatusCode, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a 200 response.
    pub fn respond(self, body: Value) -> Self {
        self.respond_with_status(StatusCode::OK, body)
    }

    pub fn respond_with_status(mut self, status: StatusCode, body: Value) -> Self {
        self.responses.get_mut().push_back((status, body));
        self
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn post(&self, endpoint: &str, body: &Value) -> Result<ApiResponse<String>, AppError> {
        self.requests.lock().await.push(RecordedRequest {
            endpoint: endpoint.to_string(),
            body: body.clone(),
        });

        let url = format!("https://www.notion.so/api/v3/{}", endpoint);
        match self.responses.lock().await.pop_front() {
            Some((status, body)) => Ok(ApiResponse {
                data: body.to_string(),
                status,
                url,
            }),
            None => Err(AppError::Transport {
                url,
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "no canned response left".to_string(),
            }),
        }
    }
}

/// A client over the stub, keeping a handle to inspect requests.
pub fn client_with(stub: StubTransport) -> (NotionClient, Arc<StubTransport>) {
    let stub = Arc::new(stub);
    let client = NotionClient::with_transport(stub.clone());
    (client, stub)
}

/// A live block record as the service sends it.
pub fn block_record(id: &str, block_type: &str, title: &str, content: &[&str]) -> Value {
    json!({
        "role": "editor",
        "value": {
            "id": id,
            "version": 1,
            "type": block_type,
            "alive": true,
            "properties": {"title": [[title]]},
            "content": content,
            "parent_table": "block",
            "created_time": 1551225600000i64,
            "last_edited_time": 1551225600000i64
        }
    })
}

/// A `loadPageChunk` response holding `blocks` and continuing at `cursor_ids`.
pub fn chunk(blocks: &[(&str, Value)], cursor_ids: &[&str]) -> Value {
    let block_map: serde_json::Map<String, Value> = blocks
        .iter()
        .map(|(id, record)| (id.to_string(), record.clone()))
        .collect();
    let stack: Vec<Value> = cursor_ids
        .iter()
        .map(|id| json!([{"table": "block", "id": id, "index": 0}]))
        .collect();
    json!({
        "recordMap": {"block": block_map},
        "cursor": {"stack": stack}
    })
}
