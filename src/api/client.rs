// src/api/client.rs
//! The three boundary operations, built on a `Transport`.

use super::pagination::fetch_all_chunks;
use super::parser::{check_status, parse_api_response, parse_record_values};
use super::transport::{HttpTransport, Transport};
use super::wire::{
    Cursor, GetRecordValuesRequest, LoadPageChunkRequest, LoadPageChunkResponse, Operation,
    RecordDescriptor, RecordRef, SubmitTransactionRequest,
};
use crate::config::ClientConfig;
use crate::constants::{
    GET_RECORD_VALUES, LOAD_PAGE_CHUNK, PAGE_CHUNK_LIMIT, SUBMIT_TRANSACTION,
};
use crate::error::{AppError, Result};
use crate::model::{merge_record_maps, BlockTree, RecordMap};
use crate::types::{BlockId, PropertyPath};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Client for the v3 API.
///
/// Holds no state between calls: each fetch builds its own record map.
#[derive(Clone)]
pub struct NotionClient {
    transport: Arc<dyn Transport>,
    page_limit: u32,
    vertical_columns: bool,
}

impl NotionClient {
    /// Creates a client that talks HTTP according to `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport))
            .with_page_limit(config.page_limit)
            .with_vertical_columns(config.vertical_columns))
    }

    /// Creates a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            page_limit: PAGE_CHUNK_LIMIT,
            vertical_columns: false,
        }
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_vertical_columns(mut self, vertical_columns: bool) -> Self {
        self.vertical_columns = vertical_columns;
        self
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<super::ApiResponse<String>> {
        let body = to_body(endpoint, body)?;
        self.transport.post(endpoint, &body).await
    }

    /// Fetches one page of records starting at `cursor`.
    pub async fn load_page_chunk(
        &self,
        page_id: &BlockId,
        cursor: Cursor,
    ) -> Result<LoadPageChunkResponse> {
        let request = LoadPageChunkRequest {
            page_id: page_id.clone(),
            limit: self.page_limit,
            cursor,
            vertical_columns: self.vertical_columns,
        };
        let response = self.post(LOAD_PAGE_CHUNK, &request).await?;
        parse_api_response(response, "loadPageChunk response")
    }

    /// Fetches every page of records under `root_id`, in fetch order.
    pub async fn fetch_record_maps(&self, root_id: &BlockId) -> Result<Vec<RecordMap>> {
        fetch_all_chunks(|cursor| self.load_page_chunk(root_id, cursor)).await
    }

    /// Fetches, merges and resolves the tree rooted at `root_id`.
    pub async fn fetch_block_tree(&self, root_id: &BlockId) -> Result<BlockTree> {
        let chunks = self.fetch_record_maps(root_id).await?;
        let page_count = chunks.len();
        let records = merge_record_maps(chunks);
        let tree = BlockTree::resolve(root_id.as_str(), records)?;

        log::info!(
            "Fetched block {} in {} page(s): {} records, {} blocks in tree",
            root_id,
            page_count,
            tree.records.len(),
            tree.root.node_count()
        );
        Ok(tree)
    }

    /// Looks up records by (table, id); results are in request order.
    pub async fn fetch_record_descriptors(
        &self,
        refs: &[RecordRef],
    ) -> Result<Vec<RecordDescriptor>> {
        let request = GetRecordValuesRequest {
            requests: refs.to_vec(),
        };
        let response = self.post(GET_RECORD_VALUES, &request).await?;
        parse_record_values(response, refs)
    }

    /// Overwrites the value at `path` on a block.
    ///
    /// A blind write: `version` is not checked and nothing is validated locally.
    pub async fn set_property(
        &self,
        block_id: &BlockId,
        path: &PropertyPath,
        value: &str,
    ) -> Result<()> {
        let request = SubmitTransactionRequest {
            operations: vec![Operation::set(block_id, path, value)],
        };
        let response = self.post(SUBMIT_TRANSACTION, &request).await?;
        check_status(response)?;

        log::debug!("Set {} on block {}", path, block_id);
        Ok(())
    }
}

fn to_body<B: Serialize>(endpoint: &str, body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|source| AppError::Serialization {
        context: format!("{} request", endpoint),
        source,
    })
}

#[async_trait::async_trait]
impl super::NotionRepository for NotionClient {
    async fn fetch_block_tree(&self, root_id: &BlockId) -> Result<BlockTree> {
        NotionClient::fetch_block_tree(self, root_id).await
    }

    async fn fetch_record_descriptors(&self, refs: &[RecordRef]) -> Result<Vec<RecordDescriptor>> {
        NotionClient::fetch_record_descriptors(self, refs).await
    }

    async fn set_property(&self, block_id: &BlockId, path: &PropertyPath, value: &str) -> Result<()> {
        NotionClient::set_property(self, block_id, path, value).await
    }
}
