// src/api/mod.rs
//! v3 API interaction: transport, wire shapes, response parsing,
//! pagination and the client facade.

mod client;
mod pagination;
pub mod parser;
mod transport;
pub mod wire;

use crate::error::Result;
use crate::model::BlockTree;
use crate::types::{BlockId, PropertyPath};
use wire::{RecordDescriptor, RecordRef};

/// The operations callers depend on, independent of HTTP details.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    /// Pages, merges and resolves the tree rooted at `root_id`.
    async fn fetch_block_tree(&self, root_id: &BlockId) -> Result<BlockTree>;

    /// Looks up records by (table, id) without resolving anything.
    async fn fetch_record_descriptors(&self, refs: &[RecordRef]) -> Result<Vec<RecordDescriptor>>;

    /// Blindly overwrites one property path of a block.
    async fn set_property(&self, block_id: &BlockId, path: &PropertyPath, value: &str) -> Result<()>;
}

pub use client::NotionClient;
pub use pagination::fetch_all_chunks;
pub use transport::{extract_response_text, ApiResponse, HttpTransport, Transport};
pub use wire::{Cursor, LoadPageChunkResponse, Operation, RecordValue, StackPosition};
