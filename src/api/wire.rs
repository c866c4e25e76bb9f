// src/api/wire.rs
//! Request and response bodies of the v3 endpoints this client calls.
//!
//! Field names and nesting follow the service exactly; the request bodies
//! are serialized byte-for-byte as the service's own web client sends them.

use crate::constants::SET_COMMAND;
use crate::error::{AppError, Result};
use crate::model::{
    Block, Collection, CollectionView, Record, RecordMap, Space, Table, User,
};
use crate::types::{BlockId, PropertyPath};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One marker of a cursor's position stack.
///
/// Kept as the raw object the service sent so it goes back out with the
/// same keys, key order and values. The accessors only read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackPosition(Map<String, Value>);

impl StackPosition {
    pub fn table(&self) -> Option<&str> {
        self.0.get("table").and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn index(&self) -> Option<&Value> {
        self.0.get("index")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for StackPosition {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Opaque pagination continuation; an empty stack means no more pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub stack: Vec<Vec<StackPosition>>,
}

impl Cursor {
    /// The cursor of the first request.
    pub fn start() -> Self {
        Self::default()
    }

    pub fn is_final(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Body of `loadPageChunk`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPageChunkRequest {
    pub page_id: BlockId,
    pub limit: u32,
    pub cursor: Cursor,
    pub vertical_columns: bool,
}

/// Response of `loadPageChunk`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPageChunkResponse {
    #[serde(default)]
    pub record_map: RecordMap,
    #[serde(default)]
    pub cursor: Cursor,
}

/// A (table, id) lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: String,
    pub table: Table,
}

impl RecordRef {
    pub fn new(table: Table, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            table,
        }
    }

    pub fn block(id: &BlockId) -> Self {
        Self::new(Table::Block, id.as_str())
    }
}

/// Body of `getRecordValues`.
#[derive(Debug, Clone, Serialize)]
pub struct GetRecordValuesRequest {
    pub requests: Vec<RecordRef>,
}

/// Response of `getRecordValues`; results are positional with the requests.
#[derive(Debug, Clone, Deserialize)]
pub struct GetRecordValuesResponse {
    #[serde(default)]
    pub results: Vec<Record<Value>>,
}

/// A record value decoded according to the table it was requested from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Block(Block),
    Space(Space),
    User(User),
    Collection(Collection),
    CollectionView(CollectionView),
    Other(Value),
}

impl RecordValue {
    pub fn decode(table: &Table, value: &Value) -> std::result::Result<Self, serde_json::Error> {
        Ok(match table {
            Table::Block => Self::Block(Block::deserialize(value)?),
            Table::Space => Self::Space(Space::deserialize(value)?),
            Table::NotionUser => Self::User(User::deserialize(value)?),
            Table::Collection => Self::Collection(Collection::deserialize(value)?),
            Table::CollectionView => Self::CollectionView(CollectionView::deserialize(value)?),
            Table::Other(_) => Self::Other(value.clone()),
        })
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(block) => Some(block),
            _ => None,
        }
    }
}

/// A looked-up record: the role plus its decoded value, if readable.
pub type RecordDescriptor = Record<RecordValue>;

impl RecordDescriptor {
    /// The value, or `RecordUnavailable` naming the role the service returned.
    pub fn require(self, id: &str) -> Result<RecordValue> {
        let role = self.role_name().to_string();
        self.value.ok_or_else(|| AppError::RecordUnavailable {
            id: id.to_string(),
            role,
        })
    }
}

/// One edit inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub id: String,
    pub table: Table,
    pub path: Vec<String>,
    pub command: String,
    pub args: Vec<Vec<String>>,
}

impl Operation {
    /// Overwrites the value at `path` on a block.
    pub fn set(block_id: &BlockId, path: &PropertyPath, value: impl Into<String>) -> Self {
        Self {
            id: block_id.to_string(),
            table: Table::Block,
            path: path.segments(),
            command: SET_COMMAND.to_string(),
            args: vec![vec![value.into()]],
        }
    }
}

/// Body of `submitTransaction`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitTransactionRequest {
    pub operations: Vec<Operation>,
}
