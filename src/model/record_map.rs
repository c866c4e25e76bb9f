// src/model/record_map.rs
//! Records keyed by category and id, and the merger that consolidates the
//! partial maps returned by successive page fetches.

use super::block::{Block, Role, Table};
use super::inline::{parse_inline_blocks, plain_text, InlineDecodeError};
use crate::types::{BlockId, CollectionId, CollectionViewId, SpaceId, UserId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record together with the caller's access level.
///
/// `value` is absent when the record was not found or is not readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub value: Option<T>,
}

impl<T> Record<T> {
    pub fn new(role: Role, value: T) -> Self {
        Self {
            role: Some(role),
            value: Some(value),
        }
    }

    pub fn unavailable(role: Role) -> Self {
        Self {
            role: Some(role),
            value: None,
        }
    }

    pub fn role_name(&self) -> &str {
        self.role.as_ref().map(Role::as_str).unwrap_or("unknown")
    }
}

/// A workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An account, stored under the `notion_user` category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn full_name(&self) -> String {
        [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A database: its schema plus the views over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    /// Rich text in the compact span encoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_table: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    /// The collection name flattened to plain text.
    pub fn name_text(&self) -> Result<Option<String>, InlineDecodeError> {
        match &self.name {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => Ok(Some(plain_text(&parse_inline_blocks(raw)?))),
        }
    }
}

/// One view (table, board, list...) over a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionView {
    pub id: CollectionViewId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_table: Option<Table>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Records of the five categories, each keyed by id in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMap {
    #[serde(default)]
    pub block: IndexMap<BlockId, Record<Block>>,
    #[serde(default)]
    pub space: IndexMap<SpaceId, Record<Space>>,
    #[serde(default)]
    pub notion_user: IndexMap<UserId, Record<User>>,
    #[serde(default)]
    pub collection: IndexMap<CollectionId, Record<Collection>>,
    #[serde(default)]
    pub collection_view: IndexMap<CollectionViewId, Record<CollectionView>>,
}

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every record of `other` into `self`, replacing records with the same id.
    pub fn absorb(&mut self, other: RecordMap) {
        self.block.extend(other.block);
        self.space.extend(other.space);
        self.notion_user.extend(other.notion_user);
        self.collection.extend(other.collection);
        self.collection_view.extend(other.collection_view);
    }

    /// Merge `other` on top of `self`.
    pub fn merge(mut self, other: RecordMap) -> Self {
        self.absorb(other);
        self
    }

    /// A readable block by id.
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.block.get(id).and_then(|record| record.value.as_ref())
    }

    pub fn insert_block(&mut self, role: Role, block: Block) {
        self.block.insert(block.id.clone(), Record::new(role, block));
    }

    /// Total number of records across all categories.
    pub fn len(&self) -> usize {
        self.block.len()
            + self.space.len()
            + self.notion_user.len()
            + self.collection.len()
            + self.collection_view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consolidates partial maps in fetch order; the last map holding an id wins.
pub fn merge_record_maps<I>(maps: I) -> RecordMap
where
    I: IntoIterator<Item = RecordMap>,
{
    maps.into_iter().fold(RecordMap::new(), RecordMap::merge)
}
