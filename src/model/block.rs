use super::format::*;
use crate::constants::TITLE_PROPERTY;
use crate::error::AppError;
use crate::types::{BlockId, CollectionId, UserId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Macro for the string vocabularies that must survive values this client doesn't know yet
macro_rules! wire_vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(other) => other,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

wire_vocabulary! {
    /// Entity categories ("tables") the service keys records under.
    Table {
        Block => "block",
        Space => "space",
        NotionUser => "notion_user",
        Collection => "collection",
        CollectionView => "collection_view",
    }
}

wire_vocabulary! {
    /// Access level the requesting user has on a record.
    Role {
        Editor => "editor",
        ReadAndWrite => "read_and_write",
        CommentOnly => "comment_only",
        Reader => "reader",
        NoAccess => "none",
    }
}

/// A block's type together with the format payload that type carries.
///
/// Only the variant matching the wire `type` exists, so a page's format
/// can never be read as an image's.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Page(Option<FormatPage>),
    Text(Option<FormatText>),
    Header,
    SubHeader,
    SubSubHeader,
    Todo,
    BulletedList,
    NumberedList,
    Toggle,
    Quote,
    Callout,
    Divider,
    Code,
    Equation,
    Image(Option<FormatImage>),
    Video(Option<FormatVideo>),
    Bookmark(Option<FormatBookmark>),
    Embed,
    Gist,
    File,
    Column(Option<FormatColumn>),
    ColumnList,
    Table(Option<FormatTable>),
    CollectionView,
    CollectionViewPage,
    Other(String),
}

impl BlockKind {
    /// Reads the discriminator first, then decodes the matching format.
    pub fn decode(type_name: &str, format: Option<&Value>) -> Result<Self, serde_json::Error> {
        let kind = match type_name {
            "page" => Self::Page(typed_format(format)?),
            "text" => Self::Text(typed_format(format)?),
            "header" => Self::Header,
            "sub_header" => Self::SubHeader,
            "sub_sub_header" => Self::SubSubHeader,
            "to_do" => Self::Todo,
            "bulleted_list" => Self::BulletedList,
            "numbered_list" => Self::NumberedList,
            "toggle" => Self::Toggle,
            "quote" => Self::Quote,
            "callout" => Self::Callout,
            "divider" => Self::Divider,
            "code" => Self::Code,
            "equation" => Self::Equation,
            "image" => Self::Image(typed_format(format)?),
            "video" => Self::Video(typed_format(format)?),
            "bookmark" => Self::Bookmark(typed_format(format)?),
            "embed" => Self::Embed,
            "gist" => Self::Gist,
            "file" => Self::File,
            "column" => Self::Column(typed_format(format)?),
            "column_list" => Self::ColumnList,
            "table" => Self::Table(typed_format(format)?),
            "collection_view" => Self::CollectionView,
            "collection_view_page" => Self::CollectionViewPage,
            other => Self::Other(other.to_string()),
        };
        Ok(kind)
    }

    /// The wire `type` string.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Page(_) => "page",
            Self::Text(_) => "text",
            Self::Header => "header",
            Self::SubHeader => "sub_header",
            Self::SubSubHeader => "sub_sub_header",
            Self::Todo => "to_do",
            Self::BulletedList => "bulleted_list",
            Self::NumberedList => "numbered_list",
            Self::Toggle => "toggle",
            Self::Quote => "quote",
            Self::Callout => "callout",
            Self::Divider => "divider",
            Self::Code => "code",
            Self::Equation => "equation",
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Bookmark(_) => "bookmark",
            Self::Embed => "embed",
            Self::Gist => "gist",
            Self::File => "file",
            Self::Column(_) => "column",
            Self::ColumnList => "column_list",
            Self::Table(_) => "table",
            Self::CollectionView => "collection_view",
            Self::CollectionViewPage => "collection_view_page",
            Self::Other(name) => name,
        }
    }

    /// Kinds whose `properties.title` holds rich text.
    pub fn has_rich_text(&self) -> bool {
        matches!(
            self,
            Self::Page(_)
                | Self::Text(_)
                | Self::Header
                | Self::SubHeader
                | Self::SubSubHeader
                | Self::Todo
                | Self::BulletedList
                | Self::NumberedList
                | Self::Toggle
                | Self::Quote
                | Self::Callout
                | Self::Code
                | Self::Equation
                | Self::Bookmark(_)
        )
    }
}

fn typed_format<T: DeserializeOwned>(format: Option<&Value>) -> Result<Option<T>, serde_json::Error> {
    match format {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value).map(Some),
    }
}

/// A user's permission on a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub role: Role,
    #[serde(rename = "type")]
    pub permission_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// A node of the content tree, as stored in a record map.
///
/// The block lists its children by id only; `BlockArena::resolve` turns
/// those ids into a linked tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    /// Increases on every edit; writes are last-writer-wins.
    pub version: i64,
    pub kind: BlockKind,
    /// False once the block has been deleted.
    pub alive: bool,
    /// Child ids in display order.
    pub content_ids: Vec<BlockId>,
    pub parent_id: Option<String>,
    pub parent_table: Option<Table>,
    pub properties: Map<String, Value>,
    pub created_by: Option<UserId>,
    /// Milliseconds since the epoch.
    pub created_time: i64,
    pub last_edited_by: Option<UserId>,
    pub last_edited_time: i64,
    pub copied_from: Option<BlockId>,
    pub collection_id: Option<CollectionId>,
    pub discussion_ids: Vec<String>,
    /// Uploaded files, stored under `secure.notion-static.com/<id>/<name>`.
    pub file_ids: Vec<String>,
    pub ignore_block_count: bool,
    pub permissions: Vec<Permission>,
    pub view_ids: Vec<String>,
    /// The `format` object exactly as received.
    pub format_raw: Option<Value>,
}

impl Block {
    /// Get block type name
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    pub fn is_page(&self) -> bool {
        matches!(self.kind, BlockKind::Page(_))
    }

    /// A page whose parent is the space itself is a link to an existing page.
    pub fn is_link_to_page(&self) -> bool {
        self.is_page() && self.parent_table == Some(Table::Space)
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, BlockKind::Image(_))
    }

    pub fn is_code(&self) -> bool {
        matches!(self.kind, BlockKind::Code)
    }

    pub fn is_todo(&self) -> bool {
        matches!(self.kind, BlockKind::Todo)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, BlockKind::Text(_))
    }

    pub fn has_rich_text(&self) -> bool {
        self.kind.has_rich_text()
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_time)
    }

    pub fn updated_on(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_edited_time)
    }

    /// A raw property value, e.g. `property("title")`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn title_property(&self) -> Option<&Value> {
        self.property(TITLE_PROPERTY)
    }

    /// Minimal live block, for building record maps by hand.
    pub fn new(id: impl Into<BlockId>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            version: 1,
            kind,
            alive: true,
            content_ids: Vec::new(),
            parent_id: None,
            parent_table: None,
            properties: Map::new(),
            created_by: None,
            created_time: 0,
            last_edited_by: None,
            last_edited_time: 0,
            copied_from: None,
            collection_id: None,
            discussion_ids: Vec::new(),
            file_ids: Vec::new(),
            ignore_block_count: false,
            permissions: Vec::new(),
            view_ids: Vec::new(),
            format_raw: None,
        }
    }

    pub fn with_content(mut self, ids: &[&str]) -> Self {
        self.content_ids = ids.iter().map(|id| BlockId::new(*id)).collect();
        self
    }

    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }
}

/// The block exactly as the wire spells it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBlock {
    id: BlockId,
    #[serde(default)]
    version: i64,
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default = "default_alive")]
    alive: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_table: Option<Table>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_by: Option<UserId>,
    #[serde(default)]
    created_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_edited_by: Option<UserId>,
    #[serde(default)]
    last_edited_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    copied_from: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection_id: Option<CollectionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    discussion: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    file_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    ignore_block_count: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    view_ids: Vec<String>,
}

fn default_alive() -> bool {
    true
}

impl TryFrom<RawBlock> for Block {
    type Error = AppError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let kind = BlockKind::decode(&raw.block_type, raw.format.as_ref()).map_err(|source| {
            AppError::FormatDecode {
                block_id: raw.id.to_string(),
                block_type: raw.block_type.clone(),
                source,
            }
        })?;

        Ok(Block {
            id: raw.id,
            version: raw.version,
            kind,
            alive: raw.alive,
            content_ids: raw.content,
            parent_id: raw.parent_id,
            parent_table: raw.parent_table,
            properties: raw.properties,
            created_by: raw.created_by,
            created_time: raw.created_time,
            last_edited_by: raw.last_edited_by,
            last_edited_time: raw.last_edited_time,
            copied_from: raw.copied_from,
            collection_id: raw.collection_id,
            discussion_ids: raw.discussion,
            file_ids: raw.file_ids,
            ignore_block_count: raw.ignore_block_count,
            permissions: raw.permissions,
            view_ids: raw.view_ids,
            format_raw: raw.format,
        })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        RawBlock {
            block_type: block.kind.type_name().to_string(),
            id: block.id,
            version: block.version,
            alive: block.alive,
            content: block.content_ids,
            parent_id: block.parent_id,
            parent_table: block.parent_table,
            properties: block.properties,
            format: block.format_raw,
            created_by: block.created_by,
            created_time: block.created_time,
            last_edited_by: block.last_edited_by,
            last_edited_time: block.last_edited_time,
            copied_from: block.copied_from,
            collection_id: block.collection_id,
            discussion: block.discussion_ids,
            file_ids: block.file_ids,
            ignore_block_count: block.ignore_block_count,
            permissions: block.permissions,
            view_ids: block.view_ids,
        }
    }
}
