// src/model/mod.rs
//! Typed record model: rich text, blocks and their formats, record maps,
//! and the resolved block tree.

mod block;
pub mod format;
mod inline;
mod record_map;
mod tree;

pub use block::{Block, BlockKind, Permission, Role, Table};
pub use format::{
    accessible_image_url, FormatBookmark, FormatColumn, FormatImage, FormatPage, FormatTable,
    FormatText, FormatVideo, TableProperty,
};
pub use inline::{
    encode_inline_blocks, parse_inline_blocks, plain_text, AttrFlags, Date, DateKind,
    InlineBlock, InlineDecodeError, InlinePosition, InlineTarget,
};
pub use record_map::{
    merge_record_maps, Collection, CollectionView, Record, RecordMap, Space, User,
};
pub use tree::{BlockArena, BlockDetails, BlockNode, BlockTree, CollectionViewInfo};
