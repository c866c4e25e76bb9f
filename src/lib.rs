// src/lib.rs
//! notion-recordmap: a client for the notion.so v3 API that pages through
//! record chunks, merges them, and resolves the result into a block tree.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`
//! - **Configuration**: `ClientConfig`, `RetryPolicy`, `CliConfig`
//! - **Record model**: `Block`, `BlockKind`, `InlineBlock`, `RecordMap`, `BlockTree`
//! - **Domain types**: `BlockId`, `NotionId`, `ApiToken`, `PropertyPath`
//! - **API client**: `NotionClient`, `NotionRepository`, `Transport`

pub mod api;
mod config;
mod constants;
mod error;
mod error_recovery;
pub mod model;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, Result};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CliConfig, ClientConfig, CommandLineInput, RetryPolicy, TOKEN_ENV_VAR};
pub use crate::constants::{DEFAULT_BASE_URL, PAGE_CHUNK_LIMIT};

// --- Record Model ---
pub use crate::model::{
    encode_inline_blocks, merge_record_maps, parse_inline_blocks, plain_text, AttrFlags, Block,
    BlockArena, BlockDetails, BlockKind, BlockNode, BlockTree, Collection, CollectionView,
    CollectionViewInfo, Date, DateKind, InlineBlock, InlineDecodeError, InlineTarget, Record,
    RecordMap, Role, Space, Table, User,
};

// --- Domain Types ---
pub use crate::types::{
    ApiToken, BlockId, CollectionId, CollectionViewId, NotionId, PropertyPath, SpaceId, UserId,
    ValidatedUrl,
};

// --- API Client ---
pub use crate::api::wire::{RecordDescriptor, RecordRef, RecordValue};
pub use crate::api::{ApiResponse, HttpTransport, NotionClient, NotionRepository, Transport};
