// src/constants.rs
//! Domain constants that define the operational boundaries of the client.

// ---------------------------------------------------------------------------
// v3 API boundaries
// ---------------------------------------------------------------------------

/// Base endpoint of the internal API every request is made against.
pub const DEFAULT_BASE_URL: &str = "https://www.notion.so/api/v3/";

/// How many records a single `loadPageChunk` request asks for.
pub const PAGE_CHUNK_LIMIT: u32 = 50;

/// Endpoint names, relative to the base URL.
pub const LOAD_PAGE_CHUNK: &str = "loadPageChunk";
pub const GET_RECORD_VALUES: &str = "getRecordValues";
pub const SUBMIT_TRANSACTION: &str = "submitTransaction";

/// The only mutation command this client issues.
pub const SET_COMMAND: &str = "set";

// ---------------------------------------------------------------------------
// Record vocabulary
// ---------------------------------------------------------------------------

/// Text the service substitutes for an embedded @mention or @date.
pub const INLINE_AT: &str = "‣";

/// Property holding a block's rich-text title.
pub const TITLE_PROPERTY: &str = "title";

/// Value of the `checked` property on a ticked to-do.
pub const CHECKED_YES: &str = "Yes";

/// Prefix of uploaded files that are only reachable through the image proxy.
pub const SECURE_FILE_PREFIX: &str = "https://s3-us-west-2.amazonaws.com/secure.notion-static.com/";

/// Image proxy that makes secure uploads and relative covers reachable.
pub const IMAGE_PROXY_PREFIX: &str = "https://www.notion.so/image/";

/// Host that relative page-cover paths resolve against.
pub const NOTION_HOST: &str = "https://www.notion.so";

// ---------------------------------------------------------------------------
// Tree resolution
// ---------------------------------------------------------------------------

/// Maximum nesting depth of a resolved tree, root included.
///
/// Deeper `content` chains fail resolution with `DepthExceeded`.
pub const MAX_RESOLVE_DEPTH: usize = 100;

// ---------------------------------------------------------------------------
// Transport retry defaults
// ---------------------------------------------------------------------------

/// Attempts per request, including the first.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles on each further attempt.
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;

/// Upper bound on the delay between attempts.
pub const RETRY_MAX_DELAY_MS: u64 = 5_000;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing undecodable response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 500;
