// src/config.rs
use crate::constants::{
    DEFAULT_BASE_URL, PAGE_CHUNK_LIMIT, RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS,
    RETRY_MAX_DELAY_MS,
};
use crate::error::AppError;
use crate::types::{ApiToken, BlockId, NotionId, PropertyPath, ValidatedUrl};
use clap::Parser;
use std::time::Duration;

/// Environment variable holding the `token_v2` session cookie.
pub const TOKEN_ENV_VAR: &str = "NOTION_TOKEN";

/// How the transport retries failed round trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
        }
    }
}

/// Everything a client needs to talk to the service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: ValidatedUrl,
    pub token: ApiToken,
    /// Records requested per page fetch
    pub page_limit: u32,
    pub vertical_columns: bool,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Default settings with the given session token.
    pub fn with_token(token: ApiToken) -> Result<Self, AppError> {
        Ok(Self {
            base_url: ValidatedUrl::parse_base(DEFAULT_BASE_URL)?,
            token,
            page_limit: PAGE_CHUNK_LIMIT,
            vertical_columns: false,
            retry: RetryPolicy::default(),
        })
    }
}

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Block ID or notion.so URL of the block to update
    pub block: String,

    /// Enable verbose logging (debug level) and dump the fetched tree to stderr
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Base URL of the v3 API
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Dotted property path to overwrite
    #[arg(long, default_value = "properties.title")]
    pub path: String,

    /// Attempts per request, including the first
    #[arg(long, default_value_t = RETRY_MAX_ATTEMPTS)]
    pub retries: u32,
}

/// Resolved configuration for the update tool.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub block_id: BlockId,
    pub path: PropertyPath,
    pub client: ClientConfig,
    pub verbose: bool,
}

impl CliConfig {
    /// Resolves the configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let token = std::env::var(TOKEN_ENV_VAR).map_err(|_| {
            AppError::MissingConfiguration(format!(
                "{} environment variable not set",
                TOKEN_ENV_VAR
            ))
        })?;
        Self::from_parts(cli, &token)
    }

    fn from_parts(cli: CommandLineInput, token: &str) -> Result<Self, AppError> {
        let mut client = ClientConfig::with_token(ApiToken::new(token)?)?;
        client.base_url = ValidatedUrl::parse_base(&cli.base_url)?;
        client.retry.max_attempts = cli.retries.max(1);

        Ok(CliConfig {
            block_id: NotionId::parse(&cli.block)?.to_block_id(),
            path: PropertyPath::parse(&cli.path)?,
            client,
            verbose: cli.verbose,
        })
    }
}
