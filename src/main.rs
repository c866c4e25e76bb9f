// src/main.rs
//! Overwrites a block's text with whatever is piped to stdin.
//!
//! ```text
//! echo "New title" | NOTION_TOKEN=... update-block-text <block id or URL>
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_recordmap::{
    CliConfig, CommandLineInput, NotionClient, NotionRepository, RecordRef, RecordValue,
};
use std::fs;
use std::io::{IsTerminal, Read};

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("update_block_text.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // stdout carries the echoed text, so logs go to stderr
    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Reads the replacement text from a piped stdin.
fn read_piped_input() -> anyhow::Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!(
            "stdin appears to be a tty device. This tool is meant to be invoked and have stdin provided by a pipe"
        );
    }

    let mut data = String::new();
    stdin
        .read_to_string(&mut data)
        .context("Failed to read stdin")?;
    Ok(data.trim().to_string())
}

async fn run(config: CliConfig) -> anyhow::Result<()> {
    let content = read_piped_input()?;
    let client = NotionClient::new(&config.client)?;
    let repository: &dyn NotionRepository = &client;

    let descriptor = repository
        .fetch_record_descriptors(&[RecordRef::block(&config.block_id)])
        .await?
        .into_iter()
        .next()
        .context("getRecordValues returned no results")?;
    let block_id = match descriptor.require(config.block_id.as_str())? {
        RecordValue::Block(block) => block.id,
        _ => bail!("record {} is not a block", config.block_id),
    };

    let tree = repository.fetch_block_tree(&block_id).await?;
    if config.verbose {
        let dump = serde_json::to_string_pretty(tree.root.as_ref())?;
        eprintln!("{}", dump);
    }

    repository
        .set_property(&block_id, &config.path, &content)
        .await?;

    // Echo back out for editor use
    println!("{}", content);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CommandLineInput::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    let result = match CliConfig::resolve(cli) {
        Ok(config) => run(config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
