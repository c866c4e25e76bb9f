// src/api/pagination.rs
//! Cursor-driven page fetching.

use super::wire::{Cursor, LoadPageChunkResponse};
use crate::error::Result;
use crate::model::RecordMap;

/// Fetches pages until the service returns an empty cursor stack.
///
/// Requests are strictly sequential: each one carries the cursor from the
/// previous response, unmodified. The first failure aborts the whole fetch.
pub async fn fetch_all_chunks<F, Fut>(mut fetch_fn: F) -> Result<Vec<RecordMap>>
where
    F: FnMut(Cursor) -> Fut,
    Fut: std::future::Future<Output = Result<LoadPageChunkResponse>>,
{
    let mut chunks = Vec::new();
    let mut cursor = Cursor::start();

    loop {
        let response = fetch_fn(cursor).await?;

        log::debug!(
            "Page {}: {} blocks, cursor depth {}",
            chunks.len() + 1,
            response.record_map.block.len(),
            response.cursor.depth()
        );

        chunks.push(response.record_map);
        if response.cursor.is_final() {
            break;
        }
        cursor = response.cursor;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::model::{Block, BlockKind, Role};
    use crate::api::wire::StackPosition;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    fn cursor_at(id: &str) -> Cursor {
        let mut marker = serde_json::Map::new();
        marker.insert("table".to_string(), "block".into());
        marker.insert("id".to_string(), id.into());
        marker.insert("index".to_string(), 0.into());
        Cursor {
            stack: vec![vec![StackPosition::from(marker)]],
        }
    }

    fn chunk(block_id: &str, cursor: Cursor) -> LoadPageChunkResponse {
        let mut record_map = RecordMap::new();
        record_map.insert_block(Role::Editor, Block::new(block_id, BlockKind::Text(None)));
        LoadPageChunkResponse { record_map, cursor }
    }

    #[tokio::test]
    async fn follows_cursor_until_empty() {
        let seen = &Mutex::new(Vec::new());
        let mut pages = vec![
            chunk("a", cursor_at("a")),
            chunk("b", cursor_at("b")),
            chunk("c", Cursor::start()),
        ]
        .into_iter();

        let chunks = fetch_all_chunks(move |cursor| {
            seen.lock().unwrap().push(cursor);
            let next = pages.next();
            async move { next.ok_or_else(|| AppError::MissingConfiguration("no page".into())) }
        })
        .await
        .unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Cursor::start(), cursor_at("a"), cursor_at("b")]
        );
        assert!(chunks[2].block("c").is_some());
    }

    #[tokio::test]
    async fn failure_aborts_without_partial_result() {
        let mut calls = 0;
        let result = fetch_all_chunks(|_| {
            calls += 1;
            let outcome = if calls == 1 {
                Ok(chunk("a", cursor_at("a")))
            } else {
                Err(AppError::Transport {
                    url: "loadPageChunk".to_string(),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".to_string(),
                })
            };
            async move { outcome }
        })
        .await;

        assert!(matches!(result, Err(AppError::Transport { .. })));
        assert_eq!(calls, 2);
    }
}
