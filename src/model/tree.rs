// src/model/tree.rs
//! Block arena and the resolver that links it into a rooted tree.
//!
//! The arena owns every live block by id, along with the collections and
//! views that collection-view blocks point at. Resolution walks
//! `content_ids` from a root and builds a separate tree of `BlockNode`s;
//! the arena is left untouched, so it can be updated and resolved again.

use super::block::{Block, BlockKind, Table};
use super::format::accessible_image_url;
use super::inline::{parse_inline_blocks, plain_text, InlineBlock};
use super::record_map::{Collection, CollectionView, Record, RecordMap};
use crate::constants::{CHECKED_YES, MAX_RESOLVE_DEPTH};
use crate::error::{AppError, Result};
use crate::types::{BlockId, CollectionId, CollectionViewId};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Live blocks by id, plus the collection records they reference.
#[derive(Debug, Clone, Default)]
pub struct BlockArena {
    blocks: IndexMap<BlockId, Arc<Block>>,
    collections: IndexMap<CollectionId, Arc<Collection>>,
    views: IndexMap<CollectionViewId, Arc<CollectionView>>,
}

/// Records of one category that carry a value.
fn readable<K, T>(records: &IndexMap<K, Record<T>>) -> IndexMap<K, Arc<T>>
where
    K: Clone + Eq + Hash,
    T: Clone,
{
    records
        .iter()
        .filter_map(|(id, record)| {
            record
                .value
                .as_ref()
                .map(|value| (id.clone(), Arc::new(value.clone())))
        })
        .collect()
}

impl BlockArena {
    /// Readable records of the map; records without a value are left out.
    pub fn from_record_map(records: &RecordMap) -> Self {
        Self {
            blocks: readable(&records.block),
            collections: readable(&records.collection),
            views: readable(&records.collection_view),
        }
    }

    /// Replaces or adds a single block.
    pub fn upsert(&mut self, block: Block) {
        self.blocks.insert(block.id.clone(), Arc::new(block));
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Block>> {
        self.blocks.get(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Resolves the tree rooted at `root`.
    ///
    /// A child referenced twice is resolved once and shared.
    pub fn resolve(&self, root: &str) -> Result<Arc<BlockNode>> {
        self.resolve_with_max_depth(root, MAX_RESOLVE_DEPTH)
    }

    /// Like `resolve`, failing with `DepthExceeded` below `max_depth` levels.
    pub fn resolve_with_max_depth(&self, root: &str, max_depth: usize) -> Result<Arc<BlockNode>> {
        let block = self.get(root).ok_or_else(|| AppError::MissingRoot {
            id: root.to_string(),
        })?;
        if !block.alive {
            return Err(AppError::DeletedBlock {
                id: root.to_string(),
            });
        }

        let mut resolver = Resolver {
            arena: self,
            max_depth,
            resolved: HashMap::new(),
        };
        resolver.resolve_node(block, &ResolveContext::default())
    }
}

/// What is on the current resolution path.
#[derive(Debug, Clone, Default)]
struct ResolveContext {
    /// Ids on the path, persistent for cheap cloning
    in_progress: im::HashSet<BlockId>,
    path: im::Vector<BlockId>,
}

impl ResolveContext {
    fn contains(&self, id: &BlockId) -> bool {
        self.in_progress.contains(id)
    }

    fn depth(&self) -> usize {
        self.path.len()
    }

    /// Returns a new context with the given ID pushed onto the path.
    fn with_entered(&self, id: BlockId) -> Self {
        let mut next = self.clone();
        next.in_progress.insert(id.clone());
        next.path.push_back(id);
        next
    }

    fn cycle_error(&self, id: &BlockId) -> AppError {
        let mut path: Vec<String> = self.path.iter().map(|step| step.to_string()).collect();
        path.push(id.to_string());
        AppError::CycleDetected {
            id: id.to_string(),
            path,
        }
    }
}

struct Resolver<'a> {
    arena: &'a BlockArena,
    max_depth: usize,
    resolved: HashMap<BlockId, Arc<BlockNode>>,
}

impl Resolver<'_> {
    fn resolve_node(&mut self, block: &Arc<Block>, context: &ResolveContext) -> Result<Arc<BlockNode>> {
        if let Some(node) = self.resolved.get(&block.id) {
            return Ok(Arc::clone(node));
        }

        let arena = self.arena;
        let context = context.with_entered(block.id.clone());
        let mut content = Vec::with_capacity(block.content_ids.len());

        for child_id in &block.content_ids {
            if context.contains(child_id) {
                return Err(context.cycle_error(child_id));
            }
            let child = arena
                .get(child_id.as_str())
                .ok_or_else(|| AppError::MissingBlock {
                    id: child_id.to_string(),
                })?;
            if !child.alive {
                log::warn!(
                    "Skipping deleted block {} referenced by {}",
                    child_id,
                    block.id
                );
                continue;
            }
            if context.depth() >= self.max_depth {
                return Err(AppError::DepthExceeded {
                    id: child_id.to_string(),
                    limit: self.max_depth,
                });
            }
            content.push(self.resolve_node(child, &context)?);
        }

        let inline_content = decode_title(block)?;
        let details = BlockDetails::derive(block, &inline_content, arena)?;

        let node = Arc::new(BlockNode {
            block: Arc::clone(block),
            content,
            inline_content,
            details,
        });
        self.resolved.insert(block.id.clone(), Arc::clone(&node));
        Ok(node)
    }
}

fn decode_title(block: &Block) -> Result<Vec<InlineBlock>> {
    if !block.has_rich_text() {
        return Ok(Vec::new());
    }
    match block.title_property() {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(raw) => parse_inline_blocks(raw).map_err(|source| AppError::InlineDecode {
            block_id: block.id.to_string(),
            source,
        }),
    }
}

/// Fields derived from a block's type and properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockDetails {
    None,
    Page {
        title: String,
    },
    Todo {
        checked: bool,
    },
    Code {
        code: String,
        language: Option<String>,
    },
    Image {
        source: Option<String>,
        image_url: Option<String>,
    },
    Bookmark {
        link: Option<String>,
        description: Option<String>,
        title: String,
    },
    Video {
        source: Option<String>,
    },
    File {
        source: Option<String>,
        file_size: Option<String>,
    },
    /// Embeds and gists.
    Embed {
        source: Option<String>,
    },
    CollectionView {
        views: Vec<CollectionViewInfo>,
    },
}

/// One view of a collection-view block, paired with the collection it shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionViewInfo {
    pub view: Arc<CollectionView>,
    /// Absent when the block names no collection.
    pub collection: Option<Arc<Collection>>,
}

impl BlockDetails {
    fn derive(block: &Block, title: &[InlineBlock], arena: &BlockArena) -> Result<Self> {
        let details = match &block.kind {
            BlockKind::Page(_) => BlockDetails::Page {
                title: plain_text(title),
            },
            BlockKind::Todo => BlockDetails::Todo {
                checked: first_text(block, "checked").as_deref() == Some(CHECKED_YES),
            },
            BlockKind::Code => BlockDetails::Code {
                code: plain_text(title),
                language: first_text(block, "language"),
            },
            BlockKind::Image(format) => {
                let source = first_text(block, "source").or_else(|| {
                    format
                        .as_ref()
                        .and_then(|format| format.display_source.clone())
                });
                let image_url = source.as_deref().map(accessible_image_url);
                BlockDetails::Image { source, image_url }
            }
            BlockKind::Bookmark(_) => BlockDetails::Bookmark {
                link: first_text(block, "link"),
                description: first_text(block, "description"),
                title: plain_text(title),
            },
            BlockKind::Video(format) => BlockDetails::Video {
                source: first_text(block, "source").or_else(|| {
                    format
                        .as_ref()
                        .and_then(|format| format.display_source.clone())
                }),
            },
            BlockKind::File => BlockDetails::File {
                source: first_text(block, "source"),
                file_size: first_text(block, "size"),
            },
            BlockKind::Embed | BlockKind::Gist => BlockDetails::Embed {
                source: first_text(block, "source").or_else(|| raw_display_source(block)),
            },
            BlockKind::CollectionView | BlockKind::CollectionViewPage => {
                BlockDetails::CollectionView {
                    views: collection_views(block, arena)?,
                }
            }
            _ => BlockDetails::None,
        };
        Ok(details)
    }
}

/// `format.display_source` of kinds without a typed format.
fn raw_display_source(block: &Block) -> Option<String> {
    block
        .format_raw
        .as_ref()?
        .get("display_source")?
        .as_str()
        .map(str::to_string)
}

/// Pairs each of the block's views with its collection, in `view_ids` order.
fn collection_views(block: &Block, arena: &BlockArena) -> Result<Vec<CollectionViewInfo>> {
    let collection = match &block.collection_id {
        Some(id) => {
            let collection = arena
                .collections
                .get(id)
                .ok_or_else(|| AppError::MissingRecord {
                    table: Table::Collection.to_string(),
                    id: id.to_string(),
                })?;
            Some(Arc::clone(collection))
        }
        None => None,
    };

    block
        .view_ids
        .iter()
        .map(|view_id| {
            let view = arena
                .views
                .get(view_id.as_str())
                .ok_or_else(|| AppError::MissingRecord {
                    table: Table::CollectionView.to_string(),
                    id: view_id.clone(),
                })?;
            Ok(CollectionViewInfo {
                view: Arc::clone(view),
                collection: collection.clone(),
            })
        })
        .collect()
}

/// First text of a simple property such as `[["Yes"]]`.
fn first_text(block: &Block, name: &str) -> Option<String> {
    block
        .property(name)?
        .get(0)?
        .get(0)?
        .as_str()
        .map(str::to_string)
}

/// A resolved block with its children linked in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockNode {
    pub block: Arc<Block>,
    pub content: Vec<Arc<BlockNode>>,
    pub inline_content: Vec<InlineBlock>,
    pub details: BlockDetails,
}

impl BlockNode {
    pub fn id(&self) -> &BlockId {
        &self.block.id
    }

    /// The title as plain text.
    pub fn text(&self) -> String {
        plain_text(&self.inline_content)
    }

    /// Number of distinct nodes reachable from this one, itself included.
    pub fn node_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.count_into(&mut seen);
        seen.len()
    }

    fn count_into<'a>(&'a self, seen: &mut std::collections::HashSet<&'a BlockId>) {
        if seen.insert(self.id()) {
            for child in &self.content {
                child.count_into(seen);
            }
        }
    }
}

/// The outcome of a full fetch: the resolved tree plus every record fetched along the way.
#[derive(Debug, Clone)]
pub struct BlockTree {
    pub root: Arc<BlockNode>,
    pub records: RecordMap,
}

impl BlockTree {
    /// Builds the arena from `records` and resolves `root` against it.
    pub fn resolve(root: &str, records: RecordMap) -> Result<Self> {
        let arena = BlockArena::from_record_map(&records);
        let root = arena.resolve(root)?;
        Ok(Self { root, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::Role;
    use crate::model::inline::AttrFlags;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(id: &str, children: &[&str]) -> Block {
        Block::new(id, BlockKind::Text(None))
            .with_content(children)
            .with_property("title", json!([[id]]))
    }

    fn arena(blocks: Vec<Block>) -> BlockArena {
        let mut records = RecordMap::new();
        for block in blocks {
            records.insert_block(Role::Editor, block);
        }
        BlockArena::from_record_map(&records)
    }

    fn child_ids(node: &BlockNode) -> Vec<String> {
        node.content.iter().map(|child| child.id().to_string()).collect()
    }

    #[test]
    fn children_keep_listed_order() {
        let arena = arena(vec![text("r", &["a", "b"]), text("a", &[]), text("b", &[])]);
        let root = arena.resolve("r").unwrap();
        assert_eq!(child_ids(&root), vec!["a", "b"]);
        assert_eq!(root.content[0].text(), "a");
        assert_eq!(root.text(), "r");
    }

    #[test]
    fn missing_child_names_the_id() {
        let arena = arena(vec![text("r", &["a", "b"]), text("a", &[])]);
        let err = arena.resolve("r").unwrap_err();
        assert!(matches!(&err, AppError::MissingBlock { id } if id == "b"));
        assert!(err.is_consistency_error());
    }

    #[test]
    fn missing_root_is_reported() {
        let err = arena(vec![text("a", &[])]).resolve("r").unwrap_err();
        assert!(matches!(err, AppError::MissingRoot { id } if id == "r"));
    }

    #[test]
    fn cycle_fails_with_path() {
        let arena = arena(vec![
            text("r", &["a"]),
            text("a", &["b"]),
            text("b", &["a"]),
        ]);
        match arena.resolve("r").unwrap_err() {
            AppError::CycleDetected { id, path } => {
                assert_eq!(id, "a");
                assert_eq!(path, vec!["r", "a", "b", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = arena(vec![text("r", &["r"])]).resolve("r").unwrap_err();
        assert!(matches!(err, AppError::CycleDetected { .. }));
    }

    #[test]
    fn shared_child_is_resolved_once() {
        let arena = arena(vec![
            text("r", &["a", "b"]),
            text("a", &["shared"]),
            text("b", &["shared"]),
            text("shared", &[]),
        ]);
        let root = arena.resolve("r").unwrap();
        let via_a = &root.content[0].content[0];
        let via_b = &root.content[1].content[0];
        assert!(Arc::ptr_eq(via_a, via_b));
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn deleted_child_is_skipped_and_deleted_root_fails() {
        let mut gone = text("gone", &[]);
        gone.alive = false;
        let arena = arena(vec![text("r", &["gone", "a"]), text("a", &[]), gone]);

        let root = arena.resolve("r").unwrap();
        assert_eq!(child_ids(&root), vec!["a"]);

        let err = arena.resolve("gone").unwrap_err();
        assert!(matches!(err, AppError::DeletedBlock { id } if id == "gone"));
    }

    #[test]
    fn bad_rich_text_fails_the_whole_resolution() {
        let broken = Block::new("a", BlockKind::Text(None))
            .with_property("title", json!([["x", [["z"]]]]));
        let arena = arena(vec![text("r", &["a"]), broken]);
        let err = arena.resolve("r").unwrap_err();
        assert!(matches!(err, AppError::InlineDecode { block_id, .. } if block_id == "a"));
    }

    #[test]
    fn inline_content_is_parsed() {
        let block = Block::new("r", BlockKind::Text(None))
            .with_property("title", json!([["hello"], ["world", [["b"]]]]));
        let root = arena(vec![block]).resolve("r").unwrap();
        assert_eq!(
            root.inline_content,
            vec![
                InlineBlock::plain("hello"),
                InlineBlock::plain("world").with_flags(AttrFlags::BOLD),
            ]
        );
    }

    #[test]
    fn null_records_are_not_in_the_arena() {
        let records: RecordMap = serde_json::from_value(json!({
            "block": {
                "r": {"role": "editor", "value": {"id": "r", "type": "page", "content": ["hidden"], "alive": true}},
                "hidden": {"role": "none", "value": null}
            }
        }))
        .unwrap();
        let err = BlockTree::resolve("r", records).unwrap_err();
        assert!(matches!(err, AppError::MissingBlock { id } if id == "hidden"));
    }

    #[test]
    fn details_follow_block_type() {
        let todo = Block::new("t", BlockKind::Todo)
            .with_property("title", json!([["ship it"]]))
            .with_property("checked", json!([["Yes"]]));
        let code = Block::new("c", BlockKind::Code)
            .with_property("title", json!([["fn main() {}"]]))
            .with_property("language", json!([["Rust"]]));
        let image = Block::new("i", BlockKind::Image(None)).with_property(
            "source",
            json!([["https://s3-us-west-2.amazonaws.com/secure.notion-static.com/x/y.png"]]),
        );
        let page = Block::new("p", BlockKind::Page(None))
            .with_content(&["t", "c", "i"])
            .with_property("title", json!([["Notes"]]));

        let root = arena(vec![page, todo, code, image]).resolve("p").unwrap();
        assert_eq!(
            root.details,
            BlockDetails::Page {
                title: "Notes".to_string()
            }
        );
        assert_eq!(root.content[0].details, BlockDetails::Todo { checked: true });
        assert_eq!(
            root.content[1].details,
            BlockDetails::Code {
                code: "fn main() {}".to_string(),
                language: Some("Rust".to_string()),
            }
        );
        match &root.content[2].details {
            BlockDetails::Image { image_url, .. } => {
                assert!(image_url
                    .as_deref()
                    .unwrap()
                    .starts_with("https://www.notion.so/image/"));
            }
            other => panic!("expected image details, got {:?}", other),
        }
    }

    #[test]
    fn upserted_block_is_seen_on_next_resolution() {
        let mut arena = arena(vec![text("r", &["a"]), text("a", &[])]);
        arena.upsert(text("r", &["a", "b"]));
        arena.upsert(text("b", &[]));
        let root = arena.resolve("r").unwrap();
        assert_eq!(child_ids(&root), vec!["a", "b"]);
    }

    #[test]
    fn file_and_embed_details() {
        let file = Block::new("f", BlockKind::File)
            .with_property("source", json!([["https://example.com/report.pdf"]]))
            .with_property("size", json!([["1.2MB"]]));
        let mut embed = Block::new("e", BlockKind::Embed);
        embed.format_raw = Some(json!({"display_source": "https://example.com/widget"}));
        let gist = Block::new("g", BlockKind::Gist)
            .with_property("source", json!([["https://gist.github.com/x/1"]]));
        let page = Block::new("p", BlockKind::Page(None)).with_content(&["f", "e", "g"]);

        let root = arena(vec![page, file, embed, gist]).resolve("p").unwrap();
        assert_eq!(
            root.content[0].details,
            BlockDetails::File {
                source: Some("https://example.com/report.pdf".to_string()),
                file_size: Some("1.2MB".to_string()),
            }
        );
        assert_eq!(
            root.content[1].details,
            BlockDetails::Embed {
                source: Some("https://example.com/widget".to_string())
            }
        );
        assert_eq!(
            root.content[2].details,
            BlockDetails::Embed {
                source: Some("https://gist.github.com/x/1".to_string())
            }
        );
    }

    fn collection_records(view_ids: &[&str], stored_views: &[&str]) -> RecordMap {
        let views: serde_json::Map<String, Value> = stored_views
            .iter()
            .map(|id| {
                let record = json!({"role": "reader", "value": {"id": id, "type": "table", "name": id}});
                (id.to_string(), record)
            })
            .collect();
        serde_json::from_value(json!({
            "block": {
                "p": {"role": "editor", "value": {"id": "p", "type": "page", "content": ["cv"], "alive": true}},
                "cv": {"role": "editor", "value": {
                    "id": "cv",
                    "type": "collection_view",
                    "collection_id": "c1",
                    "view_ids": view_ids,
                    "alive": true
                }}
            },
            "collection": {
                "c1": {"role": "reader", "value": {"id": "c1", "name": [["Tasks"]]}}
            },
            "collection_view": views
        }))
        .unwrap()
    }

    #[test]
    fn collection_view_pairs_views_with_collection() {
        let tree = BlockTree::resolve("p", collection_records(&["v1", "v2"], &["v1", "v2"])).unwrap();
        match &tree.root.content[0].details {
            BlockDetails::CollectionView { views } => {
                let ids: Vec<_> = views.iter().map(|info| info.view.id.to_string()).collect();
                assert_eq!(ids, vec!["v1", "v2"]);
                let collection = views[0].collection.as_ref().unwrap();
                assert_eq!(collection.name_text().unwrap().as_deref(), Some("Tasks"));
                assert!(Arc::ptr_eq(
                    collection,
                    views[1].collection.as_ref().unwrap()
                ));
            }
            other => panic!("expected collection view details, got {:?}", other),
        }
    }

    #[test]
    fn missing_view_record_is_a_consistency_error() {
        let err = BlockTree::resolve("p", collection_records(&["v1", "v2"], &["v1"])).unwrap_err();
        assert!(
            matches!(&err, AppError::MissingRecord { table, id } if table == "collection_view" && id == "v2")
        );
        assert!(err.is_consistency_error());
    }

    #[test]
    fn missing_collection_record_is_a_consistency_error() {
        let mut records = collection_records(&["v1"], &["v1"]);
        records.collection.clear();
        let err = BlockTree::resolve("p", records).unwrap_err();
        assert!(matches!(err, AppError::MissingRecord { table, id } if table == "collection" && id == "c1"));
    }

    fn chain(len: usize) -> BlockArena {
        let ids: Vec<String> = (0..len).map(|i| format!("n{}", i)).collect();
        let blocks = ids
            .iter()
            .enumerate()
            .map(|(i, id)| match ids.get(i + 1) {
                Some(next) => text(id, &[next.as_str()]),
                None => text(id, &[]),
            })
            .collect();
        arena(blocks)
    }

    #[test]
    fn depth_up_to_the_limit_resolves() {
        let root = chain(5).resolve_with_max_depth("n0", 5).unwrap();
        assert_eq!(root.node_count(), 5);
    }

    #[test]
    fn deeper_chain_fails_instead_of_recursing() {
        let err = chain(6).resolve_with_max_depth("n0", 5).unwrap_err();
        assert!(matches!(&err, AppError::DepthExceeded { id, limit } if id == "n5" && *limit == 5));

        let err = chain(MAX_RESOLVE_DEPTH + 1).resolve("n0").unwrap_err();
        assert!(matches!(err, AppError::DepthExceeded { .. }));
    }
}
