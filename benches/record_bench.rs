// benches/record_bench.rs
//! Benchmarks for rich-text decoding, record-map merging and tree resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notion_recordmap::{
    merge_record_maps, parse_inline_blocks, Block, BlockArena, BlockKind, RecordMap, Role,
};
use serde_json::{json, Value};

fn create_sample_title(spans: usize) -> Value {
    let entries: Vec<Value> = (0..spans)
        .map(|i| match i % 4 {
            0 => json!(["plain text "]),
            1 => json!(["bold and italic ", [["b"], ["i"]]]),
            2 => json!(["link", [["a", "https://example.com/page"]]]),
            _ => json!(["‣", [["d", {"type": "date", "start_date": "2019-02-27"}]]]),
        })
        .collect();
    Value::Array(entries)
}

/// One parent per page, each listing `per_page` children defined on the same page.
fn create_pages(pages: usize, per_page: usize) -> Vec<RecordMap> {
    (0..pages)
        .map(|page| {
            let mut map = RecordMap::new();
            let child_ids: Vec<String> = (0..per_page).map(|i| format!("p{}-c{}", page, i)).collect();
            let child_refs: Vec<&str> = child_ids.iter().map(String::as_str).collect();
            map.insert_block(
                Role::Editor,
                Block::new(format!("p{}", page), BlockKind::Page(None)).with_content(&child_refs),
            );
            for id in &child_ids {
                map.insert_block(
                    Role::Editor,
                    Block::new(id.as_str(), BlockKind::Text(None))
                        .with_property("title", json!([[id]])),
                );
            }
            map
        })
        .collect()
}

fn bench_inline_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("inline_parsing");

    for spans in [4, 64, 512] {
        let title = create_sample_title(spans);
        group.bench_with_input(BenchmarkId::from_parameter(spans), &title, |b, title| {
            b.iter(|| parse_inline_blocks(black_box(title)))
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_map_merge");

    for pages in [1, 10, 50] {
        let chunks = create_pages(pages, 50);
        group.bench_with_input(BenchmarkId::from_parameter(pages), &chunks, |b, chunks| {
            b.iter(|| merge_record_maps(black_box(chunks.clone())))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut root = RecordMap::new();
    let page_ids: Vec<String> = (0..20).map(|page| format!("p{}", page)).collect();
    let page_refs: Vec<&str> = page_ids.iter().map(String::as_str).collect();
    root.insert_block(
        Role::Editor,
        Block::new("root", BlockKind::Page(None)).with_content(&page_refs),
    );

    let mut chunks = vec![root];
    chunks.extend(create_pages(20, 50));
    let arena = BlockArena::from_record_map(&merge_record_maps(chunks));

    c.bench_function("resolve_1000_blocks", |b| {
        b.iter(|| arena.resolve(black_box("root")))
    });
}

criterion_group!(benches, bench_inline_parsing, bench_merge, bench_resolve);
criterion_main!(benches);
