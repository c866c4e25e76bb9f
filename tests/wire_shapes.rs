// tests/wire_shapes.rs
//! Request bodies must match what the service expects byte for byte.

mod common;

use common::{block_record, chunk, client_with, StubTransport};
use notion_recordmap::{BlockId, PropertyPath, RecordRef, Table};
use serde_json::json;

async fn sent_body(stub: &StubTransport) -> String {
    let requests = stub.requests().await;
    serde_json::to_string(&requests[0].body).unwrap()
}

#[tokio::test]
async fn page_fetch_request() {
    let stub = StubTransport::new().respond(chunk(
        &[("4c6a54c6-8e6b-4b3e-9c4e-0f0a4e1b2c3d", block_record("4c6a54c6-8e6b-4b3e-9c4e-0f0a4e1b2c3d", "page", "P", &[]))],
        &[],
    ));
    let (client, stub) = client_with(stub);

    client
        .fetch_block_tree(&BlockId::new("4c6a54c6-8e6b-4b3e-9c4e-0f0a4e1b2c3d"))
        .await
        .unwrap();

    insta::assert_snapshot!(
        sent_body(&stub).await,
        @r#"{"pageId":"4c6a54c6-8e6b-4b3e-9c4e-0f0a4e1b2c3d","limit":50,"cursor":{"stack":[]},"verticalColumns":false}"#
    );
}

#[tokio::test]
async fn list_records_request() {
    let stub = StubTransport::new().respond(json!({"results": [{"role": "reader"}, {"role": "reader"}]}));
    let (client, stub) = client_with(stub);

    client
        .fetch_record_descriptors(&[
            RecordRef::new(Table::Block, "b1"),
            RecordRef::new(Table::NotionUser, "u1"),
        ])
        .await
        .unwrap();

    insta::assert_snapshot!(
        sent_body(&stub).await,
        @r#"{"requests":[{"id":"b1","table":"block"},{"id":"u1","table":"notion_user"}]}"#
    );
}

#[tokio::test]
async fn mutation_request() {
    let stub = StubTransport::new().respond(json!({}));
    let (client, stub) = client_with(stub);

    client
        .set_property(
            &BlockId::new("b1"),
            &PropertyPath::from("properties.title"),
            "hello",
        )
        .await
        .unwrap();

    let requests = stub.requests().await;
    assert_eq!(requests[0].endpoint, "submitTransaction");
    insta::assert_snapshot!(
        sent_body(&stub).await,
        @r#"{"operations":[{"id":"b1","table":"block","path":["properties","title"],"command":"set","args":[["hello"]]}]}"#
    );
}
