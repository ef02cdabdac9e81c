//! `DynamoChunkStore` against a local endpoint that speaks the DynamoDB JSON
//! protocol and answers from a script.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::Client;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shard_blob::{BlobError, ChunkStore, DynamoChunkStore, ItemKey, ScanRequest, StoredItem};
use tokio::net::TcpListener;

const TABLE: &str = "Images";

#[derive(Clone, Default)]
struct ScriptedDynamo {
    replies: Arc<Mutex<VecDeque<Value>>>,
    seen: Arc<Mutex<Vec<(String, Value)>>>,
}

impl ScriptedDynamo {
    fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            seen: Arc::default(),
        }
    }

    /// (operation, request body) for every call received so far
    fn seen(&self) -> Vec<(String, Value)> {
        self.seen.lock().clone()
    }
}

async fn answer(State(script): State<ScriptedDynamo>, headers: HeaderMap, body: Bytes) -> Response {
    let operation = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit('.').next())
        .unwrap_or_default()
        .to_string();
    let request = serde_json::from_slice(&body).unwrap_or(Value::Null);
    script.seen.lock().push((operation, request));

    let reply = script.replies.lock().pop_front().unwrap_or_else(|| json!({}));
    ([(CONTENT_TYPE, "application/x-amz-json-1.0")], reply.to_string()).into_response()
}

async fn serve(script: ScriptedDynamo) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(answer).with_state(script);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

async fn store(script: &ScriptedDynamo) -> DynamoChunkStore {
    let addr = serve(script.clone()).await;
    let config = aws_sdk_dynamodb::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .endpoint_url(format!("http://{addr}"))
        .build();
    DynamoChunkStore::from_client(Client::from_conf(config), TABLE)
}

fn chunk(n: u64) -> StoredItem {
    StoredItem::new("alice", format!("cat.png#CHUNK#{:04}", n + 1))
        .with_number("chunkIndex", n)
        .with_string("data", "QUJD")
}

fn unprocessed(sort_keys: &[&str]) -> Value {
    let puts: Vec<Value> = sort_keys
        .iter()
        .map(|sk| json!({"PutRequest": {"Item": {"userId": {"S": "alice"}, "sk": {"S": sk}}}}))
        .collect();
    json!({ "UnprocessedItems": { TABLE: puts } })
}

fn batch_len(request: &Value) -> usize {
    request["RequestItems"][TABLE].as_array().map_or(0, Vec::len)
}

#[tokio::test]
async fn batch_gives_up_after_the_resubmit_bound() {
    let script = ScriptedDynamo::new(vec![
        unprocessed(&["cat.png#CHUNK#0002"]),
        unprocessed(&["cat.png#CHUNK#0002"]),
        unprocessed(&["cat.png#CHUNK#0002"]),
        unprocessed(&["cat.png#CHUNK#0002"]),
    ]);
    let store = store(&script).await.with_max_resubmits(2);

    let err = store.put_batch(vec![chunk(0), chunk(1)]).await.unwrap_err();
    assert!(matches!(err, BlobError::StoreWrite { .. }), "{err:?}");

    // first send plus exactly two resubmits
    let seen = script.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|(op, _)| op == "BatchWriteItem"));
    assert_eq!(batch_len(&seen[0].1), 2);
    assert_eq!(batch_len(&seen[1].1), 1);
    assert_eq!(batch_len(&seen[2].1), 1);
}

#[tokio::test]
async fn zero_resubmits_fails_on_first_leftover() {
    let script = ScriptedDynamo::new(vec![unprocessed(&["cat.png#CHUNK#0001"])]);
    let store = store(&script).await.with_max_resubmits(0);

    let err = store.put_batch(vec![chunk(0)]).await.unwrap_err();
    assert!(matches!(err, BlobError::StoreWrite { .. }));
    assert_eq!(script.seen().len(), 1);
}

#[tokio::test]
async fn partial_leftover_is_resubmitted_once() {
    let script = ScriptedDynamo::new(vec![
        unprocessed(&["cat.png#CHUNK#0003"]),
        json!({ "UnprocessedItems": {} }),
    ]);
    let store = store(&script).await;

    store.put_batch(vec![chunk(0), chunk(1), chunk(2)]).await.unwrap();

    let seen = script.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(batch_len(&seen[0].1), 3);
    assert_eq!(batch_len(&seen[1].1), 1);
    assert_eq!(
        seen[1].1["RequestItems"][TABLE][0]["PutRequest"]["Item"]["sk"]["S"],
        "cat.png#CHUNK#0003"
    );
}

#[tokio::test]
async fn large_batches_are_split_at_twenty_five() {
    let script = ScriptedDynamo::new(vec![json!({}), json!({})]);
    let store = store(&script).await;

    store.put_batch((0..30).map(chunk).collect()).await.unwrap();

    let sizes: Vec<usize> = script.seen().iter().map(|(_, req)| batch_len(req)).collect();
    assert_eq!(sizes, vec![25, 5]);
}

#[tokio::test]
async fn query_pages_are_merged() {
    let resume = json!({"userId": {"S": "alice"}, "sk": {"S": "cat.png#META"}});
    let script = ScriptedDynamo::new(vec![
        json!({
            "Count": 1,
            "ScannedCount": 1,
            "Items": [{"userId": {"S": "alice"}, "sk": {"S": "cat.png#META"}, "totalChunks": {"N": "1"}}],
            "LastEvaluatedKey": resume.clone(),
        }),
        json!({
            "Count": 1,
            "ScannedCount": 1,
            "Items": [{"userId": {"S": "alice"}, "sk": {"S": "cat.png#CHUNK#0001"}, "chunkIndex": {"N": "0"}, "data": {"S": "QUJD"}}],
        }),
    ]);
    let store = store(&script).await;

    let items = store.query_prefix("alice", "cat.png#").await.unwrap();
    let keys: Vec<&str> = items.iter().map(StoredItem::sort_key).collect();
    assert_eq!(keys, vec!["cat.png#META", "cat.png#CHUNK#0001"]);
    assert_eq!(items[0].number("totalChunks"), Some(1));
    assert_eq!(items[1].string("data"), Some("QUJD"));

    let seen = script.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|(op, _)| op == "Query"));
    assert!(seen[0].1.get("ExclusiveStartKey").is_none());
    assert_eq!(seen[1].1["ExclusiveStartKey"], resume);
    assert_eq!(seen[0].1["ExpressionAttributeValues"][":prefix"]["S"], "cat.png#");
}

#[tokio::test]
async fn scan_projects_through_placeholders() {
    let script = ScriptedDynamo::new(vec![json!({
        "Count": 1,
        "ScannedCount": 1,
        "Items": [{"userId": {"S": "bob"}, "sk": {"S": "dog.png#META"}, "totalChunks": {"N": "3"}}],
        "LastEvaluatedKey": {"userId": {"S": "bob"}, "sk": {"S": "dog.png#META"}},
    })]);
    let store = store(&script).await;

    let page = store
        .scan(ScanRequest::new().with_projection(["totalChunks", "sizeBytes"]).with_limit(10))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(
        page.next,
        Some(ItemKey {
            partition_key: "bob".into(),
            sort_key: "dog.png#META".into(),
        })
    );

    let (op, request) = &script.seen()[0];
    assert_eq!(op, "Scan");
    assert_eq!(request["ProjectionExpression"], "#pk, #sk, #a0, #a1");
    assert_eq!(
        request["ExpressionAttributeNames"],
        json!({"#pk": "userId", "#sk": "sk", "#a0": "totalChunks", "#a1": "sizeBytes"})
    );
    assert_eq!(request["Limit"], 10);
}
