use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use file_relay::object_store::{IpfsPinner, PinError, Pinner};

#[derive(Default)]
struct Node {
    added: Mutex<Vec<(String, Vec<u8>)>>,
    query: Mutex<Option<HashMap<String, String>>>,
}

async fn add(
    State(node): State<Arc<Node>>,
    Query(params): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    *node.query.lock().unwrap() = Some(params);
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap().to_vec();
        if name == "reject.bin" {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"Message":"disk full","Code":0,"Type":"error"}"#.to_string(),
            );
        }
        node.added.lock().unwrap().push((name, data));
    }
    (
        StatusCode::OK,
        "{\"Name\":\"hello.txt\",\"Hash\":\"bafyhello\",\"Size\":\"13\"}\n".to_string(),
    )
}

async fn pin_rm(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let message = match params.get("arg").map(String::as_str) {
        Some("bafyhello") => return (StatusCode::OK, Json(serde_json::json!({"Pins": ["bafyhello"]}))),
        Some("bafygone") => "not pinned or pinned indirectly",
        _ => "invalid path",
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"Message": message, "Code": 0, "Type": "error"})),
    )
}

async fn spawn_node() -> (String, Arc<Node>) {
    let node = Arc::new(Node::default());
    let app = Router::new()
        .route("/api/v0/add", post(add))
        .route("/api/v0/pin/rm", post(pin_rm))
        .with_state(Arc::clone(&node));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), node)
}

#[tokio::test]
async fn test_pin_returns_content_hash() {
    let (url, node) = spawn_node().await;
    let pinner = IpfsPinner::new(&url).unwrap();

    let cid = pinner
        .pin("hello.txt", Bytes::from("hello, world!"))
        .await
        .unwrap();
    assert_eq!(cid, "bafyhello");

    let added = node.added.lock().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].0, "hello.txt");
    assert_eq!(added[0].1, b"hello, world!");

    let query = node.query.lock().unwrap().clone().unwrap();
    assert_eq!(query.get("pin").map(String::as_str), Some("true"));
    assert_eq!(query.get("cid-version").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn test_pin_surfaces_node_error_message() {
    let (url, _node) = spawn_node().await;
    let pinner = IpfsPinner::new(&url).unwrap();

    match pinner.pin("reject.bin", Bytes::from("x")).await {
        Err(PinError::Rejected { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "disk full");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unpin_tolerates_missing_pin() {
    let (url, _node) = spawn_node().await;
    let pinner = IpfsPinner::new(&url).unwrap();

    pinner.unpin("bafyhello").await.unwrap();
    pinner.unpin("bafygone").await.unwrap();
    assert!(matches!(
        pinner.unpin("garbage").await,
        Err(PinError::Rejected { .. })
    ));
}

#[tokio::test]
async fn test_pin_unreachable_node() {
    // Bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pinner = IpfsPinner::new(&format!("http://{addr}")).unwrap();
    assert!(matches!(
        pinner.pin("a.txt", Bytes::from("a")).await,
        Err(PinError::Request(_))
    ));
}
