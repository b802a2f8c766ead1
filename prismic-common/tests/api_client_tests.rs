//! Content API client against an in-process HTTP server

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use prismic_common::api::{ClientOptions, PrismicClient};
use prismic_common::normalize::DocumentSource;
use prismic_common::Error;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct FakeApi {
    documents: Vec<Value>,
    fail_page: Option<usize>,
    root_hits: AtomicUsize,
}

async fn api_root(State(api): State<Arc<FakeApi>>) -> Json<Value> {
    api.root_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "refs": [{"id": "master", "ref": "master-ref", "label": "Master", "isMasterRef": true}]
    }))
}

async fn search(
    State(api): State<Arc<FakeApi>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if params.get("access_token").map(String::as_str) != Some("secret") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if params.get("ref").map(String::as_str) != Some("master-ref") {
        return Err(StatusCode::BAD_REQUEST);
    }

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let page_size: usize = params.get("pageSize").and_then(|p| p.parse().ok()).unwrap_or(20);
    if api.fail_page == Some(page) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let matching: Vec<Value> = match params.get("q") {
        Some(q) => {
            let id = q
                .trim_start_matches("[[at(document.id,\"")
                .trim_end_matches("\")]]");
            api.documents.iter().filter(|d| d["id"] == json!(id)).cloned().collect()
        }
        None => api.documents.clone(),
    };

    let total = matching.len();
    let results: Vec<Value> = matching.into_iter().skip((page - 1) * page_size).take(page_size).collect();
    Ok(Json(json!({
        "page": page,
        "results_per_page": page_size,
        "results_size": results.len(),
        "total_results_size": total,
        "total_pages": total.div_ceil(page_size),
        "next_page": null,
        "results": results,
    })))
}

async fn serve(api: FakeApi) -> (String, Arc<FakeApi>) {
    let api = Arc::new(api);
    let app = Router::new()
        .route("/api/v2", get(api_root))
        .route("/api/v2/documents/search", get(search))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api/v2", addr), api)
}

fn documents(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id": format!("doc{}", i), "type": "page", "lang": "en-us", "data": {"n": i}}))
        .collect()
}

fn client(endpoint: String) -> PrismicClient {
    PrismicClient::new(ClientOptions {
        endpoint,
        access_token: Some("secret".to_string()),
        lang: "*".to_string(),
        fetch_links: Vec::new(),
        requests_per_second: None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_query_all_pages_until_total() {
    // Given: 250 documents served 100 per page
    let (endpoint, api) = serve(FakeApi {
        documents: documents(250),
        fail_page: None,
        root_hits: AtomicUsize::new(0),
    })
    .await;

    // When: querying everything
    let docs = client(endpoint).query_all().await.unwrap();

    // Then: all three pages are collected in order and the ref is resolved once
    assert_eq!(docs.len(), 250);
    assert_eq!(docs[0].id, "doc0");
    assert_eq!(docs[249].id, "doc249");
    assert_eq!(api.root_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_page_failure_aborts_query() {
    let (endpoint, _api) = serve(FakeApi {
        documents: documents(250),
        fail_page: Some(2),
        root_hits: AtomicUsize::new(0),
    })
    .await;

    let err = client(endpoint).query_all().await.unwrap_err();
    let err: Error = err.into();
    assert!(matches!(err, Error::Fetch(msg) if msg.contains("500")));
}

#[tokio::test]
async fn test_get_by_id() {
    let (endpoint, _api) = serve(FakeApi {
        documents: documents(3),
        fail_page: None,
        root_hits: AtomicUsize::new(0),
    })
    .await;
    let client = client(endpoint);

    let doc = client.get_by_id("doc1").await.unwrap().unwrap();
    assert_eq!(doc.id, "doc1");
    assert_eq!(doc.data, json!({"n": 1}));

    assert!(client.get_by_id("missing").await.unwrap().is_none());

    // Same lookup through the normalizer's collaborator trait
    let source: &dyn DocumentSource = &client;
    assert_eq!(source.get_by_id("doc2").await.unwrap().unwrap().id, "doc2");
}

#[tokio::test]
async fn test_rejected_token_is_status_error() {
    let (endpoint, _api) = serve(FakeApi {
        documents: documents(1),
        fail_page: None,
        root_hits: AtomicUsize::new(0),
    })
    .await;
    let client = PrismicClient::new(ClientOptions {
        endpoint,
        access_token: Some("wrong".to_string()),
        lang: "*".to_string(),
        fetch_links: Vec::new(),
        requests_per_second: Some(50),
    })
    .unwrap();

    let err = client.query_page(1).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}
