//! Router-level tests for the blog API, driven through `oneshot` with the
//! in-memory repository standing in for Postgres.

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{MemoryPostsRepo, memory_cache, sample_post};
use vetrina::application::posts::PostService;
use vetrina::cache::ByteCache;
use vetrina::infra::http::{HttpState, build_router};

fn build_app(repo: Arc<MemoryPostsRepo>, cache: Arc<ByteCache>) -> Router {
    let posts = Arc::new(PostService::new(
        repo.clone(),
        repo,
        cache,
        common::test_cache_config(),
    ));
    build_router(HttpState {
        posts,
        default_page_size: 20,
        max_page_size: 50,
    })
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request handled")
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collected")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn json_request(method: &str, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn header_str<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn health_endpoint() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());
    let response = send(&app, get("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn empty_list_has_pagination_headers() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());

    let response = send(&app, get("/api/blog?page=1&page_size=20")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "x-total-count"), Some("0"));
    assert_eq!(header_str(&response, "content-range"), Some("posts 0-0/0"));
    assert_eq!(
        header_str(&response, "cache-control"),
        Some("public, max-age=60, stale-while-revalidate=120")
    );
    assert_eq!(header_str(&response, "etag"), Some("W/\"0-0\""));
    assert!(header_str(&response, "last-modified").is_none());
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn create_then_list_and_detail() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());

    let created = send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "Hello World", "summary": "intro", "body": "Body" }),
        ),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    assert_eq!(created["slug"], "hello-world");
    assert_eq!(created["body"], "Body");

    // The list projection carries exactly the summary fields.
    let listed = send(&app, get("/api/blog?page=1&page_size=20")).await;
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(header_str(&listed, "x-total-count"), Some("1"));
    let items = body_json(listed).await;
    let items = items.as_array().expect("list body");
    assert_eq!(items.len(), 1);
    let item = items[0].as_object().expect("summary object");
    let mut keys: Vec<&str> = item.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["created_at", "slug", "summary", "title"]);

    // Detail includes the body.
    let detail = send(&app, get("/api/blog/hello-world")).await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert_eq!(body_json(detail).await["body"], "Body");
}

#[tokio::test]
async fn missing_post_is_404() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());
    let response = send(&app, get("/api/blog/nonexistent-post")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());
    let payload = json!({ "title": "Hello World", "summary": "s", "body": "b" });

    let first = send(&app, json_request("POST", "/api/blog", payload.clone())).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send(&app, json_request("POST", "/api/blog", payload)).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "duplicate");
}

#[tokio::test]
async fn pagination_math_via_headers() {
    let repo = Arc::new(MemoryPostsRepo::new());
    for slug in ["one", "two", "three"] {
        repo.insert_directly(sample_post(slug)).await;
    }
    let app = build_app(repo, memory_cache());

    let page1 = send(&app, get("/api/blog?page=1&page_size=2")).await;
    assert_eq!(header_str(&page1, "x-total-count"), Some("3"));
    assert_eq!(header_str(&page1, "content-range"), Some("posts 0-1/3"));
    assert_eq!(body_json(page1).await.as_array().map(Vec::len), Some(2));

    let page2 = send(&app, get("/api/blog?page=2&page_size=2")).await;
    assert_eq!(header_str(&page2, "content-range"), Some("posts 2-2/3"));
    assert_eq!(body_json(page2).await.as_array().map(Vec::len), Some(1));

    // A page past the end is empty with end index pinned to the offset.
    let page3 = send(&app, get("/api/blog?page=3&page_size=2")).await;
    assert_eq!(header_str(&page3, "content-range"), Some("posts 4-4/3"));
    assert_eq!(body_json(page3).await, json!([]));
}

#[tokio::test]
async fn etag_replay_yields_304_with_validators() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());

    send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "Cache Test", "summary": "sum", "body": "content" }),
        ),
    )
    .await;

    let first = send(&app, get("/api/blog?page=1&page_size=20")).await;
    assert_eq!(first.status(), StatusCode::OK);
    let etag = header_str(&first, "etag").expect("etag").to_string();
    let last_modified = header_str(&first, "last-modified")
        .expect("last-modified")
        .to_string();
    assert!(etag.starts_with("W/\""));

    // Replaying the tag yields an empty 304 that still carries validators.
    for _ in 0..2 {
        let replay = send(
            &app,
            Request::builder()
                .uri("/api/blog?page=1&page_size=20")
                .header(header::IF_NONE_MATCH, etag.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(replay.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(header_str(&replay, "etag"), Some(etag.as_str()));
        assert_eq!(
            header_str(&replay, "last-modified"),
            Some(last_modified.as_str())
        );
        let bytes = replay.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    // If-Modified-Since matches the same way.
    let by_date = send(
        &app,
        Request::builder()
            .uri("/api/blog?page=1&page_size=20")
            .header(header::IF_MODIFIED_SINCE, last_modified.clone())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(by_date.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn etag_rotates_after_writes() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());

    send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "Cache Test", "summary": "sum", "body": "content" }),
        ),
    )
    .await;

    let first = send(&app, get("/api/blog?page=1&page_size=20")).await;
    let old_etag = header_str(&first, "etag").expect("etag").to_string();

    send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "Cache Miss", "summary": "sum2", "body": "content2" }),
        ),
    )
    .await;

    let replay = send(
        &app,
        Request::builder()
            .uri("/api/blog?page=1&page_size=20")
            .header(header::IF_NONE_MATCH, old_etag.clone())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::OK);
    let new_etag = header_str(&replay, "etag").expect("etag");
    assert_ne!(new_etag, old_etag);
}

#[tokio::test]
async fn update_changes_fields_and_missing_update_is_404() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());

    send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "Original", "summary": "old", "body": "old body" }),
        ),
    )
    .await;

    let updated = send(
        &app,
        json_request("PUT", "/api/blog/original", json!({ "summary": "new" })),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = body_json(updated).await;
    assert_eq!(updated["summary"], "new");
    assert_eq!(updated["title"], "Original");
    assert_eq!(updated["body"], "old body");

    let missing = send(
        &app,
        json_request("PUT", "/api/blog/absent", json!({ "summary": "new" })),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_post() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());

    send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "Delete Me", "summary": "s", "body": "b" }),
        ),
    )
    .await;

    let deleted = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/api/blog/delete-me")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(body_json(deleted).await, json!({ "ok": true }));

    let missing = send(&app, get("/api/blog/delete-me")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let again = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/api/blog/delete-me")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "   ", "summary": "s", "body": "b" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backup_and_restore_roundtrip() {
    let app = build_app(Arc::new(MemoryPostsRepo::new()), memory_cache());

    send(
        &app,
        json_request(
            "POST",
            "/api/blog",
            json!({ "title": "Backup Me", "summary": "sum", "body": "full" }),
        ),
    )
    .await;

    let backup = send(&app, get("/api/blog/backup")).await;
    assert_eq!(backup.status(), StatusCode::OK);
    let dump = body_json(backup).await;
    let dump = dump.as_array().expect("backup array").clone();
    assert_eq!(dump.len(), 1);
    assert_eq!(dump[0]["body"], "full");

    // Restore a different collection wholesale.
    let restored = send(
        &app,
        json_request(
            "POST",
            "/api/blog/restore",
            json!([
                { "slug": "a", "title": "A", "summary": "sa", "body": "ba" },
                { "slug": "b", "title": "B", "summary": "sb", "body": "bb",
                  "created_at": "2024-01-15T12:30:45Z" }
            ]),
        ),
    )
    .await;
    assert_eq!(restored.status(), StatusCode::OK);
    assert_eq!(body_json(restored).await, json!({ "ok": true, "count": 2 }));

    let listed = send(&app, get("/api/blog?page=1&page_size=20")).await;
    assert_eq!(header_str(&listed, "x-total-count"), Some("2"));
    let missing = send(&app, get("/api/blog/backup-me")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn identity_header_requests_work_and_stay_segmented() {
    let repo = Arc::new(MemoryPostsRepo::new());
    repo.insert_directly(sample_post("first")).await;
    let app = build_app(repo.clone(), memory_cache());

    let signed_in = send(
        &app,
        Request::builder()
            .uri("/api/blog?page=1&page_size=20")
            .header(header::AUTHORIZATION, "Bearer alice")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(signed_in.status(), StatusCode::OK);
    assert_eq!(header_str(&signed_in, "x-total-count"), Some("1"));

    // Anonymous request misses the signed-in slot and hits the store again.
    let anon = send(&app, get("/api/blog?page=1&page_size=20")).await;
    assert_eq!(anon.status(), StatusCode::OK);
    assert_eq!(repo.page_query_count(), 2);
}
