mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tnportal_client::transport::{Form, Part, SseEvent};
use tnportal_client::TransportError;

use support::{Frame, UploadFixture, client, client_with_timeout, serve, serve_upload, stalled_stream};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
}

fn form() -> Form {
    Form::new().text("identifier", "upload-1")
}

fn echo(method: Method, headers: &HeaderMap, body: Value) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "content_type": headers.get("content-type").and_then(|v| v.to_str().ok()),
        "body": body,
    }))
}

#[tokio::test]
async fn get_decodes_json_body() {
    let app = Router::new().route(
        "/users",
        get(|| async {
            Json(json!([
                {"id": 1, "name": "Max Mustermann", "email": "max@example.com"},
                {"id": 2, "name": "Anna Schmidt", "email": "anna@example.com"},
                {"id": 3, "name": "Tom Weber", "email": "tom@example.com"}
            ]))
        }),
    );
    let base = serve(app).await;

    let users: Vec<User> = client(&base).get("/users").await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(
        users[0],
        User {
            id: 1,
            name: "Max Mustermann".into(),
            email: "max@example.com".into()
        }
    );
}

#[tokio::test]
async fn not_found_is_a_status_error_without_retry() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/users",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::NOT_FOUND
            }
        }),
    );
    let base = serve(app).await;

    let err = client(&base).get::<Value>("/users").await.unwrap_err();
    match err {
        TransportError::Status {
            status_code,
            ref message,
        } => {
            assert_eq!(status_code, 404);
            assert_eq!(message, "HTTP error! status: 404");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn json_methods_send_json_content_type() {
    let app = Router::new().route(
        "/items",
        post(|method: Method, headers: HeaderMap, Json(body): Json<Value>| async move {
            echo(method, &headers, body)
        })
        .put(|method: Method, headers: HeaderMap, Json(body): Json<Value>| async move {
            echo(method, &headers, body)
        })
        .delete(|method: Method, headers: HeaderMap| async move {
            echo(method, &headers, Value::Null)
        }),
    );
    let base = serve(app).await;
    let client = client(&base);

    let posted: Value = client.post("/items", &json!({"a": 1})).await.unwrap();
    assert_eq!(posted["method"], "POST");
    assert_eq!(posted["content_type"], "application/json");
    assert_eq!(posted["body"], json!({"a": 1}));

    let put: Value = client.put("/items", &json!({"a": 2})).await.unwrap();
    assert_eq!(put["method"], "PUT");
    assert_eq!(put["body"]["a"], 2);

    let deleted: Value = client.delete("/items").await.unwrap();
    assert_eq!(deleted["method"], "DELETE");
    assert_eq!(deleted["content_type"], "application/json");
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let app = Router::new().route("/health", get(|| async { "ok" }));
    let base = serve(app).await;

    let err = client(&base).get::<Value>("/health").await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn slow_response_times_out() {
    let app = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let base = serve(app).await;

    let client = client_with_timeout(&base, Duration::from_millis(150));
    let err = client.get::<Value>("/slow").await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_millis(150)));
}

#[tokio::test]
async fn form_data_lets_reqwest_pick_the_boundary() {
    let app = Router::new().route(
        "/forms",
        post(|headers: HeaderMap| async move {
            Json(json!({
                "content_type": headers.get("content-type").and_then(|v| v.to_str().ok()),
            }))
        }),
    );
    let base = serve(app).await;

    let form = Form::new()
        .text("identifier", "upload-1")
        .part("file", Part::bytes(b"abc".to_vec()).file_name("a.txt"));
    let response: Value = client(&base).post_form_data("/forms", form).await.unwrap();
    let content_type = response["content_type"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="), "{content_type}");
}

#[tokio::test]
async fn event_stream_delivers_json_frames_and_resolves_with_the_last() {
    let base = serve_upload(UploadFixture::new(vec![
        Frame::Comment("keepalive"),
        Frame::Json("status", json!({"message": "Processing..."})),
        Frame::Text("ping", "not json"),
        Frame::Json("success", json!({"result": {"extractions": {}}})),
        Frame::Text("message", "trailing heartbeat"),
    ]))
    .await;

    let mut seen: Vec<SseEvent> = Vec::new();
    let last: Value = client(&base)
        .post_form_data_with_events("/tn-document/upload", form(), |event| {
            seen.push(event.clone())
        })
        .await
        .unwrap();

    let names: Vec<_> = seen.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(names, vec!["status", "success"]);
    assert_eq!(seen[0].data["message"], "Processing...");
    assert_eq!(last, json!({"result": {"extractions": {}}}));
}

#[tokio::test]
async fn event_stream_without_json_resolves_null() {
    let base = serve_upload(UploadFixture::new(vec![
        Frame::Text("message", "hello"),
        Frame::Comment("bye"),
    ]))
    .await;

    let mut count = 0;
    let last: Value = client(&base)
        .post_form_data_with_events("/tn-document/upload", form(), |_| count += 1)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(last, Value::Null);
}

#[tokio::test]
async fn event_stream_rejected_before_any_event() {
    let base = serve_upload(UploadFixture::rejecting(StatusCode::INTERNAL_SERVER_ERROR)).await;

    let mut count = 0;
    let err = client(&base)
        .post_form_data_with_events::<Value, _>("/tn-document/upload", form(), |_| count += 1)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(count, 0);
}

#[tokio::test]
async fn stalled_event_stream_times_out() {
    let app = Router::new().route("/tn-document/upload", post(|| async { stalled_stream() }));
    let base = serve(app).await;

    let mut count = 0;
    let err = client_with_timeout(&base, Duration::from_millis(300))
        .post_form_data_with_events::<Value, _>("/tn-document/upload", form(), |_| count += 1)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)), "{err:?}");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{addr}"));
    let err = client.get::<Value>("/users").await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)), "got {err:?}");
    assert_eq!(err.status_code(), None);
}
