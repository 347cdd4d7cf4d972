//! Local backend stand-in: an axum server on an ephemeral port.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use futures::stream::{self, Stream};
use serde_json::Value;
use tnportal_client::ApiClient;
use tnportal_core::PortalConfig;

/// One frame the fixture writes to the event stream.
#[derive(Clone, Debug)]
pub enum Frame {
    Json(&'static str, Value),
    Text(&'static str, &'static str),
    Comment(&'static str),
}

impl Frame {
    fn into_event(self) -> Event {
        match self {
            Frame::Json(name, data) => Event::default().event(name).data(data.to_string()),
            Frame::Text(name, data) => Event::default().event(name).data(data),
            Frame::Comment(text) => Event::default().comment(text),
        }
    }
}

/// A multipart field as the server saw it.
#[derive(Clone, Debug)]
pub struct ReceivedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct UploadFixture {
    pub frames: Vec<Frame>,
    /// Reject the upload with this status before streaming.
    pub status: Option<StatusCode>,
    pub received: Arc<Mutex<Vec<ReceivedField>>>,
    pub request_content_type: Arc<Mutex<Option<String>>>,
}

impl UploadFixture {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            ..Default::default()
        }
    }

    pub fn rejecting(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<ReceivedField> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.name == name)
            .cloned()
    }
}

async fn upload_handler(
    State(fixture): State<UploadFixture>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    *fixture.request_content_type.lock().unwrap() = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    while let Some(field) = multipart.next_field().await.unwrap() {
        let received = ReceivedField {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.unwrap().to_vec(),
        };
        fixture.received.lock().unwrap().push(received);
    }

    if let Some(status) = fixture.status {
        return (status, "rejected").into_response();
    }

    let events = fixture
        .frames
        .into_iter()
        .map(|frame| Ok::<_, Infallible>(frame.into_event()));
    Sse::new(stream::iter(events)).into_response()
}

/// Server whose upload endpoint streams `fixture.frames` and then closes.
pub async fn serve_upload(fixture: UploadFixture) -> String {
    let app = Router::new()
        .route("/tn-document/upload", post(upload_handler))
        .with_state(fixture);
    serve(app).await
}

/// Event stream that sends one frame and then never finishes.
pub fn stalled_stream() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        yield Ok(Event::default().event("status").data(r#"{"message":"Processing..."}"#));
        std::future::pending::<()>().await;
    };
    Sse::new(stream)
}

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn client(base_url: &str) -> ApiClient {
    client_with_timeout(base_url, Duration::from_secs(10))
}

pub fn client_with_timeout(base_url: &str, timeout: Duration) -> ApiClient {
    ApiClient::new(&PortalConfig::new(base_url, timeout).with_debug(true)).unwrap()
}
