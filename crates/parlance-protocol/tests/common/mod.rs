//! In-process mock dialogue backend for client integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{Response, StatusCode};
use axum::routing::post;
use tokio::net::TcpListener;

/// Metadata header name used by the mock.
pub const METADATA_HEADER: &str = "x-turn-metadata";

/// How the mock answers every request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A 200 with optional metadata header and an audio body.
    Turn {
        metadata: Option<String>,
        audio: Vec<u8>,
    },
    /// A non-success status with a raw body.
    Error { status: u16, body: String },
}

/// Multipart fields received by the mock, keyed by field name.
pub type CapturedForm = HashMap<String, Vec<u8>>;

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    captured: Arc<Mutex<Vec<CapturedForm>>>,
}

/// A running mock backend.
pub struct MockBackend {
    pub url: String,
    captured: Arc<Mutex<Vec<CapturedForm>>>,
}

impl MockBackend {
    /// Returns every form received so far.
    pub fn captured(&self) -> Vec<CapturedForm> {
        self.captured.lock().unwrap().clone()
    }
}

async fn handle_turn(State(state): State<MockState>, mut multipart: Multipart) -> Response<Body> {
    let mut form = CapturedForm::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let data = field.bytes().await.unwrap();
        form.insert(name, data.to_vec());
    }
    state.captured.lock().unwrap().push(form);

    match state.reply {
        MockReply::Turn { metadata, audio } => {
            let mut builder = Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "audio/mpeg");
            if let Some(metadata) = metadata {
                builder = builder.header(METADATA_HEADER, metadata);
            }
            builder.body(Body::from(audio)).unwrap()
        }
        MockReply::Error { status, body } => Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    }
}

/// Spawns the mock on an ephemeral port.
pub async fn spawn_backend(reply: MockReply) -> MockBackend {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        reply,
        captured: Arc::clone(&captured),
    };
    let app = Router::new()
        .route("/conversation/turn", post(handle_turn))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        url: format!("http://{addr}/conversation/turn"),
        captured,
    }
}

/// Returns a URL on a port nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/conversation/turn")
}
