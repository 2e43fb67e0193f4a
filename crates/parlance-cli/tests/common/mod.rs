//! Scripted in-process dialogue backend for driver tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{Response, StatusCode};
use axum::routing::post;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parlance_cli::config::Cli;
use serde_json::json;
use tokio::net::TcpListener;

pub const METADATA_HEADER: &str = "x-turn-metadata";

/// One scripted backend answer.
#[derive(Debug, Clone)]
pub enum Answer {
    Reply {
        heard: String,
        reply: String,
        charm_delta: i32,
    },
    Failure {
        status: u16,
        body: String,
    },
}

#[derive(Clone, Default)]
struct Script {
    answers: Arc<Mutex<VecDeque<Answer>>>,
    histories: Arc<Mutex<Vec<String>>>,
}

pub struct Backend {
    pub url: String,
    histories: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    /// The `history` form field of every request received.
    pub fn histories(&self) -> Vec<String> {
        self.histories.lock().unwrap().clone()
    }
}

async fn handle_turn(State(script): State<Script>, mut multipart: Multipart) -> Response<Body> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let data = field.bytes().await.unwrap();
        if name == "history" {
            let history = String::from_utf8(data.to_vec()).unwrap();
            script.histories.lock().unwrap().push(history);
        }
    }

    match script.answers.lock().unwrap().pop_front() {
        Some(Answer::Reply {
            heard,
            reply,
            charm_delta,
        }) => {
            let metadata = json!({
                "input_target": heard,
                "response_target": reply,
                "response_english": "(reply)",
                "charm_delta": charm_delta,
            });
            Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "audio/mpeg")
                .header(METADATA_HEADER, STANDARD.encode(metadata.to_string()))
                .body(Body::from(b"ID3fake".to_vec()))
                .unwrap()
        }
        Some(Answer::Failure { status, body }) => Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Body::from(r#"{"message": "Script exhausted"}"#))
            .unwrap(),
    }
}

pub async fn spawn_backend(answers: Vec<Answer>) -> Backend {
    let script = Script {
        answers: Arc::new(Mutex::new(answers.into())),
        histories: Arc::default(),
    };
    let histories = Arc::clone(&script.histories);
    let app = Router::new()
        .route("/conversation/turn", post(handle_turn))
        .with_state(script);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend {
        url: format!("http://{addr}/conversation/turn"),
        histories,
    }
}

/// Writes `count` fake recordings under `dir`.
pub fn recordings(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("take-{i}.m4a"));
            std::fs::write(&path, format!("utterance {i}")).unwrap();
            path
        })
        .collect()
}

pub fn cli(endpoint: &str, scratch: &Path, charm: u8, recordings: Vec<PathBuf>) -> Cli {
    Cli {
        endpoint: endpoint.to_owned(),
        metadata_header: METADATA_HEADER.to_owned(),
        timeout_secs: 5,
        scratch_dir: Some(scratch.to_path_buf()),
        npc_id: "npc-baker".to_owned(),
        npc_name: "Baker".to_owned(),
        charm,
        player_name: "Mina".to_owned(),
        recordings,
    }
}
