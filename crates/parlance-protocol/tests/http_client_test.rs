//! Integration tests for `HttpDialogueClient` against a mock backend.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use parlance_core::charm::CharmLevel;
use parlance_core::error::TurnError;
use parlance_core::scratch::ScratchSpace;
use parlance_core::turn::NpcProfile;
use parlance_protocol::metadata::{TurnMetadata, WireWordMapping};
use parlance_protocol::{ClientConfig, DialogueService, HttpDialogueClient, TurnRequest};
use tempfile::TempDir;

use common::{MockReply, spawn_backend};

fn metadata() -> TurnMetadata {
    TurnMetadata {
        input_target: "빵 주세요".to_owned(),
        input_mapping: vec![WireWordMapping {
            word_target: "빵".to_owned(),
            word_translit: "ppang".to_owned(),
            word_eng: "bread".to_owned(),
            pos: "noun".to_owned(),
        }],
        response_target: "여기 있어요".to_owned(),
        response_english: "Here you go".to_owned(),
        response_mapping: Vec::new(),
        charm_delta: 7,
    }
}

fn client_for(url: &str, dir: &TempDir) -> HttpDialogueClient {
    let scratch = Arc::new(ScratchSpace::new(dir.path().join("scratch")).unwrap());
    HttpDialogueClient::new(ClientConfig::new(url), scratch).unwrap()
}

async fn request_with_recording(dir: &TempDir) -> TurnRequest {
    let recording: PathBuf = dir.path().join("turn.m4a");
    tokio::fs::write(&recording, b"fake-aac-bytes").await.unwrap();
    TurnRequest {
        npc: NpcProfile::new("baker", "Baker Kim"),
        charm: CharmLevel::clamped(42),
        history_transcript: "Player: 안녕하세요\nBaker Kim: 어서 오세요".to_owned(),
        recording,
    }
}

#[tokio::test]
async fn test_submit_turn_sends_form_and_decodes_reply() {
    // Arrange
    let backend = spawn_backend(MockReply::Turn {
        metadata: Some(metadata().encode()),
        audio: b"ID3-reply-audio".to_vec(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&backend.url, &dir);
    let request = request_with_recording(&dir).await;

    // Act
    let reply = client.submit_turn(request).await.unwrap();

    // Assert
    assert_eq!(reply.player_text, "빵 주세요");
    assert_eq!(reply.player_alignments[0].gloss_english, "bread");
    assert_eq!(reply.npc_text, "여기 있어요");
    assert_eq!(reply.npc_english, "Here you go");
    assert_eq!(reply.charm_delta, 7);
    let audio = reply.npc_audio.expect("reply audio stored");
    assert_eq!(tokio::fs::read(&audio).await.unwrap(), b"ID3-reply-audio");

    let captured = backend.captured();
    assert_eq!(captured.len(), 1);
    let form = &captured[0];
    assert_eq!(form["npc_id"], b"baker");
    assert_eq!(form["npc_name"], "Baker Kim".as_bytes());
    assert_eq!(form["charm_level"], b"42");
    assert_eq!(
        form["history"],
        "Player: 안녕하세요\nBaker Kim: 어서 오세요".as_bytes()
    );
    assert_eq!(form["audio"], b"fake-aac-bytes");
}

#[tokio::test]
async fn test_empty_audio_body_yields_no_artifact() {
    let backend = spawn_backend(MockReply::Turn {
        metadata: Some(metadata().encode()),
        audio: Vec::new(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&backend.url, &dir);

    let reply = client
        .submit_turn(request_with_recording(&dir).await)
        .await
        .unwrap();

    assert!(reply.npc_audio.is_none());
}

#[tokio::test]
async fn test_missing_metadata_header_is_protocol_error() {
    // Arrange
    let backend = spawn_backend(MockReply::Turn {
        metadata: None,
        audio: b"ID3".to_vec(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&backend.url, &dir);

    // Act
    let err = client
        .submit_turn(request_with_recording(&dir).await)
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(err, TurnError::Protocol(_)), "{err:?}");
}

#[tokio::test]
async fn test_rate_limited_body_is_service_error_with_sentence() {
    // Arrange
    let backend = spawn_backend(MockReply::Error {
        status: 500,
        body: r#"{"detail": "{'status': 'rate_limited'}"}"#.to_owned(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&backend.url, &dir);

    // Act
    let err = client
        .submit_turn(request_with_recording(&dir).await)
        .await
        .unwrap_err();

    // Assert
    match err {
        TurnError::Service { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Rate limited");
        }
        other => panic!("expected Service, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let url = common::dead_endpoint().await;
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&url, &dir);

    let err = client
        .submit_turn(request_with_recording(&dir).await)
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn test_missing_recording_is_storage_error() {
    let backend = spawn_backend(MockReply::Turn {
        metadata: Some(metadata().encode()),
        audio: Vec::new(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&backend.url, &dir);
    let mut request = request_with_recording(&dir).await;
    request.recording = dir.path().join("missing.m4a");

    let err = client.submit_turn(request).await.unwrap_err();

    assert!(matches!(err, TurnError::Storage(_)), "{err:?}");
    assert!(backend.captured().is_empty());
}
