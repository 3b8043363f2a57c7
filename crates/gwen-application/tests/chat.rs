mod common;

use common::{ChatScript, Harness, MockBackend};
use gwen_application::{ChatPhase, SendOutcome};
use gwen_core::error::GwenError;
use gwen_core::event::{NotificationLevel, SessionEvent};
use gwen_core::session::{ChatRole, ModelCatalog, PREFERRED_MODEL, RenderState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn completed_id(outcome: &SendOutcome) -> &str {
    match outcome {
        SendOutcome::Completed { entry_id } => entry_id,
        other => panic!("expected completed turn, got {other:?}"),
    }
}

#[tokio::test]
async fn test_frame_split_across_chunks_is_reassembled() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::Chunks(vec![
        br#"{"type":"progress","mess"#.to_vec(),
        b"age\":\"hi\"}\n{\"type\":\"complete\",\"message\":\"done\"}\n".to_vec(),
    ]));
    let h = Harness::new(backend);
    let client = h.chat();

    let outcome = client.send("write hello world").await;

    let entry = client.entry(completed_id(&outcome)).unwrap();
    assert_eq!(entry.text, "hi\ndone");
    assert_eq!(entry.render_state, RenderState::Complete);
    assert!(!h.state.is_processing());
    assert_eq!(client.phase(), ChatPhase::Idle);
}

#[tokio::test]
async fn test_turn_appends_one_user_and_one_assistant_entry() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::lines(&[
        r#"{"type":"progress","message":"Generated file: app.py"}"#,
        r#"{"type":"complete","message":"Code generation complete"}"#,
    ]));
    let mut h = Harness::new(backend);
    let client = h.chat();

    client.send("  build an app  ").await;

    let transcript = client.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, ChatRole::User);
    assert_eq!(transcript[0].text, "build an app");
    assert_eq!(transcript[1].role, ChatRole::Assistant);
    assert_eq!(
        transcript[1].text,
        "Generated file: app.py\nCode generation complete"
    );

    // Scrolled after the placeholder and after each applied frame.
    let scrolls = h
        .drain()
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::TranscriptScrolled { .. }))
        .count();
    assert_eq!(scrolls, 3);
}

#[tokio::test]
async fn test_error_frame_replaces_progress() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::lines(&[
        r#"{"type":"progress","message":"thinking"}"#,
        r#"{"type":"error","message":"model not found"}"#,
        r#"{"type":"complete","message":"ignored"}"#,
    ]));
    let h = Harness::new(backend);
    let client = h.chat();

    let outcome = client.send("hello").await;

    let SendOutcome::Errored { entry_id, message } = outcome else {
        panic!("expected errored turn, got {outcome:?}");
    };
    assert_eq!(message, "model not found");
    let entry = client.entry(&entry_id).unwrap();
    assert_eq!(entry.text, "model not found");
    assert_eq!(entry.render_state, RenderState::Error);
    assert!(!h.state.is_processing());
}

#[tokio::test]
async fn test_invalid_lines_are_skipped() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::lines(&[
        "not json at all",
        r#"{"type":"heartbeat","message":"?"}"#,
        r#"{"type":"progress","message":"a"}"#,
        r#"{"type":"complete","message":"b"}"#,
    ]));
    let h = Harness::new(backend);
    let client = h.chat();

    let outcome = client.send("hello").await;
    assert_eq!(client.entry(completed_id(&outcome)).unwrap().text, "a\nb");
}

#[tokio::test]
async fn test_body_ending_without_terminal_frame_releases_session() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::lines(&[r#"{"type":"progress","message":"partial"}"#]));
    let mut h = Harness::new(backend);
    let client = h.chat();

    let outcome = client.send("hello").await;

    let SendOutcome::Errored { entry_id, message } = outcome else {
        panic!("expected errored turn, got {outcome:?}");
    };
    assert_eq!(message, "Failed to send message");
    assert_eq!(
        client.entry(&entry_id).unwrap().render_state,
        RenderState::Error
    );
    assert!(!h.state.is_processing());

    let errors: Vec<_> = h
        .notifications()
        .into_iter()
        .filter(|n| n.level == NotificationLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_unterminated_final_frame_still_completes() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::Chunks(vec![
        br#"{"type":"complete","message":"tail"}"#.to_vec(),
    ]));
    let h = Harness::new(backend);
    let client = h.chat();

    let outcome = client.send("hello").await;
    assert_eq!(client.entry(completed_id(&outcome)).unwrap().text, "tail");
}

#[tokio::test]
async fn test_request_failure_releases_session() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::Fail(GwenError::backend(
        400,
        Some("Prompt is required".to_string()),
    )));
    let mut h = Harness::new(backend);
    let client = h.chat();

    let outcome = client.send("hello").await;

    assert!(matches!(
        outcome,
        SendOutcome::Errored { ref message, .. } if message == "Prompt is required"
    ));
    assert!(!h.state.is_processing());
    assert_eq!(h.notifications()[0].message, "Prompt is required");

    // The session accepts the next request.
    h.backend.push_chat(ChatScript::lines(&[r#"{"type":"complete","message":"ok"}"#]));
    assert!(matches!(
        client.send("again").await,
        SendOutcome::Completed { .. }
    ));
}

#[tokio::test]
async fn test_second_send_while_processing_is_a_noop() {
    let (tx, rx) = mpsc::unbounded_channel();
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::Channel(rx));
    let h = Harness::new(backend);
    let client = Arc::new(h.chat());

    let first = tokio::spawn({
        let client = client.clone();
        async move { client.send("first").await }
    });
    while !h.state.is_processing() {
        tokio::task::yield_now().await;
    }

    assert_eq!(client.send("second").await, SendOutcome::Skipped);
    assert_eq!(client.transcript().len(), 2);
    assert_eq!(h.backend.chat_requests.lock().unwrap().len(), 1);
    assert!(h.state.is_processing());

    tx.send(Ok(b"{\"type\":\"complete\",\"message\":\"done\"}\n".to_vec()))
        .unwrap();
    let outcome = first.await.unwrap();
    assert!(matches!(outcome, SendOutcome::Completed { .. }));
    assert!(!h.state.is_processing());
}

#[tokio::test]
async fn test_stream_read_error_releases_session() {
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(Ok(b"{\"type\":\"progress\",\"message\":\"a\"}\n".to_vec()))
        .unwrap();
    tx.send(Err(GwenError::transport("connection reset"))).unwrap();
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::Channel(rx));
    let h = Harness::new(backend);
    let client = h.chat();

    let outcome = client.send("hello").await;

    assert!(matches!(outcome, SendOutcome::Errored { .. }));
    assert!(!h.state.is_processing());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_stream_times_out() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::Stall(vec![
        b"{\"type\":\"progress\",\"message\":\"a\"}\n".to_vec(),
    ]));
    let h = Harness::new(backend);
    let client = h.chat().with_stall_timeout(Duration::from_secs(120));

    let outcome = client.send("hello").await;

    let SendOutcome::Errored { entry_id, .. } = outcome else {
        panic!("expected errored turn, got {outcome:?}");
    };
    assert_eq!(
        client.entry(&entry_id).unwrap().render_state,
        RenderState::Error
    );
    assert!(!h.state.is_processing());
}

#[tokio::test]
async fn test_blank_prompt_is_ignored() {
    let h = Harness::new(MockBackend::new());
    let client = h.chat();

    assert_eq!(client.send("   \n").await, SendOutcome::Ignored);
    assert!(client.transcript().is_empty());
    assert!(h.backend.chat_requests.lock().unwrap().is_empty());
    assert!(!h.state.is_processing());
}

#[tokio::test]
async fn test_request_uses_selected_model() {
    let backend = MockBackend::new();
    backend.push_chat(ChatScript::lines(&[r#"{"type":"complete","message":"1"}"#]));
    backend.push_chat(ChatScript::lines(&[r#"{"type":"complete","message":"2"}"#]));
    let h = Harness::new(backend);
    let client = h.chat();

    client.send("one").await;
    h.state.set_catalog(
        ModelCatalog::from_models(vec!["mistral".to_string()], PREFERRED_MODEL),
        true,
    );
    client.send("two").await;

    let requests = h.backend.chat_requests.lock().unwrap();
    assert_eq!(requests[0].model, PREFERRED_MODEL);
    assert_eq!(requests[1].model, "mistral");
    assert_eq!(requests[1].prompt, "two");
}
