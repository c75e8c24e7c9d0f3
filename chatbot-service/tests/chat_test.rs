//! Integration tests for the message-send flow and history retrieval.

mod common;

use axum::http::StatusCode;
use chatbot_service::services::providers::{mock::MockReplyProvider, ProviderError};
use chatbot_service::services::{MessageStore, ReplyGenerator};
use common::{RecordingReplyProvider, TestApp};
use serde_json::json;

async fn registered_token(app: &TestApp) -> (String, String) {
    let body = app.register("Alice", "pw1", None).await;
    (
        body["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

fn assert_timestamps_ascending(messages: &[serde_json::Value]) {
    let mut previous: Option<chrono::DateTime<chrono::FixedOffset>> = None;
    for message in messages {
        let ts = chrono::DateTime::parse_from_rfc3339(message["timestamp"].as_str().unwrap())
            .expect("timestamp must be RFC 3339");
        if let Some(prev) = previous {
            assert!(ts >= prev, "timestamps must be non-decreasing");
        }
        previous = Some(ts);
    }
}

// ============================================================================
// Send
// ============================================================================

#[tokio::test]
async fn send_without_conversation_id_mints_a_fresh_one() {
    let app = TestApp::spawn();
    let (_, token) = registered_token(&app).await;

    let (status, first) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "Bonjour" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let first_id = first["conversationId"].as_str().unwrap();
    assert!(!first_id.is_empty());

    let (_, second) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "Encore" }))
        .await;
    let second_id = second["conversationId"].as_str().unwrap();

    // Each omitted id starts a new conversation.
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn send_with_existing_conversation_id_keeps_it() {
    let app = TestApp::spawn();
    let (_, token) = registered_token(&app).await;

    let (_, first) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "Hello" }))
        .await;
    let conversation_id = first["conversationId"].as_str().unwrap().to_string();

    let (status, second) = app
        .post_json(
            "/chat/send",
            Some(&token),
            json!({ "message": "Again", "conversationId": conversation_id }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["conversationId"], conversation_id.as_str());
    assert_eq!(second["userMessage"]["conversationId"], conversation_id.as_str());
}

#[tokio::test]
async fn send_returns_both_turns() {
    let app = TestApp::spawn();
    let (user_id, token) = registered_token(&app).await;

    let (status, body) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "Bonjour" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);

    let user_message = &body["userMessage"];
    assert_eq!(user_message["sender"], "user");
    assert_eq!(user_message["text"], "Bonjour");
    assert_eq!(user_message["userId"], user_id.as_str());
    assert_eq!(user_message["authorRole"], "student");

    let bot_message = &body["botMessage"];
    assert_eq!(bot_message["sender"], "bot");
    assert!(!bot_message["text"].as_str().unwrap().is_empty());
    assert_eq!(
        bot_message["conversationId"],
        user_message["conversationId"]
    );
}

#[tokio::test]
async fn send_carries_metadata_through_both_turns() {
    let app = TestApp::spawn();
    let (_, token) = registered_token(&app).await;

    let metadata = json!({ "lang": "fr", "topic": "greetings" });
    let (_, body) = app
        .post_json(
            "/chat/send",
            Some(&token),
            json!({ "message": "Bonjour", "metadata": metadata }),
        )
        .await;

    assert_eq!(body["userMessage"]["metadata"], metadata);
    assert_eq!(body["botMessage"]["metadata"], metadata);
}

#[tokio::test]
async fn whitespace_only_message_is_rejected_and_nothing_persisted() {
    let app = TestApp::spawn();
    let (user_id, token) = registered_token(&app).await;

    let (status, body) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "  \t\n " }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EMPTY_MESSAGE");

    let stored = app.store.messages_for_user(&user_id).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn provider_failure_becomes_a_stored_apology_reply() {
    let app = TestApp::with_provider(MockReplyProvider::failing(ProviderError::NetworkError(
        "connection refused".to_string(),
    )));
    let (user_id, token) = registered_token(&app).await;

    let (status, body) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "Hello" }))
        .await;

    // The failure never surfaces: still 201 with a bot turn.
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["userMessage"]["text"].as_str().unwrap().is_empty());
    assert!(!body["botMessage"]["text"].as_str().unwrap().is_empty());

    let stored = app.store.messages_for_user(&user_id).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn unconfigured_generator_stores_only_the_user_turn() {
    let app = TestApp::with_generator(ReplyGenerator::disabled());
    let (user_id, token) = registered_token(&app).await;

    let (status, body) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "Hello" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["userMessage"]["text"], "Hello");
    assert!(body["botMessage"].is_null());

    let stored = app.store.messages_for_user(&user_id).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn empty_provider_reply_stores_no_bot_turn() {
    let app = TestApp::with_provider(MockReplyProvider::with_reply("   "));
    let (user_id, token) = registered_token(&app).await;

    let (status, body) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "Hello" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["botMessage"].is_null());

    let stored = app.store.messages_for_user(&user_id).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn send_requires_authentication() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json("/chat/send", None, json!({ "message": "Hello" }))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_MISSING_TOKEN");
}

// ============================================================================
// Context window
// ============================================================================

#[tokio::test]
async fn context_window_is_chronological_capped_and_excludes_current_turn() {
    let provider = RecordingReplyProvider::new();
    let app = TestApp::with_provider(provider.clone());
    let (_, token) = registered_token(&app).await;

    let (_, first) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "m1" }))
        .await;
    let conversation_id = first["conversationId"].as_str().unwrap().to_string();

    for i in 2..=13 {
        app.post_json(
            "/chat/send",
            Some(&token),
            json!({ "message": format!("m{}", i), "conversationId": conversation_id }),
        )
        .await;
    }

    let calls = provider.calls();
    assert_eq!(calls.len(), 13);

    // First turn of a conversation has no context.
    assert!(calls[0].1.is_empty());

    // By the 13th send there are 24 prior turns; only the 10 most recent are
    // handed over, oldest first, and the current input is not among them.
    let (input, history) = &calls[12];
    assert_eq!(input, "m13");
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].text, "m8");
    assert_eq!(history[9].text, "Reply to: m12");
    assert!(history.iter().all(|turn| turn.text != "m13"));
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn history_roundtrip_returns_messages_in_call_order() {
    let app = TestApp::spawn();
    let (_, token) = registered_token(&app).await;

    let (_, first) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "one" }))
        .await;
    let conversation_id = first["conversationId"].as_str().unwrap().to_string();
    for text in ["two", "three"] {
        app.post_json(
            "/chat/send",
            Some(&token),
            json!({ "message": text, "conversationId": conversation_id }),
        )
        .await;
    }

    let (status, body) = app
        .get(
            &format!("/chat/history?conversationId={}", conversation_id),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversationId"], conversation_id.as_str());

    let messages = body["messages"].as_array().unwrap();
    // 3 sends, each one user turn plus one bot turn.
    assert_eq!(messages.len(), 6);
    assert_timestamps_ascending(messages);

    let texts: Vec<&str> = messages.iter().map(|m| m["text"].as_str().unwrap()).collect();
    assert_eq!(
        texts,
        vec![
            "one",
            "Mock reply for: one",
            "two",
            "Mock reply for: two",
            "three",
            "Mock reply for: three",
        ]
    );
    let senders: Vec<&str> = messages
        .iter()
        .map(|m| m["sender"].as_str().unwrap())
        .collect();
    assert_eq!(senders, vec!["user", "bot", "user", "bot", "user", "bot"]);
}

#[tokio::test]
async fn history_without_id_resolves_the_latest_conversation() {
    let app = TestApp::spawn();
    let (_, token) = registered_token(&app).await;

    app.post_json("/chat/send", Some(&token), json!({ "message": "old thread" }))
        .await;
    let (_, newer) = app
        .post_json("/chat/send", Some(&token), json!({ "message": "new thread" }))
        .await;
    let newer_id = newer["conversationId"].as_str().unwrap();

    let (status, body) = app.get("/chat/history", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversationId"], newer_id);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["text"], "new thread");
}

#[tokio::test]
async fn history_all_returns_every_conversation_with_null_id() {
    let app = TestApp::spawn();
    let (_, token) = registered_token(&app).await;

    app.post_json("/chat/send", Some(&token), json!({ "message": "first" }))
        .await;
    app.post_json("/chat/send", Some(&token), json!({ "message": "second" }))
        .await;

    let (status, body) = app.get("/chat/history?all=true", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["conversationId"].is_null());

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_timestamps_ascending(messages);

    // Two distinct conversation ids; the client groups them itself.
    let ids: std::collections::HashSet<&str> = messages
        .iter()
        .map(|m| m["conversationId"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn history_for_a_user_with_no_messages_is_empty_with_null_id() {
    let app = TestApp::spawn();
    let (_, token) = registered_token(&app).await;

    let (status, body) = app.get("/chat/history", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["conversationId"].is_null());
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn history_is_scoped_to_the_calling_user() {
    let app = TestApp::spawn();
    let alice = app.register("Alice", "pw1", None).await;
    let bob = app.register("Bob", "pw2", None).await;
    let alice_token = alice["token"].as_str().unwrap();
    let bob_token = bob["token"].as_str().unwrap();

    let (_, sent) = app
        .post_json(
            "/chat/send",
            Some(alice_token),
            json!({ "message": "private" }),
        )
        .await;
    let conversation_id = sent["conversationId"].as_str().unwrap();

    // Bob asks for Alice's conversation id and gets nothing.
    let (status, body) = app
        .get(
            &format!("/chat/history?conversationId={}", conversation_id),
            Some(bob_token),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);
}
