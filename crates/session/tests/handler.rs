pub mod fixtures;

use fixtures::*;
use keepsake_session::*;
use keepsake_store::{FileStore, MemoryStore, SessionStore};
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_end_to_end_roundtrip() {
    let handler = setup_handler(CipherMode::Cbc);
    let id = sid("abc");
    let original = payload(json!({ "user": { "id": 42 } }));

    handler.write(&id, &SessionState::from_payload(original.clone())).await.unwrap();
    let loaded = handler.load(&id).await.unwrap();

    assert_eq!(loaded.outcome, LoadOutcome::Restored);
    assert_eq!(loaded.state.snapshot(), original);
}

#[tokio::test]
async fn test_stored_blob_is_not_plaintext() {
    let handler = setup_handler(CipherMode::Cbc);
    let id = sid("abc");

    handler
        .write(&id, &SessionState::from_payload(payload(json!({ "user": { "id": 42 } }))))
        .await
        .unwrap();

    let raw = handler.store().read(&id).await.unwrap().unwrap();
    let text = String::from_utf8(raw).unwrap();
    assert!(!text.contains("user"));
    assert_eq!(keepsake_codec::decrypt(&text, SECRET).unwrap(), br#"{"user":{"id":42}}"#);
}

#[tokio::test]
async fn test_absent_session_is_fresh_and_empty() {
    let handler = setup_handler(CipherMode::Cbc);

    let loaded = handler.load(&sid("never-written")).await.unwrap();

    assert_eq!(loaded.outcome, LoadOutcome::Fresh);
    assert!(loaded.state.is_empty());
    assert_eq!(handler.decrypt_failures(), 0);
}

#[tokio::test]
async fn test_tampered_session_reads_as_empty() {
    let handler = setup_handler(CipherMode::Cbc);
    let id = sid("abc");
    handler
        .write(&id, &SessionState::from_payload(payload(json!({ "user": { "id": 42 } }))))
        .await
        .unwrap();

    let blob = handler.store().read(&id).await.unwrap().unwrap();
    handler.store().write(&id, &flip_decoded_byte(&blob, 0)).await.unwrap();

    let state = handler.read(&id).await.expect("tampering must not be an error");

    assert!(state.is_empty());
    assert_eq!(handler.decrypt_failures(), 1);
}

#[tokio::test]
async fn test_authenticated_mode_discards_any_tampered_byte() {
    let handler = setup_handler(CipherMode::Authenticated);
    let id = sid("abc");
    handler
        .write(&id, &SessionState::from_payload(payload(json!({ "user": { "id": 42 } }))))
        .await
        .unwrap();
    let blob = handler.store().read(&id).await.unwrap().unwrap();
    let decoded_len = keepsake_codec::Envelope::decode(&blob).unwrap().len();

    for index in 0..decoded_len {
        handler.store().write(&id, &flip_decoded_byte(&blob, index)).await.unwrap();
        let loaded = handler.load(&id).await.unwrap();

        assert_eq!(loaded.outcome, LoadOutcome::Discarded, "byte {index}");
        assert!(loaded.state.is_empty());
    }

    assert_eq!(handler.decrypt_failures(), decoded_len as u64);
}

#[tokio::test]
async fn test_garbage_blob_is_discarded() {
    let handler = setup_handler(CipherMode::Cbc);
    let id = sid("abc");

    handler.store().write(&id, b"definitely not base64 !!").await.unwrap();

    assert_eq!(handler.load(&id).await.unwrap().outcome, LoadOutcome::Discarded);
}

#[tokio::test]
async fn test_key_mismatch_discards_session() {
    let store = MemoryStore::default();
    let writer =
        SessionHandler::builder().store(store.clone()).encryption_key("old-key").build().unwrap();
    let reader =
        SessionHandler::builder().store(store).encryption_key("rotated-key").build().unwrap();
    let id = sid("abc");

    writer
        .write(&id, &SessionState::from_payload(payload(json!({ "user": { "id": 42 } }))))
        .await
        .unwrap();

    let loaded = reader.load(&id).await.unwrap();
    assert_eq!(loaded.outcome, LoadOutcome::Discarded);
    assert_eq!(reader.decrypt_failures(), 1);
}

#[tokio::test]
async fn test_fingerprint_change_discards_session() {
    let store = MemoryStore::default();
    let build = |client: &str| {
        SessionHandler::builder()
            .store(store.clone())
            .encryption_key(SECRET)
            .fingerprint(fingerprint(client))
            .build()
            .unwrap()
    };
    let id = sid("abc");

    let chrome = build("Mozilla/5.0 Chrome");
    let state = SessionState::new();
    state.accessor().set("cart.items", 3);
    chrome.write(&id, &state).await.unwrap();

    assert_eq!(build("Mozilla/5.0 Chrome").load(&id).await.unwrap().outcome, LoadOutcome::Restored);
    assert_eq!(build("curl/8.0").load(&id).await.unwrap().outcome, LoadOutcome::Discarded);
}

#[tokio::test]
async fn test_without_key_payload_is_stored_plain() {
    let handler = SessionHandler::builder().store(MemoryStore::default()).build().unwrap();
    let id = sid("abc");

    handler
        .write(&id, &SessionState::from_payload(payload(json!({ "user": { "id": 42 } }))))
        .await
        .unwrap();

    let raw = handler.store().read(&id).await.unwrap().unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&raw).unwrap(), json!({ "user": { "id": 42 } }));
    assert_eq!(handler.read(&id).await.unwrap().snapshot(), payload(json!({ "user": { "id": 42 } })));
}

#[tokio::test]
async fn test_backend_failures_propagate() {
    let handler = SessionHandler::builder().store(FailingStore).encryption_key(SECRET).build().unwrap();
    let id = sid("abc");

    let read = handler.read(&id).await.expect_err("read must fail");
    let write = handler.write(&id, &SessionState::new()).await.expect_err("write must fail");
    let destroy = handler.destroy(&id).await.expect_err("destroy must fail");

    assert!(read.is_backend() && write.is_backend() && destroy.is_backend());
    assert_eq!(handler.decrypt_failures(), 0);
}

#[tokio::test]
async fn test_destroy_then_read_is_fresh() {
    let handler = setup_handler(CipherMode::Cbc);
    let id = sid("abc");
    handler.write(&id, &SessionState::new()).await.unwrap();

    handler.destroy(&id).await.unwrap();

    assert_eq!(handler.load(&id).await.unwrap().outcome, LoadOutcome::Fresh);
}

#[tokio::test]
async fn test_file_store_end_to_end_with_gc() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::builder().root(temp.path()).connect().await.unwrap();
    let handler = SessionHandler::builder()
        .store(store)
        .encryption_key(SECRET)
        .lifetime(Duration::from_secs(3600))
        .build()
        .unwrap();
    let id = sid("abcdef0123");

    let state = handler.read(&id).await.unwrap();
    let mut session = state.accessor();
    session.set("user.id", 42);
    session.set_to("flash", "notice", "Welcome back");
    handler.write(&id, &state).await.unwrap();

    let restored = handler.read(&id).await.unwrap();
    assert_eq!(restored.accessor().get("user.id"), Some(json!(42)));
    assert_eq!(restored.namespace("flash").get("notice"), Some(json!("Welcome back")));

    assert_eq!(handler.gc().await.unwrap(), 0);
    assert!(handler.store().resolve(&id).exists());
}

#[tokio::test]
async fn test_from_config_binds_user_agent() {
    let store = MemoryStore::default();
    let config = SessionConfig {
        encryption_key: Some(SECRET.to_owned()),
        bind_user_agent: true,
        cipher: CipherMode::Authenticated,
        ..SessionConfig::default()
    };
    let id = sid("abc");

    let handler = SessionHandler::from_config(store.clone(), &config, Some("agent/1")).unwrap();
    handler.write(&id, &SessionState::new()).await.unwrap();

    let same = SessionHandler::from_config(store.clone(), &config, Some("agent/1")).unwrap();
    let other = SessionHandler::from_config(store, &config, Some("agent/2")).unwrap();

    assert_eq!(same.mode(), Some(CipherMode::Authenticated));
    assert_eq!(same.load(&id).await.unwrap().outcome, LoadOutcome::Restored);
    assert_eq!(other.load(&id).await.unwrap().outcome, LoadOutcome::Discarded);
}

#[tokio::test]
async fn test_from_config_rejects_invalid_settings() {
    let config = SessionConfig { encryption_key: Some(String::new()), ..SessionConfig::default() };

    let err = SessionHandler::from_config(MemoryStore::default(), &config, None).unwrap_err();

    assert!(matches!(err, SessionError::Configuration { .. }));
}
