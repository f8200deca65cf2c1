//! Integration tests for conversation memory backed by files on disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use cadre_core::ContextSource;
use cadre_memory::*;
use std::sync::Arc;

fn turn(q: &str, a: &str) -> Conversation {
    Conversation {
        question: q.into(),
        answer: a.into(),
        agents: vec!["Calc".into()],
        reason: "arithmetic".into(),
    }
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();

    {
        let store = FileMemoryStore::new(path.clone()).await.unwrap();
        let ids = store
            .upload(&[turn("1+1?", "2"), turn("2+2?", "4")], Some("ctx"))
            .await
            .unwrap();
        assert_eq!(ids, vec![0, 1]);
    }

    let reopened = FileMemoryStore::new(path).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 2);

    let latest = reopened.latest().await.unwrap().unwrap();
    assert_eq!(latest.id, 1);
    assert_eq!(latest.conversation.answer, "4");
    assert_eq!(latest.pre_context.as_deref(), Some("ctx"));

    // New ids continue after the ones already on disk.
    let ids = reopened.upload(&[turn("3+3?", "6")], None).await.unwrap();
    assert_eq!(ids, vec![2]);
    assert!(reopened.fetch(2).await.unwrap().unwrap().pre_context.is_none());
}

#[tokio::test]
async fn manager_from_config_uses_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = MemoryConfig {
        data_dir: Some(dir.path().join("memory")),
        buffer_capacity: 2,
    };
    let memory = MemoryManager::from_config(&config).await.unwrap();

    memory.add_conversation(turn("a?", "A")).await.unwrap();
    assert_eq!(memory.buffered().await, 1);
    assert_eq!(memory.recent_context(5).await, vec!["Previous Q: a?, Previous A: A"]);

    memory.add_conversation(turn("b?", "B")).await.unwrap();
    assert_eq!(memory.buffered().await, 0);
    assert!(memory.recent_context(5).await.is_empty());
    assert!(dir.path().join("memory/conversation-1.json").exists());

    assert_eq!(
        memory.lookup("latest").await.unwrap().as_deref(),
        Some("Previous Q: b?, Previous A: B")
    );
}

#[tokio::test]
async fn concurrent_writers_share_one_store() {
    let memory = Arc::new(MemoryManager::new(Arc::new(InMemoryStore::new()), 4));

    let mut handles = Vec::new();
    for i in 0..8 {
        let memory = memory.clone();
        handles.push(tokio::spawn(async move {
            memory
                .add_conversation(turn(&format!("q{i}"), &format!("a{i}")))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(memory.store().count().await.unwrap(), 8);
    assert_eq!(memory.buffered().await, 0);
}

#[test]
fn default_config() {
    let config: MemoryConfig = serde_json::from_str("{}").unwrap();
    assert!(config.data_dir.is_none());
    assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
}
