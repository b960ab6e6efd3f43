use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use time::OffsetDateTime;

use super::models::{ChatMessageRecord, ChatThreadRecord, MESSAGE_DOC_TYPE, THREAD_DOC_TYPE};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query surface the reporting service needs from the chat document store.
pub trait ThreadStore: Send + Sync {
    /// Thread records newest-first, `offset`/`limit` applied after ordering.
    fn threads_page(&self, limit: usize, offset: usize)
        -> Result<Vec<ChatThreadRecord>, StoreError>;

    /// All messages of one thread, oldest-first.
    fn thread_messages(&self, thread_id: &str) -> Result<Vec<ChatMessageRecord>, StoreError>;

    /// Thread records with `createdAt` inside `[start, end]`, newest-first.
    fn threads_created_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ChatThreadRecord>, StoreError>;
}

/// Development store keeping one JSON document per file under a base
/// directory. Documents that fail the strict decode are skipped with a
/// warning instead of poisoning whole queries.
pub struct FileThreadStore {
    threads_dir: PathBuf,
    messages_dir: PathBuf,
}

impl FileThreadStore {
    pub fn new(base_dir: PathBuf) -> Result<Self, StoreError> {
        let threads_dir = base_dir.join("threads");
        let messages_dir = base_dir.join("messages");
        fs::create_dir_all(&threads_dir)?;
        fs::create_dir_all(&messages_dir)?;
        Ok(Self {
            threads_dir,
            messages_dir,
        })
    }

    pub fn put_thread(&self, record: &ChatThreadRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(record)?;
        fs::write(self.threads_dir.join(format!("{}.json", record.id)), payload)?;
        Ok(())
    }

    pub fn put_message(&self, record: &ChatMessageRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(record)?;
        fs::write(
            self.messages_dir.join(format!("{}.json", record.id)),
            payload,
        )?;
        Ok(())
    }

    fn load_threads(&self) -> Result<Vec<ChatThreadRecord>, StoreError> {
        let mut records: Vec<ChatThreadRecord> = load_documents(&self.threads_dir)?;
        records.retain(|record| record.doc_type == THREAD_DOC_TYPE);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

impl ThreadStore for FileThreadStore {
    fn threads_page(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ChatThreadRecord>, StoreError> {
        Ok(self
            .load_threads()?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    fn thread_messages(&self, thread_id: &str) -> Result<Vec<ChatMessageRecord>, StoreError> {
        let mut records: Vec<ChatMessageRecord> = load_documents(&self.messages_dir)?;
        records.retain(|record| {
            record.doc_type == MESSAGE_DOC_TYPE && record.thread_id == thread_id
        });
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    fn threads_created_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<ChatThreadRecord>, StoreError> {
        Ok(self
            .load_threads()?
            .into_iter()
            .filter(|record| record.created_at >= start && record.created_at <= end)
            .collect())
    }
}

fn load_documents<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>, StoreError> {
    let mut records = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let bytes = fs::read(&path)?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping malformed document");
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::datetime;

    fn thread(id: &str, user: &str, created_at: OffsetDateTime) -> ChatThreadRecord {
        ChatThreadRecord::new(id, None, Some(user.into()), None, created_at)
    }

    #[test]
    fn threads_page_orders_newest_first() {
        let dir = tempdir().expect("tempdir");
        let store = FileThreadStore::new(dir.path().to_path_buf()).expect("store");
        store
            .put_thread(&thread("t1", "u1", datetime!(2026-07-01 08:00 UTC)))
            .unwrap();
        store
            .put_thread(&thread("t2", "u1", datetime!(2026-07-03 08:00 UTC)))
            .unwrap();
        store
            .put_thread(&thread("t3", "u2", datetime!(2026-07-02 08:00 UTC)))
            .unwrap();

        let page = store.threads_page(2, 0).unwrap();
        assert_eq!(
            page.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["t2", "t3"]
        );

        let rest = store.threads_page(2, 2).unwrap();
        assert_eq!(
            rest.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["t1"]
        );
    }

    #[test]
    fn messages_filter_by_thread_and_order_oldest_first() {
        let dir = tempdir().expect("tempdir");
        let store = FileThreadStore::new(dir.path().to_path_buf()).expect("store");
        store
            .put_message(&ChatMessageRecord::new(
                "m2",
                "t1",
                "assistant",
                "hello back",
                datetime!(2026-07-01 08:01 UTC),
            ))
            .unwrap();
        store
            .put_message(&ChatMessageRecord::new(
                "m1",
                "t1",
                "user",
                "hello",
                datetime!(2026-07-01 08:00 UTC),
            ))
            .unwrap();
        store
            .put_message(&ChatMessageRecord::new(
                "m3",
                "t2",
                "user",
                "other thread",
                datetime!(2026-07-01 08:02 UTC),
            ))
            .unwrap();

        let messages = store.thread_messages("t1").unwrap();
        assert_eq!(
            messages.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["m1", "m2"]
        );
    }

    #[test]
    fn window_query_is_inclusive() {
        let dir = tempdir().expect("tempdir");
        let store = FileThreadStore::new(dir.path().to_path_buf()).expect("store");
        store
            .put_thread(&thread("inside", "u1", datetime!(2026-07-02 00:00 UTC)))
            .unwrap();
        store
            .put_thread(&thread("before", "u1", datetime!(2026-06-20 00:00 UTC)))
            .unwrap();

        let records = store
            .threads_created_between(
                datetime!(2026-07-01 00:00 UTC),
                datetime!(2026-07-07 23:59:59.999 UTC),
            )
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "inside");
    }

    #[test]
    fn malformed_documents_are_skipped() {
        let dir = tempdir().expect("tempdir");
        let store = FileThreadStore::new(dir.path().to_path_buf()).expect("store");
        store
            .put_thread(&thread("ok", "u1", datetime!(2026-07-02 00:00 UTC)))
            .unwrap();
        fs::write(dir.path().join("threads/broken.json"), b"{not json").unwrap();

        let page = store.threads_page(10, 0).unwrap();
        assert_eq!(page.len(), 1);
    }
}
