//! Long-term memory: namespaced JSON records that survive across threads.
//!
//! A [`Namespace`] is a `(MemoryKind, user_id)` pair; records inside it are
//! `(id, JSON value)` entries in insertion order. `put` replaces wholesale by
//! id, so replaying the same write is a no-op in effect. Store failures are
//! recoverable by contract: readers degrade to an empty view via
//! [`search_or_empty`], and only explicit resets delete anything.

pub mod records;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::message::MemoryKind;

/// Addressing for one user's records of one kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub kind: MemoryKind,
    pub user_id: String,
}

impl Namespace {
    #[must_use]
    pub fn new(kind: MemoryKind, user_id: &str) -> Self {
        Self {
            kind,
            user_id: user_id.to_string(),
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.user_id)
    }
}

/// One stored document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum MemoryError {
    #[error("memory store unavailable: {0}")]
    #[diagnostic(
        code(lingograph::memory::unavailable),
        help("Reads degrade to an empty namespace; writes should be retried next turn.")
    )]
    Unavailable(String),

    #[error(transparent)]
    #[diagnostic(code(lingograph::memory::serde_json))]
    Serde(#[from] serde_json::Error),
}

/// The storage seam. Implementations must keep `put` atomic per record id and
/// writes immediately visible to subsequent `search` calls.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// All records in the namespace, insertion order.
    async fn search(&self, ns: &Namespace) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// Insert or replace the record wholesale.
    async fn put(&self, ns: &Namespace, id: &str, value: Value) -> Result<(), MemoryError>;

    /// Remove the whole namespace. Explicit resets only.
    async fn delete(&self, ns: &Namespace) -> Result<(), MemoryError>;
}

/// Read a namespace, degrading to empty on store failure.
///
/// This is the mandated read path for prompt assembly: a dead store means the
/// agent knows nothing, not that the turn fails.
pub async fn search_or_empty(store: &dyn MemoryStore, ns: &Namespace) -> Vec<MemoryRecord> {
    match store.search(ns).await {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(namespace = %ns, error = %err, "memory read failed, continuing without");
            Vec::new()
        }
    }
}

/// Process-local store: namespaces to ordered record lists.
#[derive(Default)]
pub struct InMemoryMemoryStore {
    namespaces: RwLock<FxHashMap<Namespace, Vec<MemoryRecord>>>,
}

impl InMemoryMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn search(&self, ns: &Namespace) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(self
            .namespaces
            .read()
            .get(ns)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(&self, ns: &Namespace, id: &str, value: Value) -> Result<(), MemoryError> {
        let mut namespaces = self.namespaces.write();
        let records = namespaces.entry(ns.clone()).or_default();
        let record = MemoryRecord {
            id: id.to_string(),
            value,
            updated_at: Utc::now(),
        };
        match records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn delete(&self, ns: &Namespace) -> Result<(), MemoryError> {
        self.namespaces.write().remove(ns);
        Ok(())
    }
}

/// Mint an id for a freshly inserted record.
#[must_use]
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ns() -> Namespace {
        Namespace::new(MemoryKind::Profile, "lance")
    }

    #[tokio::test]
    async fn put_then_search_round_trips() {
        let store = InMemoryMemoryStore::new();
        store.put(&ns(), "r1", json!({"name": "Lance"})).await.unwrap();

        let records = store.search(&ns()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "r1");
        assert_eq!(records[0].value, json!({"name": "Lance"}));
    }

    #[tokio::test]
    async fn put_same_id_replaces_wholesale() {
        let store = InMemoryMemoryStore::new();
        store
            .put(&ns(), "r1", json!({"name": "Lance", "location": "SF"}))
            .await
            .unwrap();
        store.put(&ns(), "r1", json!({"name": "Lance"})).await.unwrap();

        let records = store.search(&ns()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, json!({"name": "Lance"}));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = InMemoryMemoryStore::new();
        store.put(&ns(), "r1", json!({"name": "Lance"})).await.unwrap();

        let other_user = Namespace::new(MemoryKind::Profile, "mara");
        let other_kind = Namespace::new(MemoryKind::Topic, "lance");
        assert!(store.search(&other_user).await.unwrap().is_empty());
        assert!(store.search(&other_kind).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_preserves_insertion_order() {
        let store = InMemoryMemoryStore::new();
        for i in 0..5 {
            store
                .put(&ns(), &format!("r{i}"), json!({"seq": i}))
                .await
                .unwrap();
        }
        let ids: Vec<_> = store
            .search(&ns())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "r4"]);
    }

    #[tokio::test]
    async fn delete_removes_only_that_namespace() {
        let store = InMemoryMemoryStore::new();
        let topics = Namespace::new(MemoryKind::Topic, "lance");
        store.put(&ns(), "r1", json!({})).await.unwrap();
        store.put(&topics, "t1", json!({})).await.unwrap();

        store.delete(&ns()).await.unwrap();
        assert!(store.search(&ns()).await.unwrap().is_empty());
        assert_eq!(store.search(&topics).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_or_empty_swallows_failure() {
        struct Broken;

        #[async_trait]
        impl MemoryStore for Broken {
            async fn search(&self, _: &Namespace) -> Result<Vec<MemoryRecord>, MemoryError> {
                Err(MemoryError::Unavailable("connection refused".to_string()))
            }
            async fn put(&self, _: &Namespace, _: &str, _: Value) -> Result<(), MemoryError> {
                Err(MemoryError::Unavailable("connection refused".to_string()))
            }
            async fn delete(&self, _: &Namespace) -> Result<(), MemoryError> {
                Err(MemoryError::Unavailable("connection refused".to_string()))
            }
        }

        assert!(search_or_empty(&Broken, &ns()).await.is_empty());
    }
}
