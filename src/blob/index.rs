//! In-memory blob index mirror.
//!
//! Fast lookup of committed blobs by root, namespace, storage key and
//! recency. The authoritative index is the store's SQLite database; this
//! mirror is a best-effort cache warmed at startup and kept in sync by the
//! store on insert/delete. It is not thread-safe on its own; the store owns
//! it behind its own synchronization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::nmt::namespace::NamespaceId;
use crate::utils::bytes::bytes_to_hex;
use crate::utils::hash::Digest32;

use super::types::{BlobMeta, Commitment};

/// Indexed material for one committed blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(with = "serde_bytes")]
    pub root: Digest32,
    pub namespace: NamespaceId,
    pub size_bytes: u64,
    pub storage_key: String,
    pub created_at: i64,
    pub mime: Option<String>,
    pub data_shards: Option<u32>,
    pub total_shards: Option<u32>,
    pub share_bytes: Option<u32>,
}

impl IndexRecord {
    pub fn from_commit_meta(commit: &Commitment, meta: &BlobMeta, created_at: i64) -> Self {
        Self {
            root: commit.root,
            namespace: commit.namespace,
            size_bytes: commit.size_bytes,
            storage_key: bytes_to_hex(&commit.root),
            created_at,
            mime: meta.mime.clone(),
            data_shards: meta.data_shards,
            total_shards: meta.total_shards,
            share_bytes: meta.share_bytes,
        }
    }
}

/// Bounded in-memory index with secondary maps.
#[derive(Debug)]
pub struct InMemoryIndex {
    by_root: HashMap<Digest32, IndexRecord>,
    by_ns: HashMap<NamespaceId, Vec<Digest32>>,
    by_storage_key: HashMap<String, Digest32>,
    /// Roots ordered most-recent first.
    recent: Vec<Digest32>,
    max_recent: usize,
}

impl InMemoryIndex {
    pub fn new(max_recent: usize) -> Self {
        Self {
            by_root: HashMap::new(),
            by_ns: HashMap::new(),
            by_storage_key: HashMap::new(),
            recent: Vec::new(),
            max_recent: max_recent.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.by_root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_root.is_empty()
    }

    /// Insert or replace a record, keeping the secondary maps consistent.
    pub fn put(&mut self, rec: IndexRecord) {
        let root = rec.root;
        if self.by_root.contains_key(&root) {
            self.remove(&root);
        }
        self.by_ns.entry(rec.namespace).or_default().push(root);
        self.by_storage_key.insert(rec.storage_key.clone(), root);
        self.recent.insert(0, root);
        self.by_root.insert(root, rec);

        // Recency is bounded; evicted entries stay reachable by root.
        if self.recent.len() > self.max_recent {
            self.recent.truncate(self.max_recent);
        }
    }

    pub fn remove(&mut self, root: &Digest32) -> Option<IndexRecord> {
        let rec = self.by_root.remove(root)?;
        if let Some(roots) = self.by_ns.get_mut(&rec.namespace) {
            roots.retain(|r| r != root);
            if roots.is_empty() {
                self.by_ns.remove(&rec.namespace);
            }
        }
        self.by_storage_key.remove(&rec.storage_key);
        self.recent.retain(|r| r != root);
        Some(rec)
    }

    pub fn get(&self, root: &Digest32) -> Option<&IndexRecord> {
        self.by_root.get(root)
    }

    pub fn get_by_storage_key(&self, key: &str) -> Option<&IndexRecord> {
        self.by_storage_key.get(key).and_then(|r| self.by_root.get(r))
    }

    /// Records under a namespace, most recent first.
    pub fn by_namespace(&self, ns: NamespaceId, limit: usize) -> Vec<&IndexRecord> {
        let mut recs: Vec<&IndexRecord> = self
            .by_ns
            .get(&ns)
            .map(|roots| roots.iter().filter_map(|r| self.by_root.get(r)).collect())
            .unwrap_or_default();
        recs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recs.truncate(limit);
        recs
    }

    /// Most recently inserted records.
    pub fn recent(&self, limit: usize) -> Vec<&IndexRecord> {
        self.recent
            .iter()
            .take(limit)
            .filter_map(|r| self.by_root.get(r))
            .collect()
    }
}

/* --------------------------------- Tests ----------------------------------- */
