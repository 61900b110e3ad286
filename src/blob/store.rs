//! Local content-addressed blob store (filesystem + SQLite).
//!
//! Payloads are stored under their commitment root (`storage_key` is the
//! lowercase `0x`-hex of the root) with sharded directories for large
//! stores, and indexed in a single SQLite database:
//!
//! ```text
//! <root_dir>/
//!   objects/aa/bb/0xaabb….blob        payload (exactly the original bytes)
//!   objects/aa/bb/0xaabb….meta.json   non-authoritative metadata mirror
//!   db.sqlite
//! ```
//!
//! Durability contract for writes: payload → temp file in the target
//! directory → fsync → atomic rename → fsync of the directory; only then is
//! the index row inserted (`ON CONFLICT(root) DO NOTHING`). A concurrent
//! reader either sees no row or a fully written file, and an indexed root is
//! always readable.
//!
//! The store is the single writer of its database within a process; share
//! one handle. Cross-process deployments open one store per process against
//! the same root directory (WAL mode).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::erasure::params::ErasureParams;
use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::utils::bytes::bytes_to_hex;
use crate::utils::hash::Digest32;

use super::commitment::{commit_bytes, commit_file};
use super::index::{InMemoryIndex, IndexRecord};
use super::types::{BlobMeta, BlobRef, Commitment};

/// Store construction knobs.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// SQLite file override; `None` uses `db.sqlite` under the root directory.
    pub db_path: Option<PathBuf>,
    /// Directory sharding depth for object files.
    pub shard_depth: usize,
    /// Hex characters per shard level.
    pub shard_width: usize,
    /// Write a small meta.json next to each blob (best effort).
    pub keep_meta_json: bool,
    /// Mirror the index in memory for fast list/find.
    pub enable_mem_index: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            db_path: None,
            shard_depth: 2,
            shard_width: 2,
            keep_meta_json: true,
            enable_mem_index: true,
        }
    }
}

/// Result of an `add_*` call.
#[derive(Clone, Debug)]
pub struct AddOutcome {
    pub blob_ref: BlobRef,
    pub commitment: Commitment,
    pub meta: BlobMeta,
    /// True when the root was already present and nothing was written.
    pub existed: bool,
}

/// GC selection filters.
#[derive(Clone, Debug, Default)]
pub struct GcOptions {
    /// List candidates without deleting anything.
    pub dry_run: bool,
    /// Only collect rows created strictly before this unix timestamp.
    pub older_than: Option<i64>,
    /// Restrict collection to these namespaces.
    pub namespaces: Option<Vec<NamespaceId>>,
    /// Upper bound on deletions per run (0 = default 1000).
    pub max_delete: usize,
}

/// Content-addressed blob store rooted at a directory.
pub struct BlobStore {
    root_dir: PathBuf,
    objects_dir: PathBuf,
    db: Mutex<Connection>,
    index: Option<Mutex<InMemoryIndex>>,
    opts: StoreOptions,
}

impl BlobStore {
    /// Open (or create) a store at `root_dir` with default options.
    pub fn open(root_dir: impl AsRef<Path>) -> DaResult<Self> {
        Self::open_with(root_dir, StoreOptions::default())
    }

    pub fn open_with(root_dir: impl AsRef<Path>, opts: StoreOptions) -> DaResult<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        let objects_dir = root_dir.join("objects");
        fs::create_dir_all(&objects_dir)?;

        let db_path = opts
            .db_path
            .clone()
            .unwrap_or_else(|| root_dir.join("db.sqlite"));
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        // journal_mode returns the resulting mode as a row; read and drop it.
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |r| r.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::ensure_schema(&conn)?;

        let store = Self {
            root_dir,
            objects_dir,
            db: Mutex::new(conn),
            index: opts
                .enable_mem_index
                .then(|| Mutex::new(InMemoryIndex::new(10_000))),
            opts,
        };
        store.warm_index()?;
        info!(root = %store.root_dir.display(), "blob store opened");
        Ok(store)
    }

    fn ensure_schema(conn: &Connection) -> DaResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS blobs(
              root BLOB PRIMARY KEY,
              namespace INTEGER NOT NULL,
              size_bytes INTEGER NOT NULL,
              mime TEXT,
              storage_key TEXT NOT NULL UNIQUE,
              path TEXT NOT NULL,
              created_at INTEGER NOT NULL,
              data_shards INTEGER,
              total_shards INTEGER,
              share_bytes INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_blobs_ns_created
              ON blobs(namespace, created_at DESC);
            CREATE TABLE IF NOT EXISTS pins(
              root BLOB NOT NULL REFERENCES blobs(root) ON DELETE CASCADE,
              tag TEXT,
              created_at INTEGER NOT NULL,
              PRIMARY KEY(root, tag)
            );
            "#,
        )?;
        Ok(())
    }

    fn warm_index(&self) -> DaResult<()> {
        let Some(index) = &self.index else {
            return Ok(());
        };
        let conn = self.db.lock().expect("store db lock");
        let mut stmt = conn.prepare(
            "SELECT root, namespace, size_bytes, mime, storage_key, created_at,
                    data_shards, total_shards, share_bytes
             FROM blobs ORDER BY created_at DESC LIMIT 20000",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(IndexRecord {
                root: digest_col(row.get::<_, Vec<u8>>(0)?),
                namespace: NamespaceId::new(row.get::<_, u32>(1)?),
                size_bytes: row.get(2)?,
                mime: row.get(3)?,
                storage_key: row.get(4)?,
                created_at: row.get(5)?,
                data_shards: row.get(6)?,
                total_shards: row.get(7)?,
                share_bytes: row.get(8)?,
            })
        })?;
        let mut idx = index.lock().expect("store index lock");
        for rec in rows {
            idx.put(rec?);
        }
        Ok(())
    }

    /* ----------------------------- Path helpers ----------------------------- */

    fn shard_dir(&self, storage_key: &str) -> PathBuf {
        let bare = storage_key.trim_start_matches("0x");
        let mut dir = self.objects_dir.clone();
        for level in 0..self.opts.shard_depth {
            let start = (level * self.opts.shard_width).min(bare.len());
            let end = (start + self.opts.shard_width).min(bare.len());
            if start == end {
                break;
            }
            dir.push(&bare[start..end]);
        }
        dir
    }

    fn object_path(&self, storage_key: &str) -> PathBuf {
        self.shard_dir(storage_key).join(format!("{storage_key}.blob"))
    }

    fn meta_path(&self, storage_key: &str) -> PathBuf {
        self.shard_dir(storage_key)
            .join(format!("{storage_key}.meta.json"))
    }

    /* -------------------------------- Adds ---------------------------------- */

    /// Commit and persist an in-memory payload. Idempotent per root.
    pub fn add_bytes(
        &self,
        data: &[u8],
        namespace: NamespaceId,
        mime: Option<String>,
        params: &ErasureParams,
    ) -> DaResult<AddOutcome> {
        let (commitment, meta, _info) = commit_bytes(data, namespace, mime, params)?;
        self.store_and_index(&commitment, &meta, Payload::Bytes(data))
    }

    /// Commit and persist a file by path. Idempotent per root.
    pub fn add_file(
        &self,
        path: impl AsRef<Path>,
        namespace: NamespaceId,
        mime: Option<String>,
        params: &ErasureParams,
    ) -> DaResult<AddOutcome> {
        let path = path.as_ref();
        let (commitment, meta, _info) = commit_file(path, namespace, mime, params)?;
        self.store_and_index(&commitment, &meta, Payload::File(path))
    }

    fn store_and_index(
        &self,
        commitment: &Commitment,
        meta: &BlobMeta,
        payload: Payload<'_>,
    ) -> DaResult<AddOutcome> {
        let storage_key = commitment.root_hex();

        // Idempotence: short-circuit on an existing row, no rewrite.
        if let Some(existing) = self.get_ref(&commitment.root)? {
            debug!(root = %storage_key, "add is a no-op: root already stored");
            return Ok(AddOutcome {
                blob_ref: existing,
                commitment: *commitment,
                meta: meta.clone(),
                existed: true,
            });
        }

        let obj_path = self.object_path(&storage_key);
        let dir = obj_path.parent().expect("object path has a parent");
        fs::create_dir_all(dir)?;

        // Durable write: temp file, fsync, atomic rename, directory fsync.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        match payload {
            Payload::Bytes(b) => tmp.write_all(b)?,
            Payload::File(src) => {
                let mut f = File::open(src)?;
                std::io::copy(&mut f, tmp.as_file_mut())?;
            }
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&obj_path)
            .map_err(|e| DaError::Io(e.error))?;
        File::open(dir)?.sync_all()?;

        if self.opts.keep_meta_json {
            self.write_meta_json(&storage_key, commitment, meta, &obj_path);
        }

        let created_at = now_unix();
        {
            let conn = self.db.lock().expect("store db lock");
            conn.execute(
                "INSERT INTO blobs(root, namespace, size_bytes, mime, storage_key, path,
                                   created_at, data_shards, total_shards, share_bytes)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(root) DO NOTHING",
                params![
                    commitment.root.as_slice(),
                    commitment.namespace.value(),
                    commitment.size_bytes,
                    meta.mime,
                    storage_key,
                    obj_path.to_string_lossy(),
                    created_at,
                    meta.data_shards,
                    meta.total_shards,
                    meta.share_bytes,
                ],
            )?;
        }

        let blob_ref = BlobRef {
            root: commitment.root,
            namespace: commitment.namespace,
            size_bytes: commitment.size_bytes,
            storage_key: storage_key.clone(),
            path: obj_path.to_string_lossy().into_owned(),
            created_at,
            mime: meta.mime.clone(),
        };

        if let Some(index) = &self.index {
            index
                .lock()
                .expect("store index lock")
                .put(IndexRecord::from_commit_meta(commitment, meta, created_at));
        }

        info!(root = %storage_key, ns = %commitment.namespace, size = commitment.size_bytes,
              "blob stored");
        Ok(AddOutcome {
            blob_ref,
            commitment: *commitment,
            meta: meta.clone(),
            existed: false,
        })
    }

    fn write_meta_json(
        &self,
        storage_key: &str,
        commitment: &Commitment,
        meta: &BlobMeta,
        obj_path: &Path,
    ) {
        let doc = serde_json::json!({
            "commitment": {
                "namespace": commitment.namespace.value(),
                "root": storage_key,
                "size_bytes": commitment.size_bytes,
            },
            "meta": meta,
            "path": obj_path.to_string_lossy(),
            "created_at": now_unix(),
        });
        let path = self.meta_path(storage_key);
        // Non-authoritative mirror: failures never block acceptance.
        if let Err(e) = fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap_or_default()) {
            warn!(path = %path.display(), error = %e, "meta.json write failed");
        }
    }

    /* ------------------------------ Lookups ---------------------------------- */

    pub fn has(&self, root: &Digest32) -> DaResult<bool> {
        let conn = self.db.lock().expect("store db lock");
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM blobs WHERE root = ?1 LIMIT 1",
                params![root.as_slice()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_ref(&self, root: &Digest32) -> DaResult<Option<BlobRef>> {
        let conn = self.db.lock().expect("store db lock");
        let row = conn
            .query_row(
                "SELECT root, namespace, size_bytes, mime, storage_key, path, created_at
                 FROM blobs WHERE root = ?1",
                params![root.as_slice()],
                Self::ref_from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn ref_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlobRef> {
        Ok(BlobRef {
            root: digest_col(row.get::<_, Vec<u8>>(0)?),
            namespace: NamespaceId::new(row.get::<_, u32>(1)?),
            size_bytes: row.get(2)?,
            mime: row.get(3)?,
            storage_key: row.get(4)?,
            path: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn get_meta(&self, root: &Digest32) -> DaResult<Option<BlobMeta>> {
        let conn = self.db.lock().expect("store db lock");
        let row = conn
            .query_row(
                "SELECT namespace, size_bytes, mime, data_shards, total_shards, share_bytes
                 FROM blobs WHERE root = ?1",
                params![root.as_slice()],
                |row| {
                    Ok(BlobMeta {
                        namespace: NamespaceId::new(row.get::<_, u32>(0)?),
                        size_bytes: row.get(1)?,
                        mime: row.get(2)?,
                        data_shards: row.get(3)?,
                        total_shards: row.get(4)?,
                        share_bytes: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Read the full payload. An indexed row whose file is gone is reported
    /// as store corruption, not as a missing blob.
    pub fn read(&self, root: &Digest32) -> DaResult<Vec<u8>> {
        let blob_ref = self
            .get_ref(root)?
            .ok_or_else(|| DaError::NotFound(format!("blob {}", bytes_to_hex(root))))?;
        fs::read(&blob_ref.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DaError::StoreCorruption(format!(
                    "payload missing for indexed root {}",
                    blob_ref.storage_key
                ))
            } else {
                DaError::Io(e)
            }
        })
    }

    /// Open the payload for streaming reads.
    pub fn open_payload(&self, root: &Digest32) -> DaResult<File> {
        let blob_ref = self
            .get_ref(root)?
            .ok_or_else(|| DaError::NotFound(format!("blob {}", bytes_to_hex(root))))?;
        File::open(&blob_ref.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DaError::StoreCorruption(format!(
                    "payload missing for indexed root {}",
                    blob_ref.storage_key
                ))
            } else {
                DaError::Io(e)
            }
        })
    }

    /* ------------------------------- Listings -------------------------------- */

    pub fn list_by_namespace(
        &self,
        ns: NamespaceId,
        limit: usize,
        offset: usize,
    ) -> DaResult<Vec<BlobRef>> {
        let conn = self.db.lock().expect("store db lock");
        let mut stmt = conn.prepare(
            "SELECT root, namespace, size_bytes, mime, storage_key, path, created_at
             FROM blobs WHERE namespace = ?1
             ORDER BY created_at DESC, root LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(
            params![ns.value(), limit as i64, offset as i64],
            Self::ref_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn recent(&self, limit: usize) -> DaResult<Vec<BlobRef>> {
        let conn = self.db.lock().expect("store db lock");
        let mut stmt = conn.prepare(
            "SELECT root, namespace, size_bytes, mime, storage_key, path, created_at
             FROM blobs ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::ref_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Totals: `(blobs, pinned_roots)`.
    pub fn stats(&self) -> DaResult<(u64, u64)> {
        let conn = self.db.lock().expect("store db lock");
        let total: u64 = conn.query_row("SELECT COUNT(*) FROM blobs", [], |r| r.get(0))?;
        let pinned: u64 =
            conn.query_row("SELECT COUNT(DISTINCT root) FROM pins", [], |r| r.get(0))?;
        Ok((total, pinned))
    }

    /* ------------------------------ Pinning ---------------------------------- */

    /// Pin a root (optionally under a tag). Fails on unknown roots.
    pub fn pin(&self, root: &Digest32, tag: Option<&str>) -> DaResult<usize> {
        if !self.has(root)? {
            return Err(DaError::State(format!(
                "cannot pin unknown root {}",
                bytes_to_hex(root)
            )));
        }
        let conn = self.db.lock().expect("store db lock");
        conn.execute(
            "INSERT OR IGNORE INTO pins(root, tag, created_at) VALUES(?1, ?2, ?3)",
            params![root.as_slice(), tag, now_unix()],
        )?;
        Self::pin_count_locked(&conn, root)
    }

    /// Remove a pin row; `tag = None` removes the untagged pin.
    pub fn unpin(&self, root: &Digest32, tag: Option<&str>) -> DaResult<usize> {
        let conn = self.db.lock().expect("store db lock");
        conn.execute(
            "DELETE FROM pins WHERE root = ?1 AND tag IS ?2",
            params![root.as_slice(), tag],
        )?;
        Self::pin_count_locked(&conn, root)
    }

    pub fn is_pinned(&self, root: &Digest32) -> DaResult<bool> {
        let conn = self.db.lock().expect("store db lock");
        Ok(Self::pin_count_locked(&conn, root)? > 0)
    }

    fn pin_count_locked(conn: &Connection, root: &Digest32) -> DaResult<usize> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pins WHERE root = ?1",
            params![root.as_slice()],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    /* --------------------------------- GC ------------------------------------ */

    /// Garbage-collect unpinned blobs, oldest first.
    ///
    /// Returns the storage keys removed (or that would be removed under
    /// `dry_run`). Pinned rows are never touched. Runs on the store's own
    /// connection, so it serializes against concurrent writers.
    pub fn gc(&self, opts: &GcOptions) -> DaResult<Vec<String>> {
        let max_delete = if opts.max_delete == 0 { 1000 } else { opts.max_delete };

        let mut sql = String::from(
            "SELECT b.root, b.storage_key, b.path FROM blobs b
             WHERE NOT EXISTS (SELECT 1 FROM pins p WHERE p.root = b.root)",
        );
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(cutoff) = opts.older_than {
            sql.push_str(" AND b.created_at < ?");
            args.push(Box::new(cutoff));
        }
        if let Some(namespaces) = &opts.namespaces {
            if !namespaces.is_empty() {
                let placeholders = vec!["?"; namespaces.len()].join(",");
                sql.push_str(&format!(" AND b.namespace IN ({placeholders})"));
                for ns in namespaces {
                    args.push(Box::new(ns.value()));
                }
            }
        }
        sql.push_str(" ORDER BY b.created_at ASC LIMIT ?");
        args.push(Box::new(max_delete as i64));

        let candidates: Vec<(Vec<u8>, String, String)> = {
            let conn = self.db.lock().expect("store db lock");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(args), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut removed = Vec::with_capacity(candidates.len());
        for (root_bytes, storage_key, path) in candidates {
            if opts.dry_run {
                removed.push(storage_key);
                continue;
            }
            // Payload first (missing files are fine), then the row.
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(DaError::Io(e));
                }
            }
            let _ = fs::remove_file(self.meta_path(&storage_key));
            {
                let conn = self.db.lock().expect("store db lock");
                conn.execute("DELETE FROM blobs WHERE root = ?1", params![root_bytes])?;
            }
            if let Some(index) = &self.index {
                let root = digest_col(root_bytes);
                index.lock().expect("store index lock").remove(&root);
            }
            debug!(root = %storage_key, "gc removed blob");
            removed.push(storage_key);
        }
        if !opts.dry_run && !removed.is_empty() {
            info!(count = removed.len(), "gc pass complete");
        }
        Ok(removed)
    }

    /* ------------------------------- Accessors -------------------------------- */

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Snapshot of an in-memory index record, when the mirror is enabled.
    pub fn cached_record(&self, root: &Digest32) -> Option<IndexRecord> {
        self.index
            .as_ref()
            .and_then(|idx| idx.lock().expect("store index lock").get(root).cloned())
    }
}

enum Payload<'a> {
    Bytes(&'a [u8]),
    File(&'a Path),
}

fn digest_col(bytes: Vec<u8>) -> Digest32 {
    let mut out = [0u8; 32];
    if bytes.len() == 32 {
        out.copy_from_slice(&bytes);
    }
    out
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(v: u32) -> NamespaceId {
        NamespaceId::new(v)
    }

    fn small_params() -> ErasureParams {
        ErasureParams::new(2, 4, 4).unwrap()
    }

    fn open_store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn add_and_read_roundtrip() {
        let (_dir, store) = open_store();
        let out = store
            .add_bytes(b"payload", ns(16), None, &small_params())
            .unwrap();
        assert!(!out.existed);
        assert_eq!(store.read(&out.commitment.root).unwrap(), b"payload");
        assert!(store.has(&out.commitment.root).unwrap());

        let r = store.get_ref(&out.commitment.root).unwrap().unwrap();
        assert_eq!(r.size_bytes, 7);
        assert_eq!(r.storage_key, out.commitment.root_hex());
        assert!(Path::new(&r.path).exists());
    }

    #[test]
    fn add_is_idempotent() {
        let (_dir, store) = open_store();
        let p = small_params();
        let a = store.add_bytes(b"payload", ns(16), None, &p).unwrap();
        let b = store.add_bytes(b"payload", ns(16), None, &p).unwrap();
        assert!(b.existed);
        assert_eq!(a.blob_ref.root, b.blob_ref.root);
        assert_eq!(a.blob_ref.created_at, b.blob_ref.created_at);
        assert_eq!(store.list_by_namespace(ns(16), 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn meta_and_listings() {
        let (_dir, store) = open_store();
        let p = small_params();
        store
            .add_bytes(b"one", ns(16), Some("text/plain".into()), &p)
            .unwrap();
        store.add_bytes(b"two", ns(16), None, &p).unwrap();
        store.add_bytes(b"three", ns(17), None, &p).unwrap();

        assert_eq!(store.list_by_namespace(ns(16), 10, 0).unwrap().len(), 2);
        assert_eq!(store.list_by_namespace(ns(17), 10, 0).unwrap().len(), 1);
        assert_eq!(store.recent(2).unwrap().len(), 2);
        assert_eq!(store.stats().unwrap().0, 3);

        let root = store.list_by_namespace(ns(16), 1, 0).unwrap()[0].root;
        let meta = store.get_meta(&root).unwrap().unwrap();
        assert_eq!(meta.data_shards, Some(2));
    }

    #[test]
    fn unknown_root_is_not_found() {
        let (_dir, store) = open_store();
        let missing = [0xee; 32];
        assert!(matches!(store.read(&missing), Err(DaError::NotFound(_))));
        assert!(store.get_ref(&missing).unwrap().is_none());
    }

    #[test]
    fn indexed_row_with_missing_file_is_corruption() {
        let (_dir, store) = open_store();
        let out = store
            .add_bytes(b"doomed", ns(16), None, &small_params())
            .unwrap();
        fs::remove_file(&out.blob_ref.path).unwrap();
        assert!(matches!(
            store.read(&out.commitment.root),
            Err(DaError::StoreCorruption(_))
        ));
    }

    #[test]
    fn pin_protects_from_gc() {
        let (_dir, store) = open_store();
        let p = small_params();
        let out = store.add_bytes(b"precious", ns(16), None, &p).unwrap();
        let root = out.commitment.root;

        store.pin(&root, None).unwrap();
        assert!(store.is_pinned(&root).unwrap());

        let removed = store
            .gc(&GcOptions {
                dry_run: false,
                ..Default::default()
            })
            .unwrap();
        assert!(removed.is_empty());
        assert!(store.has(&root).unwrap());

        store.unpin(&root, None).unwrap();
        assert!(!store.is_pinned(&root).unwrap());
        let removed = store
            .gc(&GcOptions {
                dry_run: false,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(removed, vec![out.commitment.root_hex()]);
        assert!(!store.has(&root).unwrap());
        assert!(!Path::new(&out.blob_ref.path).exists());
    }

    #[test]
    fn pin_unknown_root_is_a_state_error() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.pin(&[0x01; 32], None),
            Err(DaError::State(_))
        ));
    }

    #[test]
    fn gc_filters_and_dry_run() {
        let (_dir, store) = open_store();
        let p = small_params();
        let a = store.add_bytes(b"aaa", ns(16), None, &p).unwrap();
        let b = store.add_bytes(b"bbb", ns(17), None, &p).unwrap();

        // Dry run mutates nothing.
        let listed = store
            .gc(&GcOptions {
                dry_run: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(store.has(&a.commitment.root).unwrap());

        // Namespace filter only touches matching rows.
        let removed = store
            .gc(&GcOptions {
                dry_run: false,
                namespaces: Some(vec![ns(17)]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(removed, vec![b.commitment.root_hex()]);
        assert!(store.has(&a.commitment.root).unwrap());

        // Future cutoff collects the rest.
        let removed = store
            .gc(&GcOptions {
                dry_run: false,
                older_than: Some(now_unix() + 10),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(store.stats().unwrap().0, 0);
    }

    #[test]
    fn db_path_override_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = tempfile::tempdir().unwrap();
        let db_path = db_dir.path().join("nested").join("index.sqlite");

        let opts = StoreOptions {
            db_path: Some(db_path.clone()),
            ..Default::default()
        };
        let root = {
            let store = BlobStore::open_with(dir.path(), opts.clone()).unwrap();
            store
                .add_bytes(b"elsewhere", ns(16), None, &small_params())
                .unwrap()
                .commitment
                .root
        };
        assert!(db_path.exists());
        assert!(!dir.path().join("db.sqlite").exists());

        // Reopening against the same override sees the row.
        let store = BlobStore::open_with(dir.path(), opts).unwrap();
        assert_eq!(store.read(&root).unwrap(), b"elsewhere");
    }

    #[test]
    fn reopen_sees_persisted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let root = {
            let store = BlobStore::open(dir.path()).unwrap();
            store
                .add_bytes(b"durable", ns(16), None, &small_params())
                .unwrap()
                .commitment
                .root
        };
        let store = BlobStore::open(dir.path()).unwrap();
        assert_eq!(store.read(&root).unwrap(), b"durable");
        assert!(store.cached_record(&root).is_some());
    }
}
