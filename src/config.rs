//! Runtime configuration for the DA subsystem.
//!
//! Every field has a sensible default and can be overridden through
//! environment variables; nothing here touches the network. Values are
//! validated against the guard rails in [`crate::constants`].
//!
//! Recognized variables (all optional):
//!
//! ```text
//! ANIMICA_DA_STORAGE_DIR=./data/da
//! ANIMICA_DA_SQLITE_PATH=./data/da/db.sqlite
//! ANIMICA_DA_CHAIN_ID=1337
//! ANIMICA_DA_K=32
//! ANIMICA_DA_N=48
//! ANIMICA_DA_SHARE_SIZE=4096          # plain bytes or KiB/MiB/KB/MB suffix
//! ANIMICA_DA_MAX_BLOB=8MiB
//! ANIMICA_DA_P_FAIL=2^-40             # or a float like 1e-12
//! ANIMICA_DA_MIN_SAMPLES=60
//! ANIMICA_DA_MAX_SAMPLES=256
//! ANIMICA_DA_SAMPLER_TIMEOUT_MS=1500
//! ```

use std::env;
use std::path::PathBuf;

use tracing::debug;

use crate::blob::store::StoreOptions;
use crate::constants::{
    ERASURE_K_DEFAULT, ERASURE_N_DEFAULT, MAX_BLOB_BYTES, MAX_BLOB_BYTES_HARD_CAP,
    SHARE_SIZE_DEFAULT, SHARE_SIZE_MIN, SHARE_SIZE_MULTIPLE,
};
use crate::erasure::params::ErasureParams;
use crate::error::{DaError, DaResult};

/// DA subsystem configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DaConfig {
    /// Root directory for the blob store.
    pub storage_dir: PathBuf,
    /// Override for the store's SQLite file; `None` keeps the store default
    /// of `db.sqlite` under `storage_dir`.
    pub sqlite_path: Option<PathBuf>,
    /// Numeric chain id bound into receipts and gossip topics.
    pub chain_id: u64,
    /// Erasure data shards per stripe (k).
    pub data_shards: usize,
    /// Erasure total shards per stripe (n).
    pub total_shards: usize,
    /// Shard payload size in bytes.
    pub share_bytes: usize,
    /// Soft blob size cap, pre-encoding.
    pub max_blob_bytes: usize,
    /// Target miss probability for sampling plans.
    pub p_fail_target: f64,
    /// Sampler bounds: never draw fewer/more samples than these.
    pub min_samples: usize,
    pub max_samples: usize,
    /// Per-sample network timeout in milliseconds.
    pub sample_timeout_ms: u64,
}

impl Default for DaConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data/da"),
            sqlite_path: None,
            chain_id: 1337,
            data_shards: ERASURE_K_DEFAULT,
            total_shards: ERASURE_N_DEFAULT,
            share_bytes: SHARE_SIZE_DEFAULT,
            max_blob_bytes: MAX_BLOB_BYTES,
            p_fail_target: 2f64.powi(-40),
            min_samples: 60,
            max_samples: 256,
            sample_timeout_ms: 1500,
        }
    }
}

impl DaConfig {
    /// Load configuration from the environment on top of the defaults.
    pub fn from_env() -> DaResult<Self> {
        let mut cfg = Self::default();
        if let Some(v) = getenv("ANIMICA_DA_STORAGE_DIR") {
            cfg.storage_dir = PathBuf::from(v);
        }
        if let Some(v) = getenv("ANIMICA_DA_SQLITE_PATH") {
            cfg.sqlite_path = Some(PathBuf::from(v));
        }
        if let Some(v) = getenv("ANIMICA_DA_CHAIN_ID") {
            cfg.chain_id = parse_uint(&v, "ANIMICA_DA_CHAIN_ID")?;
        }
        if let Some(v) = getenv("ANIMICA_DA_K") {
            cfg.data_shards = parse_uint(&v, "ANIMICA_DA_K")? as usize;
        }
        if let Some(v) = getenv("ANIMICA_DA_N") {
            cfg.total_shards = parse_uint(&v, "ANIMICA_DA_N")? as usize;
        }
        if let Some(v) = getenv("ANIMICA_DA_SHARE_SIZE") {
            cfg.share_bytes = parse_size(&v)?;
        }
        if let Some(v) = getenv("ANIMICA_DA_MAX_BLOB") {
            cfg.max_blob_bytes = parse_size(&v)?;
        }
        if let Some(v) = getenv("ANIMICA_DA_P_FAIL") {
            cfg.p_fail_target = parse_probability(&v)?;
        }
        if let Some(v) = getenv("ANIMICA_DA_MIN_SAMPLES") {
            cfg.min_samples = parse_uint(&v, "ANIMICA_DA_MIN_SAMPLES")? as usize;
        }
        if let Some(v) = getenv("ANIMICA_DA_MAX_SAMPLES") {
            cfg.max_samples = parse_uint(&v, "ANIMICA_DA_MAX_SAMPLES")? as usize;
        }
        if let Some(v) = getenv("ANIMICA_DA_SAMPLER_TIMEOUT_MS") {
            cfg.sample_timeout_ms = parse_uint(&v, "ANIMICA_DA_SAMPLER_TIMEOUT_MS")?;
        }
        cfg.validate()?;
        debug!(?cfg, "DA configuration loaded");
        Ok(cfg)
    }

    /// Check cross-field invariants and guard rails.
    pub fn validate(&self) -> DaResult<()> {
        // Delegates the k/n/share checks.
        self.erasure_params()?;
        if self.share_bytes < SHARE_SIZE_MIN || self.share_bytes % SHARE_SIZE_MULTIPLE != 0 {
            return Err(DaError::Validation(format!(
                "share_bytes must be a multiple of {SHARE_SIZE_MULTIPLE}, at least {SHARE_SIZE_MIN}"
            )));
        }
        if self.max_blob_bytes == 0 || self.max_blob_bytes > MAX_BLOB_BYTES_HARD_CAP {
            return Err(DaError::Validation(format!(
                "max_blob_bytes must be in (0, {MAX_BLOB_BYTES_HARD_CAP}]"
            )));
        }
        if !(self.p_fail_target > 0.0 && self.p_fail_target < 1.0) {
            return Err(DaError::Validation("p_fail_target must be in (0, 1)".into()));
        }
        if self.min_samples > self.max_samples {
            return Err(DaError::Validation(
                "min_samples must not exceed max_samples".into(),
            ));
        }
        Ok(())
    }

    /// The erasure profile this configuration describes.
    pub fn erasure_params(&self) -> DaResult<ErasureParams> {
        ErasureParams::new(self.data_shards, self.total_shards, self.share_bytes)
    }

    /// Store construction options for [`crate::blob::store::BlobStore::open_with`],
    /// carrying the SQLite path override when one is configured.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            db_path: self.sqlite_path.clone(),
            ..StoreOptions::default()
        }
    }
}

/* --------------------------------- Parsers ---------------------------------- */

fn getenv(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_uint(value: &str, what: &str) -> DaResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| DaError::Validation(format!("{what}: invalid integer {value:?}: {e}")))
}

/// Parse human sizes like `4096`, `4KiB`, `8MB`, `0x1000` into bytes.
pub fn parse_size(value: &str) -> DaResult<usize> {
    let v = value.trim();
    if let Some(hexpart) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        return usize::from_str_radix(hexpart, 16)
            .map_err(|e| DaError::Validation(format!("invalid size {value:?}: {e}")));
    }

    let split = v
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(v.len());
    let (num_part, unit_part) = v.split_at(split);
    let num: f64 = num_part
        .parse()
        .map_err(|e| DaError::Validation(format!("invalid size {value:?}: {e}")))?;
    let mult: u64 = match unit_part.trim().to_ascii_lowercase().as_str() {
        "" | "b" | "byte" | "bytes" => 1,
        "kb" => 1000,
        "kib" => 1024,
        "mb" => 1000 * 1000,
        "mib" => 1024 * 1024,
        "gb" => 1000 * 1000 * 1000,
        "gib" => 1024 * 1024 * 1024,
        other => {
            return Err(DaError::Validation(format!(
                "unknown unit {other:?} in size {value:?}"
            )))
        }
    };
    Ok((num * mult as f64) as usize)
}

/// Parse `2^-40`, `1e-12` or a plain float into a probability.
pub fn parse_probability(value: &str) -> DaResult<f64> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(exp) = v.strip_prefix("2^-") {
        let e: i32 = exp
            .trim()
            .parse()
            .map_err(|err| DaError::Validation(format!("invalid probability {value:?}: {err}")))?;
        return Ok(2f64.powi(-e));
    }
    v.parse::<f64>()
        .map_err(|e| DaError::Validation(format!("invalid probability {value:?}: {e}")))
}

/* --------------------------------- Tests ----------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = DaConfig::default();
        cfg.validate().unwrap();
        let p = cfg.erasure_params().unwrap();
        assert_eq!((p.data_shards, p.total_shards), (32, 48));
        assert_eq!(cfg.sqlite_path, None);
        assert_eq!(cfg.store_options().db_path, None);
    }

    #[test]
    fn sqlite_path_threads_into_store_options() {
        let cfg = DaConfig {
            sqlite_path: Some(PathBuf::from("/var/lib/animica/da.sqlite3")),
            ..DaConfig::default()
        };
        cfg.validate().unwrap();
        let opts = cfg.store_options();
        assert_eq!(
            opts.db_path.as_deref(),
            Some(std::path::Path::new("/var/lib/animica/da.sqlite3"))
        );
        // The rest of the options keep their store defaults.
        assert_eq!(opts.shard_depth, 2);
        assert!(opts.keep_meta_json);
    }

    #[test]
    fn size_parsing() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("4KiB").unwrap(), 4096);
        assert_eq!(parse_size("4kb").unwrap(), 4000);
        assert_eq!(parse_size("8MiB").unwrap(), 8 * 1024 * 1024);
        assert_eq!(parse_size("1.5KiB").unwrap(), 1536);
        assert_eq!(parse_size("0x1000").unwrap(), 4096);
        assert!(parse_size("fourty").is_err());
        assert!(parse_size("4parsecs").is_err());
    }

    #[test]
    fn probability_parsing() {
        assert_eq!(parse_probability("2^-40").unwrap(), 2f64.powi(-40));
        assert_eq!(parse_probability("1e-12").unwrap(), 1e-12);
        assert_eq!(parse_probability("0.25").unwrap(), 0.25);
        assert!(parse_probability("maybe").is_err());
    }

    #[test]
    fn invalid_configs_rejected() {
        let mut cfg = DaConfig::default();
        cfg.share_bytes = 100; // not a multiple of 256
        assert!(cfg.validate().is_err());

        let mut cfg = DaConfig::default();
        cfg.total_shards = cfg.data_shards;
        assert!(cfg.validate().is_err());

        let mut cfg = DaConfig::default();
        cfg.min_samples = 500;
        assert!(cfg.validate().is_err());

        let mut cfg = DaConfig::default();
        cfg.p_fail_target = 0.0;
        assert!(cfg.validate().is_err());
    }
}
