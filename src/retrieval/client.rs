//! Async client for the DA retrieval endpoints.
//!
//! Talks to the REST surface mounted by a node:
//! - `POST /da/blob?ns=<u32>` : submit raw bytes, receive the commitment
//! - `GET  /da/blob/{commitment}` : fetch payload bytes (optionally ranged)
//! - `GET  /da/proof?commitment=…&indices=…` : fetch inclusion branches
//!
//! Transient failures (5xx, 429) are retried with a fixed backoff. Response
//! bodies are parsed into the typed shapes from [`crate::retrieval::wire`].

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tokio::time::sleep;
use tracing::debug;

use crate::error::{DaError, DaResult};
use crate::nmt::namespace::NamespaceId;
use crate::utils::bytes::bytes_to_hex;
use crate::utils::hash::Digest32;

use super::wire::{PostBlobResponse, ProofResponse};

/// A fetched blob (possibly partial).
#[derive(Clone, Debug)]
pub struct BlobBytes {
    pub data: Vec<u8>,
    /// 200 for full, 206 for partial content.
    pub status: u16,
    pub etag: Option<String>,
    pub content_range: Option<String>,
}

/// DA retrieval REST client.
#[derive(Clone)]
pub struct DaClient {
    base: Url,
    http: Client,
    retries: usize,
    backoff: Duration,
}

impl DaClient {
    /// Create a client from a base URL (e.g. `http://127.0.0.1:8648`).
    pub fn new(base_url: &str) -> DaResult<Self> {
        let base = Url::parse(base_url).map_err(|e| DaError::Http(format!("invalid base URL: {e}")))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DaError::Http(format!("http client build: {e}")))?;
        Ok(Self {
            base,
            http,
            retries: 3,
            backoff: Duration::from_millis(250),
        })
    }

    /// Adjust retry attempts for transient failures (default 3).
    pub fn with_retries(mut self, n: usize) -> Self {
        self.retries = n;
        self
    }

    /// Adjust backoff between retries (default 250ms).
    pub fn with_backoff(mut self, d: Duration) -> Self {
        self.backoff = d;
        self
    }

    fn url(&self, path: &str) -> DaResult<Url> {
        self.base
            .join(path)
            .map_err(|e| DaError::Http(format!("url join: {e}")))
    }

    /* ------------------------------- Endpoints -------------------------------- */

    /// POST a blob under a namespace; returns the server's commitment record.
    pub async fn post_blob(&self, namespace: NamespaceId, data: &[u8]) -> DaResult<PostBlobResponse> {
        let mut url = self.url("/da/blob")?;
        url.query_pairs_mut().append_pair("ns", &namespace.to_string());

        let body = data.to_vec();
        self.retrying(|| async {
            let resp = self
                .http
                .post(url.clone())
                .header("Content-Type", "application/octet-stream")
                .body(body.clone())
                .send()
                .await
                .map_err(|e| DaError::Http(format!("DA POST error: {e}")))?;
            Self::check_status(&resp)?;
            resp.json::<PostBlobResponse>()
                .await
                .map_err(|e| DaError::Http(format!("parse DA POST response: {e}")))
        })
        .await
    }

    /// GET raw blob bytes by commitment root; `range` is a full header value
    /// like `bytes=0-4`.
    pub async fn get_blob(&self, root: &Digest32, range: Option<&str>) -> DaResult<BlobBytes> {
        let url = self.url(&format!("/da/blob/{}", commitment_path(root)))?;
        let range = range.map(str::to_string);
        self.retrying(|| async {
            let mut req = self.http.get(url.clone());
            if let Some(r) = &range {
                req = req.header("Range", r);
            }
            let resp = req
                .send()
                .await
                .map_err(|e| DaError::Http(format!("DA GET error: {e}")))?;
            Self::check_status(&resp)?;
            let status = resp.status().as_u16();
            let etag = header_string(&resp, "etag");
            let content_range = header_string(&resp, "content-range");
            let data = resp
                .bytes()
                .await
                .map_err(|e| DaError::Http(format!("DA GET read: {e}")))?
                .to_vec();
            Ok(BlobBytes {
                data,
                status,
                etag,
                content_range,
            })
        })
        .await
    }

    /// GET inclusion branches for a CSV-able list of leaf indices.
    pub async fn get_proof(&self, root: &Digest32, indices: &[usize]) -> DaResult<ProofResponse> {
        if indices.is_empty() {
            return Err(DaError::Validation("no indices requested".into()));
        }
        let csv = indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut url = self.url("/da/proof")?;
        url.query_pairs_mut()
            .append_pair("commitment", &bytes_to_hex(root))
            .append_pair("indices", &csv);

        self.retrying(|| async {
            let resp = self
                .http
                .get(url.clone())
                .send()
                .await
                .map_err(|e| DaError::Http(format!("DA proof error: {e}")))?;
            Self::check_status(&resp)?;
            resp.json::<ProofResponse>()
                .await
                .map_err(|e| DaError::Http(format!("parse DA proof response: {e}")))
        })
        .await
    }

    /* -------------------------------- Internals -------------------------------- */

    async fn retrying<T, F, Fut>(&self, mut op: F) -> DaResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = DaResult<T>>,
    {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt <= self.retries && is_transient(&e) => {
                    debug!(attempt, error = %e, "retrying DA request");
                    sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn check_status(resp: &reqwest::Response) -> DaResult<()> {
        let s = resp.status();
        if s.is_success() || s == StatusCode::NOT_MODIFIED {
            return Ok(());
        }
        if s == StatusCode::NOT_FOUND {
            return Err(DaError::NotFound("blob not found".into()));
        }
        if s == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(DaError::InvalidProof("proof request rejected".into()));
        }
        if s == StatusCode::TOO_MANY_REQUESTS {
            return Err(DaError::Http(format!("transient {s}")));
        }
        if s.is_server_error() {
            return Err(DaError::Http(format!("transient {s}")));
        }
        Err(DaError::Validation(format!("DA request failed: {s}")))
    }
}

fn is_transient(e: &DaError) -> bool {
    matches!(e, DaError::Http(msg) if msg.contains("transient") || msg.contains("error sending request"))
}

fn header_string(resp: &reqwest::Response, name: &str) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn commitment_path(root: &Digest32) -> String {
    urlencoding::encode(&bytes_to_hex(root)).into_owned()
}

/* --------------------------------- Tests ----------------------------------- */
