//! Retrieval surface: post/get/proof orchestration over the blob store.
//!
//! Transport-agnostic by design: the HTTP framework mounting these
//! operations lives outside this crate. What is fixed here: the wire shapes
//! ([`wire`]), single-range and ETag semantics ([`handlers`]), token-bucket
//! rate limiting ([`rate_limit`]), the orchestration itself ([`service`])
//! and an async client for the mounted endpoints ([`client`]).

pub mod client;
pub mod handlers;
pub mod rate_limit;
pub mod service;
pub mod wire;

pub use client::DaClient;
pub use handlers::{etag_for_commitment, parse_range_header, RangeSpec};
pub use rate_limit::{RateLimiter, Tier};
pub use service::RetrievalService;
