//! Data Availability Sampling (DAS) for light clients.
//!
//! [`plan`] turns the availability math into concrete leaf indices,
//! uniform (optionally seeded for reproducibility) or stratified across
//! rows. [`light_client`] executes a plan against a share provider and
//! verifies every fetched share against the DA root; a single verification
//! failure rejects the blob.

pub mod light_client;
pub mod plan;

pub use light_client::{LightClient, SampleReport, ShareProvider};
pub use plan::{draw_stratified, draw_uniform};
