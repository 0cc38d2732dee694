//! uplink-core: the pure half of the uplink ingestion pipeline.
//!
//! An uplink envelope pushed by the LoRaWAN network server goes through
//! two side-effect-free steps before anything is persisted:
//!
//! ```text
//! serde_json::Value ──validate()──▶ ValidatedUplink ──extract()──▶ Reading
//! ```
//!
//! Persistence, roster aggregation and HTTP live in `uplink-store` and
//! `uplink-api`. This crate also owns the `uplink.toml` configuration
//! model shared by the daemon and the API.

pub mod config;
pub mod envelope;
pub mod error;
pub mod reading;

pub use config::{UplinkConfig, WriteMode};
pub use envelope::{ValidatedUplink, validate};
pub use error::ValidationError;
pub use reading::{Reading, SensorData, UNKNOWN_APPLICATION, device_collection, extract, extract_at};
