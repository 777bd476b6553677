//! healthspan
//!
//! Scoring and share-link engine behind the four-week healthspan self-assessment,
//! plus the configuration, telemetry and HTTP surface the API service builds on.

pub mod assessment;
pub mod config;
pub mod error;
pub mod telemetry;
