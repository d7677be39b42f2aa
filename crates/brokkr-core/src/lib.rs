//! # brokkr-core
//!
//! Core library for Brokkr providing:
//! - Backoff policy configuration (brokkr.yaml)
//! - Retry execution engine with conflict-aware classification
//! - Concurrent operation metrics collection
//! - Type definitions for lock and retry settings

pub mod config;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod types;

pub use config::BrokkrConfig;
pub use error::{Error, Result};
pub use metrics::MetricsCollector;
