//! Type definitions for Brokkr configuration

mod runtime_config;

pub use runtime_config::*;
