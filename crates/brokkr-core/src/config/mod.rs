//! Configuration loading for Brokkr

mod loader;

pub use loader::BrokkrConfig;
