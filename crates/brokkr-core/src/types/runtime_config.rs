//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior:
//! backoff policies for conflict retries and lease settings for the
//! distributed lock layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Complete coordination configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoordinationConfig {
    /// Backoff policy configurations
    #[serde(default)]
    pub retry_policies: RetryPoliciesConfig,

    /// Distributed lock settings
    #[serde(default)]
    pub lock: LockSettings,
}

/// Backoff policy configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default backoff policy
    #[serde(default)]
    pub default: BackoffPolicy,

    /// Per-operation backoff policies
    #[serde(default)]
    pub operations: HashMap<String, BackoffPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();

        // Transfers touch two resources and collide more often, so they
        // back off exponentially rather than randomly.
        operations.insert(
            "transfer".to_string(),
            BackoffPolicy {
                max_attempts: 10,
                strategy: BackoffStrategy::ExponentialBackoff,
                backoff_multiplier: 2.0,
                base_delay_ms: 100,
                max_delay_ms: 2000,
                step_increment_ms: default_step_increment(),
                jitter_bound_ms: default_jitter_bound(),
            },
        );

        Self {
            default: BackoffPolicy::default(),
            operations,
        }
    }
}

impl RetryPoliciesConfig {
    /// Look up the policy for an operation type, falling back to the default.
    pub fn policy_for(&self, operation: &str) -> &BackoffPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }
}

/// Backoff policy for an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BackoffPolicy {
    /// Maximum number of retry attempts after the initial execution
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff strategy
    #[serde(default)]
    pub strategy: BackoffStrategy,

    /// Multiplier for the exponential strategy
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Base delay in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Per-attempt linear increment for the random strategy, in milliseconds
    #[serde(default = "default_step_increment")]
    pub step_increment_ms: u64,

    /// Upper bound on random jitter for the random strategy, in milliseconds
    #[serde(default = "default_jitter_bound")]
    pub jitter_bound_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: BackoffStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            step_increment_ms: default_step_increment(),
            jitter_bound_ms: default_jitter_bound(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_base_delay() -> u64 {
    100
}
fn default_max_delay() -> u64 {
    2000
}
fn default_step_increment() -> u64 {
    50
}
fn default_jitter_bound() -> u64 {
    200
}

/// Backoff strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    FixedDelay,

    /// Randomized backoff with jitter (default)
    #[default]
    RandomBackoff,

    /// Exponential backoff with cap
    ExponentialBackoff,
}

/// Distributed lock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LockSettings {
    /// Prefix prepended to every lock key in the shared store
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Lease duration in seconds
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,

    /// How long acquire-with-wait polls before giving up, in milliseconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Interval between acquisition polls, in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            lease_secs: default_lease_secs(),
            wait_timeout_ms: default_wait_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl LockSettings {
    /// Lease duration as a `Duration`.
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    /// Wait timeout as a `Duration`.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_namespace() -> String {
    "lock:".to_string()
}
fn default_lease_secs() -> u64 {
    30
}
fn default_wait_timeout() -> u64 {
    5000
}
fn default_poll_interval() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordination_config_defaults() {
        let config = CoordinationConfig::default();
        assert_eq!(config.lock.namespace, "lock:");
        assert_eq!(config.lock.lease_secs, 30);
        assert_eq!(config.lock.poll_interval_ms, 100);
        assert_eq!(config.retry_policies.default.max_attempts, 10);
    }

    #[test]
    fn test_backoff_policy_defaults() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert!(matches!(policy.strategy, BackoffStrategy::RandomBackoff));
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert_eq!(policy.base_delay_ms, 100);
        assert_eq!(policy.max_delay_ms, 2000);
    }

    #[test]
    fn test_retry_policies_config_lookup() {
        let config = RetryPoliciesConfig::default();
        assert!(config.operations.contains_key("transfer"));
        let transfer = config.policy_for("transfer");
        assert!(matches!(
            transfer.strategy,
            BackoffStrategy::ExponentialBackoff
        ));

        // Unknown operations fall back to the default policy
        let unknown = config.policy_for("no-such-operation");
        assert!(matches!(unknown.strategy, BackoffStrategy::RandomBackoff));
    }

    #[test]
    fn test_lock_settings_serialization() {
        let settings = LockSettings {
            namespace: "orders:".to_string(),
            lease_secs: 10,
            wait_timeout_ms: 2500,
            poll_interval_ms: 50,
        };
        let yaml = serde_yaml_ng::to_string(&settings).unwrap();
        assert!(yaml.contains("lease-secs: 10"));
        assert!(yaml.contains("orders:"));

        let back: LockSettings = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back.lease(), Duration::from_secs(10));
        assert_eq!(back.wait_timeout(), Duration::from_millis(2500));
        assert_eq!(back.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_strategy_kebab_case_roundtrip() {
        let yaml = "strategy: exponential-backoff\n";
        let policy: BackoffPolicy = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(matches!(
            policy.strategy,
            BackoffStrategy::ExponentialBackoff
        ));
        // Unspecified fields take their defaults
        assert_eq!(policy.base_delay_ms, 100);
    }
}
