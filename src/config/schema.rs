//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the wallet synchronizer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Wallet provider connection settings.
    pub provider: ProviderConfig,

    /// Balance polling settings.
    pub polling: PollingConfig,

    /// Session behavior.
    pub session: SessionConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Wallet provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Whether a provider is present at all. `false` simulates a browser
    /// with no wallet installed.
    pub enabled: bool,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order.
    pub failover_urls: Vec<String>,

    /// Upper bound on the account prompt and chain switch, in seconds.
    pub connect_timeout_secs: u64,

    /// Upper bound on chain and balance queries, in seconds.
    pub query_timeout_secs: u64,

    /// How often the RPC provider checks for account/chain changes.
    pub event_poll_interval_ms: u64,
}

impl ProviderConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_interval_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            connect_timeout_secs: 120,
            query_timeout_secs: 10,
            event_poll_interval_ms: 2000,
        }
    }
}

/// Polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Refresh interval while a session is active, in seconds.
    pub interval_secs: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// What to do when the provider reports a chain change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainChangePolicy {
    /// Drop the session and return to `Disconnected`.
    #[default]
    Reset,
    /// Keep the session and refresh it against the new chain.
    Resync,
}

/// Session behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Chain to switch the wallet to before requesting accounts
    /// (e.g. "0xaa36a7" for Sepolia). `None` skips the switch.
    pub preferred_chain_id: Option<String>,

    /// Reaction to `chainChanged`.
    pub chain_change_policy: ChainChangePolicy,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "wallet_sync=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert!(config.provider.enabled);
        assert_eq!(config.polling.interval(), Duration::from_secs(10));
        assert_eq!(config.provider.query_timeout_secs, 10);
        assert_eq!(config.session.chain_change_policy, ChainChangePolicy::Reset);
        assert!(config.session.preferred_chain_id.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: SyncConfig = toml::from_str(
            r#"
            [polling]
            interval_secs = 3

            [session]
            preferred_chain_id = "0xaa36a7"
            chain_change_policy = "resync"
            "#,
        )
        .unwrap();

        assert_eq!(config.polling.interval_secs, 3);
        assert_eq!(config.session.preferred_chain_id.as_deref(), Some("0xaa36a7"));
        assert_eq!(config.session.chain_change_policy, ChainChangePolicy::Resync);
        // Untouched sections keep defaults
        assert_eq!(config.provider.rpc_url, "http://localhost:8545");
    }
}
