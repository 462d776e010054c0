//! JSON-RPC wallet provider with timeout and failover.
//!
//! # Responsibilities
//! - Connect to a JSON-RPC node (primary + failovers)
//! - Serve account, chain and balance queries from the node
//! - Synthesize `accountsChanged` / `chainChanged` by watching the node
//!
//! A plain node has no connection prompt and cannot switch chains, so
//! `request_accounts` maps to `eth_accounts` and `switch_chain` only succeeds
//! when the node already serves the requested chain.

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::chain::registry::normalize_chain_id;
use crate::config::ProviderConfig;
use crate::provider::types::{ProviderError, ProviderEvent, ProviderResult, Subscription};
use crate::provider::WalletProvider;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Ordered list of RPC endpoints sharing one per-call timeout.
struct Endpoints {
    providers: Vec<DynProvider>,
    timeout_duration: Duration,
}

impl Endpoints {
    /// Run `call` against each endpoint in turn until one succeeds.
    async fn first_success<T, E, F, Fut>(&self, operation: &'static str, call: F) -> ProviderResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, operation, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, operation, "RPC timeout, trying next provider");
                }
            }
        }
        Err(ProviderError::QueryFailed(format!(
            "All RPC providers failed to {}",
            operation
        )))
    }

    async fn accounts(&self) -> ProviderResult<Vec<String>> {
        let accounts = self
            .first_success("get accounts", |p| async move { p.get_accounts().await })
            .await?;
        Ok(accounts.iter().map(|a| a.to_string()).collect())
    }

    async fn chain_id(&self) -> ProviderResult<String> {
        let id = self
            .first_success("get chain id", |p| async move { p.get_chain_id().await })
            .await?;
        Ok(id.to_string())
    }
}

/// Wallet provider backed by a JSON-RPC node.
pub struct RpcWalletProvider {
    endpoints: Arc<Endpoints>,
    rpc_url: String,
    event_poll_interval: Duration,
}

impl RpcWalletProvider {
    /// Build a provider from configuration.
    ///
    /// Fails only if the primary URL is malformed; invalid failover URLs are
    /// skipped with a warning.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ProviderError::QueryFailed(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => {
                    providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider)
                }
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            endpoints = providers.len(),
            "RPC wallet provider initialized"
        );

        Ok(Self {
            endpoints: Arc::new(Endpoints {
                providers,
                timeout_duration: config.query_timeout(),
            }),
            rpc_url: config.rpc_url.clone(),
            event_poll_interval: config.event_poll_interval(),
        })
    }

    /// Number of configured endpoints (primary + valid failovers).
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.providers.len()
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        self.endpoints.accounts().await
    }

    async fn switch_chain(&self, chain_id: &str) -> ProviderResult<()> {
        let wanted = normalize_chain_id(chain_id);
        let current = self.endpoints.chain_id().await?;
        if current == wanted {
            Ok(())
        } else {
            Err(ProviderError::UserRejected(format!(
                "node serves chain {}, cannot switch to {}",
                current, wanted
            )))
        }
    }

    async fn chain_id(&self) -> ProviderResult<String> {
        self.endpoints.chain_id().await
    }

    async fn balance(&self, address: &str) -> ProviderResult<U256> {
        let address: Address = address
            .parse()
            .map_err(|e| ProviderError::QueryFailed(format!("Invalid address '{}': {}", address, e)))?;

        self.endpoints
            .first_success("get balance", move |p| async move { p.get_balance(address).await })
            .await
    }

    fn subscribe(&self, events: mpsc::UnboundedSender<ProviderEvent>) -> Subscription {
        let endpoints = self.endpoints.clone();
        let poll_interval = self.event_poll_interval;
        let handle = tokio::spawn(watch_node(endpoints, poll_interval, events));
        Subscription::new(move || handle.abort())
    }
}

/// Poll the node and emit an event whenever accounts or chain change.
async fn watch_node(
    endpoints: Arc<Endpoints>,
    poll_interval: Duration,
    events: mpsc::UnboundedSender<ProviderEvent>,
) {
    let mut last_accounts = endpoints.accounts().await.ok();
    let mut last_chain = endpoints.chain_id().await.ok();

    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if let Ok(accounts) = endpoints.accounts().await {
            if last_accounts.as_ref() != Some(&accounts) {
                if last_accounts.is_some()
                    && events.send(ProviderEvent::AccountsChanged(accounts.clone())).is_err()
                {
                    break;
                }
                last_accounts = Some(accounts);
            }
        }

        if let Ok(chain) = endpoints.chain_id().await {
            if last_chain.as_ref() != Some(&chain) {
                if last_chain.is_some() && events.send(ProviderEvent::ChainChanged(chain.clone())).is_err() {
                    break;
                }
                last_chain = Some(chain);
            }
        }

        if events.is_closed() {
            break;
        }
    }

    tracing::debug!("Node watcher stopped");
}

impl std::fmt::Debug for RpcWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWalletProvider")
            .field("rpc_url", &self.rpc_url)
            .field("endpoints", &self.endpoints.providers.len())
            .field("timeout", &self.endpoints.timeout_duration)
            .finish()
    }
}
