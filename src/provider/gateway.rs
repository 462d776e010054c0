//! Provider gateway with timeout and error mapping.
//!
//! # Responsibilities
//! - Report whether a wallet provider is present
//! - Bound every provider call with a caller-side timeout
//! - Normalize failures into the three session-level error kinds
//! - Hand out event subscriptions

use alloy::primitives::U256;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::ProviderConfig;
use crate::provider::types::{ProviderError, ProviderEvent, ProviderResult, Subscription};
use crate::provider::WalletProvider;

/// Capability wrapper around the injected wallet provider.
#[derive(Clone)]
pub struct ProviderGateway {
    /// The injected provider, if any.
    provider: Option<Arc<dyn WalletProvider>>,
    /// Bound on the account prompt and chain switch.
    connect_timeout: Duration,
    /// Bound on chain and balance queries.
    query_timeout: Duration,
}

impl ProviderGateway {
    /// Create a gateway from configuration.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, config: &ProviderConfig) -> Self {
        Self::with_timeouts(provider, config.connect_timeout(), config.query_timeout())
    }

    /// Create a gateway with explicit timeouts.
    pub fn with_timeouts(
        provider: Option<Arc<dyn WalletProvider>>,
        connect_timeout: Duration,
        query_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            connect_timeout,
            query_timeout,
        }
    }

    /// Whether a wallet provider is present.
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> ProviderResult<&Arc<dyn WalletProvider>> {
        self.provider.as_ref().ok_or(ProviderError::Unavailable)
    }

    /// Prompt the user for accounts.
    ///
    /// Any failure other than a missing provider is reported as
    /// `UserRejected`, including a prompt that never answers.
    pub async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        let provider = self.provider()?;

        match timeout(self.connect_timeout, provider.request_accounts()).await {
            Ok(Ok(accounts)) => Ok(accounts),
            Ok(Err(ProviderError::QueryFailed(msg))) => Err(ProviderError::UserRejected(msg)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(timeout = ?self.connect_timeout, "Account request timed out");
                Err(ProviderError::UserRejected(format!(
                    "no response within {:?}",
                    self.connect_timeout
                )))
            }
        }
    }

    /// Ask the wallet to select `chain_id`.
    pub async fn switch_chain(&self, chain_id: &str) -> ProviderResult<()> {
        let provider = self.provider()?;

        match timeout(self.connect_timeout, provider.switch_chain(chain_id)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(ProviderError::QueryFailed(msg))) => Err(ProviderError::UserRejected(msg)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(chain_id, timeout = ?self.connect_timeout, "Chain switch timed out");
                Err(ProviderError::UserRejected(format!(
                    "chain switch not answered within {:?}",
                    self.connect_timeout
                )))
            }
        }
    }

    /// Query the selected chain id.
    pub async fn chain_id(&self) -> ProviderResult<String> {
        let provider = self.provider()?;
        self.query("chain_id", provider.chain_id()).await
    }

    /// Query the native balance of `address` in wei.
    pub async fn balance(&self, address: &str) -> ProviderResult<U256> {
        let provider = self.provider()?;
        self.query("balance", provider.balance(address)).await
    }

    async fn query<T, F>(&self, operation: &'static str, fut: F) -> ProviderResult<T>
    where
        F: std::future::Future<Output = ProviderResult<T>>,
    {
        match timeout(self.query_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(ProviderError::UserRejected(msg))) => Err(ProviderError::QueryFailed(msg)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.query_timeout, "Provider query timed out");
                Err(ProviderError::QueryFailed(format!(
                    "{} timed out after {:?}",
                    operation, self.query_timeout
                )))
            }
        }
    }

    /// Subscribe to provider events. `None` when no provider is present.
    pub fn subscribe(&self, events: mpsc::UnboundedSender<ProviderEvent>) -> Option<Subscription> {
        self.provider.as_ref().map(|p| p.subscribe(events))
    }
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("available", &self.is_available())
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}
