//! Wallet provider subsystem.
//!
//! # Data Flow
//! ```text
//! Injected capability (dyn WalletProvider)
//!     → gateway.rs (availability check, per-call timeouts, error mapping)
//!     → session state machine
//!
//! Provider notifications
//!     → Subscription (single idempotent teardown)
//!     → mpsc channel of ProviderEvent
//!     → session driver
//! ```
//!
//! # Implementations
//! - `rpc.rs`: JSON-RPC node via alloy, with failover endpoints
//! - `mock.rs`: scriptable in-memory provider for tests and demos
//!
//! # Design Decisions
//! - The provider is passed in explicitly, never read from a global
//! - Absence of a provider is a normal condition, not a panic
//! - Every provider call is bounded by a caller-side timeout

pub mod gateway;
pub mod mock;
pub mod rpc;
pub mod types;

use alloy::primitives::U256;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub use gateway::ProviderGateway;
pub use mock::MockWalletProvider;
pub use rpc::RpcWalletProvider;
pub use types::{ProviderError, ProviderEvent, ProviderResult, Subscription};

/// Capability exposed by a user's wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompt the user to expose their accounts.
    async fn request_accounts(&self) -> ProviderResult<Vec<String>>;

    /// Ask the wallet to select the given chain.
    async fn switch_chain(&self, chain_id: &str) -> ProviderResult<()>;

    /// Currently selected chain id, as a decimal or `0x` hex string.
    async fn chain_id(&self) -> ProviderResult<String>;

    /// Native balance of `address` in wei.
    async fn balance(&self, address: &str) -> ProviderResult<U256>;

    /// Register for account and chain change notifications.
    ///
    /// Events are delivered on `events` until the returned subscription is
    /// torn down.
    fn subscribe(&self, events: mpsc::UnboundedSender<ProviderEvent>) -> Subscription;
}
