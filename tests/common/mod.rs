//! Shared utilities for integration tests.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use alloy::primitives::U256;
use wallet_sync::chain::ChainRegistry;
use wallet_sync::config::SessionConfig;
use wallet_sync::provider::{MockWalletProvider, ProviderGateway};
use wallet_sync::session::{SessionSnapshot, SessionStateMachine};

pub const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// Whole-ether amount in wei.
#[allow(dead_code)]
pub fn eth(n: u64) -> U256 {
    U256::from(n) * U256::from(WEI_PER_ETH)
}

/// Gateway over `mock` with short test timeouts.
pub fn gateway(mock: &MockWalletProvider) -> ProviderGateway {
    ProviderGateway::with_timeouts(
        Some(Arc::new(mock.clone())),
        Duration::from_secs(30),
        Duration::from_secs(5),
    )
}

/// State machine wired to `mock`.
pub fn machine(mock: &MockWalletProvider) -> SessionStateMachine {
    SessionStateMachine::new(gateway(mock), ChainRegistry::new(), &SessionConfig::default())
}

/// Let spawned tasks run to their next suspension point.
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Wait until a published snapshot satisfies `pred`, or panic after 5s.
#[allow(dead_code)]
pub async fn wait_for<F>(rx: &mut watch::Receiver<SessionSnapshot>, pred: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("snapshot condition not reached in time")
        .expect("state machine dropped");
    (*snapshot).clone()
}
